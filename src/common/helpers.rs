//! Provides some helper functions.
use rayon::prelude::*;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};


/// Projects `v` onto the probability simplex
/// ```txt
/// Δ_K := { w ∈ [0, 1]^K | sum( w[k] ) = 1 }
/// ```
/// with respect to the Euclidean norm.
///
/// The projection follows the sort-based algorithm in
/// [John Duchi, Shai Shalev-Shwartz, Yoram Singer, and Tushar Chandra.
/// Efficient projections onto the l1-ball for learning in high dimensions
/// [ICML 2008]](https://dl.acm.org/doi/10.1145/1390156.1390191).
///
/// Time complexity: `O(K log K)`.
pub fn project_to_simplex(v: &[f64]) -> Vec<f64> {
    let dim = v.len();
    assert!(dim > 0, "cannot project an empty vector onto the simplex");

    let mut sorted = v.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));

    let mut cumsum = 0f64;
    let mut theta = 0f64;
    for (k, u) in sorted.into_iter().enumerate() {
        cumsum += u;
        let candidate = (cumsum - 1f64) / (k + 1) as f64;
        if u - candidate > 0f64 {
            theta = candidate;
        }
    }

    v.iter()
        .map(|x| (x - theta).max(0f64))
        .collect()
}


/// Normalizes the given slice so that its entries sum up to `1`.
/// The entries are assumed to be non-negative.
#[inline(always)]
pub fn normalize(items: &mut [f64]) {
    let z = items.iter()
        .map(|it| it.abs())
        .sum::<f64>();

    assert_ne!(z, 0.0, "{items:?}");

    items.par_iter_mut()
        .for_each(|item| { *item /= z; });
}


/// Compute the inner-product of the given two slices.
#[inline(always)]
pub fn inner_product(v1: &[f64], v2: &[f64]) -> f64 {
    v1.iter()
        .zip(v2)
        .map(|(a, b)| a * b)
        .sum::<f64>()
}


/// Returns the index of the minimal entry.
/// Ties are broken by the position (the first one wins),
/// and `NaN` entries are never selected unless every entry is `NaN`.
pub fn argmin(arr: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &a) in arr.iter().enumerate() {
        let a = if a.is_nan() { f64::INFINITY } else { a };
        match best {
            Some((_, b)) if a >= b => {},
            _ => { best = Some((i, a)); },
        }
    }
    best.map(|(i, _)| i)
}


/// Weighted mean of `values`.
/// Returns `NaN` if the total weight is zero.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> f64 {
    let total = weights.iter().sum::<f64>();
    values.iter()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum::<f64>()
        / total
}


/// Median of `values`.
/// For an even number of items, returns the average of the two middle ones.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() { return None; }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let n = sorted.len();
    let mid = n / 2;
    let median = if n % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    };
    Some(median)
}


/// Most frequent value of `values`.
/// Ties are broken by the smallest value.
pub fn mode(values: &[f64]) -> Option<f64> {
    let mut counts = BTreeMap::new();
    for &v in values {
        *counts.entry(OrderedValue(v)).or_insert(0_usize) += 1;
    }

    let mut best: Option<(f64, usize)> = None;
    for (value, count) in counts {
        match best {
            Some((_, c)) if count <= c => {},
            _ => { best = Some((value.0, count)); },
        }
    }
    best.map(|(v, _)| v)
}


/// Weighted Pearson correlation of `x` and `y`.
/// Returns `0` if either vector has zero variance.
pub fn weighted_correlation(x: &[f64], y: &[f64], weights: &[f64]) -> f64 {
    let mx = weighted_mean(x, weights);
    let my = weighted_mean(y, weights);

    let mut sxy = 0f64;
    let mut sxx = 0f64;
    let mut syy = 0f64;
    for ((xi, yi), wi) in x.iter().zip(y).zip(weights) {
        let dx = xi - mx;
        let dy = yi - my;
        sxy += wi * dx * dy;
        sxx += wi * dx * dx;
        syy += wi * dy * dy;
    }

    if sxx <= 0f64 || syy <= 0f64 {
        return 0f64;
    }
    sxy / (sxx * syy).sqrt()
}


/// Make the given names unique by appending `_2`, `_3`, ...
/// to the repeated ones.
/// A generated name never collides with a given one.
pub fn unique_names<I, S>(names: I) -> Vec<String>
    where I: IntoIterator<Item = S>,
          S: AsRef<str>,
{
    let names = names.into_iter()
        .map(|name| name.as_ref().to_string())
        .collect::<Vec<_>>();
    let declared = names.iter()
        .cloned()
        .collect::<HashSet<_>>();

    let mut used = HashSet::new();
    let mut output = Vec::with_capacity(names.len());
    for name in names {
        let mut unique = name.clone();
        let mut k = 1;
        while used.contains(&unique) || (k > 1 && declared.contains(&unique)) {
            k += 1;
            unique = format!("{name}_{k}");
        }
        used.insert(unique.clone());
        output.push(unique);
    }
    output
}


/// A total order on `f64` used as a map key.
#[derive(Debug, Clone, Copy)]
struct OrderedValue(f64);


impl PartialEq for OrderedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}


impl Eq for OrderedValue {}


impl PartialOrd for OrderedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}


impl Ord for OrderedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_projection_of_interior_point() {
        let w = project_to_simplex(&[0.2, 0.3, 0.5]);
        assert_relative_eq!(w[0], 0.2, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.3, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_projection_clips_negative_entries() {
        let w = project_to_simplex(&[2.0, -1.0, 0.0]);
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(w[1], 0.0, epsilon = 1e-12);
        assert_relative_eq!(w[2], 0.0, epsilon = 1e-12);

        let w = project_to_simplex(&[0.5, 0.5, 0.5]);
        let sum = w.iter().sum::<f64>();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        assert!(w.iter().all(|x| (x - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn test_argmin_prefers_first_tie() {
        assert_eq!(argmin(&[0.5, 0.3, 0.3]), Some(1));
        assert_eq!(argmin(&[f64::NAN, 0.3]), Some(1));
        assert_eq!(argmin(&[]), None);
    }

    #[test]
    fn test_median_and_mode() {
        assert_eq!(median(&[1.0, 3.0, 5.0]), Some(3.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 10.0]), Some(2.5));
        assert_eq!(median(&[]), None);
        assert_eq!(mode(&[1.0, 0.0, 1.0, 0.0]), Some(0.0));
        assert_eq!(mode(&[2.0, 1.0, 2.0]), Some(2.0));
    }

    #[test]
    fn test_correlation_of_constant_is_zero() {
        let w = vec![1.0; 4];
        let r = weighted_correlation(&[1.0, 1.0, 1.0, 1.0], &[1.0, 2.0, 3.0, 4.0], &w);
        assert_eq!(r, 0.0);
        let r = weighted_correlation(&[1.0, 2.0, 3.0, 4.0], &[2.0, 4.0, 6.0, 8.0], &w);
        assert_relative_eq!(r, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unique_names() {
        let names = unique_names(["tree", "mean", "tree", "tree"]);
        assert_eq!(names, vec!["tree", "mean", "tree_2", "tree_3"]);

        // `tree_2` is taken, so the repeated `tree` skips it.
        let names = unique_names(["tree", "tree", "tree_2"]);
        assert_eq!(names, vec!["tree", "tree_3", "tree_2"]);

        let names = unique_names(["a_2", "a", "a", "a_2"]);
        assert_eq!(names, vec!["a_2", "a", "a_3", "a_2_2"]);
    }
}
