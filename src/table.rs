//! Struct `Table` represents a raw, possibly incomplete, dataset.
//! A [`Table`] is turned into a [`Task`](crate::Task)
//! by [`TaskBuilder`](crate::TaskBuilder).

// Provides the raw column enum.
pub(crate) mod column;
// Provides the table struct.
pub(crate) mod table_struct;
// Provides a struct that reads a file.
pub(crate) mod reader;


pub use column::RawColumn;
pub use table_struct::Table;
pub use reader::TableReader;
