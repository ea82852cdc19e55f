//! Data store - payload records addressed by the same keys as the index.

mod data_file;
mod record;

pub use data_file::DataFile;
pub use record::Record;
