//! File and network I/O shared by the dataset loaders.

pub mod csv_io;
pub mod error;
pub mod fetch;

pub use csv_io::{read_matrix, Delimiter, ReadOptions};
pub use error::{IoError, IoResult};
pub use fetch::{download_file, open_maybe_gz};
