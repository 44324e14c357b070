//! Storage layer: Parquet loading from local paths, globs, directories and object
//! storage, and partitioned Parquet writing.

mod error;
mod read;
mod remote;
mod source;
mod write;

pub use error::StoreError;
pub use read::{footer_metadata, load_table};
pub use source::{REMOTE_SCHEMES, is_remote, resolve_local};
pub use write::{DEFAULT_FILE_NAME, resolve_output_path, write_parquet, write_partitioned};
