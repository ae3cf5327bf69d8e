pub mod types;

pub use types::{ApiError, ConfigError, DirectoryError, StorageError, WebError};
