//! Runtime configuration: a TOML file with `[server]` and `[client]` tables,
//! overridable from the command line and the environment.

pub mod config;
pub mod types;

pub use config::{Config, Configuration};
pub use types::{ClientConfig, ServerConfig};
