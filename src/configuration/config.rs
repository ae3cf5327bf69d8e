use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::Parser;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::types::{ClientConfig, ServerConfig};
use crate::error_handling::types::ConfigError;

const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;
const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_REFRESH_WINDOW_SECS: i64 = 24 * 60 * 60;

fn base_url_shape() -> &'static Regex {
    static SHAPE: OnceLock<Regex> = OnceLock::new();
    SHAPE.get_or_init(|| {
        Regex::new(r"^https?://[^\s/?#]+(/[^\s?#]*)?$").expect("base url pattern is valid")
    })
}

/// Complete runtime configuration, as read from a TOML file.
///
/// Both tables are optional and every field has a default, so an empty file
/// is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub client: ClientConfig,
}

impl Config {
    /// Reads and validates the TOML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let address = self.server.bind_address.as_str();
        if address != "localhost" && address.parse::<IpAddr>().is_err() {
            return Err(ConfigError::BadAddressFormatting(address.to_string()));
        }
        if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.server.token_ttl_secs) {
            return Err(ConfigError::NotInRange(format!(
                "server.token_ttl_secs must be within 1..={}, got {}",
                MAX_TOKEN_TTL_SECS, self.server.token_ttl_secs
            )));
        }
        if !base_url_shape().is_match(&self.client.base_url) {
            return Err(ConfigError::BadUrl(self.client.base_url.clone()));
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.client.timeout_secs) {
            return Err(ConfigError::NotInRange(format!(
                "client.timeout_secs must be within 1..={}, got {}",
                MAX_TIMEOUT_SECS, self.client.timeout_secs
            )));
        }
        if !(0..=MAX_REFRESH_WINDOW_SECS).contains(&self.client.refresh_window_secs) {
            return Err(ConfigError::NotInRange(format!(
                "client.refresh_window_secs must be within 0..={}, got {}",
                MAX_REFRESH_WINDOW_SECS, self.client.refresh_window_secs
            )));
        }
        Ok(())
    }

    /// Overrides the server table with whatever was given on the command line
    /// or through the environment.
    pub fn apply(&mut self, args: &Configuration) {
        if let Some(bind_address) = &args.bind_address {
            self.server.bind_address = bind_address.clone();
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(ttl) = args.token_ttl_secs {
            self.server.token_ttl_secs = ttl;
        }
        if args.no_demo_users {
            self.server.seed_demo_users = false;
        }
    }
}

/// Command-line arguments of the `yunmeng` binary.
///
/// Every option can also be given through its `YUNMENG_*` environment
/// variable; options win over the configuration file.
#[derive(Parser, Debug, Clone, Default, PartialEq)]
#[command(name = "yunmeng")]
#[command(version)]
#[command(about = "Mock resource server for the Yunmeng project management API")]
pub struct Configuration {
    /// TOML configuration file. Defaults apply when omitted.
    pub config_file: Option<PathBuf>,

    /// Address to bind the mock server to.
    ///
    /// # Command Line
    /// Use `--bind-address <ADDRESS>` to set this value from the CLI
    #[arg(long, env = "YUNMENG_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Port to serve the API on.
    ///
    /// # Command Line
    /// Use `--port <PORT>` to set this value from the CLI
    #[arg(long, env = "YUNMENG_PORT")]
    pub port: Option<u16>,

    /// Lifetime in seconds of issued tokens.
    #[arg(long, env = "YUNMENG_TOKEN_TTL_SECS")]
    pub token_ttl_secs: Option<u64>,

    /// Start with an empty user directory.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub no_demo_users: bool,
}

impl Configuration {
    /// Parses the process arguments, exiting with usage on error.
    pub fn from_args() -> Self {
        Configuration::parse()
    }

    /// Loads the configuration file (if any), applies the overrides and
    /// validates the result.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config_file {
            Some(path) => Config::from_file(path)?,
            None => {
                info!("No configuration file given, using defaults");
                Config::default()
            }
        };
        config.apply(self);
        config.validate()?;
        Ok(config)
    }
}
