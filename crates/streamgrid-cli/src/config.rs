//! Layered application configuration.
//!
//! Sources, lowest to highest priority: built-in defaults, `streamgrid.toml`
//! in the working directory, `STREAMGRID_*` environment variables, then
//! command-line flags.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Optional config file looked up in the working directory.
pub const CONFIG_FILE: &str = "streamgrid.toml";

/// Prefix for environment overrides, e.g. `STREAMGRID_PORT=4000`.
pub const ENV_PREFIX: &str = "STREAMGRID_";

/// Host bound when `start --host` exposes the dashboard on the network.
pub const PUBLIC_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Location of the persisted state document
    pub state_path: PathBuf,
    /// Open the dashboard in a browser after `start`
    pub open: bool,
    /// Quiet period before an external edit of the state file is reloaded
    pub watch_debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            state_path: default_state_path(),
            open: true,
            watch_debounce_ms: default_watch_debounce_ms(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3939
}

fn default_watch_debounce_ms() -> u64 {
    100
}

/// `<user config dir>/streamgrid/state.json`, or `./streamgrid/state.json`
/// on platforms without one.
pub fn default_state_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("streamgrid")
        .join("state.json")
}

/// Values given on the command line. `None` leaves lower layers in charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
}

impl AppConfig {
    /// Load configuration using `streamgrid.toml` from the working directory.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE), overrides)
    }

    /// Load configuration with an explicit config file location. A missing
    /// file is skipped.
    pub fn load_from(config_file: &Path, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if config_file.exists() {
            figment = figment.merge(Toml::file(config_file));
        }

        // No key splitting: field names themselves contain underscores
        figment = figment.merge(Env::prefixed(ENV_PREFIX));
        figment = figment.merge(Serialized::defaults(overrides));

        let config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "host".to_string(),
                value: format!("{:?}", self.host),
                hint: "Use an address such as 127.0.0.1, or pass --host to listen on all interfaces"
                    .to_string(),
            });
        }
        if self.state_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "state_path".to_string(),
                value: "\"\"".to_string(),
                hint: "Pass --state <PATH> or set STREAMGRID_STATE_PATH".to_string(),
            });
        }
        if self.watch_debounce_ms > 10_000 {
            return Err(ConfigError::InvalidValue {
                field: "watch_debounce_ms".to_string(),
                value: self.watch_debounce_ms.to_string(),
                hint: "Use a value between 0 and 10000 milliseconds".to_string(),
            });
        }
        Ok(())
    }

    /// Address string accepted by `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL to open in a browser. Wildcard binds are reached via loopback.
    pub fn server_url(&self) -> String {
        let host = if self.host == PUBLIC_HOST {
            "127.0.0.1"
        } else {
            self.host.as_str()
        };
        format!("http://{}:{}", host, self.port)
    }
}
