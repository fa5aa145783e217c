//! Settings (spec §6 "Environment/config options"): a TOML file with
//! defaults for everything, each field overridable by an environment
//! variable prefixed `ROSETTA_ZEN_`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use rosetta_zen_chain::Network;
use rosetta_zen_rpc::RetryPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("unknown network {0:?}, expected mainnet, testnet, or regtest")]
    UnknownNetwork(String),
    #[error("unknown mode {0:?}, expected online or offline")]
    UnknownMode(String),
    #[error("environment variable {name} is not valid {kind}: {value:?}")]
    BadEnvOverride { name: &'static str, kind: &'static str, value: String },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Mode {
    Online,
    Offline,
}

/// The raw, TOML-shaped settings. Field names match spec §6's config
/// option names with underscores in place of hyphens.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: String,
    pub network: String,
    pub node_rpc_url: String,
    pub node_rpc_user: Option<String>,
    pub node_rpc_password: Option<String>,
    pub data_dir: PathBuf,
    pub fee_confirmation_target: u32,
    pub fee_min_rate: f64,
    pub replay_protection_depth: i64,
    pub sync_window: usize,
    pub rpc_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            mode: "online".to_string(),
            network: "mainnet".to_string(),
            node_rpc_url: "http://127.0.0.1:8231".to_string(),
            node_rpc_user: None,
            node_rpc_password: None,
            data_dir: dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".")).join("rosetta-zen-gateway"),
            fee_confirmation_target: 6,
            fee_min_rate: 1.0,
            replay_protection_depth: 300,
            sync_window: 8,
            rpc_timeout_ms: 10_000,
        }
    }
}

impl Settings {
    /// Loads defaults, then a TOML file if `path` exists, then
    /// environment-variable overrides — in that order, each layer only
    /// replacing what it actually specifies.
    pub fn load(path: &Path) -> Result<Settings, ConfigError> {
        let mut settings = if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
            toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?
        } else {
            Settings::default()
        };
        settings.apply_env_overrides()?;
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("ROSETTA_ZEN_MODE") {
            self.mode = v;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_NETWORK") {
            self.network = v;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_NODE_RPC_URL") {
            self.node_rpc_url = v;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_NODE_RPC_USER") {
            self.node_rpc_user = Some(v);
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_NODE_RPC_PASSWORD") {
            self.node_rpc_password = Some(v);
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_FEE_CONFIRMATION_TARGET") {
            self.fee_confirmation_target = parse_env("ROSETTA_ZEN_FEE_CONFIRMATION_TARGET", "an integer", &v)?;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_FEE_MIN_RATE") {
            self.fee_min_rate = parse_env("ROSETTA_ZEN_FEE_MIN_RATE", "a decimal", &v)?;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_REPLAY_PROTECTION_DEPTH") {
            self.replay_protection_depth = parse_env("ROSETTA_ZEN_REPLAY_PROTECTION_DEPTH", "an integer", &v)?;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_SYNC_WINDOW") {
            self.sync_window = parse_env("ROSETTA_ZEN_SYNC_WINDOW", "an integer", &v)?;
        }
        if let Ok(v) = std::env::var("ROSETTA_ZEN_RPC_TIMEOUT_MS") {
            self.rpc_timeout_ms = parse_env("ROSETTA_ZEN_RPC_TIMEOUT_MS", "an integer", &v)?;
        }
        Ok(())
    }

    pub fn mode(&self) -> Result<Mode, ConfigError> {
        match self.mode.as_str() {
            "online" => Ok(Mode::Online),
            "offline" => Ok(Mode::Offline),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }

    pub fn network(&self) -> Result<Network, ConfigError> {
        self.network.parse().map_err(|_| ConfigError::UnknownNetwork(self.network.clone()))
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn rpc_auth(&self) -> Option<(String, String)> {
        self.node_rpc_user.clone().zip(self.node_rpc_password.clone())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &'static str, kind: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::BadEnvOverride { name, kind, value: value.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_an_online_mainnet_gateway() {
        let settings = Settings::default();
        assert_eq!(settings.mode().unwrap(), Mode::Online);
        assert_eq!(settings.network().unwrap(), Network::Mainnet);
    }

    #[test]
    fn loading_a_missing_file_falls_back_to_defaults() {
        let settings = Settings::load(Path::new("/nonexistent/rosetta-zen-gateway.toml")).unwrap();
        assert_eq!(settings.node_rpc_url, Settings::default().node_rpc_url);
    }

    #[test]
    fn a_toml_file_overrides_only_what_it_names() {
        let dir = tempdir::TempDir::new("rosetta-zen-gatewayd-config-test").unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "network = \"testnet\"\nnode_rpc_url = \"http://node:1234\"\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.network, "testnet");
        assert_eq!(settings.node_rpc_url, "http://node:1234");
        assert_eq!(settings.fee_confirmation_target, Settings::default().fee_confirmation_target);
    }
}
