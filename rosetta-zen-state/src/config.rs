use std::path::PathBuf;

use rosetta_zen_chain::Network;

/// On-disk location for the embedded database. Mirrors the `data-dir`
/// option named in spec §6; `rosetta-zen-gatewayd` is responsible for
/// turning its configuration file into one of these.
#[derive(Clone, Debug)]
pub struct Config {
    pub cache_dir: PathBuf,
}

impl Config {
    pub fn new(cache_dir: PathBuf) -> Config {
        Config { cache_dir }
    }

    /// Database directory for a given network, so mainnet/testnet/regtest
    /// state never collide under the same `data-dir`.
    fn db_path(&self, network: Network) -> PathBuf {
        self.cache_dir.join("state").join(network.to_string())
    }

    pub(crate) fn sled_config(&self, network: Network) -> sled::Config {
        sled::Config::default()
            .path(self.db_path(network))
            .cache_capacity(64 * 1024 * 1024)
    }
}

impl Default for Config {
    fn default() -> Config {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rosetta-zen-gateway");
        Config::new(cache_dir)
    }
}
