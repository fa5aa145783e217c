//! Version metadata (§11 "Node/middleware version metadata"): bundled for
//! whatever external `/network/status`-style façade wires this crate up.

pub const ROSETTA_VERSION: &str = "1.4.4";
pub const NODE_VERSION: &str = "0.20.1";
pub const MIDDLEWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The three version strings a Rosetta `/network/status` response needs.
#[derive(Clone, Copy, Debug)]
pub struct VersionInfo {
    pub rosetta_version: &'static str,
    pub node_version: &'static str,
    pub middleware_version: &'static str,
}

pub const VERSION_INFO: VersionInfo =
    VersionInfo { rosetta_version: ROSETTA_VERSION, node_version: NODE_VERSION, middleware_version: MIDDLEWARE_VERSION };
