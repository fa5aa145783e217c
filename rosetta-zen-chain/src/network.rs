use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::hash::Hash;

/// Which instance of the chain this gateway is talking to.
///
/// Determines the address version prefixes (§6 config: `network`) and the
/// genesis parent hash used to validate I4 at height 0.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(s)
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(format!("unknown network {other:?}")),
        }
    }
}

/// The two-byte Base58Check version prefixes for transparent addresses, as
/// registered for each network (`zend/chaincfg/params.go`).
pub mod address_prefix {
    pub mod p2pkh {
        pub const MAINNET: [u8; 2] = [0x20, 0x89];
        pub const TESTNET: [u8; 2] = [0x20, 0x98];
        pub const REGTEST: [u8; 2] = [0x20, 0x98];
    }

    pub mod p2sh {
        pub const MAINNET: [u8; 2] = [0x20, 0x96];
        pub const TESTNET: [u8; 2] = [0x20, 0x92];
        pub const REGTEST: [u8; 2] = [0x20, 0x92];
    }
}

/// The Bitcoin `null` previous-block hash used by the genesis block of
/// every known network.
pub const GENESIS_PREVIOUS_BLOCK_HASH: Hash = Hash::zero();
