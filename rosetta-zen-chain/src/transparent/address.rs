//! Transparent (Base58Check) addresses.
//!
//! A single two-byte prefix identifies the network and address type. The
//! result is hashed with SHA256 then RIPEMD160 (for P2PKH, the payload is
//! a compressed public key; for P2SH, a redeem script) and Base58Check
//! encoded.
//!
//! <https://en.bitcoin.it/Base58Check_encoding>

use std::{fmt, io, str::FromStr};

use ripemd::Ripemd160;
use secp256k1::PublicKey;
use sha2::{Digest, Sha256};

use crate::network::{address_prefix, Network};
use crate::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum Address {
    PayToPublicKeyHash {
        network: Network,
        pub_key_hash: [u8; 20],
    },
    PayToScriptHash {
        network: Network,
        script_hash: [u8; 20],
    },
}

impl Address {
    /// Derives the P2PKH address for a compressed secp256k1 public key.
    pub fn from_public_key(network: Network, public_key: &PublicKey) -> Address {
        Address::PayToPublicKeyHash {
            network,
            pub_key_hash: hash_payload(&public_key.serialize()),
        }
    }

    pub fn from_script_hash(network: Network, script_hash: [u8; 20]) -> Address {
        Address::PayToScriptHash {
            network,
            script_hash,
        }
    }

    /// Builds a P2PKH address directly from an already-hashed pubkey hash
    /// (e.g. one recovered by stripping a replay suffix off a locking
    /// script), without requiring the public key itself.
    pub fn from_pubkey_hash(network: Network, pub_key_hash: [u8; 20]) -> Address {
        Address::PayToPublicKeyHash {
            network,
            pub_key_hash,
        }
    }

    pub fn network(&self) -> Network {
        match self {
            Address::PayToPublicKeyHash { network, .. } => *network,
            Address::PayToScriptHash { network, .. } => *network,
        }
    }

    pub fn hash_bytes(&self) -> [u8; 20] {
        match self {
            Address::PayToPublicKeyHash { pub_key_hash, .. } => *pub_key_hash,
            Address::PayToScriptHash { script_hash, .. } => *script_hash,
        }
    }
}

fn hash_payload(bytes: &[u8]) -> [u8; 20] {
    let sha_hash = Sha256::digest(bytes);
    let ripe_hash = Ripemd160::digest(sha_hash);
    let mut payload = [0u8; 20];
    payload.copy_from_slice(&ripe_hash);
    payload
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut debug_struct = f.debug_struct("transparent::Address");
        match self {
            Address::PayToScriptHash {
                network,
                script_hash,
            } => debug_struct
                .field("network", network)
                .field("script_hash", &hex::encode(script_hash))
                .finish(),
            Address::PayToPublicKeyHash {
                network,
                pub_key_hash,
            } => debug_struct
                .field("network", network)
                .field("pub_key_hash", &hex::encode(pub_key_hash))
                .finish(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut bytes = io::Cursor::new(Vec::new());
        let _ = self.bitcoin_serialize(&mut bytes);
        f.write_str(&bs58::encode(bytes.get_ref()).with_check().into_string())
    }
}

impl FromStr for Address {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|_| SerializationError::Parse("t-addr base58check decoding error"))?;
        Self::bitcoin_deserialize(&bytes[..])
    }
}

impl BitcoinSerialize for Address {
    fn bitcoin_serialize<W: io::Write>(&self, mut writer: W) -> Result<(), io::Error> {
        match self {
            Address::PayToScriptHash {
                network,
                script_hash,
            } => {
                let prefix = match network {
                    Network::Mainnet => address_prefix::p2sh::MAINNET,
                    Network::Testnet => address_prefix::p2sh::TESTNET,
                    Network::Regtest => address_prefix::p2sh::REGTEST,
                };
                writer.write_all(&prefix)?;
                writer.write_all(script_hash)
            }
            Address::PayToPublicKeyHash {
                network,
                pub_key_hash,
            } => {
                let prefix = match network {
                    Network::Mainnet => address_prefix::p2pkh::MAINNET,
                    Network::Testnet => address_prefix::p2pkh::TESTNET,
                    Network::Regtest => address_prefix::p2pkh::REGTEST,
                };
                writer.write_all(&prefix)?;
                writer.write_all(pub_key_hash)
            }
        }
    }
}

impl BitcoinDeserialize for Address {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let mut prefix = [0u8; 2];
        reader.read_exact(&mut prefix)?;
        let mut hash_bytes = [0u8; 20];
        reader.read_exact(&mut hash_bytes)?;

        let (network, is_script_hash) = match prefix {
            p if p == address_prefix::p2pkh::MAINNET => (Network::Mainnet, false),
            p if p == address_prefix::p2sh::MAINNET => (Network::Mainnet, true),
            p if p == address_prefix::p2pkh::TESTNET => (Network::Testnet, false),
            p if p == address_prefix::p2sh::TESTNET => (Network::Testnet, true),
            _ => return Err(SerializationError::Parse("bad address version prefix")),
        };

        Ok(if is_script_hash {
            Address::PayToScriptHash {
                network,
                script_hash: hash_bytes,
            }
        } else {
            Address::PayToPublicKeyHash {
                network,
                pub_key_hash: hash_bytes,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_mainnet_p2pkh_round_trips_through_display() {
        let addr = Address::PayToPublicKeyHash {
            network: Network::Mainnet,
            pub_key_hash: [7u8; 20],
        };
        let s = addr.to_string();
        let parsed: Address = s.parse().unwrap();
        assert_eq!(addr, parsed);
    }
}
