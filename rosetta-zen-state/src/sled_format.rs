//! Typed helpers over `sled::Tree`, generalizing the teacher's
//! `zs_insert`/`zs_get` pattern to the `bincode` encoding this crate uses
//! for its record types (the teacher's own `sled_format` module was not
//! present in the retrieved sources).
//!
//! Keys are always raw bytes chosen by the caller (so height/address
//! prefixes sort and range-scan the way §6's key layout requires); only
//! values are bincode-encoded.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StateError};

pub trait SledTreeExt {
    fn zs_insert<K: AsRef<[u8]>, V: Serialize>(&self, tree: &'static str, key: K, value: &V) -> Result<()>;
    fn zs_get<K: AsRef<[u8]>, V: DeserializeOwned>(&self, tree: &'static str, key: K) -> Result<Option<V>>;
    fn zs_remove<K: AsRef<[u8]>>(&self, tree: &'static str, key: K) -> Result<bool>;
}

impl SledTreeExt for sled::Tree {
    fn zs_insert<K: AsRef<[u8]>, V: Serialize>(&self, tree: &'static str, key: K, value: &V) -> Result<()> {
        let bytes = bincode::serialize(value).map_err(|source| StateError::Encoding { tree, source })?;
        self.insert(key.as_ref(), bytes)?;
        Ok(())
    }

    fn zs_get<K: AsRef<[u8]>, V: DeserializeOwned>(&self, tree: &'static str, key: K) -> Result<Option<V>> {
        match self.get(key.as_ref())? {
            Some(bytes) => {
                let value = bincode::deserialize(&bytes)
                    .map_err(|source| StateError::Encoding { tree, source })?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn zs_remove<K: AsRef<[u8]>>(&self, tree: &'static str, key: K) -> Result<bool> {
        Ok(self.remove(key.as_ref())?.is_some())
    }
}
