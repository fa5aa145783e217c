//! The raw (wire-format) transaction used by `rosetta-zen-construction` to
//! build, sign, and serialize spends. This is distinct from
//! [`crate::model::Transaction`], the normalized Rosetta-facing transaction
//! the indexer stores — this type only ever represents a single spend that
//! the gateway itself is constructing, never an arbitrary historical
//! transaction pulled from a block.

use std::io;

use serde::{Deserialize, Serialize};
use zen_serde_derive::BtcSerialize;

use crate::compactint::CompactInt;
use crate::hash::Hash;
use crate::serialization::{BitcoinDeserialize, BitcoinSerialize, SerializationError};

use super::Script;

/// A reference to a single output of a previous transaction.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, BtcSerialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

impl OutPoint {
    pub const fn len() -> usize {
        36
    }
}

impl BitcoinDeserialize for OutPoint {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        Ok(OutPoint {
            hash: Hash::bitcoin_deserialize(&mut reader)?,
            index: u32::bitcoin_deserialize(&mut reader)?,
        })
    }
}

/// A transaction input spending a previous output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, BtcSerialize)]
pub struct Input {
    pub outpoint: OutPoint,
    pub unlock_script: Script,
    pub sequence: u32,
}

impl Input {
    pub fn len(&self) -> usize {
        OutPoint::len() + self.unlock_script.serialized_size() + 4
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A transaction output.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, BtcSerialize)]
pub struct Output {
    pub value: i64,
    pub lock_script: Script,
}

impl Output {
    pub fn len(&self) -> usize {
        8 + self.lock_script.serialized_size()
    }
}

/// A UTXO transaction, in the exact wire order the node expects for
/// `sendrawtransaction`: version, inputs, outputs, locktime.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize, BtcSerialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<Input>,
    pub outputs: Vec<Output>,
    pub locktime: u32,
}

impl Transaction {
    /// Double-SHA256 of the serialized transaction, the transaction
    /// identifier the node and every Rosetta caller agree on.
    pub fn hash(&self) -> Hash {
        let bytes = self
            .bitcoin_serialize_to_vec()
            .expect("serializing to a Vec is infallible");
        Hash::from_bytes(crate::serialization::sha256d::digest(&bytes))
    }

    /// Serialized length in bytes.
    pub fn len(&self) -> usize {
        let mut size = 4 + CompactInt::size(self.inputs.len());
        for input in &self.inputs {
            size += input.len();
        }
        size += CompactInt::size(self.outputs.len());
        for output in &self.outputs {
            size += output.len();
        }
        size + 4
    }

    pub fn to_hex(&self) -> String {
        hex::encode(
            self.bitcoin_serialize_to_vec()
                .expect("serializing to a Vec is infallible"),
        )
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, SerializationError> {
        let bytes = hex::decode(hex_str)
            .map_err(|_| SerializationError::Parse("invalid transaction hex"))?;
        Self::bitcoin_deserialize(&bytes[..])
    }
}

impl BitcoinDeserialize for Transaction {
    fn bitcoin_deserialize<R: io::Read>(mut reader: R) -> Result<Self, SerializationError> {
        let version = i32::bitcoin_deserialize(&mut reader)?;
        let input_count = CompactInt::bitcoin_deserialize(&mut reader)?.value();
        let mut inputs = Vec::with_capacity(input_count as usize);
        for _ in 0..input_count {
            inputs.push(Input {
                outpoint: OutPoint::bitcoin_deserialize(&mut reader)?,
                unlock_script: Script::bitcoin_deserialize(&mut reader)?,
                sequence: u32::bitcoin_deserialize(&mut reader)?,
            });
        }
        let output_count = CompactInt::bitcoin_deserialize(&mut reader)?.value();
        let mut outputs = Vec::with_capacity(output_count as usize);
        for _ in 0..output_count {
            outputs.push(Output {
                value: i64::bitcoin_deserialize(&mut reader)?,
                lock_script: Script::bitcoin_deserialize(&mut reader)?,
            });
        }
        let locktime = u32::bitcoin_deserialize(&mut reader)?;
        Ok(Transaction {
            version,
            inputs,
            outputs,
            locktime,
        })
    }
}

#[cfg(test)]
mod prop {
    use proptest::prelude::*;

    use super::*;
    use crate::Hash;

    fn script_strategy() -> impl Strategy<Value = Script> {
        proptest::collection::vec(any::<u8>(), 0..40).prop_map(Script)
    }

    fn input_strategy() -> impl Strategy<Value = Input> {
        (any::<[u8; 32]>(), any::<u32>(), script_strategy(), any::<u32>()).prop_map(
            |(hash, index, unlock_script, sequence)| Input {
                outpoint: OutPoint { hash: Hash::from_bytes(hash), index },
                unlock_script,
                sequence,
            },
        )
    }

    fn output_strategy() -> impl Strategy<Value = Output> {
        (any::<i64>(), script_strategy()).prop_map(|(value, lock_script)| Output { value, lock_script })
    }

    fn transaction_strategy() -> impl Strategy<Value = Transaction> {
        (
            any::<i32>(),
            proptest::collection::vec(input_strategy(), 0..4),
            proptest::collection::vec(output_strategy(), 0..4),
            any::<u32>(),
        )
            .prop_map(|(version, inputs, outputs, locktime)| Transaction { version, inputs, outputs, locktime })
    }

    proptest! {
        #[test]
        fn transaction_wire_round_trips(tx in transaction_strategy()) {
            let bytes = tx.bitcoin_serialize_to_vec().expect("serializing to a Vec is infallible");
            let parsed = Transaction::bitcoin_deserialize(&bytes[..]).expect("round-tripped bytes should deserialize");
            prop_assert_eq!(tx, parsed);
        }
    }
}
