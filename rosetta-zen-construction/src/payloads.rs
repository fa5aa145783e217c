//! `Payloads` (§4.G): assemble the unsigned transaction and the legacy
//! sighash digest each input needs signed.

use rosetta_zen_chain::model::{CoinAction, Operation, OperationType};
use rosetta_zen_chain::serialization::{sha256d, BitcoinSerialize};
use rosetta_zen_chain::transparent::{Address, Input, OutPoint, Output, Script, Transaction};
use rosetta_zen_chain::{Hash, Network};

use crate::envelope::UnsignedTransaction;
use crate::error::ConstructionError;
use crate::metadata::ConstructionMetadata;
use crate::replay::replay_protected_lock_script;

const SIGHASH_ALL: u32 = 1;

pub struct SigningPayload {
    pub bytes: Vec<u8>,
    pub address: String,
}

pub fn build_payloads(
    network: Network,
    operations: &[Operation],
    metadata: &ConstructionMetadata,
) -> Result<(UnsignedTransaction, Vec<SigningPayload>), ConstructionError> {
    let replay_hash: Hash = metadata
        .replay_block_hash
        .parse()
        .map_err(|e: rosetta_zen_chain::SerializationError| ConstructionError::Chain(e.into()))?;

    let mut inputs = Vec::new();
    let mut input_amounts = Vec::new();
    let mut input_addresses = Vec::new();

    for op in operations.iter().filter(|op| op.operation_type == OperationType::Input) {
        let coin_change = op
            .coin_change
            .as_ref()
            .ok_or(ConstructionError::MalformedOperations("input operation missing coin_change"))?;
        if coin_change.action != CoinAction::Spent {
            return Err(ConstructionError::MalformedOperations("input operation's coin_change must be Spent"));
        }
        let amount = op
            .amount
            .ok_or(ConstructionError::MalformedOperations("input operation missing amount"))?;
        let account = op
            .account
            .as_ref()
            .ok_or(ConstructionError::MalformedOperations("input operation missing account"))?;

        inputs.push(Input {
            outpoint: OutPoint {
                hash: coin_change.coin_identifier.tx_hash,
                index: coin_change.coin_identifier.vout,
            },
            unlock_script: Script(Vec::new()),
            sequence: u32::MAX,
        });
        input_amounts.push(amount.0.to_string());
        input_addresses.push(account.address.clone());
    }

    if inputs.len() != metadata.script_pub_keys.len() {
        return Err(ConstructionError::MalformedOperations(
            "metadata's scriptPubKeys count does not match the number of spent inputs",
        ));
    }

    let mut outputs = Vec::new();
    for op in operations.iter().filter(|op| op.operation_type == OperationType::Output) {
        let amount = op
            .amount
            .ok_or(ConstructionError::MalformedOperations("output operation missing amount"))?;
        let account = op
            .account
            .as_ref()
            .ok_or(ConstructionError::MalformedOperations("output operation missing account"))?;
        let address: Address = account
            .address
            .parse()
            .map_err(|e: rosetta_zen_chain::SerializationError| ConstructionError::Chain(e.into()))?;
        if address.network() != network {
            return Err(ConstructionError::MalformedOperations("output address belongs to a different network"));
        }
        outputs.push(Output {
            value: amount.0,
            lock_script: replay_protected_lock_script(&address, metadata.replay_block_height, replay_hash),
        });
    }

    let unsigned_tx = Transaction { version: 1, inputs, outputs, locktime: 0 };

    let mut payloads = Vec::with_capacity(unsigned_tx.inputs.len());
    for (index, spk) in metadata.script_pub_keys.iter().enumerate() {
        let prevout_script = Script(
            hex::decode(&spk.hex).map_err(|_| ConstructionError::MalformedOperations("scriptPubKey hex is invalid"))?,
        );
        let digest = legacy_sighash(&unsigned_tx, index, &prevout_script)?;
        payloads.push(SigningPayload { bytes: digest, address: input_addresses[index].clone() });
    }

    let envelope = UnsignedTransaction {
        transaction: unsigned_tx.to_hex(),
        script_pub_keys: metadata.script_pub_keys.clone(),
        input_amounts,
        input_addresses,
    };

    Ok((envelope, payloads))
}

/// The legacy (pre-segwit) `SIGHASH_ALL` digest: serialize the
/// transaction with every input's unlock script emptied except the one
/// being signed, which is substituted with the spent output's own
/// locking script, then append the 4-byte sighash type and double-SHA256.
pub fn legacy_sighash(tx: &Transaction, input_index: usize, prevout_script: &Script) -> Result<Vec<u8>, ConstructionError> {
    let mut modified = tx.clone();
    for (i, input) in modified.inputs.iter_mut().enumerate() {
        input.unlock_script = if i == input_index { prevout_script.clone() } else { Script(Vec::new()) };
    }

    let mut bytes = modified
        .bitcoin_serialize_to_vec()
        .map_err(|_| ConstructionError::MalformedOperations("failed to serialize transaction for signing"))?;
    bytes.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
    Ok(sha256d::digest(&bytes).to_vec())
}
