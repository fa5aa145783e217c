//! `Parse` (§4.G): reconstruct the operation list from either an
//! unsigned or a signed transaction, recovering signer addresses from
//! the signed form's unlocking scripts.

use rosetta_zen_chain::model::{
    AccountIdentifier, CoinAction, CoinChange, CoinIdentifier, Operation, OperationMetadata, OperationStatus, OperationType,
};
use rosetta_zen_chain::transparent::{Address, Script, Transaction};
use rosetta_zen_chain::{Amount, Network};

use crate::envelope::{SignedTransaction, UnsignedTransaction};
use crate::error::ConstructionError;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_CHECKBLOCKATHEIGHT: u8 = 0xb4;

pub struct ParsedTransaction {
    pub operations: Vec<Operation>,
    pub signer_addresses: Vec<String>,
}

fn input_operation(index: u64, network_index: u64, account: String, amount: i64, outpoint_hash: rosetta_zen_chain::Hash, vout: u32) -> Operation {
    Operation {
        operation_index: index,
        network_index: Some(network_index),
        operation_type: OperationType::Input,
        status: OperationStatus::Success,
        account: Some(AccountIdentifier::new(account)),
        amount: Some(Amount(amount)),
        coin_change: Some(CoinChange {
            action: CoinAction::Spent,
            coin_identifier: CoinIdentifier::new(outpoint_hash, vout),
        }),
        metadata: OperationMetadata::default(),
    }
}

fn output_operation(index: u64, network_index: u64, network: Network, lock_script: &Script) -> Result<Operation, ConstructionError> {
    let address = replay_protected_address(network, lock_script)?;
    Ok(Operation {
        operation_index: index,
        network_index: Some(network_index),
        operation_type: OperationType::Output,
        status: OperationStatus::Success,
        account: Some(AccountIdentifier::new(address.to_string())),
        amount: None,
        coin_change: None,
        metadata: OperationMetadata::default(),
    })
}

/// Strips a replay suffix off a P2PKH locking script and recovers the
/// address underneath it (the reverse of
/// [`crate::replay::replay_protected_lock_script`]).
fn replay_protected_address(network: Network, script: &Script) -> Result<Address, ConstructionError> {
    let bytes = &script.0;
    if bytes.len() < 25
        || bytes[0] != OP_DUP
        || bytes[1] != OP_HASH160
        || bytes[2] != 0x14
        || bytes[23] != OP_EQUALVERIFY
        || bytes[24] != OP_CHECKSIG
    {
        return Err(ConstructionError::UnknownScriptType(hex::encode(bytes)));
    }
    let mut pub_key_hash = [0u8; 20];
    pub_key_hash.copy_from_slice(&bytes[3..23]);

    if bytes.len() < 59 || bytes[25] != 0x20 {
        return Err(ConstructionError::UnknownScriptType(hex::encode(bytes)));
    }
    let height_len_pos = 58;
    let height_len = bytes[height_len_pos] as usize;
    let tail_pos = height_len_pos + 1 + height_len;
    if bytes.len() != tail_pos + 1 || bytes[tail_pos] != OP_CHECKBLOCKATHEIGHT {
        return Err(ConstructionError::UnknownScriptType(hex::encode(bytes)));
    }

    Ok(Address::from_pubkey_hash(network, pub_key_hash))
}

/// Recovers the signing public key from a standard P2PKH unlocking
/// script (`<sig><pubkey>`) and derives its address.
fn signer_address(network: Network, unlock_script: &Script) -> Result<Address, ConstructionError> {
    let bytes = &unlock_script.0;
    let mut offset = 0usize;
    let sig_len = *bytes.get(offset).ok_or(ConstructionError::UnknownScriptType("empty unlock script".into()))? as usize;
    offset += 1 + sig_len;
    let key_len = *bytes
        .get(offset)
        .ok_or(ConstructionError::UnknownScriptType("unlock script missing public key push".into()))? as usize;
    offset += 1;
    let pub_key = bytes
        .get(offset..offset + key_len)
        .ok_or(ConstructionError::UnknownScriptType("unlock script public key push is truncated".into()))?;
    let public_key = secp256k1::PublicKey::from_slice(pub_key)?;
    Ok(Address::from_public_key(network, &public_key))
}

pub fn parse_unsigned(network: Network, unsigned: &UnsignedTransaction) -> Result<ParsedTransaction, ConstructionError> {
    let tx = Transaction::from_hex(&unsigned.transaction).map_err(|e| ConstructionError::Chain(e.into()))?;
    let mut operations = Vec::new();

    for (i, input) in tx.inputs.iter().enumerate() {
        let amount: i64 = unsigned.input_amounts[i]
            .parse()
            .map_err(|_| ConstructionError::MalformedOperations("input_amounts entry is not an integer"))?;
        operations.push(input_operation(
            i as u64,
            i as u64,
            unsigned.input_addresses[i].clone(),
            amount,
            input.outpoint.hash,
            input.outpoint.index,
        ));
    }
    let input_count = tx.inputs.len() as u64;
    for (i, output) in tx.outputs.iter().enumerate() {
        let mut op = output_operation(input_count + i as u64, i as u64, network, &output.lock_script)?;
        op.amount = Some(Amount(output.value));
        operations.push(op);
    }

    Ok(ParsedTransaction { operations, signer_addresses: Vec::new() })
}

pub fn parse_signed(network: Network, signed: &SignedTransaction) -> Result<ParsedTransaction, ConstructionError> {
    let tx = Transaction::from_hex(&signed.transaction).map_err(|e| ConstructionError::Chain(e.into()))?;
    let mut operations = Vec::new();
    let mut signer_addresses = Vec::new();

    for (i, input) in tx.inputs.iter().enumerate() {
        let amount: i64 = signed.input_amounts[i]
            .parse()
            .map_err(|_| ConstructionError::MalformedOperations("input_amounts entry is not an integer"))?;
        let signer = signer_address(network, &input.unlock_script)?;
        let signer = signer.to_string();
        if !signer_addresses.contains(&signer) {
            signer_addresses.push(signer.clone());
        }
        operations.push(input_operation(i as u64, i as u64, signer, amount, input.outpoint.hash, input.outpoint.index));
    }
    let input_count = tx.inputs.len() as u64;
    for (i, output) in tx.outputs.iter().enumerate() {
        let mut op = output_operation(input_count + i as u64, i as u64, network, &output.lock_script)?;
        op.amount = Some(Amount(output.value));
        operations.push(op);
    }

    Ok(ParsedTransaction { operations, signer_addresses })
}
