//! `Combine` (§4.G): attach each input's signature and assemble the
//! signed transaction.

use secp256k1::{PublicKey, Signature};

use rosetta_zen_chain::transparent::{Script, Transaction};

use crate::envelope::{SignedTransaction, UnsignedTransaction};
use crate::error::ConstructionError;

pub struct InputSignature<'a> {
    /// Compact (r||s), 64 bytes — the form Rosetta signing requests ask for.
    pub signature: &'a [u8],
    pub public_key: &'a [u8],
}

/// Builds the pay-to-pubkey-hash unlocking script: a DER signature with
/// the sighash-type byte appended, then the compressed public key.
fn sig_script(input: &InputSignature) -> Result<Script, ConstructionError> {
    if input.signature.len() != 64 {
        return Err(ConstructionError::BadSignatureLength(input.signature.len()));
    }
    let signature = Signature::from_compact(input.signature)?;
    let mut der = signature.serialize_der().to_vec();
    der.push(0x01); // SIGHASH_ALL

    // validates the public key is well-formed; the bytes pushed are the
    // caller's own, preserving whatever (compressed/uncompressed) form
    // was supplied.
    PublicKey::from_slice(input.public_key)?;

    let mut script = Vec::with_capacity(1 + der.len() + 1 + input.public_key.len());
    script.push(der.len() as u8);
    script.extend_from_slice(&der);
    script.push(input.public_key.len() as u8);
    script.extend_from_slice(input.public_key);
    Ok(Script(script))
}

pub fn combine(unsigned: &UnsignedTransaction, signatures: &[InputSignature]) -> Result<SignedTransaction, ConstructionError> {
    let mut tx = Transaction::from_hex(&unsigned.transaction)
        .map_err(|e| ConstructionError::Chain(e.into()))?;
    if tx.inputs.len() != signatures.len() {
        return Err(ConstructionError::MalformedOperations("signature count does not match input count"));
    }
    for (input, signature) in tx.inputs.iter_mut().zip(signatures) {
        input.unlock_script = sig_script(signature)?;
    }

    Ok(SignedTransaction {
        transaction: tx.to_hex(),
        input_amounts: unsigned.input_amounts.clone(),
    })
}
