//! `Hash` (§4.G): the transaction identifier of a signed transaction.

use rosetta_zen_chain::transparent::Transaction;

use crate::envelope::SignedTransaction;
use crate::error::ConstructionError;

pub fn transaction_hash(signed: &SignedTransaction) -> Result<String, ConstructionError> {
    let tx = Transaction::from_hex(&signed.transaction).map_err(|e| ConstructionError::Chain(e.into()))?;
    Ok(tx.hash().to_string())
}
