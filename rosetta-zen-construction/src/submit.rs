//! `Submit` (§4.G): broadcast a signed transaction to the node.

use rosetta_zen_rpc::NodeClient;

use crate::envelope::SignedTransaction;
use crate::error::ConstructionError;

pub async fn submit<C: NodeClient + ?Sized>(client: &C, signed: &SignedTransaction) -> Result<String, ConstructionError> {
    let hash = client.send_raw_transaction(&signed.transaction).await?;
    Ok(hash.to_string())
}
