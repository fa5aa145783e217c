//! Pure block normalizer (§4.B): reduces a raw node block to the
//! operation ledger every store and query path downstream works with.
//! Takes no store or network dependency — every external fact it needs
//! (the address and amount behind a previously-created coin) is passed
//! in via `coin_lookup`.

use std::collections::HashMap;
use std::str::FromStr;

use rosetta_zen_chain::model::{
    AccountIdentifier, Block, BlockIdentifier, BlockMetadata, CoinAction, CoinChange,
    CoinIdentifier, Operation, OperationMetadata, OperationStatus, OperationType, Transaction,
    TransactionMetadata,
};
use rosetta_zen_chain::{Amount, Hash, Height};

use crate::error::NormalizeError;
use rosetta_zen_rpc::types::{RawBlock, RawVin, RawVout};

/// `(address, amount)` behind a coin, as needed to resolve an input.
type CoinFact = (String, i64);

pub(crate) fn parse_hash(s: &str) -> Result<Hash, NormalizeError> {
    Hash::from_str(s)
        .map_err(rosetta_zen_chain::Error::from)
        .map_err(NormalizeError::from)
}

/// Every non-coinbase input's coin-id in a raw block, across both
/// transactions and certificates. Used by the sync loop to pre-populate
/// its window-local coin lookup before normalizing (§4.F prefetch cache).
pub(crate) fn referenced_inputs(raw: &RawBlock) -> Result<Vec<CoinIdentifier>, NormalizeError> {
    fn collect(vin: &[RawVin], ids: &mut Vec<CoinIdentifier>) -> Result<(), NormalizeError> {
        if vin.first().map(RawVin::is_coinbase).unwrap_or(false) {
            return Ok(());
        }
        for input in vin {
            let txid = input
                .txid
                .as_deref()
                .ok_or(NormalizeError::Malformed("input missing txid"))?;
            let vout = input
                .vout
                .ok_or(NormalizeError::Malformed("input missing vout"))?;
            ids.push(CoinIdentifier::new(parse_hash(txid)?, vout));
        }
        Ok(())
    }

    let mut ids = Vec::new();
    for tx in &raw.tx {
        collect(&tx.vin, &mut ids)?;
    }
    for cert in &raw.cert {
        collect(&cert.vin, &mut ids)?;
    }
    Ok(ids)
}

/// Resolves one input's coin fact, consulting the in-block map first
/// (§9 "cyclic lookups"), then the caller-supplied external lookup.
/// Records external hits in `externally_referenced` for the fetcher's
/// pre-population bookkeeping (§4.B).
fn resolve_input(
    coin_id: &CoinIdentifier,
    in_block: &HashMap<CoinIdentifier, CoinFact>,
    external: &HashMap<CoinIdentifier, CoinFact>,
    externally_referenced: &mut Vec<CoinIdentifier>,
) -> Result<CoinFact, NormalizeError> {
    if let Some(fact) = in_block.get(coin_id) {
        return Ok(fact.clone());
    }
    if let Some(fact) = external.get(coin_id) {
        externally_referenced.push(coin_id.clone());
        return Ok(fact.clone());
    }
    Err(NormalizeError::MissingPreviousOutput(coin_id.clone()))
}

fn resolve_output_address(vout: &RawVout) -> Option<String> {
    let addresses = &vout.script_pub_key.addresses;
    match addresses.len() {
        0 => None,
        1 => Some(addresses[0].clone()),
        // multisig / nonstandard: preserve verbatim rather than picking one.
        _ => Some(addresses.join(",")),
    }
}

/// Normalizes one transaction or certificate's `vin`/`vout` into its
/// operation ledger (§4.B steps 1-4), threading the running in-block coin
/// map through so later transactions in the same block can spend outputs
/// created earlier in it.
fn normalize_operations(
    tx_hash: Hash,
    vin: &[RawVin],
    vout: &[RawVout],
    in_block: &mut HashMap<CoinIdentifier, CoinFact>,
    external: &HashMap<CoinIdentifier, CoinFact>,
    externally_referenced: &mut Vec<CoinIdentifier>,
) -> Result<Vec<Operation>, NormalizeError> {
    let mut ops = Vec::with_capacity(vin.len() + vout.len());
    let mut op_index: u64 = 0;
    let is_coinbase = vin.first().map(RawVin::is_coinbase).unwrap_or(false);

    if is_coinbase {
        ops.push(Operation {
            operation_index: op_index,
            network_index: Some(0),
            operation_type: OperationType::Coinbase,
            status: OperationStatus::Success,
            account: None,
            amount: None,
            coin_change: None,
            metadata: OperationMetadata::default(),
        });
        op_index += 1;
    } else {
        for (i, input) in vin.iter().enumerate() {
            let prev_txid = input
                .txid
                .as_deref()
                .ok_or(NormalizeError::Malformed("input missing txid"))?;
            let prev_vout = input
                .vout
                .ok_or(NormalizeError::Malformed("input missing vout"))?;
            let coin_id = CoinIdentifier::new(parse_hash(prev_txid)?, prev_vout);
            let (address, amount) =
                resolve_input(&coin_id, in_block, external, externally_referenced)?;

            ops.push(Operation {
                operation_index: op_index,
                network_index: Some(i as u64),
                operation_type: OperationType::Input,
                status: OperationStatus::Success,
                account: Some(AccountIdentifier::new(address)),
                amount: Some(Amount::zatoshi(-amount)),
                coin_change: Some(CoinChange {
                    action: CoinAction::Spent,
                    coin_identifier: coin_id,
                }),
                metadata: OperationMetadata::default(),
            });
            op_index += 1;
        }
    }

    for (j, output) in vout.iter().enumerate() {
        let coin_id = CoinIdentifier::new(tx_hash, output.n);
        let script_hex = output.script_pub_key.hex.clone();

        let (account, coin_change, amount) = if output.script_pub_key.kind == "nulldata" {
            (None, None, Amount::zatoshi(0))
        } else {
            let amount = Amount::from_coin_decimal(output.value)
                .map_err(rosetta_zen_chain::Error::from)?;
            match resolve_output_address(output) {
                None => (None, None, amount),
                Some(address) => {
                    let coinbase_locked = is_coinbase || output.backward_transfer;
                    let account = if coinbase_locked {
                        AccountIdentifier::coinbase(address.clone())
                    } else {
                        AccountIdentifier::new(address.clone())
                    };
                    in_block.insert(coin_id.clone(), (address, amount.0));
                    (
                        Some(account),
                        Some(CoinChange {
                            action: CoinAction::Created,
                            coin_identifier: coin_id.clone(),
                        }),
                        amount,
                    )
                }
            }
        };

        ops.push(Operation {
            operation_index: op_index,
            network_index: Some(j as u64),
            operation_type: OperationType::Output,
            status: OperationStatus::Success,
            account,
            amount: Some(amount),
            coin_change,
            metadata: OperationMetadata {
                script_pub_key_hex: Some(script_hex),
            },
        });
        op_index += 1;
    }

    Ok(ops)
}

/// Normalizes a raw node block (§4.B). `coin_lookup` must carry a fact for
/// every coin spent by a non-coinbase input in the block that wasn't
/// created earlier in the same block. Returns the normalized block plus
/// the coin-ids it actually drew from `coin_lookup`, so the caller knows
/// what it consumed from its prefetch cache or committed store.
pub fn normalize_block(
    raw: &RawBlock,
    coin_lookup: &HashMap<CoinIdentifier, CoinFact>,
) -> Result<(Block, Vec<CoinIdentifier>), NormalizeError> {
    let mut in_block_coins: HashMap<CoinIdentifier, CoinFact> = HashMap::new();
    let mut externally_referenced = Vec::new();
    let mut transactions = Vec::with_capacity(raw.tx.len() + raw.cert.len());

    for tx in &raw.tx {
        let tx_hash = parse_hash(&tx.txid)?;
        let operations = normalize_operations(
            tx_hash,
            &tx.vin,
            &tx.vout,
            &mut in_block_coins,
            coin_lookup,
            &mut externally_referenced,
        )?;
        transactions.push(Transaction {
            transaction_identifier: tx_hash,
            operations,
            metadata: TransactionMetadata {
                size: tx.size,
                version: tx.version,
                vsize: None,
                locktime: tx.locktime,
            },
        });
    }

    for cert in &raw.cert {
        let cert_hash = parse_hash(&cert.cert_id)?;
        let operations = normalize_operations(
            cert_hash,
            &cert.vin,
            &cert.vout,
            &mut in_block_coins,
            coin_lookup,
            &mut externally_referenced,
        )?;
        transactions.push(Transaction {
            transaction_identifier: cert_hash,
            operations,
            metadata: TransactionMetadata {
                size: cert.size,
                version: cert.version,
                vsize: None,
                locktime: 0,
            },
        });
    }

    let hash = parse_hash(&raw.hash)?;
    let index = Height(raw.height);
    let parent_index = index.previous().unwrap_or(index);
    let parent_hash = match &raw.previousblockhash {
        Some(h) => parse_hash(h)?,
        None => Hash::zero(),
    };

    let block = Block {
        block_identifier: BlockIdentifier { hash, index },
        parent_block_identifier: BlockIdentifier {
            hash: parent_hash,
            index: parent_index,
        },
        timestamp_ms: raw.time * 1000,
        metadata: BlockMetadata {
            size: raw.size,
            version: raw.version,
            merkle_root: parse_hash(&raw.merkleroot)?,
            nonce: raw.nonce.clone(),
            bits: raw.bits.clone(),
            difficulty: raw.difficulty,
        },
        transactions,
    };

    Ok((block, externally_referenced))
}


#[cfg(test)]
mod prop {
    use std::collections::HashMap;

    use proptest::prelude::*;

    use rosetta_zen_rpc::types::{RawBlock, RawTransaction, RawVin, RawVout, ScriptPubKey};

    use super::normalize_block;
    use rosetta_zen_chain::model::OperationType;

    fn coinbase_vin() -> RawVin {
        RawVin {
            coinbase: Some("03deadbeef".to_string()),
            txid: None,
            vout: None,
            sequence: 0,
        }
    }

    fn to_hex(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn address_strategy() -> impl Strategy<Value = String> {
        any::<[u8; 16]>().prop_map(|bytes| format!("z{}", to_hex(&bytes)))
    }

    fn vout_values_strategy() -> impl Strategy<Value = Vec<(i64, String)>> {
        proptest::collection::vec((1i64..1_000_000_000i64, address_strategy()), 1..6)
    }

    fn block_strategy() -> impl Strategy<Value = RawBlock> {
        (vout_values_strategy(), any::<[u8; 32]>(), any::<[u8; 32]>(), any::<[u8; 32]>()).prop_map(
            |(values, hash, merkle, txid)| {
                let vout: Vec<RawVout> = values
                    .into_iter()
                    .enumerate()
                    .map(|(n, (zatoshi, address))| RawVout {
                        value: rust_decimal::Decimal::new(zatoshi, 8),
                        n: n as u32,
                        script_pub_key: ScriptPubKey {
                            asm: String::new(),
                            hex: format!("hex-{n}"),
                            req_sigs: None,
                            kind: "pubkeyhash".to_string(),
                            addresses: vec![address],
                        },
                        backward_transfer: false,
                    })
                    .collect();

                RawBlock {
                    hash: to_hex(&hash),
                    confirmations: 1,
                    size: 250,
                    height: 1,
                    version: 4,
                    merkleroot: to_hex(&merkle),
                    tx: vec![RawTransaction {
                        txid: to_hex(&txid),
                        hex: String::new(),
                        version: 1,
                        size: 250,
                        vsize: None,
                        locktime: 0,
                        vin: vec![coinbase_vin()],
                        vout,
                    }],
                    cert: vec![],
                    time: 1_600_000_000,
                    nonce: "0".to_string(),
                    bits: "1d00ffff".to_string(),
                    difficulty: 1.0,
                    previousblockhash: None,
                    nextblockhash: None,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn coinbase_only_blocks_always_normalize(raw in block_strategy()) {
            let (block, externally_referenced) = normalize_block(&raw, &HashMap::new()).unwrap();
            prop_assert!(externally_referenced.is_empty());

            let ops = &block.transactions[0].operations;
            prop_assert_eq!(ops.len(), raw.tx[0].vout.len() + 1);
            prop_assert_eq!(ops[0].operation_type, OperationType::Coinbase);

            for (op, vout) in ops[1..].iter().zip(&raw.tx[0].vout) {
                prop_assert_eq!(op.operation_type, OperationType::Output);
                let expected: i64 = {
                    use rust_decimal::prelude::ToPrimitive;
                    (vout.value * rust_decimal::Decimal::new(100_000_000, 0)).round().to_i64().unwrap()
                };
                prop_assert_eq!(op.amount.unwrap().0, expected);
                prop_assert!(op.account.as_ref().unwrap().sub_account.is_some());
            }
        }
    }
}
