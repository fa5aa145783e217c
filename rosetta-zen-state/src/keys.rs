//! Composite sled keys for the `c/` (coin) and `k/` (balance) trees, and
//! the big-endian height encoding used wherever keys must sort by height
//! (`b/`, `h/`, and the height suffix of `k/`).

use rosetta_zen_chain::model::CoinIdentifier;
use rosetta_zen_chain::Height;

pub fn height_key(height: Height) -> [u8; 8] {
    (height.value() as u64).to_be_bytes()
}

pub fn coin_id_key(coin_id: &CoinIdentifier) -> Vec<u8> {
    coin_id.to_string().into_bytes()
}

/// `address||coin-id`, used by the `c/` tree's by-address index so a
/// range scan over one address's prefix yields exactly its coins.
pub fn coin_by_address_key(address: &str, coin_id: &CoinIdentifier) -> Vec<u8> {
    let mut key = address.as_bytes().to_vec();
    key.push(0); // separator: addresses never contain NUL, coin-ids are "<hex>:<n>"
    key.extend_from_slice(coin_id.to_string().as_bytes());
    key
}

pub fn address_prefix(address: &str) -> Vec<u8> {
    let mut key = address.as_bytes().to_vec();
    key.push(0);
    key
}

/// `address||height` with the height encoded big-endian, so that a
/// reverse range scan up to `(address, height)` finds the most recent
/// balance point with `point.height <= height` (§4.E `BalanceAt`).
pub fn balance_point_key(address: &str, height: Height) -> Vec<u8> {
    let mut key = address.as_bytes().to_vec();
    key.push(0);
    key.extend_from_slice(&height_key(height));
    key
}
