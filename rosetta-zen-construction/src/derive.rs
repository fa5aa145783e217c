//! `Derive` (§4.G): public key → address.

use secp256k1::PublicKey;

use rosetta_zen_chain::transparent::Address;
use rosetta_zen_chain::Network;

use crate::error::ConstructionError;

pub fn derive_address(network: Network, public_key_bytes: &[u8]) -> Result<Address, ConstructionError> {
    let public_key = PublicKey::from_slice(public_key_bytes)?;
    Ok(Address::from_public_key(network, &public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_the_documented_testnet_address() {
        let public_key = hex::decode("03f892ec106c94bdead9f088797ec2bb6d0f46cc7f7e6a931a0fd76c52aee5d016").unwrap();
        let address = derive_address(Network::Testnet, &public_key).unwrap();
        assert_eq!(address.to_string(), "ztmfGwLDqR9bApbXi9Nzb4JuGbhS9Biwn4M");
    }
}
