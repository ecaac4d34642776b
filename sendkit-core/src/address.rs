//! Destination address classification.

use bitcoin::{address::NetworkUnchecked, Address, Network};

use crate::draft::AddressType;
use crate::error::{Error, Result};

/// Classify an address string into its script kind and network.
///
/// Only the three spendable kinds the engine knows are accepted; anything
/// else (P2WSH, P2TR, future witness versions) is an error rather than a
/// guess.
pub fn classify_address(address: &str) -> Result<(AddressType, Network)> {
    let parsed = address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| Error::Address(e.to_string()))?;

    let network = [
        Network::Bitcoin,
        Network::Testnet,
        Network::Signet,
        Network::Regtest,
    ]
    .into_iter()
    .find(|network| parsed.is_valid_for_network(*network))
    .ok_or_else(|| Error::WrongNetwork(address.to_string()))?;

    let kind = match parsed.clone().assume_checked().address_type() {
        Some(bitcoin::AddressType::P2pkh) => AddressType::Legacy,
        Some(bitcoin::AddressType::P2sh) => AddressType::NestedSegwit,
        Some(bitcoin::AddressType::P2wpkh) => AddressType::NativeSegwit,
        _ => return Err(Error::UnknownAddressType(address.to_string())),
    };

    Ok((kind, network))
}

/// Parse an address and check it belongs to `network`.
pub(crate) fn require_network(address: &str, network: Network) -> Result<Address> {
    address
        .parse::<Address<NetworkUnchecked>>()
        .map_err(|e| Error::Address(e.to_string()))?
        .require_network(network)
        .map_err(|_| Error::WrongNetwork(address.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_the_three_known_kinds() {
        let cases = [
            (
                "1BvBMSEYstWetqTFn5Au4m4GFg7xJaNVN2",
                AddressType::Legacy,
                Network::Bitcoin,
            ),
            (
                "3P14159f73E4gFr7JterCCQh9QjiTjiZrG",
                AddressType::NestedSegwit,
                Network::Bitcoin,
            ),
            (
                "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
                AddressType::NativeSegwit,
                Network::Bitcoin,
            ),
        ];
        for (address, kind, network) in cases {
            let (got_kind, got_network) = classify_address(address).unwrap();
            assert_eq!(got_kind, kind);
            assert_eq!(got_network, network);
        }
    }

    #[test]
    fn testnet_bech32_is_not_mainnet() {
        let (kind, network) =
            classify_address("tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx").unwrap();
        assert_eq!(kind, AddressType::NativeSegwit);
        assert_ne!(network, Network::Bitcoin);
    }

    #[test]
    fn taproot_is_unknown() {
        let err = classify_address(
            "bc1p5d7rjq7g6rdk2yhzks9smlaqtedr4dekq08ge8ztwac72sfr9rusxg3297",
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownAddressType(_)));
    }

    #[test]
    fn garbage_is_an_address_error() {
        assert!(matches!(
            classify_address("clearly not an address"),
            Err(Error::Address(_))
        ));
    }
}
