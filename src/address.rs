//! Address validation and reverse-record key derivation.

use crate::error::ValidationError;
use ethers::types::{Address, H256};
use ethers::utils::keccak256;
use once_cell::sync::Lazy;

/// Suffix of the reverse-resolution namespace.
pub const REVERSE_SUFFIX: &str = "addr.reverse";

static REVERSE_PARENT: Lazy<H256> = Lazy::new(|| namehash(REVERSE_SUFFIX));

/// Parse a user supplied address. Only the strict `0x` + 40 hex digits form is accepted
/// (no checksum enforcement, no missing prefix, no surrounding whitespace).
pub fn parse_address(input: &str) -> Result<Address, ValidationError> {
    let reject = || ValidationError::MalformedAddress(input.to_string());

    let digits = input.strip_prefix("0x").ok_or_else(reject)?;
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(reject());
    }
    digits.parse::<Address>().map_err(|_| reject())
}

/// Recursive keccak-256 namehash. The empty name hashes to 32 zero bytes.
pub fn namehash(name: &str) -> H256 {
    if name.is_empty() {
        return H256::zero();
    }
    name.rsplit('.').fold(H256::zero(), |node, label| child_node(node, label))
}

fn child_node(parent: H256, label: &str) -> H256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(parent.as_bytes());
    buf[32..].copy_from_slice(&keccak256(label.as_bytes()));
    H256::from(keccak256(buf))
}

/// Reverse-record node for `address`: namehash of `<lowercase hex>.addr.reverse`.
pub fn reverse_node(address: &Address) -> H256 {
    child_node(*REVERSE_PARENT, &hex::encode(address.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_accepts_mixed_case() {
        let addr = parse_address("0x5DB91E24bd32059584bbdb831a901f1199f3d459").unwrap();
        assert_eq!(
            format!("{:?}", addr),
            "0x5db91e24bd32059584bbdb831a901f1199f3d459"
        );
    }

    #[test]
    fn test_parse_address_rejects_malformed_input() {
        for bad in [
            "not-an-address",
            "",
            "0x",
            "5db91e24bd32059584bbdb831a901f1199f3d459",
            "0x5db91e24bd32059584bbdb831a901f1199f3d45",
            "0x5db91e24bd32059584bbdb831a901f1199f3d4590",
            "0x5db91e24bd32059584bbdb831a901f1199f3d45g",
            " 0x5db91e24bd32059584bbdb831a901f1199f3d459",
        ] {
            assert!(parse_address(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_namehash_known_vectors() {
        assert_eq!(namehash(""), H256::zero());
        assert_eq!(
            format!("{:?}", namehash("eth")),
            "0x93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae"
        );
        assert_eq!(
            format!("{:?}", namehash("addr.reverse")),
            "0x91d1777781884d03a6757a803996e38de2a42967fb37eeaca72729271025a9e2"
        );
    }

    #[test]
    fn test_reverse_node_ignores_input_case() {
        let lower = parse_address("0x5db91e24bd32059584bbdb831a901f1199f3d459").unwrap();
        let upper = parse_address("0x5DB91E24BD32059584BBDB831A901F1199F3D459").unwrap();
        assert_eq!(reverse_node(&lower), reverse_node(&upper));
        assert_eq!(
            reverse_node(&lower),
            namehash("5db91e24bd32059584bbdb831a901f1199f3d459.addr.reverse")
        );
    }
}
