//! ERC-165 interface identifiers
//!
//! An interface id is the XOR of the 4-byte selectors of the functions the
//! interface itself declares. Functions inherited from a parent interface,
//! such as `price` from the base oracle interface, are not part of the id.

use ethers::utils::id;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InterfaceId(pub [u8; 4]);

const ERC165_FUNCTIONS: &[&str] = &["supportsInterface(bytes4)"];

const UNIV3_ORACLE_FUNCTIONS: &[&str] = &[
    "factory()",
    "LOW_OBS()",
    "MID_OBS()",
    "HIGH_OBS()",
    "poolsIndex(address,address)",
    "addUniV3Pools(address[])",
];

const UNIV2_ORACLE_FUNCTIONS: &[&str] = &[
    "factory()",
    "addUniV2Pools(address[])",
];

impl InterfaceId {
    pub fn from_signatures(signatures: &[&str]) -> Self {
        let mut acc = [0u8; 4];
        for signature in signatures {
            let selector = id(*signature);
            for (a, s) in acc.iter_mut().zip(selector) {
                *a ^= s;
            }
        }
        InterfaceId(acc)
    }

    pub fn erc165() -> Self {
        Self::from_signatures(ERC165_FUNCTIONS)
    }

    pub fn univ3_oracle() -> Self {
        Self::from_signatures(UNIV3_ORACLE_FUNCTIONS)
    }

    pub fn univ2_oracle() -> Self {
        Self::from_signatures(UNIV2_ORACLE_FUNCTIONS)
    }

    /// Parses `0x`-prefixed or bare hex
    pub fn from_hex(s: &str) -> Option<Self> {
        let raw = hex::decode(s.trim_start_matches("0x")).ok()?;
        let bytes: [u8; 4] = raw.try_into().ok()?;
        Some(InterfaceId(bytes))
    }
}

impl fmt::Display for InterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
