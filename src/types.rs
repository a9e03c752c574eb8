//! Core types used throughout the oracle
//!
//! Token pairs, safety levels, request masks and price responses.

use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered token pair, always stored as `token0 < token1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenPair {
    pub token0: Address,
    pub token1: Address,
}

impl TokenPair {
    /// Canonicalize two token addresses by sorting them
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            Self { token0: a, token1: b }
        } else {
            Self { token0: b, token1: a }
        }
    }

    /// True when either side is the zero address
    pub fn has_zero(&self) -> bool {
        self.token0.is_zero() || self.token1.is_zero()
    }
}

impl fmt::Display for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}/{:#x}", self.token0, self.token1)
    }
}

/// Confidence tier of a reported price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SafetyLevel {
    /// Instantaneous pool price, no averaging
    Spot = 1,
    /// Average over `LOW_OBS` observations
    Low = 2,
    /// Average over `MID_OBS` observations
    Mid = 3,
    /// Average over `HIGH_OBS` observations
    High = 4,
    /// Reserved, never produced
    Reserved = 5,
}

impl SafetyLevel {
    pub const ALL: [SafetyLevel; 5] = [
        SafetyLevel::Spot,
        SafetyLevel::Low,
        SafetyLevel::Mid,
        SafetyLevel::High,
        SafetyLevel::Reserved,
    ];

    /// Numeric safety index (1..=5); also the bit position in a request mask
    pub fn index(&self) -> u8 {
        *self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.index() == index)
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyLevel::Spot => write!(f, "SPOT"),
            SafetyLevel::Low => write!(f, "LOW"),
            SafetyLevel::Mid => write!(f, "MID"),
            SafetyLevel::High => write!(f, "HIGH"),
            SafetyLevel::Reserved => write!(f, "RESERVED"),
        }
    }
}

/// Set of requested safety levels.
///
/// Bit `i` of the raw mask requests the level with index `i`; bit 0 and bits
/// above 5 carry no meaning and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SafetyMask {
    levels: [bool; 5],
}

impl SafetyMask {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_bits(bits: u64) -> Self {
        let mut mask = Self::empty();
        for level in SafetyLevel::ALL {
            if (bits >> level.index()) & 1 == 1 {
                mask.insert(level);
            }
        }
        mask
    }

    pub fn insert(&mut self, level: SafetyLevel) {
        self.levels[usize::from(level.index() - 1)] = true;
    }

    pub fn contains(&self, level: SafetyLevel) -> bool {
        self.levels[usize::from(level.index() - 1)]
    }

    pub fn is_empty(&self) -> bool {
        !self.levels.iter().any(|set| *set)
    }

    /// Requested levels in ascending order
    pub fn iter(&self) -> impl Iterator<Item = SafetyLevel> + '_ {
        SafetyLevel::ALL.into_iter().filter(move |l| self.contains(*l))
    }

    /// Raw mask with only meaningful bits set
    pub fn bits(&self) -> u64 {
        self.iter().fold(0u64, |acc, l| acc | (1u64 << l.index()))
    }
}

impl From<u64> for SafetyMask {
    fn from(bits: u64) -> Self {
        SafetyMask::from_bits(bits)
    }
}

impl From<U256> for SafetyMask {
    fn from(bits: U256) -> Self {
        // only bits 1..=5 matter
        SafetyMask::from_bits(bits.low_u64())
    }
}

/// Prices and their safety indices, ascending by index
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceResponse {
    pub prices_x96: Vec<U256>,
    pub safety_indices: Vec<u8>,
}

impl PriceResponse {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, price_x96: U256, level: SafetyLevel) {
        debug_assert!(
            self.safety_indices.last().map_or(true, |last| *last < level.index()),
            "safety indices must be strictly ascending"
        );
        self.prices_x96.push(price_x96);
        self.safety_indices.push(level.index());
    }

    pub fn len(&self) -> usize {
        self.prices_x96.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices_x96.is_empty()
    }

    /// Price reported for a level, if it was produced
    pub fn price_for(&self, level: SafetyLevel) -> Option<U256> {
        self.safety_indices
            .iter()
            .position(|i| *i == level.index())
            .map(|pos| self.prices_x96[pos])
    }
}
