//! TWAP Oracle Library
//!
//! Safety-indexed prices from Uniswap V3 observation rings and V2 reserves

pub mod config;
pub mod error;
pub mod governance;
pub mod logging;
pub mod math;
pub mod oracle;
pub mod pool;
pub mod types;

pub use error::OracleError;
pub use oracle::{Oracle, OracleParams, UniV2Oracle, UniV3Oracle};
pub use types::{PriceResponse, SafetyLevel, SafetyMask, TokenPair};
