//! Oracle module - Safety-indexed pool prices
//!
//! Each oracle answers `price(token_a, token_b, mask)` with one X96 price per
//! requested and satisfiable safety level, ascending by level.

mod interface;
mod registry;
mod univ2;
mod univ3;

pub use interface::InterfaceId;
pub use registry::{PoolRegistry, PoolUpdate};
pub use univ2::UniV2Oracle;
pub use univ3::{OracleParams, UniV3Oracle};

use async_trait::async_trait;
use ethers::types::Address;

use crate::error::OracleError;
use crate::types::{PriceResponse, SafetyMask, TokenPair};

pub const CONTRACT_VERSION: &str = "1.0.0";

/// Common surface of every price oracle
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Name the oracle reports for itself
    fn contract_name(&self) -> &'static str;

    fn contract_version(&self) -> &'static str {
        CONTRACT_VERSION
    }

    /// Address of the pool factory the oracle's pools come from
    fn factory(&self) -> Address;

    /// Registered pools, sorted by token pair
    async fn pools(&self) -> Vec<(TokenPair, Address)>;

    /// ERC-165 style interface introspection
    fn supports_interface(&self, interface_id: InterfaceId) -> bool;

    /// Prices for the pair at every requested and satisfiable safety level.
    ///
    /// Token order does not matter. Missing pools and unsatisfiable levels
    /// are omitted rather than reported as errors.
    async fn price(
        &self,
        token_a: Address,
        token_b: Address,
        mask: SafetyMask,
    ) -> Result<PriceResponse, OracleError>;
}
