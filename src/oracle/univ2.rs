//! Uniswap V2 oracle
//!
//! Spot only: the reserve ratio of a constant-product pair. Every level other
//! than 1 is always omitted.

use async_trait::async_trait;
use ethers::types::Address;
use std::sync::Arc;
use tracing::debug;

use super::{InterfaceId, Oracle, PoolRegistry, PoolUpdate};
use crate::error::OracleError;
use crate::governance::AccessControl;
use crate::math::{mul_div, q96};
use crate::pool::UniV2PairState;
use crate::types::{PriceResponse, SafetyLevel, SafetyMask, TokenPair};

pub struct UniV2Oracle {
    factory: Address,
    governance: Arc<dyn AccessControl>,
    pairs: PoolRegistry<dyn UniV2PairState>,
}

impl UniV2Oracle {
    pub fn new(factory: Address, governance: Arc<dyn AccessControl>) -> Self {
        Self {
            factory,
            governance,
            pairs: PoolRegistry::new(),
        }
    }

    /// Registers pairs under their canonical token pair. Admin only.
    pub async fn add_pools(
        &self,
        caller: &Address,
        pairs: Vec<Arc<dyn UniV2PairState>>,
    ) -> Result<Vec<PoolUpdate>, OracleError> {
        self.governance.require_admin(caller)?;
        self.pairs.register(pairs).await
    }
}

#[async_trait]
impl Oracle for UniV2Oracle {
    fn contract_name(&self) -> &'static str {
        "UniV2Oracle"
    }

    fn factory(&self) -> Address {
        self.factory
    }

    async fn pools(&self) -> Vec<(TokenPair, Address)> {
        self.pairs.entries().await
    }

    fn supports_interface(&self, interface_id: InterfaceId) -> bool {
        interface_id == InterfaceId::univ2_oracle() || interface_id == InterfaceId::erc165()
    }

    async fn price(
        &self,
        token_a: Address,
        token_b: Address,
        mask: SafetyMask,
    ) -> Result<PriceResponse, OracleError> {
        let pair = TokenPair::new(token_a, token_b);
        let mut response = PriceResponse::empty();
        if !mask.contains(SafetyLevel::Spot) || pair.has_zero() {
            return Ok(response);
        }
        let Some(pool) = self.pairs.get(&pair).await else {
            debug!(pair = %pair, "no pair registered");
            return Ok(response);
        };

        let reserves = pool
            .reserves()
            .await
            .map_err(|e| OracleError::pool_read(pool.address(), e))?;
        if reserves.reserve0.is_zero() {
            debug!(pair = %pair, "pair has no reserves");
            return Ok(response);
        }

        let price_x96 = mul_div(reserves.reserve1, q96(), reserves.reserve0)?;
        response.push(price_x96, SafetyLevel::Spot);
        Ok(response)
    }
}
