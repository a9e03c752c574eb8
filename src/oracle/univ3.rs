//! Uniswap V3 oracle
//!
//! Level 1 reports the pool's current sqrt price. Levels 2-4 rebuild a
//! time-weighted average tick from two slots of the pool's observation ring,
//! `LOW_OBS`, `MID_OBS` or `HIGH_OBS` slots apart. Level 5 is reserved and
//! never produced. Every sqrt price is squared into an X96 price.

use async_trait::async_trait;
use ethers::types::{Address, U256};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{InterfaceId, Oracle, PoolRegistry, PoolUpdate};
use crate::error::OracleError;
use crate::governance::AccessControl;
use crate::math::{
    average_tick, get_sqrt_ratio_at_tick, price_x96_from_sqrt, MathError, TickRounding,
};
use crate::pool::{Slot0, UniV3PoolState};
use crate::types::{PriceResponse, SafetyLevel, SafetyMask, TokenPair};

/// Window sizes and rounding, fixed for the life of an oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OracleParams {
    pub low_obs: u16,
    pub mid_obs: u16,
    pub high_obs: u16,
    #[serde(default)]
    pub tick_rounding: TickRounding,
}

impl Default for OracleParams {
    fn default() -> Self {
        Self {
            low_obs: 10,
            mid_obs: 30,
            high_obs: 100,
            tick_rounding: TickRounding::Floor,
        }
    }
}

impl OracleParams {
    pub fn validate(&self) -> Result<(), OracleError> {
        if self.low_obs < 2 {
            return Err(OracleError::InvalidParams(format!(
                "LOW_OBS must be at least 2, got {}",
                self.low_obs
            )));
        }
        if !(self.low_obs < self.mid_obs && self.mid_obs < self.high_obs) {
            return Err(OracleError::InvalidParams(format!(
                "windows must be strictly ascending, got {}/{}/{}",
                self.low_obs, self.mid_obs, self.high_obs
            )));
        }
        Ok(())
    }

    /// Observation window backing a level; `None` for spot and reserved
    pub fn window(&self, level: SafetyLevel) -> Option<u16> {
        match level {
            SafetyLevel::Low => Some(self.low_obs),
            SafetyLevel::Mid => Some(self.mid_obs),
            SafetyLevel::High => Some(self.high_obs),
            SafetyLevel::Spot | SafetyLevel::Reserved => None,
        }
    }
}

pub struct UniV3Oracle {
    factory: Address,
    params: OracleParams,
    governance: Arc<dyn AccessControl>,
    pools: PoolRegistry<dyn UniV3PoolState>,
}

impl UniV3Oracle {
    pub fn new(
        factory: Address,
        params: OracleParams,
        governance: Arc<dyn AccessControl>,
    ) -> Result<Self, OracleError> {
        params.validate()?;
        Ok(Self {
            factory,
            params,
            governance,
            pools: PoolRegistry::new(),
        })
    }

    pub fn params(&self) -> &OracleParams {
        &self.params
    }

    /// Registers pools under their canonical token pair. Admin only.
    pub async fn add_pools(
        &self,
        caller: &Address,
        pools: Vec<Arc<dyn UniV3PoolState>>,
    ) -> Result<Vec<PoolUpdate>, OracleError> {
        self.governance.require_admin(caller)?;
        self.pools.register(pools).await
    }

    /// Pool registered for the pair, in either token order
    pub async fn pool_for(&self, token_a: Address, token_b: Address) -> Option<Arc<dyn UniV3PoolState>> {
        self.pools.get(&TokenPair::new(token_a, token_b)).await
    }

    /// Sqrt price averaged over `window` observation slots, or `None` when
    /// the ring cannot support the window.
    async fn average_sqrt_price(
        &self,
        pool: &dyn UniV3PoolState,
        slot0: &Slot0,
        window: u16,
    ) -> Result<Option<U256>, OracleError> {
        let cardinality = u32::from(slot0.observation_cardinality);
        if cardinality == 0 || cardinality < u32::from(window) {
            return Ok(None);
        }
        let index = u32::from(slot0.observation_index);
        // both results are < cardinality <= u16::MAX
        let latest_slot = ((index + cardinality - 1) % cardinality) as u16;
        let earliest_slot = ((index + cardinality - u32::from(window)) % cardinality) as u16;

        let address = pool.address();
        let latest = pool
            .observation(latest_slot)
            .await
            .map_err(|e| OracleError::pool_read(address, e))?;
        let earliest = pool
            .observation(earliest_slot)
            .await
            .map_err(|e| OracleError::pool_read(address, e))?;

        if !latest.initialized || !earliest.initialized {
            trace!(pool = ?address, window, "window reaches an unwritten slot");
            return Ok(None);
        }

        // timestamps wrap modulo 2^32. When the window spans the whole ring the
        // earliest slot holds the newest observation and the span runs backwards.
        let timespan = if earliest_slot == slot0.observation_index {
            -i64::from(earliest.block_timestamp.wrapping_sub(latest.block_timestamp))
        } else {
            i64::from(latest.block_timestamp.wrapping_sub(earliest.block_timestamp))
        };
        if timespan == 0 {
            trace!(pool = ?address, window, "window spans no time");
            return Ok(None);
        }

        let Some(delta) = latest.tick_cumulative.checked_sub(earliest.tick_cumulative) else {
            trace!(pool = ?address, window, "tick cumulative delta overflows");
            return Ok(None);
        };
        let tick = match average_tick(delta, timespan, self.params.tick_rounding) {
            Ok(tick) => tick,
            Err(MathError::TickOutOfRange(_) | MathError::Overflow) => {
                trace!(pool = ?address, window, delta, timespan, "average tick out of range");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(get_sqrt_ratio_at_tick(tick)?))
    }
}

#[async_trait]
impl Oracle for UniV3Oracle {
    fn contract_name(&self) -> &'static str {
        "UniV3Oracle"
    }

    fn factory(&self) -> Address {
        self.factory
    }

    async fn pools(&self) -> Vec<(TokenPair, Address)> {
        self.pools.entries().await
    }

    fn supports_interface(&self, interface_id: InterfaceId) -> bool {
        interface_id == InterfaceId::univ3_oracle() || interface_id == InterfaceId::erc165()
    }

    async fn price(
        &self,
        token_a: Address,
        token_b: Address,
        mask: SafetyMask,
    ) -> Result<PriceResponse, OracleError> {
        let pair = TokenPair::new(token_a, token_b);
        let mut response = PriceResponse::empty();
        if pair.has_zero() || mask.is_empty() {
            return Ok(response);
        }
        let Some(pool) = self.pools.get(&pair).await else {
            debug!(pair = %pair, "no pool registered");
            return Ok(response);
        };

        let slot0 = pool
            .slot0()
            .await
            .map_err(|e| OracleError::pool_read(pool.address(), e))?;

        for level in mask.iter() {
            let sqrt_price_x96 = match (level, self.params.window(level)) {
                (SafetyLevel::Spot, _) => Some(slot0.sqrt_price_x96),
                (_, Some(window)) => self.average_sqrt_price(pool.as_ref(), &slot0, window).await?,
                (_, None) => None,
            };
            match sqrt_price_x96 {
                Some(sqrt) => response.push(price_x96_from_sqrt(sqrt)?, level),
                None => trace!(pair = %pair, safety_index = level.index(), "level unavailable"),
            }
        }

        debug!(
            pair = %pair,
            mask = mask.bits(),
            levels = ?response.safety_indices,
            "price resolved"
        );
        Ok(response)
    }
}
