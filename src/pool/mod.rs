//! Pool state sources
//!
//! Read-only views over the external price-source pools the oracles consume.
//! The oracles never mutate pool state; they only call these traits.

mod memory;
pub mod onchain;
mod ring_buffer;

pub use memory::{InMemoryV2Pair, InMemoryV3Pool};
pub use onchain::{OnchainV2Pair, OnchainV3Pool};
pub use ring_buffer::ObservationRing;

use anyhow::Result;
use async_trait::async_trait;
use ethers::types::{Address, U256};
use serde::Serialize;

/// Current state word of a V3 pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Slot0 {
    /// Current sqrt price, Q64.96
    pub sqrt_price_x96: U256,
    /// Current tick
    pub tick: i32,
    /// Index of the most recently written observation
    pub observation_index: u16,
    /// Number of populated observation slots
    pub observation_cardinality: u16,
}

/// One slot of the observation ring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Observation {
    pub block_timestamp: u32,
    /// Tick accumulated over time since pool initialization
    pub tick_cumulative: i64,
    pub initialized: bool,
}

/// Reserves of a constant-product pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Reserves {
    pub reserve0: U256,
    pub reserve1: U256,
    pub block_timestamp_last: u32,
}

/// Identity shared by every pool kind
#[async_trait]
pub trait PoolTokens: Send + Sync {
    /// Pool contract address
    fn address(&self) -> Address;

    async fn token0(&self) -> Result<Address>;

    async fn token1(&self) -> Result<Address>;
}

/// Concentrated-liquidity pool with a tick observation ring
#[async_trait]
pub trait UniV3PoolState: PoolTokens {
    async fn slot0(&self) -> Result<Slot0>;

    async fn observation(&self, index: u16) -> Result<Observation>;
}

/// Constant-product pair
#[async_trait]
pub trait UniV2PairState: PoolTokens {
    async fn reserves(&self) -> Result<Reserves>;
}
