//! In-process pools
//!
//! Keep pool state in memory with the same observation semantics as the
//! on-chain contracts. Used for simulation and tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ethers::types::{Address, U256};
use std::sync::RwLock;

use super::{
    Observation, ObservationRing, PoolTokens, Reserves, Slot0, UniV2PairState, UniV3PoolState,
};
use crate::math::get_sqrt_ratio_at_tick;
use crate::types::TokenPair;

#[derive(Debug)]
struct V3State {
    sqrt_price_x96: U256,
    tick: i32,
    ring: ObservationRing,
}

/// V3 pool whose price moves only through explicit `swap_to_tick` calls
#[derive(Debug)]
pub struct InMemoryV3Pool {
    address: Address,
    pair: TokenPair,
    state: RwLock<V3State>,
}

impl InMemoryV3Pool {
    /// Initializes the pool at `tick` with one observation at `timestamp`.
    /// `capacity` is the maximum number of observation slots.
    pub fn new(
        address: Address,
        token_a: Address,
        token_b: Address,
        tick: i32,
        timestamp: u32,
        capacity: u16,
    ) -> Result<Self> {
        let sqrt_price_x96 = get_sqrt_ratio_at_tick(tick)?;
        Ok(Self {
            address,
            pair: TokenPair::new(token_a, token_b),
            state: RwLock::new(V3State {
                sqrt_price_x96,
                tick,
                ring: ObservationRing::new(capacity, timestamp)?,
            }),
        })
    }

    pub fn tick(&self) -> i32 {
        self.read(|s| s.tick)
    }

    /// Raises the target number of observation slots
    pub fn increase_observation_cardinality_next(&self, next: u16) -> u16 {
        self.write_state(|s| s.ring.grow(next))
    }

    /// Moves the price to `tick` at `timestamp`, first recording the tick
    /// that held until now.
    pub fn swap_to_tick(&self, timestamp: u32, tick: i32) -> Result<()> {
        let sqrt_price_x96 = get_sqrt_ratio_at_tick(tick)?;
        self.write_state(|s| {
            s.ring.write(timestamp, s.tick)?;
            s.tick = tick;
            s.sqrt_price_x96 = sqrt_price_x96;
            Ok(())
        })
    }

    /// Records an observation without moving the price
    pub fn poke(&self, timestamp: u32) -> Result<()> {
        self.write_state(|s| s.ring.write(timestamp, s.tick).map(|_| ()))
    }

    fn read<T>(&self, f: impl FnOnce(&V3State) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|e| e.into_inner());
        f(&guard)
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut V3State) -> T) -> T {
        let mut guard = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl PoolTokens for InMemoryV3Pool {
    fn address(&self) -> Address {
        self.address
    }

    async fn token0(&self) -> Result<Address> {
        Ok(self.pair.token0)
    }

    async fn token1(&self) -> Result<Address> {
        Ok(self.pair.token1)
    }
}

#[async_trait]
impl UniV3PoolState for InMemoryV3Pool {
    async fn slot0(&self) -> Result<Slot0> {
        Ok(self.read(|s| Slot0 {
            sqrt_price_x96: s.sqrt_price_x96,
            tick: s.tick,
            observation_index: s.ring.index(),
            observation_cardinality: s.ring.cardinality(),
        }))
    }

    async fn observation(&self, index: u16) -> Result<Observation> {
        self.read(|s| s.ring.get(index)).ok_or_else(|| {
            anyhow!(
                "observation index {} out of range for pool {:#x}",
                index,
                self.address
            )
        })
    }
}

/// Constant-product pair with settable reserves
#[derive(Debug)]
pub struct InMemoryV2Pair {
    address: Address,
    pair: TokenPair,
    reserves: RwLock<Reserves>,
}

impl InMemoryV2Pair {
    pub fn new(address: Address, token_a: Address, token_b: Address) -> Self {
        Self {
            address,
            pair: TokenPair::new(token_a, token_b),
            reserves: RwLock::new(Reserves::default()),
        }
    }

    /// Reserves are given in canonical token order
    pub fn set_reserves(&self, reserve0: U256, reserve1: U256, timestamp: u32) {
        let mut guard = self.reserves.write().unwrap_or_else(|e| e.into_inner());
        *guard = Reserves {
            reserve0,
            reserve1,
            block_timestamp_last: timestamp,
        };
    }
}

#[async_trait]
impl PoolTokens for InMemoryV2Pair {
    fn address(&self) -> Address {
        self.address
    }

    async fn token0(&self) -> Result<Address> {
        Ok(self.pair.token0)
    }

    async fn token1(&self) -> Result<Address> {
        Ok(self.pair.token1)
    }
}

#[async_trait]
impl UniV2PairState for InMemoryV2Pair {
    async fn reserves(&self) -> Result<Reserves> {
        Ok(*self.reserves.read().unwrap_or_else(|e| e.into_inner()))
    }
}
