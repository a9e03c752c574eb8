//! JSON-RPC backed pools
//!
//! Reads pool state from deployed Uniswap contracts through an `ethers`
//! HTTP provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ethers::providers::{Http, Provider};
use ethers::types::{Address, U256};
use std::sync::Arc;

use super::{Observation, PoolTokens, Reserves, Slot0, UniV2PairState, UniV3PoolState};

mod v3_bindings {
    use ethers::contract::abigen;

    abigen!(
        IUniswapV3Pool,
        r#"[
            function token0() external view returns (address)
            function token1() external view returns (address)
            function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
            function observations(uint256 index) external view returns (uint32 blockTimestamp, int56 tickCumulative, uint160 secondsPerLiquidityCumulativeX128, bool initialized)
        ]"#
    );
}

mod v2_bindings {
    use ethers::contract::abigen;

    abigen!(
        IUniswapV2Pair,
        r#"[
            function token0() external view returns (address)
            function token1() external view returns (address)
            function getReserves() external view returns (uint112 reserve0, uint112 reserve1, uint32 blockTimestampLast)
        ]"#
    );
}

use v2_bindings::IUniswapV2Pair;
use v3_bindings::IUniswapV3Pool;

/// Builds an HTTP provider for `url`
pub fn http_provider(url: &str) -> Result<Arc<Provider<Http>>> {
    let provider =
        Provider::<Http>::try_from(url).with_context(|| format!("Invalid RPC url '{}'", url))?;
    Ok(Arc::new(provider))
}

pub struct OnchainV3Pool {
    address: Address,
    contract: IUniswapV3Pool<Provider<Http>>,
}

impl OnchainV3Pool {
    pub fn new(address: Address, client: Arc<Provider<Http>>) -> Self {
        Self {
            address,
            contract: IUniswapV3Pool::new(address, client),
        }
    }
}

#[async_trait]
impl PoolTokens for OnchainV3Pool {
    fn address(&self) -> Address {
        self.address
    }

    async fn token0(&self) -> Result<Address> {
        self.contract
            .token_0()
            .call()
            .await
            .with_context(|| format!("token0() failed for pool {:#x}", self.address))
    }

    async fn token1(&self) -> Result<Address> {
        self.contract
            .token_1()
            .call()
            .await
            .with_context(|| format!("token1() failed for pool {:#x}", self.address))
    }
}

#[async_trait]
impl UniV3PoolState for OnchainV3Pool {
    async fn slot0(&self) -> Result<Slot0> {
        let (sqrt_price_x96, tick, observation_index, observation_cardinality, _, _, _) = self
            .contract
            .slot_0()
            .call()
            .await
            .with_context(|| format!("slot0() failed for pool {:#x}", self.address))?;

        Ok(Slot0 {
            sqrt_price_x96,
            tick,
            observation_index,
            observation_cardinality,
        })
    }

    async fn observation(&self, index: u16) -> Result<Observation> {
        let (block_timestamp, tick_cumulative, _, initialized) = self
            .contract
            .observations(U256::from(index))
            .call()
            .await
            .with_context(|| {
                format!(
                    "observations({}) failed for pool {:#x}",
                    index, self.address
                )
            })?;

        Ok(Observation {
            block_timestamp,
            tick_cumulative,
            initialized,
        })
    }
}

pub struct OnchainV2Pair {
    address: Address,
    contract: IUniswapV2Pair<Provider<Http>>,
}

impl OnchainV2Pair {
    pub fn new(address: Address, client: Arc<Provider<Http>>) -> Self {
        Self {
            address,
            contract: IUniswapV2Pair::new(address, client),
        }
    }
}

#[async_trait]
impl PoolTokens for OnchainV2Pair {
    fn address(&self) -> Address {
        self.address
    }

    async fn token0(&self) -> Result<Address> {
        self.contract
            .token_0()
            .call()
            .await
            .with_context(|| format!("token0() failed for pair {:#x}", self.address))
    }

    async fn token1(&self) -> Result<Address> {
        self.contract
            .token_1()
            .call()
            .await
            .with_context(|| format!("token1() failed for pair {:#x}", self.address))
    }
}

#[async_trait]
impl UniV2PairState for OnchainV2Pair {
    async fn reserves(&self) -> Result<Reserves> {
        let (reserve0, reserve1, block_timestamp_last) = self
            .contract
            .get_reserves()
            .call()
            .await
            .with_context(|| format!("getReserves() failed for pair {:#x}", self.address))?;

        Ok(Reserves {
            reserve0: U256::from(reserve0),
            reserve1: U256::from(reserve1),
            block_timestamp_last,
        })
    }
}
