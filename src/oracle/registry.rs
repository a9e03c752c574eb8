//! Pool registry keyed by canonical token pair

use ethers::types::Address;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::OracleError;
use crate::pool::PoolTokens;
use crate::types::TokenPair;

/// Outcome of registering one pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolUpdate {
    Added {
        pair: TokenPair,
        pool: Address,
    },
    /// The pair already pointed at a different pool
    Replaced {
        pair: TokenPair,
        previous: Address,
        pool: Address,
    },
    /// Same pool under the same pair, nothing changed
    Unchanged {
        pair: TokenPair,
        pool: Address,
    },
}

impl PoolUpdate {
    pub fn pair(&self) -> TokenPair {
        match self {
            PoolUpdate::Added { pair, .. }
            | PoolUpdate::Replaced { pair, .. }
            | PoolUpdate::Unchanged { pair, .. } => *pair,
        }
    }

    pub fn is_change(&self) -> bool {
        !matches!(self, PoolUpdate::Unchanged { .. })
    }
}

/// Maps each canonical pair to at most one pool.
///
/// Readers clone the pool handle out of the map and drop the lock before any
/// pool I/O, so registrations never wait on in-flight price reads.
pub struct PoolRegistry<P: ?Sized> {
    index: RwLock<HashMap<TokenPair, Arc<P>>>,
}

impl<P: PoolTokens + ?Sized> PoolRegistry<P> {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, pair: &TokenPair) -> Option<Arc<P>> {
        self.index.read().await.get(pair).cloned()
    }

    /// Registered `(pair, pool address)` entries, ordered by pair
    pub async fn entries(&self) -> Vec<(TokenPair, Address)> {
        let index = self.index.read().await;
        let mut entries: Vec<_> = index
            .iter()
            .map(|(pair, pool)| (*pair, pool.address()))
            .collect();
        entries.sort();
        entries
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    /// Registers a batch of pools.
    ///
    /// Token reads happen before the write lock is taken; if any of them
    /// fails, or any pool is invalid, nothing in the batch is applied.
    pub async fn register(&self, pools: Vec<Arc<P>>) -> Result<Vec<PoolUpdate>, OracleError> {
        let mut resolved = Vec::with_capacity(pools.len());
        for pool in pools {
            let address = pool.address();
            if address.is_zero() {
                return Err(OracleError::InvalidPool {
                    pool: address,
                    reason: "zero address".to_string(),
                });
            }
            let token0 = pool
                .token0()
                .await
                .map_err(|e| OracleError::pool_read(address, e))?;
            let token1 = pool
                .token1()
                .await
                .map_err(|e| OracleError::pool_read(address, e))?;
            if token0 == token1 {
                return Err(OracleError::InvalidPool {
                    pool: address,
                    reason: "token0 equals token1".to_string(),
                });
            }
            resolved.push((TokenPair::new(token0, token1), pool));
        }

        let mut index = self.index.write().await;
        let mut updates = Vec::with_capacity(resolved.len());
        for (pair, pool) in resolved {
            let address = pool.address();
            let update = match index.get(&pair).map(|p| p.address()) {
                Some(existing) if existing == address => PoolUpdate::Unchanged {
                    pair,
                    pool: address,
                },
                Some(previous) => {
                    index.insert(pair, pool);
                    PoolUpdate::Replaced {
                        pair,
                        previous,
                        pool: address,
                    }
                }
                None => {
                    index.insert(pair, pool);
                    PoolUpdate::Added {
                        pair,
                        pool: address,
                    }
                }
            };

            if update.is_change() {
                info!(pair = %pair, pool = ?address, "pool registered");
            } else {
                debug!(pair = %pair, pool = ?address, "pool already registered");
            }
            updates.push(update);
        }
        Ok(updates)
    }
}

impl<P: PoolTokens + ?Sized> Default for PoolRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
