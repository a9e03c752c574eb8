use ethers::types::Address;
use thiserror::Error;

use crate::governance::AuthorizationError;
use crate::math::MathError;

#[derive(Error, Debug)]
pub enum OracleError {
    #[error(transparent)]
    Unauthorized(#[from] AuthorizationError),

    #[error("invalid oracle parameters: {0}")]
    InvalidParams(String),

    #[error("invalid pool {pool:#x}: {reason}")]
    InvalidPool { pool: Address, reason: String },

    #[error("pool {pool:#x} read failed: {cause:#}")]
    PoolRead { pool: Address, cause: anyhow::Error },

    #[error(transparent)]
    Math(#[from] MathError),
}

impl OracleError {
    pub(crate) fn pool_read(pool: Address, cause: anyhow::Error) -> Self {
        OracleError::PoolRead { pool, cause }
    }
}
