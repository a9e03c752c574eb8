//! Configuration types and re-exports

pub use super::{
    AppConfig, GovernanceConfig, LoggingConfig, OracleConfig, PoolsConfig, RpcConfig,
};
