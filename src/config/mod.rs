//! Configuration management for the oracle service
//!
//! Loads from optional TOML/YAML/JSON files + environment variables via .env

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use ethers::types::Address;
use serde::Deserialize;

use crate::math::TickRounding;
use crate::oracle::OracleParams;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub oracle: OracleConfig,
    pub governance: GovernanceConfig,
    pub rpc: RpcConfig,
    pub pools: PoolsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Observations backing safety level 2
    pub low_obs: u16,
    /// Observations backing safety level 3
    pub mid_obs: u16,
    /// Observations backing safety level 4
    pub high_obs: u16,
    /// Average tick rounding: "floor" or "truncate"
    pub tick_rounding: String,
    /// Uniswap V3 factory the pools belong to
    pub univ3_factory: String,
    /// Uniswap V2 factory the pairs belong to
    pub univ2_factory: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    /// Addresses allowed to register pools
    pub admins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint
    pub url: String,
    /// Expected chain ID (1 = mainnet)
    pub chain_id: u64,
    /// Per-query timeout in milliseconds
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolsConfig {
    /// V3 pools registered at startup
    pub univ3: Vec<String>,
    /// V2 pairs registered at startup
    pub univ2: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl AppConfig {
    /// Builder pre-populated with every default
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Oracle defaults
            .set_default("oracle.low_obs", 10)?
            .set_default("oracle.mid_obs", 30)?
            .set_default("oracle.high_obs", 100)?
            .set_default("oracle.tick_rounding", "floor")?
            .set_default(
                "oracle.univ3_factory",
                "0x1F98431c8aD98523631AE4a59f267346ea31F984",
            )?
            .set_default(
                "oracle.univ2_factory",
                "0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f",
            )?
            // Governance defaults
            .set_default("governance.admins", Vec::<String>::new())?
            // RPC defaults
            .set_default("rpc.url", "http://localhost:8545")?
            .set_default("rpc.chain_id", 1)?
            .set_default("rpc.timeout_ms", 10_000)?
            // Pool defaults
            .set_default("pools.univ3", Vec::<String>::new())?
            .set_default("pools.univ2", Vec::<String>::new())?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (TWAP_ORACLE_*)
            .add_source(
                Environment::with_prefix("TWAP_ORACLE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("governance.admins")
                    .with_list_parse_key("pools.univ3")
                    .with_list_parse_key("pools.univ2")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let app_config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    /// Checks everything that can be checked without a network
    pub fn validate(&self) -> Result<()> {
        self.oracle.params()?;
        self.oracle.univ3_factory()?;
        self.oracle.univ2_factory()?;
        self.governance.admins()?;
        self.pools.univ3()?;
        self.pools.univ2()?;

        let has_pools = !self.pools.univ3.is_empty() || !self.pools.univ2.is_empty();
        if has_pools && self.governance.admins.is_empty() {
            bail!("pools are configured but governance.admins is empty");
        }
        if self.rpc.timeout_ms == 0 {
            bail!("rpc.timeout_ms must be positive");
        }
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "obs={}/{}/{} rounding={} rpc={} chain_id={} admins={} univ3_pools={} univ2_pairs={}",
            self.oracle.low_obs,
            self.oracle.mid_obs,
            self.oracle.high_obs,
            self.oracle.tick_rounding,
            self.rpc.url,
            self.rpc.chain_id,
            self.governance.admins.len(),
            self.pools.univ3.len(),
            self.pools.univ2.len()
        )
    }
}

impl OracleConfig {
    pub fn params(&self) -> Result<OracleParams> {
        let tick_rounding = TickRounding::from_name(&self.tick_rounding).with_context(|| {
            format!(
                "oracle.tick_rounding must be 'floor' or 'truncate', got '{}'",
                self.tick_rounding
            )
        })?;
        let params = OracleParams {
            low_obs: self.low_obs,
            mid_obs: self.mid_obs,
            high_obs: self.high_obs,
            tick_rounding,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn univ3_factory(&self) -> Result<Address> {
        parse_address(&self.univ3_factory).context("oracle.univ3_factory")
    }

    pub fn univ2_factory(&self) -> Result<Address> {
        parse_address(&self.univ2_factory).context("oracle.univ2_factory")
    }
}

impl GovernanceConfig {
    pub fn admins(&self) -> Result<Vec<Address>> {
        parse_addresses(&self.admins).context("governance.admins")
    }
}

impl PoolsConfig {
    pub fn univ3(&self) -> Result<Vec<Address>> {
        parse_addresses(&self.univ3).context("pools.univ3")
    }

    pub fn univ2(&self) -> Result<Vec<Address>> {
        parse_addresses(&self.univ2).context("pools.univ2")
    }
}

/// Parses a `0x`-prefixed 20-byte hex address
pub fn parse_address(s: &str) -> Result<Address> {
    let trimmed = s.trim();
    if !trimmed.starts_with("0x") || trimmed.len() != 42 {
        bail!("'{}' is not a 0x-prefixed 20-byte address", trimmed);
    }
    trimmed
        .parse::<Address>()
        .with_context(|| format!("'{}' is not valid hex", trimmed))
}

fn parse_addresses(values: &[String]) -> Result<Vec<Address>> {
    values.iter().map(|s| parse_address(s)).collect()
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_config() -> AppConfig {
        AppConfig::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_deserialize_and_validate() {
        let config = default_config();
        assert_eq!(config.oracle.low_obs, 10);
        assert_eq!(config.oracle.mid_obs, 30);
        assert_eq!(config.oracle.high_obs, 100);
        assert!(config.governance.admins.is_empty());
        assert!(config.validate().is_ok());

        let params = config.oracle.params().unwrap();
        assert_eq!(params, OracleParams::default());
    }

    #[test]
    fn test_overrides() {
        let config: AppConfig = AppConfig::defaults()
            .unwrap()
            .set_override("oracle.tick_rounding", "truncate")
            .unwrap()
            .set_override("oracle.low_obs", 5)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let params = config.oracle.params().unwrap();
        assert_eq!(params.tick_rounding, TickRounding::Truncate);
        assert_eq!(params.low_obs, 5);
    }

    #[test]
    fn test_pools_require_admins() {
        let mut config = default_config();
        config.pools.univ3 = vec!["0x8ad599c3A0ff1De082011EFDDc58f1908eb6e6D8".to_string()];
        assert!(config.validate().is_err());

        config.governance.admins = vec!["0x0000000000000000000000000000000000000001".to_string()];
        assert!(config.validate().is_ok());
        assert_eq!(config.pools.univ3().unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = default_config();
        config.oracle.tick_rounding = "ceil".to_string();
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.oracle.mid_obs = 5;
        assert!(config.validate().is_err());

        let mut config = default_config();
        config.governance.admins = vec!["not-an-address".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_address() {
        assert!(parse_address("0x1F98431c8aD98523631AE4a59f267346ea31F984").is_ok());
        assert!(parse_address(" 0x1F98431c8aD98523631AE4a59f267346ea31F984 ").is_ok());
        assert!(parse_address("1F98431c8aD98523631AE4a59f267346ea31F984").is_err());
        assert!(parse_address("0x1F98").is_err());
        assert!(parse_address("0xZZ98431c8aD98523631AE4a59f267346ea31F984").is_err());
    }

    #[test]
    fn test_digest_mentions_windows() {
        let config = default_config();
        assert!(config.to_string().contains("obs=10/30/100"));
    }
}
