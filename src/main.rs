//! TWAP Oracle CLI
//!
//! Registers the configured pools and answers price queries against a
//! JSON-RPC node.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::Address;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use twap_oracle::config::{parse_address, AppConfig};
use twap_oracle::governance::{AccessControl, AdminSet};
use twap_oracle::logging::init_logging;
use twap_oracle::oracle::{InterfaceId, Oracle, UniV2Oracle, UniV3Oracle};
use twap_oracle::pool::onchain::http_provider;
use twap_oracle::pool::{OnchainV2Pair, OnchainV3Pool, UniV2PairState, UniV3PoolState};
use twap_oracle::types::{PriceResponse, SafetyMask};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OracleKind {
    V3,
    V2,
}

#[derive(Debug, Parser)]
#[command(name = "twap-oracle", version, about = "Safety-indexed Uniswap price oracle")]
struct Cli {
    /// Which oracle answers the command
    #[arg(long, value_enum, default_value_t = OracleKind::V3, global = true)]
    kind: OracleKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Price of a token pair at the requested safety levels
    Price {
        token_a: String,
        token_b: String,
        /// Bit i requests safety level i (30 = levels 1-4)
        #[arg(long, default_value_t = 30)]
        mask: u64,
    },
    /// List registered pools
    Pools,
    /// Oracle identity and parameters
    Info {
        /// Also report whether this interface id (hex) is supported
        #[arg(long)]
        interface: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load()?;
    init_logging(&config.logging)?;
    info!(config = %config, "configuration loaded");

    let provider = http_provider(&config.rpc.url)?;
    let governance = Arc::new(AdminSet::new(config.governance.admins()?));
    let timeout = Duration::from_millis(config.rpc.timeout_ms);

    let oracle: Box<dyn Oracle> = match cli.kind {
        OracleKind::V3 => Box::new(build_univ3(&config, &provider, governance.clone(), timeout).await?),
        OracleKind::V2 => Box::new(build_univ2(&config, &provider, governance.clone(), timeout).await?),
    };

    match cli.command {
        Command::Price {
            token_a,
            token_b,
            mask,
        } => {
            check_chain_id(&provider, config.rpc.chain_id, timeout).await;
            let token_a = parse_address(&token_a).context("token_a")?;
            let token_b = parse_address(&token_b).context("token_b")?;
            let mask = SafetyMask::from_bits(mask);
            let response = with_timeout(timeout, oracle.price(token_a, token_b, mask)).await??;
            print_json(&price_json(token_a, token_b, mask, &response))?;
        }
        Command::Pools => {
            let pools: Vec<_> = oracle
                .pools()
                .await
                .into_iter()
                .map(|(pair, pool)| {
                    json!({
                        "token0": format!("{:#x}", pair.token0),
                        "token1": format!("{:#x}", pair.token1),
                        "pool": format!("{:#x}", pool),
                    })
                })
                .collect();
            print_json(&json!({
                "oracle": oracle.contract_name(),
                "pools": pools,
            }))?;
        }
        Command::Info { interface } => {
            let mut body = json!({
                "name": oracle.contract_name(),
                "version": oracle.contract_version(),
                "factory": format!("{:#x}", oracle.factory()),
                "erc165": oracle.supports_interface(InterfaceId::erc165()),
            });
            if matches!(cli.kind, OracleKind::V3) {
                let params = config.oracle.params()?;
                body["LOW_OBS"] = json!(params.low_obs);
                body["MID_OBS"] = json!(params.mid_obs);
                body["HIGH_OBS"] = json!(params.high_obs);
                body["interface_id"] = json!(InterfaceId::univ3_oracle().to_string());
            } else {
                body["interface_id"] = json!(InterfaceId::univ2_oracle().to_string());
            }
            if let Some(raw) = interface {
                let id = InterfaceId::from_hex(&raw)
                    .with_context(|| format!("'{}' is not a 4-byte interface id", raw))?;
                body["supports"] = json!(oracle.supports_interface(id));
            }
            print_json(&body)?;
        }
    }

    Ok(())
}

/// First configured admin, used to register the startup pools
fn bootstrap_admin(config: &AppConfig, governance: &dyn AccessControl) -> Result<Option<Address>> {
    let admin = config.governance.admins()?.into_iter().next();
    if let Some(admin) = admin {
        governance.require_admin(&admin)?;
    }
    Ok(admin)
}

async fn build_univ3(
    config: &AppConfig,
    provider: &Arc<Provider<Http>>,
    governance: Arc<AdminSet>,
    timeout: Duration,
) -> Result<UniV3Oracle> {
    let oracle = UniV3Oracle::new(
        config.oracle.univ3_factory()?,
        config.oracle.params()?,
        governance.clone(),
    )?;

    let addresses = config.pools.univ3()?;
    if addresses.is_empty() {
        return Ok(oracle);
    }
    let Some(admin) = bootstrap_admin(config, governance.as_ref())? else {
        bail!("pools.univ3 is set but no admin can register it");
    };

    let pools: Vec<Arc<dyn UniV3PoolState>> = addresses
        .into_iter()
        .map(|address| Arc::new(OnchainV3Pool::new(address, provider.clone())) as Arc<dyn UniV3PoolState>)
        .collect();
    let updates = with_timeout(timeout, oracle.add_pools(&admin, pools)).await??;
    for update in &updates {
        info!(pair = %update.pair(), changed = update.is_change(), "univ3 pool registered");
    }
    Ok(oracle)
}

async fn build_univ2(
    config: &AppConfig,
    provider: &Arc<Provider<Http>>,
    governance: Arc<AdminSet>,
    timeout: Duration,
) -> Result<UniV2Oracle> {
    let oracle = UniV2Oracle::new(config.oracle.univ2_factory()?, governance.clone());

    let addresses = config.pools.univ2()?;
    if addresses.is_empty() {
        return Ok(oracle);
    }
    let Some(admin) = bootstrap_admin(config, governance.as_ref())? else {
        bail!("pools.univ2 is set but no admin can register it");
    };

    let pairs: Vec<Arc<dyn UniV2PairState>> = addresses
        .into_iter()
        .map(|address| Arc::new(OnchainV2Pair::new(address, provider.clone())) as Arc<dyn UniV2PairState>)
        .collect();
    let updates = with_timeout(timeout, oracle.add_pools(&admin, pairs)).await??;
    for update in &updates {
        info!(pair = %update.pair(), changed = update.is_change(), "univ2 pool registered");
    }
    Ok(oracle)
}

async fn check_chain_id(provider: &Provider<Http>, expected: u64, timeout: Duration) {
    match with_timeout(timeout, provider.get_chainid()).await {
        Ok(Ok(chain_id)) if chain_id.as_u64() == expected => {}
        Ok(Ok(chain_id)) => warn!(expected, actual = chain_id.as_u64(), "RPC chain id mismatch"),
        Ok(Err(e)) => warn!(error = %e, "could not read chain id"),
        Err(e) => warn!(error = %e, "could not read chain id"),
    }
}

async fn with_timeout<F: Future>(timeout: Duration, fut: F) -> Result<F::Output> {
    tokio::time::timeout(timeout, fut)
        .await
        .with_context(|| format!("RPC call timed out after {}ms", timeout.as_millis()))
}

fn price_json(
    token_a: Address,
    token_b: Address,
    mask: SafetyMask,
    response: &PriceResponse,
) -> serde_json::Value {
    let prices: Vec<_> = response
        .prices_x96
        .iter()
        .zip(&response.safety_indices)
        .map(|(price, index)| {
            json!({
                "safety_index": index,
                "price_x96": price.to_string(),
            })
        })
        .collect();
    json!({
        "token_a": format!("{:#x}", token_a),
        "token_b": format!("{:#x}", token_b),
        "mask": mask.bits(),
        "prices": prices,
    })
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
