//! Service configuration

use anyhow::{anyhow, Context, Result};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{read_keypair_file, Keypair},
};
use solplace_client::{
    core::{DEVNET_RPC, ER_RPC, ER_WS},
    ClientConfig, PROGRAM_ID,
};
use std::{path::Path, sync::Arc};
use tracing::warn;

const DEFAULT_WALLET_PATH: &str = "~/.config/solana/id.json";

#[derive(Clone)]
pub struct Config {
    /// Base chain RPC URL, used for funding
    pub l1_rpc_url: String,

    /// Ephemeral rollup RPC URL
    pub er_rpc_url: String,

    /// Ephemeral rollup WebSocket URL
    pub er_ws_url: String,

    /// SolPlace program ID
    pub program_id: Pubkey,

    /// Primary wallet; without one the service can only watch
    pub wallet: Option<Arc<Keypair>>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let program_id = match lookup("PROGRAM_ID") {
            Some(id) => id.parse().context("Invalid PROGRAM_ID")?,
            None => PROGRAM_ID,
        };

        let wallet_path = lookup("WALLET_PATH").unwrap_or_else(|| DEFAULT_WALLET_PATH.to_string());
        let wallet_path = shellexpand::tilde(&wallet_path).to_string();
        let wallet = load_wallet(Path::new(&wallet_path))?;

        Ok(Config {
            l1_rpc_url: lookup("L1_RPC_URL").unwrap_or_else(|| DEVNET_RPC.to_string()),
            er_rpc_url: lookup("ER_RPC_URL").unwrap_or_else(|| ER_RPC.to_string()),
            er_ws_url: lookup("ER_WS_URL").unwrap_or_else(|| ER_WS.to_string()),
            program_id,
            wallet,
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            l1_rpc_url: self.l1_rpc_url.clone(),
            er_rpc_url: self.er_rpc_url.clone(),
            er_ws_url: self.er_ws_url.clone(),
            program_id: self.program_id,
            ..ClientConfig::default()
        }
    }
}

/// A missing wallet file is not an error; an unreadable one is.
fn load_wallet(path: &Path) -> Result<Option<Arc<Keypair>>> {
    if !path.exists() {
        warn!("No wallet at {}, painting disabled", path.display());
        return Ok(None);
    }
    let keypair = read_keypair_file(path)
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("Failed to load wallet keypair from {}", path.display()))?;
    Ok(Some(Arc::new(keypair)))
}
