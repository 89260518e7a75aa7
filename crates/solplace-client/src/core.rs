//! Core client types: configuration and error handling

use crate::snapshot::DecodeError;
use solana_sdk::{commitment_config::CommitmentConfig, native_token::LAMPORTS_PER_SOL, pubkey::Pubkey};
use std::time::Duration;
use thiserror::Error;

// ================================
// Configuration Types
// ================================

/// Default L1 (base chain) RPC endpoint
pub const DEVNET_RPC: &str = "https://api.devnet.solana.com";

/// Default ephemeral rollup RPC endpoint
pub const ER_RPC: &str = "https://devnet.magicblock.app/";

/// Default ephemeral rollup WebSocket endpoint
pub const ER_WS: &str = "wss://devnet.magicblock.app/";

/// Lamports moved into a fresh session key: 0.01 SOL covers its fees
pub const SESSION_FUND_LAMPORTS: u64 = LAMPORTS_PER_SOL / 100;

/// Number of entries the activity log keeps
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 50;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base chain RPC endpoint, used for funding the session key
    pub l1_rpc_url: String,

    /// Ephemeral rollup RPC endpoint, used for reads and pixel writes
    pub er_rpc_url: String,

    /// Ephemeral rollup WebSocket endpoint for account subscriptions
    pub er_ws_url: String,

    /// SolPlace program id
    pub program_id: Pubkey,

    /// Commitment for rollup reads and subscriptions
    pub er_commitment: CommitmentConfig,

    /// Commitment for base chain funding transfers
    pub l1_commitment: CommitmentConfig,

    /// Lamports transferred to the session key on setup
    pub fund_lamports: u64,

    /// How often the cached blockhash is refreshed
    pub blockhash_refresh: Duration,

    /// How often rollup connectivity is probed
    pub status_interval: Duration,

    /// Maximum number of activity entries retained
    pub activity_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            l1_rpc_url: DEVNET_RPC.to_string(),
            er_rpc_url: ER_RPC.to_string(),
            er_ws_url: ER_WS.to_string(),
            program_id: crate::program::PROGRAM_ID,
            er_commitment: CommitmentConfig::processed(),
            l1_commitment: CommitmentConfig::confirmed(),
            fund_lamports: SESSION_FUND_LAMPORTS,
            blockhash_refresh: Duration::from_secs(15),
            status_interval: Duration::from_secs(10),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Reject configurations the view cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.activity_capacity == 0 {
            return Err(ClientError::InvalidConfiguration(
                "activity_capacity must be non-zero".to_string(),
            ));
        }
        if self.blockhash_refresh.is_zero() || self.status_interval.is_zero() {
            return Err(ClientError::InvalidConfiguration(
                "refresh intervals must be non-zero".to_string(),
            ));
        }
        if self.fund_lamports == 0 {
            return Err(ClientError::InvalidConfiguration(
                "fund_lamports must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

// ================================
// Error Types
// ================================

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    Rpc(Box<solana_client::client_error::ClientError>),

    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Account decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("Cell ({x}, {y}) is outside the canvas")]
    OutOfBounds { x: u8, y: u8 },

    #[error("Invalid color index {0}")]
    InvalidColor(u8),

    #[error("Session key is not ready")]
    SessionNotReady,

    #[error("No wallet connected")]
    WalletNotConnected,

    #[error("Funding the session key failed: {0}")]
    FundingFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Subscription error: {0}")]
    Subscription(String),

    #[error("Canvas view is closed")]
    ViewClosed,
}

impl From<solana_client::client_error::ClientError> for ClientError {
    fn from(err: solana_client::client_error::ClientError) -> Self {
        Self::Rpc(Box::new(err))
    }
}

impl From<tungstenite::Error> for ClientError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
