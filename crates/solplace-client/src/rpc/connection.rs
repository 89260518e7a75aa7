//! Ephemeral rollup connection: HTTP reads plus WebSocket subscriptions

use super::{monitor, AccountSource, AccountSubscription, ReferenceSource};
use crate::Result;
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey};
use std::sync::Arc;
use tracing::debug;

/// Explicitly constructed rollup client; owned by whoever mounts the view
pub struct RollupConnection {
    rpc_client: Arc<RpcClient>,
    ws_url: String,
    commitment: CommitmentConfig,
}

impl RollupConnection {
    pub fn new(rpc_url: String, ws_url: String, commitment: CommitmentConfig) -> Self {
        Self {
            rpc_client: Arc::new(RpcClient::new_with_commitment(rpc_url, commitment)),
            ws_url,
            commitment,
        }
    }

    /// Get the RPC client
    pub fn rpc_client(&self) -> &Arc<RpcClient> {
        &self.rpc_client
    }
}

#[async_trait]
impl AccountSource for RollupConnection {
    async fn fetch(&self, account: &Pubkey) -> Result<Option<Vec<u8>>> {
        let response = self
            .rpc_client
            .get_account_with_commitment(account, self.commitment)
            .await?;
        debug!("Fetched account {} at slot {}", account, response.context.slot);
        Ok(response.value.map(|account| account.data))
    }

    async fn subscribe(&self, account: Pubkey) -> Result<AccountSubscription> {
        Ok(monitor::spawn(self.ws_url.clone(), account, self.commitment))
    }
}

#[async_trait]
impl ReferenceSource for RollupConnection {
    async fn latest_blockhash(&self) -> Result<Hash> {
        let (blockhash, _) = self
            .rpc_client
            .get_latest_blockhash_with_commitment(self.commitment)
            .await?;
        Ok(blockhash)
    }

    async fn slot(&self) -> Result<u64> {
        Ok(self.rpc_client.get_slot_with_commitment(self.commitment).await?)
    }
}
