//! Fire-and-forget `place_pixel` submission to the rollup

use super::{PixelWriter, ReferenceSource};
use crate::{
    program::{place_pixel_instruction, PixelPlacement},
    Result,
};
use solana_client::{nonblocking::rpc_client::RpcClient, rpc_config::RpcSendTransactionConfig};
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::Keypair,
    signer::Signer,
    transaction::Transaction,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Most recent blockhash, shared between the refresh task and the writer
#[derive(Clone, Default)]
pub struct BlockhashCache {
    inner: Arc<RwLock<Option<Hash>>>,
}

impl BlockhashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Hash> {
        *self.inner.read().await
    }

    pub async fn set(&self, blockhash: Hash) {
        *self.inner.write().await = Some(blockhash);
    }

    /// Fetch a fresh blockhash and cache it
    pub async fn refresh(&self, source: &dyn ReferenceSource) -> Result<Hash> {
        let blockhash = source.latest_blockhash().await?;
        self.set(blockhash).await;
        debug!("Refreshed blockhash {}", blockhash);
        Ok(blockhash)
    }
}

/// Signs placements with the session key and sends them without preflight
pub struct RollupWriter {
    rpc_client: Arc<RpcClient>,
    program_id: Pubkey,
    canvas: Pubkey,
    blockhash: BlockhashCache,
}

impl RollupWriter {
    pub fn new(
        rpc_client: Arc<RpcClient>,
        program_id: Pubkey,
        canvas: Pubkey,
        blockhash: BlockhashCache,
    ) -> Self {
        Self {
            rpc_client,
            program_id,
            canvas,
            blockhash,
        }
    }

    async fn send(
        rpc_client: &RpcClient,
        blockhash: &BlockhashCache,
        program_id: Pubkey,
        canvas: Pubkey,
        placement: PixelPlacement,
        signer: &Keypair,
    ) -> Result<()> {
        let recent_blockhash = match blockhash.get().await {
            Some(hash) => hash,
            None => {
                let hash = rpc_client.get_latest_blockhash().await?;
                blockhash.set(hash).await;
                hash
            }
        };

        let instruction = place_pixel_instruction(program_id, canvas, signer.pubkey(), placement);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&signer.pubkey()),
            &[signer],
            recent_blockhash,
        );

        let signature = rpc_client
            .send_transaction_with_config(
                &transaction,
                RpcSendTransactionConfig {
                    skip_preflight: true,
                    ..RpcSendTransactionConfig::default()
                },
            )
            .await?;
        debug!(
            "Sent place_pixel {} color {} ({})",
            placement.cell, placement.color, signature
        );
        Ok(())
    }
}

impl PixelWriter for RollupWriter {
    fn submit(&self, placement: PixelPlacement, signer: Arc<Keypair>) {
        let rpc_client = self.rpc_client.clone();
        let blockhash = self.blockhash.clone();
        let (program_id, canvas) = (self.program_id, self.canvas);

        tokio::spawn(async move {
            if let Err(e) =
                Self::send(&rpc_client, &blockhash, program_id, canvas, placement, &signer).await
            {
                error!("place_pixel tx failed: {}", e);
            }
        });
    }
}
