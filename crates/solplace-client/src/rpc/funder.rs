//! Session key funding from the primary wallet on the base chain

use super::Funder;
use crate::{ClientError, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    system_instruction,
    transaction::Transaction,
};
use std::sync::Arc;
use tracing::info;

/// Funds session keys with a system transfer signed by the wallet
pub struct WalletFunder {
    rpc_client: RpcClient,
    wallet: Arc<Keypair>,
}

impl WalletFunder {
    pub fn new(rpc_url: String, commitment: CommitmentConfig, wallet: Arc<Keypair>) -> Self {
        Self {
            rpc_client: RpcClient::new_with_commitment(rpc_url, commitment),
            wallet,
        }
    }
}

#[async_trait]
impl Funder for WalletFunder {
    async fn fund(&self, target: Pubkey, lamports: u64) -> Result<Signature> {
        info!(
            "Funding session key {} with {} lamports from {}",
            target,
            lamports,
            self.wallet.pubkey()
        );

        let instruction = system_instruction::transfer(&self.wallet.pubkey(), &target, lamports);
        let recent_blockhash = self.rpc_client.get_latest_blockhash().await?;
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.wallet.pubkey()),
            &[self.wallet.as_ref()],
            recent_blockhash,
        );

        self.rpc_client
            .send_and_confirm_transaction(&transaction)
            .await
            .map_err(|e| ClientError::FundingFailed(e.to_string()))
    }
}
