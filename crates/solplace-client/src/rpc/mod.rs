//! External collaborators: account reads, reference data, writes, funding
//!
//! The view only talks to these traits. The Solana-backed implementations
//! live in the submodules and are wired together by [`Collaborators::solana`].

mod connection;
mod funder;
mod monitor;
mod writer;

pub use connection::RollupConnection;
pub use funder::WalletFunder;
pub use writer::{BlockhashCache, RollupWriter};

use crate::{program::PixelPlacement, ClientConfig, Result};
use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
};
use std::sync::Arc;
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tracing::debug;

// ================================
// Collaborator Traits
// ================================

/// Source of raw canvas account bytes
#[async_trait]
pub trait AccountSource: Send + Sync {
    /// One-shot read of the current account data
    async fn fetch(&self, account: &Pubkey) -> Result<Option<Vec<u8>>>;

    /// Push subscription to future account data
    async fn subscribe(&self, account: Pubkey) -> Result<AccountSubscription>;
}

/// Periodically refreshed reference data
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn latest_blockhash(&self) -> Result<Hash>;

    async fn slot(&self) -> Result<u64>;
}

/// Fire-and-forget pixel submission.
///
/// Implementations must not block and never report failures back; a lost
/// write only shows up as a later authoritative read that disagrees.
pub trait PixelWriter: Send + Sync {
    fn submit(&self, placement: PixelPlacement, signer: Arc<Keypair>);
}

/// Transfers lamports from the primary wallet
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Funder: Send + Sync {
    /// Transfer `lamports` to `target` and wait for confirmation
    async fn fund(&self, target: Pubkey, lamports: u64) -> Result<Signature>;
}

// ================================
// Subscription Handle
// ================================

/// Live account subscription.
///
/// Updates arrive on a channel; [`AccountSubscription::unsubscribe`] stops
/// the worker and waits for it. Dropping the handle signals the worker too.
pub struct AccountSubscription {
    account: Pubkey,
    updates: mpsc::Receiver<Vec<u8>>,
    shutdown_tx: Option<broadcast::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl AccountSubscription {
    /// Subscription driven by a background worker listening on `shutdown_tx`
    pub fn new(
        account: Pubkey,
        updates: mpsc::Receiver<Vec<u8>>,
        shutdown_tx: broadcast::Sender<()>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            account,
            updates,
            shutdown_tx: Some(shutdown_tx),
            worker: Some(worker),
        }
    }

    /// Subscription fed directly by whoever holds the sender
    pub fn from_channel(account: Pubkey, updates: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            account,
            updates,
            shutdown_tx: None,
            worker: None,
        }
    }

    pub fn account(&self) -> &Pubkey {
        &self.account
    }

    /// Next raw account buffer; `None` once the source has gone away
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.updates.recv().await
    }

    /// Stop receiving and wait for the worker to exit
    pub async fn unsubscribe(mut self) {
        debug!("Unsubscribing from account {}", self.account);
        self.updates.close();
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl Drop for AccountSubscription {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = &self.shutdown_tx {
            let _ = shutdown_tx.send(());
        }
    }
}

// ================================
// Wiring
// ================================

/// Everything a view needs from the outside world
#[derive(Clone)]
pub struct Collaborators {
    pub accounts: Arc<dyn AccountSource>,
    pub reference: Arc<dyn ReferenceSource>,
    pub writer: Arc<dyn PixelWriter>,
    /// Written by the view's refresh task, read by the writer
    pub blockhash: BlockhashCache,
    /// `None` when no wallet is connected
    pub funder: Option<Arc<dyn Funder>>,
}

impl Collaborators {
    /// Solana-backed collaborators: rollup reads/writes, L1 funding
    pub fn solana(config: &ClientConfig, wallet: Option<Arc<Keypair>>) -> Self {
        let connection = Arc::new(RollupConnection::new(
            config.er_rpc_url.clone(),
            config.er_ws_url.clone(),
            config.er_commitment,
        ));
        let blockhash = BlockhashCache::new();
        let (canvas, _) = crate::program::canvas_pda(&config.program_id);
        let writer = Arc::new(RollupWriter::new(
            connection.rpc_client().clone(),
            config.program_id,
            canvas,
            blockhash.clone(),
        ));
        let funder = wallet.map(|wallet| {
            Arc::new(WalletFunder::new(
                config.l1_rpc_url.clone(),
                config.l1_commitment,
                wallet,
            )) as Arc<dyn Funder>
        });

        Self {
            accounts: connection.clone(),
            reference: connection,
            writer,
            blockhash,
            funder,
        }
    }
}
