//! In-memory collaborators for driving a mounted view without a network

#![allow(dead_code)]

use async_trait::async_trait;
use solana_sdk::{
    hash::Hash,
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use solplace_client::{
    AccountSource, AccountSubscription, BlockhashCache, CanvasEvent, CanvasSnapshot, Cell,
    ClientError, Collaborators, Funder, PixelGrid, PixelPlacement, PixelWriter, ReferenceSource,
    Result,
};
use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::sync::{broadcast, mpsc, Notify};

pub const WAIT: Duration = Duration::from_secs(2);

/// Serves an initial account buffer and hands out one channel subscription
pub struct ChannelSource {
    initial: Mutex<Option<Vec<u8>>>,
    updates: Mutex<Option<mpsc::Receiver<Vec<u8>>>>,
}

impl ChannelSource {
    pub fn new(initial: Option<Vec<u8>>) -> (Arc<Self>, mpsc::Sender<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(16);
        let source = Arc::new(Self {
            initial: Mutex::new(initial),
            updates: Mutex::new(Some(rx)),
        });
        (source, tx)
    }
}

#[async_trait]
impl AccountSource for ChannelSource {
    async fn fetch(&self, _account: &Pubkey) -> Result<Option<Vec<u8>>> {
        Ok(self.initial.lock().unwrap().clone())
    }

    async fn subscribe(&self, account: Pubkey) -> Result<AccountSubscription> {
        let rx = self
            .updates
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| ClientError::Subscription("already subscribed".to_string()))?;
        Ok(AccountSubscription::from_channel(account, rx))
    }
}

/// Reference data with a switchable connection
pub struct FakeReference {
    pub online: AtomicBool,
}

impl FakeReference {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl ReferenceSource for FakeReference {
    async fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    async fn slot(&self) -> Result<u64> {
        if self.online.load(Ordering::SeqCst) {
            Ok(7)
        } else {
            Err(ClientError::Subscription("offline".to_string()))
        }
    }
}

/// Records every submitted placement with its signer
#[derive(Default)]
pub struct RecordingWriter {
    pub submitted: Mutex<Vec<(PixelPlacement, Pubkey)>>,
}

impl PixelWriter for RecordingWriter {
    fn submit(&self, placement: PixelPlacement, signer: Arc<Keypair>) {
        self.submitted
            .lock()
            .unwrap()
            .push((placement, signer.pubkey()));
    }
}

/// Funder that waits for a release before answering
pub struct GatedFunder {
    pub calls: AtomicUsize,
    pub release: Notify,
    pub succeed: bool,
}

impl GatedFunder {
    pub fn new(succeed: bool) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            release: Notify::new(),
            succeed,
        })
    }
}

#[async_trait]
impl Funder for GatedFunder {
    async fn fund(&self, _target: Pubkey, _lamports: u64) -> Result<Signature> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.release.notified().await;
        if self.succeed {
            Ok(Signature::new_unique())
        } else {
            Err(ClientError::FundingFailed("wallet rejected".to_string()))
        }
    }
}

/// Funder that succeeds immediately
pub struct InstantFunder;

#[async_trait]
impl Funder for InstantFunder {
    async fn fund(&self, _target: Pubkey, _lamports: u64) -> Result<Signature> {
        Ok(Signature::new_unique())
    }
}

pub struct Harness {
    pub collaborators: Collaborators,
    pub updates: mpsc::Sender<Vec<u8>>,
    pub writer: Arc<RecordingWriter>,
    pub reference: Arc<FakeReference>,
}

pub fn harness(initial: Option<Vec<u8>>, funder: Option<Arc<dyn Funder>>) -> Harness {
    let (accounts, updates) = ChannelSource::new(initial);
    let writer = Arc::new(RecordingWriter::default());
    let reference = FakeReference::new();
    let collaborators = Collaborators {
        accounts,
        reference: reference.clone(),
        writer: writer.clone(),
        blockhash: BlockhashCache::new(),
        funder,
    };
    Harness {
        collaborators,
        updates,
        writer,
        reference,
    }
}

/// Encoded canvas account with the given painted cells
pub fn account_bytes(last_editor: Pubkey, pixel_count: u64, painted: &[(u8, u8, u8)]) -> Vec<u8> {
    let mut pixels = PixelGrid::blank();
    for &(x, y, color) in painted {
        pixels.set(Cell::new(x, y), color).unwrap();
    }
    CanvasSnapshot {
        authority: Pubkey::new_unique(),
        last_editor,
        pixel_count,
        pixels,
        loaded: true,
    }
    .encode()
}

/// Wait for the next event matching `pred`
pub async fn next_event<F>(events: &mut broadcast::Receiver<CanvasEvent>, mut pred: F) -> CanvasEvent
where
    F: FnMut(&CanvasEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            let event = events.recv().await.unwrap();
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
