//! Mounted canvas view: owns the store, the session key and every
//! background task, and tears all of them down together.

use crate::{
    activity::ActivityEntry,
    events::{CanvasEvent, EventStream},
    grid::Cell,
    program::{canvas_pda, PixelPlacement},
    rpc::{AccountSubscription, Collaborators, Funder, PixelWriter},
    session::{SessionCredential, SessionPhase},
    snapshot::CanvasSnapshot,
    status::{self, ConnectionStatus},
    store::CanvasStore,
    ClientConfig, ClientError, Result,
};
use solana_sdk::{pubkey::Pubkey, signature::Signature, signer::Signer};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 64;

/// Requests from the handle to the view task
enum Command {
    StartDrawing {
        reply: oneshot::Sender<Result<SessionPhase>>,
    },
    Draw {
        placement: PixelPlacement,
        reply: oneshot::Sender<Result<ActivityEntry>>,
    },
}

/// Entry point for mounting a view
pub struct CanvasView;

impl CanvasView {
    /// Open the view: fetch and subscribe to the canvas account, start the
    /// periodic refresh tasks, and spawn the event task.
    pub async fn mount(config: ClientConfig, collaborators: Collaborators) -> Result<ViewHandle> {
        config.validate()?;

        let (canvas, _) = canvas_pda(&config.program_id);
        info!("Mounting canvas view for {}", canvas);

        let mut store = CanvasStore::new(config.activity_capacity);

        // Fetch before subscribing: anything missed in between is recovered
        // by the next diff against the baseline.
        match collaborators.accounts.fetch(&canvas).await {
            Ok(Some(data)) => {
                store.apply_account_data(&data);
            }
            Ok(None) => warn!("Canvas account {} not found", canvas),
            Err(e) => warn!("Initial canvas fetch failed: {}", e),
        }
        let subscription = collaborators.accounts.subscribe(canvas).await?;

        let events = Arc::new(EventStream::default());
        let (shutdown_tx, _) = broadcast::channel(4);
        let (canvas_tx, canvas_rx) = watch::channel(store.canvas().clone());
        let (activity_tx, activity_rx) = watch::channel(store.activity().to_vec());
        let (session_tx, session_rx) = watch::channel(SessionPhase::Uninitialized);
        let status_tx = Arc::new(watch::channel(ConnectionStatus::Checking).0);
        let status_rx = status_tx.subscribe();
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (funding_tx, funding_rx) = mpsc::channel(1);

        let mut tasks = Vec::with_capacity(3);

        let blockhash = collaborators.blockhash.clone();
        let reference = collaborators.reference.clone();
        tasks.push(spawn_periodic(
            "blockhash refresh",
            config.blockhash_refresh,
            shutdown_tx.subscribe(),
            move || {
                let blockhash = blockhash.clone();
                let reference = reference.clone();
                async move {
                    if let Err(e) = blockhash.refresh(reference.as_ref()).await {
                        warn!("Failed to refresh blockhash: {}", e);
                    }
                }
            },
        ));

        let reference = collaborators.reference.clone();
        let probe_status = status_tx.clone();
        let probe_events = events.clone();
        tasks.push(spawn_periodic(
            "connection probe",
            config.status_interval,
            shutdown_tx.subscribe(),
            move || {
                let reference = reference.clone();
                let status_tx = probe_status.clone();
                let events = probe_events.clone();
                async move {
                    if let Some(next) = status::probe(reference.as_ref(), &status_tx).await {
                        info!("Rollup connection {}", next);
                        events.emit(CanvasEvent::ConnectionChanged(next));
                    }
                }
            },
        ));

        let view_loop = ViewLoop {
            store,
            session: SessionCredential::new(),
            subscription,
            writer: collaborators.writer,
            funder: collaborators.funder,
            fund_lamports: config.fund_lamports,
            events: events.clone(),
            canvas_tx,
            activity_tx,
            session_tx,
            commands_rx,
            funding_tx,
            funding_rx,
            funding_task: None,
            shutdown_rx: shutdown_tx.subscribe(),
        };
        tasks.push(tokio::spawn(view_loop.run()));

        Ok(ViewHandle {
            canvas,
            commands: commands_tx,
            canvas_rx,
            activity_rx,
            session_rx,
            status_rx,
            events,
            shutdown_tx,
            tasks,
        })
    }
}

/// Handle to a mounted view
pub struct ViewHandle {
    canvas: Pubkey,
    commands: mpsc::Sender<Command>,
    canvas_rx: watch::Receiver<CanvasSnapshot>,
    activity_rx: watch::Receiver<Vec<ActivityEntry>>,
    session_rx: watch::Receiver<SessionPhase>,
    status_rx: watch::Receiver<ConnectionStatus>,
    events: Arc<EventStream>,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
}

impl ViewHandle {
    /// Canvas account address
    pub fn canvas_address(&self) -> Pubkey {
        self.canvas
    }

    /// Create and fund the session key. A no-op while funding or once ready.
    pub async fn start_drawing(&self) -> Result<SessionPhase> {
        let (reply, rx) = oneshot::channel();
        self.request(Command::StartDrawing { reply }, rx).await
    }

    /// Place a pixel optimistically and submit it with the session key
    pub async fn draw(&self, cell: Cell, color: u8) -> Result<ActivityEntry> {
        let (reply, rx) = oneshot::channel();
        let placement = PixelPlacement { cell, color };
        self.request(Command::Draw { placement, reply }, rx).await
    }

    async fn request<T>(&self, command: Command, rx: oneshot::Receiver<Result<T>>) -> Result<T> {
        self.commands
            .send(command)
            .await
            .map_err(|_| ClientError::ViewClosed)?;
        rx.await.map_err(|_| ClientError::ViewClosed)?
    }

    /// Working canvas (authoritative plus optimistic edits)
    pub fn canvas(&self) -> watch::Receiver<CanvasSnapshot> {
        self.canvas_rx.clone()
    }

    /// Activity log, newest first
    pub fn activity(&self) -> watch::Receiver<Vec<ActivityEntry>> {
        self.activity_rx.clone()
    }

    pub fn session(&self) -> watch::Receiver<SessionPhase> {
        self.session_rx.clone()
    }

    pub fn session_phase(&self) -> SessionPhase {
        *self.session_rx.borrow()
    }

    pub fn connection_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_rx.clone()
    }

    /// Subscribe to view events
    pub fn subscribe(&self) -> broadcast::Receiver<CanvasEvent> {
        self.events.subscribe()
    }

    /// Stop every task the view started and wait for them to finish
    pub async fn teardown(mut self) {
        info!("Tearing down canvas view for {}", self.canvas);
        let _ = self.shutdown_tx.send(());
        for task in std::mem::take(&mut self.tasks) {
            let _ = task.await;
        }
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        if !self.tasks.is_empty() {
            let _ = self.shutdown_tx.send(());
        }
    }
}

/// The single task that mutates store and session state
struct ViewLoop {
    store: CanvasStore,
    session: SessionCredential,
    subscription: AccountSubscription,
    writer: Arc<dyn PixelWriter>,
    funder: Option<Arc<dyn Funder>>,
    fund_lamports: u64,
    events: Arc<EventStream>,
    canvas_tx: watch::Sender<CanvasSnapshot>,
    activity_tx: watch::Sender<Vec<ActivityEntry>>,
    session_tx: watch::Sender<SessionPhase>,
    commands_rx: mpsc::Receiver<Command>,
    funding_tx: mpsc::Sender<(Pubkey, Result<Signature>)>,
    funding_rx: mpsc::Receiver<(Pubkey, Result<Signature>)>,
    funding_task: Option<JoinHandle<()>>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ViewLoop {
    async fn run(mut self) {
        let mut subscription_open = true;

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    debug!("View received shutdown signal");
                    break;
                }

                update = self.subscription.recv(), if subscription_open => match update {
                    Some(data) => self.on_account_data(&data),
                    None => {
                        warn!("Canvas subscription ended");
                        subscription_open = false;
                        self.events.emit(CanvasEvent::SubscriptionEnded);
                    }
                },

                command = self.commands_rx.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },

                Some((target, outcome)) = self.funding_rx.recv() => {
                    self.on_funding_outcome(target, outcome);
                }
            }
        }

        if let Some(task) = self.funding_task.take() {
            task.abort();
            let _ = task.await;
        }
        self.subscription.unsubscribe().await;
        info!("Canvas view stopped");
    }

    fn on_account_data(&mut self, data: &[u8]) {
        let Some(entries) = self.store.apply_account_data(data) else {
            return;
        };

        let canvas = self.store.canvas();
        self.events.emit(CanvasEvent::SnapshotApplied {
            pixel_count: canvas.pixel_count,
            changed_cells: entries.len(),
        });
        self.canvas_tx.send_replace(canvas.clone());

        if !entries.is_empty() {
            self.activity_tx.send_replace(self.store.activity().to_vec());
            self.events.emit(CanvasEvent::Activity(entries));
        }
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::StartDrawing { reply } => {
                let _ = reply.send(self.start_drawing());
            }
            Command::Draw { placement, reply } => {
                let _ = reply.send(self.draw(placement));
            }
        }
    }

    fn start_drawing(&mut self) -> Result<SessionPhase> {
        let funder = self.funder.clone().ok_or(ClientError::WalletNotConnected)?;
        let Some(keypair) = self.session.begin_setup() else {
            return Ok(self.session.phase());
        };
        self.publish_session();

        let target = keypair.pubkey();
        let lamports = self.fund_lamports;
        let funding_tx = self.funding_tx.clone();
        self.funding_task = Some(tokio::spawn(async move {
            let outcome = funder.fund(target, lamports).await;
            let _ = funding_tx.send((target, outcome)).await;
        }));

        Ok(self.session.phase())
    }

    fn on_funding_outcome(&mut self, target: Pubkey, outcome: Result<Signature>) {
        self.funding_task = None;
        self.session.finish_setup(target, outcome);
        self.publish_session();
    }

    fn draw(&mut self, placement: PixelPlacement) -> Result<ActivityEntry> {
        let signer = self.session.signer().ok_or(ClientError::SessionNotReady)?;
        let entry = self
            .store
            .apply_local(placement.cell, placement.color, signer.pubkey())?;

        self.writer.submit(placement, signer);

        self.canvas_tx.send_replace(self.store.canvas().clone());
        self.activity_tx.send_replace(self.store.activity().to_vec());
        self.events.emit(CanvasEvent::Activity(vec![entry.clone()]));

        Ok(entry)
    }

    fn publish_session(&self) {
        let phase = self.session.phase();
        if self.session_tx.send_replace(phase) != phase {
            self.events.emit(CanvasEvent::SessionChanged(phase));
        }
    }
}

/// Run `tick` every `period` (first tick immediately) until shutdown. An
/// in-flight tick is cancelled by shutdown.
fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => break,
                () = async {
                    interval.tick().await;
                    tick().await;
                } => {}
            }
        }
        debug!("{} stopped", name);
    })
}
