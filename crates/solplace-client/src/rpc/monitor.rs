//! WebSocket `accountSubscribe` worker for the canvas account

use super::AccountSubscription;
use crate::{ClientError, Result};
use base64::Engine;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

const SUBSCRIBE_REQUEST_ID: u64 = 1;
const UNSUBSCRIBE_REQUEST_ID: u64 = 2;
const UPDATE_BUFFER: usize = 64;
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// WebSocket subscription request
#[derive(Debug, Serialize)]
struct SubscriptionRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: serde_json::Value,
}

/// WebSocket response or notification
#[derive(Debug, Deserialize)]
struct WsResponse {
    id: Option<u64>,
    result: Option<serde_json::Value>,
    error: Option<serde_json::Value>,
    method: Option<String>,
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    result: NotificationResult,
    subscription: u64,
}

#[derive(Debug, Deserialize)]
struct NotificationResult {
    context: NotificationContext,
    value: Option<NotificationAccount>,
}

#[derive(Debug, Deserialize)]
struct NotificationContext {
    slot: u64,
}

#[derive(Debug, Deserialize)]
struct NotificationAccount {
    /// `[payload, encoding]`
    data: Vec<String>,
}

/// What one frame told us
#[derive(Debug, PartialEq, Eq)]
enum Frame {
    /// Subscription confirmed with this id
    Subscribed(u64),
    /// Account data changed
    Data { slot: u64, data: Vec<u8> },
    /// Anything else (acks, notifications for other subscriptions)
    Other,
}

/// Parse a JSON-RPC frame from an account subscription
fn parse_account_notification(text: &str) -> Result<Frame> {
    let response: WsResponse = serde_json::from_str(text)?;

    if let Some(error) = response.error {
        return Err(ClientError::Subscription(error.to_string()));
    }

    if response.id == Some(SUBSCRIBE_REQUEST_ID) {
        if let Some(id) = response.result.as_ref().and_then(serde_json::Value::as_u64) {
            return Ok(Frame::Subscribed(id));
        }
    }

    if response.method.as_deref() != Some("accountNotification") {
        return Ok(Frame::Other);
    }
    let Some(params) = response.params else {
        return Ok(Frame::Other);
    };
    let slot = params.result.context.slot;
    let Some(account) = params.result.value else {
        return Ok(Frame::Other);
    };

    let (payload, encoding) = match account.data.as_slice() {
        [payload, encoding, ..] => (payload, encoding.as_str()),
        _ => return Err(ClientError::Subscription("missing account data".to_string())),
    };
    if encoding != "base64" {
        return Err(ClientError::Subscription(format!(
            "unexpected encoding {encoding} on subscription {}",
            params.subscription
        )));
    }
    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ClientError::Subscription(e.to_string()))?;

    Ok(Frame::Data { slot, data })
}

/// Why a connection ended
enum ConnectionEnd {
    /// Shutdown requested or nobody is listening any more
    Stopped,
    /// Server went away; worth reconnecting
    Disconnected,
}

/// Spawn the subscription worker for `account`
pub(super) fn spawn(ws_url: String, account: Pubkey, commitment: CommitmentConfig) -> AccountSubscription {
    let (updates_tx, updates_rx) = mpsc::channel(UPDATE_BUFFER);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    let worker = tokio::spawn(async move {
        monitor_loop(ws_url, account, commitment, updates_tx, shutdown_rx).await;
    });

    AccountSubscription::new(account, updates_rx, shutdown_tx, worker)
}

/// Connect, stream, reconnect until shut down
async fn monitor_loop(
    ws_url: String,
    account: Pubkey,
    commitment: CommitmentConfig,
    updates_tx: mpsc::Sender<Vec<u8>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    info!("Starting account monitor for {}", account);

    loop {
        match run_connection(&ws_url, account, commitment, &updates_tx, &mut shutdown_rx).await {
            Ok(ConnectionEnd::Stopped) => break,
            Ok(ConnectionEnd::Disconnected) => warn!("Account subscription for {} dropped", account),
            Err(e) => error!("Account monitor error: {}", e),
        }

        tokio::select! {
            _ = shutdown_rx.recv() => break,
            () = tokio::time::sleep(RECONNECT_DELAY) => {
                info!("Reconnecting account monitor to {}", ws_url);
            }
        }
    }

    info!("Account monitor for {} stopped", account);
}

async fn run_connection(
    ws_url: &str,
    account: Pubkey,
    commitment: CommitmentConfig,
    updates_tx: &mpsc::Sender<Vec<u8>>,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> Result<ConnectionEnd> {
    let request = SubscriptionRequest {
        jsonrpc: "2.0",
        id: SUBSCRIBE_REQUEST_ID,
        method: "accountSubscribe",
        params: serde_json::json!([
            account.to_string(),
            {
                "encoding": "base64",
                "commitment": commitment.commitment
            }
        ]),
    };
    let request = Message::text(serde_json::to_string(&request)?);

    // Shutdown must be able to interrupt a stalled handshake.
    let connect = async {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (mut write, read) = ws_stream.split();
        write.send(request).await?;
        Ok::<_, ClientError>((write, read))
    };
    let (mut write, mut read) = tokio::select! {
        _ = shutdown_rx.recv() => {
            debug!("Shutdown during connect to {}", ws_url);
            return Ok(ConnectionEnd::Stopped);
        }
        connected = connect => connected?,
    };

    let mut subscription_id = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                if let Some(id) = subscription_id {
                    let request = SubscriptionRequest {
                        jsonrpc: "2.0",
                        id: UNSUBSCRIBE_REQUEST_ID,
                        method: "accountUnsubscribe",
                        params: serde_json::json!([id]),
                    };
                    let _ = write.send(Message::text(serde_json::to_string(&request)?)).await;
                }
                let _ = write.close().await;
                return Ok(ConnectionEnd::Stopped);
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => match parse_account_notification(&text) {
                        Ok(Frame::Subscribed(id)) => {
                            info!("Subscribed to {} (subscription {})", account, id);
                            subscription_id = Some(id);
                        }
                        Ok(Frame::Data { slot, data }) => {
                            debug!("Account update for {} at slot {}", account, slot);
                            if updates_tx.send(data).await.is_err() {
                                return Ok(ConnectionEnd::Stopped);
                            }
                        }
                        Ok(Frame::Other) => {}
                        Err(e) => warn!("Error handling message: {}", e),
                    },
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket connection closed");
                        return Ok(ConnectionEnd::Disconnected);
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("WebSocket stream ended");
                        return Ok(ConnectionEnd::Disconnected);
                    }
                    _ => {}
                }
            }
        }
    }
}
