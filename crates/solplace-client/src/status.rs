//! Rollup connectivity tracking

use crate::rpc::ReferenceSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionStatus {
    #[default]
    Checking,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    /// Status shown while a probe is in flight: a disconnected rollup goes
    /// back to `Checking`, anything else is kept.
    pub fn probing(self) -> Self {
        match self {
            ConnectionStatus::Disconnected => ConnectionStatus::Checking,
            other => other,
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Checking => write!(f, "checking"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Probe the rollup once and publish the result. Returns the new status when
/// it changed.
pub async fn probe(
    source: &dyn ReferenceSource,
    status: &watch::Sender<ConnectionStatus>,
) -> Option<ConnectionStatus> {
    let before = *status.borrow();
    status.send_if_modified(|current| {
        let next = current.probing();
        let changed = next != *current;
        *current = next;
        changed
    });

    let next = match source.slot().await {
        Ok(slot) => {
            debug!("Rollup reachable at slot {}", slot);
            ConnectionStatus::Connected
        }
        Err(e) => {
            debug!("Rollup probe failed: {}", e);
            ConnectionStatus::Disconnected
        }
    };
    status.send_replace(next);

    (next != before).then_some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientError, Result};
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;

    struct Probe(bool);

    #[async_trait]
    impl ReferenceSource for Probe {
        async fn latest_blockhash(&self) -> Result<Hash> {
            Ok(Hash::default())
        }

        async fn slot(&self) -> Result<u64> {
            if self.0 {
                Ok(42)
            } else {
                Err(ClientError::Subscription("offline".to_string()))
            }
        }
    }

    #[test]
    fn test_probing_transition() {
        assert_eq!(ConnectionStatus::Disconnected.probing(), ConnectionStatus::Checking);
        assert_eq!(ConnectionStatus::Connected.probing(), ConnectionStatus::Connected);
        assert_eq!(ConnectionStatus::Checking.probing(), ConnectionStatus::Checking);
    }

    #[tokio::test]
    async fn test_probe_updates_status() {
        let (tx, rx) = watch::channel(ConnectionStatus::Checking);

        assert_eq!(probe(&Probe(true), &tx).await, Some(ConnectionStatus::Connected));
        assert_eq!(*rx.borrow(), ConnectionStatus::Connected);

        assert_eq!(probe(&Probe(true), &tx).await, None);

        assert_eq!(
            probe(&Probe(false), &tx).await,
            Some(ConnectionStatus::Disconnected)
        );
        assert_eq!(*rx.borrow(), ConnectionStatus::Disconnected);
    }
}
