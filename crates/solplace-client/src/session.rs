//! Ephemeral session key lifecycle
//!
//! A session key signs every pixel placement so the primary wallet is only
//! prompted once, for the funding transfer. The key lives in memory for the
//! lifetime of the view and is never persisted.
//!
//! ```text
//! uninitialized --begin_setup--> funding --success--> ready
//!                                funding --failure--> uninitialized
//! ```

use crate::{rpc::Funder, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
};
use std::{fmt, sync::Arc};
use tracing::{debug, info, warn};

/// Observable phase of the session key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    Funding,
    Ready,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Uninitialized => write!(f, "uninitialized"),
            SessionPhase::Funding => write!(f, "funding"),
            SessionPhase::Ready => write!(f, "ready"),
        }
    }
}

enum State {
    Uninitialized,
    Funding(Arc<Keypair>),
    Ready(Arc<Keypair>),
}

/// Session key state machine
pub struct SessionCredential {
    state: State,
}

impl SessionCredential {
    pub fn new() -> Self {
        Self {
            state: State::Uninitialized,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match self.state {
            State::Uninitialized => SessionPhase::Uninitialized,
            State::Funding(_) => SessionPhase::Funding,
            State::Ready(_) => SessionPhase::Ready,
        }
    }

    /// Generate a key and enter `funding`.
    ///
    /// Returns the key to fund, or `None` when a setup is already in flight
    /// or the key is ready.
    pub fn begin_setup(&mut self) -> Option<Arc<Keypair>> {
        match self.state {
            State::Uninitialized => {
                let keypair = Arc::new(Keypair::new());
                info!("Generated session key {}", keypair.pubkey());
                self.state = State::Funding(keypair.clone());
                Some(keypair)
            }
            State::Funding(_) => {
                debug!("Session setup already in flight");
                None
            }
            State::Ready(_) => None,
        }
    }

    /// Apply the outcome of funding `target`.
    ///
    /// Outcomes for a key other than the one being funded are ignored.
    pub fn finish_setup(&mut self, target: Pubkey, outcome: Result<Signature>) -> SessionPhase {
        let state = std::mem::replace(&mut self.state, State::Uninitialized);
        self.state = match state {
            State::Funding(keypair) if keypair.pubkey() == target => match outcome {
                Ok(signature) => {
                    info!("Session key {} funded ({})", target, signature);
                    State::Ready(keypair)
                }
                Err(e) => {
                    warn!("Failed to fund session key {}: {}", target, e);
                    State::Uninitialized
                }
            },
            other => {
                debug!("Ignoring funding outcome for {}", target);
                other
            }
        };
        self.phase()
    }

    /// Run a complete setup: generate, fund, confirm.
    pub async fn setup(&mut self, funder: &dyn Funder, lamports: u64) -> SessionPhase {
        let Some(keypair) = self.begin_setup() else {
            return self.phase();
        };
        let target = keypair.pubkey();
        let outcome = funder.fund(target, lamports).await;
        self.finish_setup(target, outcome)
    }

    /// Signing key, available only once funded
    pub fn signer(&self) -> Option<Arc<Keypair>> {
        match &self.state {
            State::Ready(keypair) => Some(keypair.clone()),
            _ => None,
        }
    }

    /// Public key of the current key, if one has been generated
    pub fn pubkey(&self) -> Option<Pubkey> {
        match &self.state {
            State::Funding(keypair) | State::Ready(keypair) => Some(keypair.pubkey()),
            State::Uninitialized => None,
        }
    }
}

impl Default for SessionCredential {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("phase", &self.phase())
            .field("pubkey", &self.pubkey())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rpc::MockFunder, ClientError};

    #[test]
    fn test_setup_success_path() {
        let mut session = SessionCredential::new();
        assert_eq!(session.phase(), SessionPhase::Uninitialized);
        assert!(session.signer().is_none());

        let keypair = session.begin_setup().unwrap();
        assert_eq!(session.phase(), SessionPhase::Funding);
        assert!(session.signer().is_none());

        let phase = session.finish_setup(keypair.pubkey(), Ok(Signature::default()));
        assert_eq!(phase, SessionPhase::Ready);
        assert_eq!(session.signer().unwrap().pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_failure_returns_to_uninitialized() {
        let mut session = SessionCredential::new();
        let keypair = session.begin_setup().unwrap();

        let phase = session.finish_setup(
            keypair.pubkey(),
            Err(ClientError::FundingFailed("rejected".to_string())),
        );
        assert_eq!(phase, SessionPhase::Uninitialized);
        assert!(session.pubkey().is_none());

        // Retry generates a fresh key.
        let retry = session.begin_setup().unwrap();
        assert_ne!(retry.pubkey(), keypair.pubkey());
    }

    #[test]
    fn test_setup_while_funding_is_noop() {
        let mut session = SessionCredential::new();
        let keypair = session.begin_setup().unwrap();

        assert!(session.begin_setup().is_none());
        assert_eq!(session.phase(), SessionPhase::Funding);
        assert_eq!(session.pubkey(), Some(keypair.pubkey()));
    }

    #[test]
    fn test_ready_is_terminal() {
        let mut session = SessionCredential::new();
        let keypair = session.begin_setup().unwrap();
        session.finish_setup(keypair.pubkey(), Ok(Signature::default()));

        assert!(session.begin_setup().is_none());
        let phase = session.finish_setup(
            keypair.pubkey(),
            Err(ClientError::FundingFailed("late".to_string())),
        );
        assert_eq!(phase, SessionPhase::Ready);
    }

    #[test]
    fn test_outcome_for_other_key_ignored() {
        let mut session = SessionCredential::new();
        session.begin_setup().unwrap();

        let phase = session.finish_setup(Pubkey::new_unique(), Ok(Signature::default()));
        assert_eq!(phase, SessionPhase::Funding);
    }

    #[tokio::test]
    async fn test_setup_funds_generated_key() {
        let mut funder = MockFunder::new();
        funder
            .expect_fund()
            .withf(|_, lamports| *lamports == 10_000_000)
            .times(1)
            .returning(|_, _| Ok(Signature::default()));

        let mut session = SessionCredential::new();
        let phase = session.setup(&funder, 10_000_000).await;
        assert_eq!(phase, SessionPhase::Ready);

        // Already ready: the funder must not be called again.
        assert_eq!(session.setup(&funder, 10_000_000).await, SessionPhase::Ready);
    }

    #[tokio::test]
    async fn test_setup_failure_allows_retry() {
        let mut funder = MockFunder::new();
        funder
            .expect_fund()
            .times(1)
            .returning(|_, _| Err(ClientError::FundingFailed("user rejected".to_string())));

        let mut session = SessionCredential::new();
        assert_eq!(
            session.setup(&funder, 1).await,
            SessionPhase::Uninitialized
        );
    }
}
