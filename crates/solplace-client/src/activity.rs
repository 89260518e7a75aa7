//! Bounded, newest-first log of recent cell changes

use crate::grid::Cell;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::{collections::VecDeque, fmt};

/// Where an activity entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Detected by diffing an authoritative account update
    Remote,
    /// Applied optimistically by this client
    Local,
}

/// Store-unique activity id; the sequence is shared by both origins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId {
    pub origin: Origin,
    pub seq: u64,
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            Origin::Remote => write!(f, "ws-{}", self.seq),
            Origin::Local => write!(f, "opt-{}", self.seq),
        }
    }
}

/// One recorded placement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub painter: Pubkey,
    pub cell: Cell,
    pub color: u8,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEntry {
    pub fn origin(&self) -> Origin {
        self.id.origin
    }
}

/// Newest-first activity log holding at most `capacity` entries
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend a batch, keeping the batch's own order, then drop the oldest
    /// entries beyond capacity.
    pub fn push_batch<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = ActivityEntry>,
        I::IntoIter: DoubleEndedIterator,
    {
        for entry in batch.into_iter().rev() {
            self.entries.push_front(entry);
        }
        self.entries.truncate(self.capacity);
    }

    pub fn push(&mut self, entry: ActivityEntry) {
        self.push_batch(std::iter::once(entry));
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
