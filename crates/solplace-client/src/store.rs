//! Canvas state store: authoritative snapshot, optimistic overlay and the
//! diff baseline that keeps the two from double-reporting edits.

use crate::{
    activity::{ActivityEntry, ActivityId, ActivityLog, Origin},
    diff,
    grid::{check_color, Cell, PixelGrid},
    snapshot::CanvasSnapshot,
    Result,
};
use chrono::Utc;
use solana_sdk::pubkey::Pubkey;
use tracing::debug;

/// Merged canvas state consumed by the presentation layer.
///
/// Three copies of the grid are kept apart:
/// - `authoritative`: the last decoded account, never touched locally
/// - `working`: what is displayed, authoritative plus optimistic edits
/// - `baseline`: what the next account update is diffed against
pub struct CanvasStore {
    authoritative: Option<CanvasSnapshot>,
    working: CanvasSnapshot,
    baseline: Option<PixelGrid>,
    activity: ActivityLog,
    next_seq: u64,
}

impl CanvasStore {
    pub fn new(activity_capacity: usize) -> Self {
        Self {
            authoritative: None,
            working: CanvasSnapshot::default(),
            baseline: None,
            activity: ActivityLog::new(activity_capacity),
            next_seq: 0,
        }
    }

    /// Decode and apply a raw account buffer.
    ///
    /// Buffers that fail to decode are ignored and `None` is returned; prior
    /// state is left untouched.
    pub fn apply_account_data(&mut self, data: &[u8]) -> Option<Vec<ActivityEntry>> {
        match CanvasSnapshot::decode(data) {
            Ok(snapshot) => Some(self.apply_snapshot(snapshot)),
            Err(e) => {
                debug!("Ignoring account update: {}", e);
                None
            }
        }
    }

    /// Replace the view with an authoritative snapshot and return the remote
    /// activity it implies. Nothing is reported for the first snapshot.
    pub fn apply_snapshot(&mut self, snapshot: CanvasSnapshot) -> Vec<ActivityEntry> {
        let mut entries = Vec::new();

        // Diff against the baseline before it is replaced.
        if let Some(baseline) = &self.baseline {
            let now = Utc::now();
            for change in diff::changes(baseline, &snapshot.pixels) {
                self.next_seq += 1;
                entries.push(ActivityEntry {
                    id: ActivityId {
                        origin: Origin::Remote,
                        seq: self.next_seq,
                    },
                    painter: snapshot.last_editor,
                    cell: change.cell,
                    color: change.color,
                    timestamp: now,
                });
            }
        }

        if !entries.is_empty() {
            debug!(
                "Account update changed {} cells (last editor {})",
                entries.len(),
                snapshot.last_editor
            );
            self.activity.push_batch(entries.iter().cloned());
        }

        self.baseline = Some(snapshot.pixels.clone());
        self.working = snapshot.clone();
        self.authoritative = Some(snapshot);

        entries
    }

    /// Apply a local placement before the network has seen it.
    ///
    /// The write is folded into the diff baseline so the echo from the next
    /// account update is not reported again. Nothing is rolled back if the
    /// write never lands; the next authoritative snapshot wins.
    pub fn apply_local(&mut self, cell: Cell, color: u8, painter: Pubkey) -> Result<ActivityEntry> {
        let color = check_color(color)?;
        self.working.pixels.set(cell, color)?;
        self.working.pixel_count = self.working.pixel_count.saturating_add(1);
        self.working.last_editor = painter;

        if let Some(baseline) = &mut self.baseline {
            baseline.set(cell, color)?;
        }

        self.next_seq += 1;
        let entry = ActivityEntry {
            id: ActivityId {
                origin: Origin::Local,
                seq: self.next_seq,
            },
            painter,
            cell,
            color,
            timestamp: Utc::now(),
        };
        self.activity.push(entry.clone());

        Ok(entry)
    }

    /// Working view: authoritative state plus optimistic edits
    pub fn canvas(&self) -> &CanvasSnapshot {
        &self.working
    }

    /// Last snapshot received from the network
    pub fn authoritative(&self) -> Option<&CanvasSnapshot> {
        self.authoritative.as_ref()
    }

    pub fn baseline(&self) -> Option<&PixelGrid> {
        self.baseline.as_ref()
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn is_loaded(&self) -> bool {
        self.working.loaded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{layout::MIN_ACCOUNT_LEN, ClientError};

    fn snapshot_with(cells: &[(Cell, u8)], count: u64, editor: Pubkey) -> CanvasSnapshot {
        let mut pixels = PixelGrid::blank();
        for &(cell, color) in cells {
            pixels.set(cell, color).unwrap();
        }
        CanvasSnapshot {
            authority: Pubkey::default(),
            last_editor: editor,
            pixel_count: count,
            pixels,
            loaded: true,
        }
    }

    #[test]
    fn test_first_snapshot_loads_without_activity() {
        let mut store = CanvasStore::new(50);
        assert!(!store.is_loaded());

        let entries = store.apply_snapshot(snapshot_with(&[(Cell::new(1, 1), 2)], 1, Pubkey::new_unique()));
        assert!(entries.is_empty());
        assert!(store.is_loaded());
        assert!(store.activity().is_empty());
        assert_eq!(store.canvas().pixel_count, 1);
    }

    #[test]
    fn test_remote_changes_attributed_to_last_editor() {
        let mut store = CanvasStore::new(50);
        store.apply_snapshot(snapshot_with(&[], 0, Pubkey::default()));

        let editor = Pubkey::new_unique();
        let entries = store.apply_snapshot(snapshot_with(
            &[(Cell::new(2, 0), 4), (Cell::new(9, 9), 5)],
            2,
            editor,
        ));
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.painter == editor && e.origin() == Origin::Remote));
        assert_eq!(store.activity().len(), 2);
        assert_eq!(store.activity().iter().next().unwrap().cell, Cell::new(2, 0));
    }

    #[test]
    fn test_short_buffer_keeps_prior_state() {
        let mut store = CanvasStore::new(50);
        let snapshot = snapshot_with(&[(Cell::new(3, 3), 8)], 7, Pubkey::new_unique());
        store.apply_snapshot(snapshot.clone());

        assert!(store.apply_account_data(&[0u8; 10]).is_none());
        assert!(store.apply_account_data(&vec![1u8; MIN_ACCOUNT_LEN - 1]).is_none());
        assert_eq!(store.canvas(), &snapshot);
        assert_eq!(store.authoritative(), Some(&snapshot));
    }

    #[test]
    fn test_local_write_updates_working_copy_only() {
        let mut store = CanvasStore::new(50);
        let snapshot = snapshot_with(&[], 10, Pubkey::default());
        store.apply_snapshot(snapshot.clone());

        let painter = Pubkey::new_unique();
        let entry = store.apply_local(Cell::new(4, 6), 9, painter).unwrap();

        assert_eq!(entry.origin(), Origin::Local);
        assert_eq!(store.canvas().pixels.get(Cell::new(4, 6)).unwrap(), 9);
        assert_eq!(store.canvas().pixel_count, 11);
        assert_eq!(store.canvas().last_editor, painter);
        assert_eq!(store.authoritative(), Some(&snapshot));
        assert_eq!(store.baseline().unwrap().get(Cell::new(4, 6)).unwrap(), 9);
    }

    #[test]
    fn test_local_write_rejects_bad_input() {
        let mut store = CanvasStore::new(50);
        assert!(matches!(
            store.apply_local(Cell::new(64, 0), 1, Pubkey::default()),
            Err(ClientError::OutOfBounds { .. })
        ));
        assert!(matches!(
            store.apply_local(Cell::new(0, 0), 16, Pubkey::default()),
            Err(ClientError::InvalidColor(16))
        ));
        assert!(store.activity().is_empty());
        assert_eq!(store.canvas().pixel_count, 0);
    }

    #[test]
    fn test_echo_of_local_write_is_not_reported() {
        let mut store = CanvasStore::new(50);
        store.apply_snapshot(snapshot_with(&[], 0, Pubkey::default()));

        let painter = Pubkey::new_unique();
        store.apply_local(Cell::new(5, 5), 3, painter).unwrap();

        let entries = store.apply_snapshot(snapshot_with(&[(Cell::new(5, 5), 3)], 1, painter));
        assert!(entries.is_empty());
        assert_eq!(store.activity().len(), 1);
    }

    #[test]
    fn test_authoritative_read_overrides_lost_write() {
        let mut store = CanvasStore::new(50);
        store.apply_snapshot(snapshot_with(&[], 0, Pubkey::default()));
        store.apply_local(Cell::new(1, 1), 6, Pubkey::new_unique()).unwrap();

        // The write never landed; another painter touched a different cell.
        let other = Pubkey::new_unique();
        let entries = store.apply_snapshot(snapshot_with(&[(Cell::new(2, 2), 7)], 1, other));

        // The lost write shows up as a change back to the stored color.
        assert_eq!(entries.len(), 2);
        assert_eq!(store.canvas().pixels.get(Cell::new(1, 1)).unwrap(), 0);
        assert_eq!(store.canvas().pixel_count, 1);
    }

    #[test]
    fn test_ids_unique_across_origins() {
        let mut store = CanvasStore::new(50);
        store.apply_snapshot(snapshot_with(&[], 0, Pubkey::default()));
        store.apply_local(Cell::new(0, 0), 1, Pubkey::default()).unwrap();
        store.apply_snapshot(snapshot_with(&[(Cell::new(0, 0), 1), (Cell::new(1, 0), 2)], 2, Pubkey::default()));
        store.apply_local(Cell::new(2, 0), 3, Pubkey::default()).unwrap();

        let mut seqs: Vec<u64> = store.activity().iter().map(|e| e.id.seq).collect();
        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), store.activity().len());
    }
}
