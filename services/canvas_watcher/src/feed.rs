//! Log lines for canvas events

use chrono::{DateTime, Utc};
use solplace_client::{
    format::{time_ago, truncate_address},
    palette::color_of,
    ActivityEntry, CanvasEvent,
};
use tracing::{info, warn};

pub fn describe(entry: &ActivityEntry, now: DateTime<Utc>) -> String {
    format!(
        "[{}] {} painted {} {} ({}) {}",
        entry.id,
        truncate_address(&entry.painter.to_string()),
        entry.cell,
        color_of(entry.color).name,
        color_of(entry.color).hex(),
        time_ago(entry.timestamp, now),
    )
}

pub fn log_event(event: &CanvasEvent) {
    match event {
        CanvasEvent::SnapshotApplied {
            pixel_count,
            changed_cells,
        } => info!(
            "Canvas updated: {} placements total, {} cells changed",
            pixel_count, changed_cells
        ),
        CanvasEvent::Activity(entries) => {
            let now = Utc::now();
            for entry in entries {
                info!("{}", describe(entry, now));
            }
        }
        CanvasEvent::SessionChanged(phase) => info!("Session key {}", phase),
        CanvasEvent::ConnectionChanged(status) => info!("Rollup {}", status),
        CanvasEvent::SubscriptionEnded => warn!("Live updates stopped"),
    }
}
