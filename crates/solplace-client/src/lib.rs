//! SolPlace canvas client
//!
//! Live view of the shared 64x64 pixel canvas on an ephemeral rollup. Mirrors
//! the canvas account over a WebSocket subscription, derives an activity feed
//! by diffing successive snapshots, and places pixels optimistically with a
//! funded session key.

// ================================
// Module Declarations
// ================================

pub mod core;

// Account layout and decoding
pub mod layout;
pub mod snapshot;

// Canvas state and reconciliation
pub mod activity;
pub mod diff;
pub mod grid;
pub mod store;

// Presentation helpers
pub mod format;
pub mod palette;

// Program interaction
pub mod program;
pub mod rpc;
pub mod session;

// View lifecycle and events
pub mod events;
pub mod status;
pub mod view;

// ================================
// Public API Re-exports
// ================================

// Configuration and errors
pub use self::core::{ClientConfig, ClientError, Result};

// Canvas state
pub use activity::{ActivityEntry, ActivityId, ActivityLog, Origin};
pub use grid::{Cell, PixelGrid};
pub use snapshot::{CanvasSnapshot, DecodeError};
pub use store::CanvasStore;

// Program and session
pub use program::{canvas_pda, place_pixel_instruction, PixelPlacement, PROGRAM_ID};
pub use session::{SessionCredential, SessionPhase};

// Collaborators
pub use rpc::{
    AccountSource, AccountSubscription, BlockhashCache, Collaborators, Funder, PixelWriter,
    ReferenceSource, RollupConnection, RollupWriter, WalletFunder,
};

// View and events
pub use events::{CanvasEvent, EventStream};
pub use status::ConnectionStatus;
pub use view::{CanvasView, ViewHandle};
