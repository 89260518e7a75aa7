//! Byte layout of the on-chain canvas account
//!
//! The program stores the canvas as a zero-copy `repr(C)` Anchor account:
//!
//! ```text
//! 8 (discriminator) + 32 (authority) + 1 (width) + 1 (height) + 6 (padding)
//!   + 32 (last_editor) + 8 (pixel_count) + 4096 (pixels)
//! ```

/// Canvas width in cells
pub const CANVAS_WIDTH: usize = 64;

/// Canvas height in cells
pub const CANVAS_HEIGHT: usize = 64;

/// Total number of cells, one byte each
pub const GRID_CELLS: usize = CANVAS_WIDTH * CANVAS_HEIGHT;

pub const DISCRIMINATOR_SIZE: usize = 8;
pub const PUBKEY_SIZE: usize = 32;

pub const AUTHORITY_OFFSET: usize = DISCRIMINATOR_SIZE;
pub const WIDTH_OFFSET: usize = AUTHORITY_OFFSET + PUBKEY_SIZE;
pub const HEIGHT_OFFSET: usize = WIDTH_OFFSET + 1;
pub const PADDING_OFFSET: usize = HEIGHT_OFFSET + 1;
pub const PADDING_SIZE: usize = 6;
pub const LAST_EDITOR_OFFSET: usize = PADDING_OFFSET + PADDING_SIZE;
pub const PIXEL_COUNT_OFFSET: usize = LAST_EDITOR_OFFSET + PUBKEY_SIZE;
pub const PIXELS_OFFSET: usize = PIXEL_COUNT_OFFSET + 8;

/// Smallest buffer the decoder accepts
pub const MIN_ACCOUNT_LEN: usize = PIXELS_OFFSET + GRID_CELLS;

// Offsets must match the program's `Canvas::SIZE` and its u64 alignment.
const _: () = assert!(MIN_ACCOUNT_LEN == 8 + 32 + 1 + 1 + 6 + 32 + 8 + 4096);
const _: () = assert!(LAST_EDITOR_OFFSET == 48);
const _: () = assert!(PIXEL_COUNT_OFFSET % 8 == 0);
const _: () = assert!(PIXELS_OFFSET == 88);
const _: () = assert!(CANVAS_WIDTH <= u8::MAX as usize + 1);
const _: () = assert!(CANVAS_HEIGHT <= u8::MAX as usize + 1);
