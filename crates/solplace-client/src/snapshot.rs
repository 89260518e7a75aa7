//! Canvas account decoding

use crate::{
    grid::PixelGrid,
    layout::{
        AUTHORITY_OFFSET, CANVAS_HEIGHT, CANVAS_WIDTH, DISCRIMINATOR_SIZE, GRID_CELLS,
        HEIGHT_OFFSET, LAST_EDITOR_OFFSET, MIN_ACCOUNT_LEN, PIXELS_OFFSET, PIXEL_COUNT_OFFSET,
        PUBKEY_SIZE, WIDTH_OFFSET,
    },
    program,
};
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// Why a buffer could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("account data too short: {len} bytes, need at least {min}")]
    TooShort { len: usize, min: usize },
}

/// Decoded canvas account
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanvasSnapshot {
    /// Key that initialized the canvas
    pub authority: Pubkey,

    /// Signer of the most recent placement
    pub last_editor: Pubkey,

    /// Total placements ever made
    pub pixel_count: u64,

    pub pixels: PixelGrid,

    /// False until the first successful decode
    pub loaded: bool,
}

impl CanvasSnapshot {
    /// Decode a raw account buffer.
    ///
    /// Only the length is checked. Width/height bytes and the discriminator
    /// are not validated, and color bytes are kept as stored.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < MIN_ACCOUNT_LEN {
            return Err(DecodeError::TooShort {
                len: data.len(),
                min: MIN_ACCOUNT_LEN,
            });
        }

        let authority = Pubkey::new_from_array(read_array(data, AUTHORITY_OFFSET)?);
        let last_editor = Pubkey::new_from_array(read_array(data, LAST_EDITOR_OFFSET)?);
        let pixel_count = u64::from_le_bytes(read_array(data, PIXEL_COUNT_OFFSET)?);
        let pixels = PixelGrid::from_slice(&data[PIXELS_OFFSET..PIXELS_OFFSET + GRID_CELLS])
            .ok_or(DecodeError::TooShort {
                len: data.len(),
                min: MIN_ACCOUNT_LEN,
            })?;

        Ok(Self {
            authority,
            last_editor,
            pixel_count,
            pixels,
            loaded: true,
        })
    }

    /// Serialize into the account layout, `MIN_ACCOUNT_LEN` bytes long
    pub fn encode(&self) -> Vec<u8> {
        let mut data = vec![0u8; MIN_ACCOUNT_LEN];
        data[..DISCRIMINATOR_SIZE].copy_from_slice(&program::canvas_discriminator());
        data[AUTHORITY_OFFSET..AUTHORITY_OFFSET + PUBKEY_SIZE]
            .copy_from_slice(self.authority.as_ref());
        data[WIDTH_OFFSET] = CANVAS_WIDTH as u8;
        data[HEIGHT_OFFSET] = CANVAS_HEIGHT as u8;
        data[LAST_EDITOR_OFFSET..LAST_EDITOR_OFFSET + PUBKEY_SIZE]
            .copy_from_slice(self.last_editor.as_ref());
        data[PIXEL_COUNT_OFFSET..PIXEL_COUNT_OFFSET + 8]
            .copy_from_slice(&self.pixel_count.to_le_bytes());
        data[PIXELS_OFFSET..].copy_from_slice(self.pixels.as_bytes());
        data
    }
}

fn read_array<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N], DecodeError> {
    data.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::TooShort {
            len: data.len(),
            min: offset + N,
        })
}
