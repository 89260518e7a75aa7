//! SolPlace program addressing and instruction encoding

use crate::grid::Cell;
use sha2::{Digest, Sha256};
use solana_sdk::{
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

/// Deployed SolPlace program
pub const PROGRAM_ID: Pubkey = solana_sdk::pubkey!("CQCS2S6uj46VD2WEScxJLSWWNB8zYUppUHNS5GecMU8J");

/// Seed of the single canvas PDA
pub const CANVAS_SEED: &[u8] = b"canvas";

/// Canvas account address and bump for a program
pub fn canvas_pda(program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[CANVAS_SEED], program_id)
}

/// Anchor discriminator: first 8 bytes of `sha256("<namespace>:<name>")`
fn discriminator(preimage: &str) -> [u8; 8] {
    let hash = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Account discriminator of the `Canvas` account
pub fn canvas_discriminator() -> [u8; 8] {
    discriminator("account:Canvas")
}

/// A single placement to submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelPlacement {
    pub cell: Cell,
    pub color: u8,
}

/// Build `place_pixel(x, y, color)` signed by `painter` against `canvas`
pub fn place_pixel_instruction(
    program_id: Pubkey,
    canvas: Pubkey,
    painter: Pubkey,
    placement: PixelPlacement,
) -> Instruction {
    let mut data = discriminator("global:place_pixel").to_vec();
    data.extend_from_slice(&[placement.cell.x, placement.cell.y, placement.color]);

    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::new(painter, true), // Painter, also fee payer
            AccountMeta::new(canvas, false), // Canvas PDA
        ],
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canvas_pda_is_deterministic() {
        let (a, bump_a) = canvas_pda(&PROGRAM_ID);
        let (b, bump_b) = canvas_pda(&PROGRAM_ID);
        assert_eq!(a, b);
        assert_eq!(bump_a, bump_b);
        assert_ne!(canvas_pda(&Pubkey::new_unique()).0, a);
    }

    #[test]
    fn test_place_pixel_encoding() {
        let canvas = Pubkey::new_unique();
        let painter = Pubkey::new_unique();
        let ix = place_pixel_instruction(
            PROGRAM_ID,
            canvas,
            painter,
            PixelPlacement {
                cell: Cell::new(5, 6),
                color: 3,
            },
        );

        assert_eq!(ix.program_id, PROGRAM_ID);
        assert_eq!(ix.data.len(), 11);
        assert_eq!(&ix.data[..8], &discriminator("global:place_pixel"));
        assert_eq!(&ix.data[8..], &[5, 6, 3]);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].pubkey == painter);
        assert!(ix.accounts[1].is_writable && !ix.accounts[1].is_signer);
    }

    #[test]
    fn test_discriminators_differ() {
        assert_ne!(canvas_discriminator(), discriminator("global:place_pixel"));
    }
}
