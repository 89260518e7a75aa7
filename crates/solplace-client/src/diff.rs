//! Cell-level diffing between two grids

use crate::grid::{Cell, PixelGrid};
use serde::{Deserialize, Serialize};

/// A cell whose color differs between two grids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    pub cell: Cell,
    /// Color in the newer grid
    pub color: u8,
}

/// Changed cells from `prev` to `next`, in row-major order.
///
/// Linear in the grid size and allocation-free; callers decide whether to
/// collect.
pub fn changes<'a>(prev: &'a PixelGrid, next: &'a PixelGrid) -> impl Iterator<Item = CellChange> + 'a {
    prev.as_bytes()
        .iter()
        .zip(next.as_bytes().iter())
        .enumerate()
        .filter(|(_, (old, new))| old != new)
        .map(|(index, (_, &color))| CellChange {
            cell: Cell::from_index(index),
            color,
        })
}
