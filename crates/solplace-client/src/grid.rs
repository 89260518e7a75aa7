//! Fixed-size pixel grid and cell coordinates

use crate::{
    layout::{CANVAS_HEIGHT, CANVAS_WIDTH, GRID_CELLS},
    palette::PALETTE_SIZE,
    ClientError, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell coordinate on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: u8,
    pub y: u8,
}

impl Cell {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Row-major index, or an error when the cell lies outside the canvas
    pub fn index(self) -> Result<usize> {
        let (x, y) = (usize::from(self.x), usize::from(self.y));
        if x >= CANVAS_WIDTH || y >= CANVAS_HEIGHT {
            return Err(ClientError::OutOfBounds {
                x: self.x,
                y: self.y,
            });
        }
        Ok(y * CANVAS_WIDTH + x)
    }

    /// Inverse of [`Cell::index`] for indices below `GRID_CELLS`
    pub(crate) fn from_index(index: usize) -> Self {
        Self {
            x: (index % CANVAS_WIDTH) as u8,
            y: (index / CANVAS_WIDTH) as u8,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Validate a color index against the palette the program accepts
pub fn check_color(color: u8) -> Result<u8> {
    if usize::from(color) >= PALETTE_SIZE {
        return Err(ClientError::InvalidColor(color));
    }
    Ok(color)
}

/// Row-major grid of palette indices, always exactly `GRID_CELLS` long
#[derive(Clone, PartialEq, Eq)]
pub struct PixelGrid {
    cells: Box<[u8; GRID_CELLS]>,
}

impl PixelGrid {
    /// All-zero (black) grid
    pub fn blank() -> Self {
        Self {
            cells: Box::new([0u8; GRID_CELLS]),
        }
    }

    /// Copy a grid out of a slice of exactly `GRID_CELLS` bytes
    pub(crate) fn from_slice(bytes: &[u8]) -> Option<Self> {
        let cells: [u8; GRID_CELLS] = bytes.try_into().ok()?;
        Some(Self {
            cells: Box::new(cells),
        })
    }

    pub fn as_bytes(&self) -> &[u8; GRID_CELLS] {
        &self.cells
    }

    pub fn get(&self, cell: Cell) -> Result<u8> {
        Ok(self.cells[cell.index()?])
    }

    pub fn set(&mut self, cell: Cell, color: u8) -> Result<()> {
        let index = cell.index()?;
        self.cells[index] = color;
        Ok(())
    }
}

impl Default for PixelGrid {
    fn default() -> Self {
        Self::blank()
    }
}

impl fmt::Debug for PixelGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let painted = self.cells.iter().filter(|&&c| c != 0).count();
        f.debug_struct("PixelGrid")
            .field("width", &CANVAS_WIDTH)
            .field("height", &CANVAS_HEIGHT)
            .field("painted", &painted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_index_row_major() {
        assert_eq!(Cell::new(0, 0).index().unwrap(), 0);
        assert_eq!(Cell::new(5, 5).index().unwrap(), 5 * 64 + 5);
        assert_eq!(Cell::new(63, 63).index().unwrap(), GRID_CELLS - 1);
        assert_eq!(Cell::from_index(5 * 64 + 5), Cell::new(5, 5));
    }

    #[test]
    fn test_cell_out_of_bounds() {
        assert!(matches!(
            Cell::new(64, 0).index(),
            Err(ClientError::OutOfBounds { x: 64, y: 0 })
        ));
        assert!(Cell::new(0, 200).index().is_err());
    }

    #[test]
    fn test_check_color() {
        assert_eq!(check_color(15).unwrap(), 15);
        assert!(matches!(check_color(16), Err(ClientError::InvalidColor(16))));
    }

    #[test]
    fn test_grid_set_get() {
        let mut grid = PixelGrid::blank();
        grid.set(Cell::new(3, 7), 9).unwrap();
        assert_eq!(grid.get(Cell::new(3, 7)).unwrap(), 9);
        assert_eq!(grid.as_bytes()[7 * 64 + 3], 9);
        assert_eq!(grid.as_bytes().len(), GRID_CELLS);
    }

    #[test]
    fn test_from_slice_requires_exact_length() {
        assert!(PixelGrid::from_slice(&[0u8; GRID_CELLS - 1]).is_none());
        assert!(PixelGrid::from_slice(&[1u8; GRID_CELLS]).is_some());
    }
}
