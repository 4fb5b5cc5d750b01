//! The grid itself: bounds, per-cell terrain, and the file layout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use sk_core::Position;

use crate::error::{GridError, GridResult};
use crate::terrain::{Terrain, TerrainCell};

const DEFAULT_FEET_PER_SQUARE: u32 = 5;

/// A rectangular battlefield of square cells.
///
/// Cells without an explicit entry are open ground. Positions run from
/// `(0, 0)` to `(width - 1, height - 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridLayout", into = "GridLayout")]
pub struct TacticalGrid {
    width: i32,
    height: i32,
    feet_per_square: u32,
    cells: HashMap<Position, TerrainCell>,
}

/// One non-default cell in a [`GridLayout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainPlacement {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Cell contents.
    #[serde(flatten)]
    pub cell: TerrainCell,
}

/// Serialized form of a grid, as found in encounter files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// Feet per square (default 5).
    #[serde(default = "default_feet_per_square")]
    pub feet_per_square: u32,
    /// Non-open cells.
    #[serde(default)]
    pub terrain: Vec<TerrainPlacement>,
}

fn default_feet_per_square() -> u32 {
    DEFAULT_FEET_PER_SQUARE
}

impl TacticalGrid {
    /// Create an all-open grid.
    pub fn new(width: i32, height: i32) -> GridResult<Self> {
        if width <= 0 || height <= 0 {
            return Err(GridError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            feet_per_square: DEFAULT_FEET_PER_SQUARE,
            cells: HashMap::new(),
        })
    }

    /// Set the size of a square in feet.
    pub fn with_feet_per_square(mut self, feet: u32) -> Self {
        self.feet_per_square = feet.max(1);
        self
    }

    /// Place a cell, builder style.
    pub fn with_cell(mut self, position: Position, cell: TerrainCell) -> GridResult<Self> {
        self.set_cell(position, cell)?;
        Ok(self)
    }

    /// Number of columns.
    pub fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Feet per square.
    pub fn feet_per_square(&self) -> u32 {
        self.feet_per_square
    }

    /// Returns true if the position lies on the grid.
    pub fn in_bounds(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }

    /// Terrain at a position (open if never set).
    pub fn cell(&self, position: Position) -> TerrainCell {
        self.cells.get(&position).copied().unwrap_or_default()
    }

    /// Terrain class at a position.
    pub fn terrain_at(&self, position: Position) -> Terrain {
        self.cell(position).terrain
    }

    /// Ranged-attack cover bonus at a position.
    pub fn cover_at(&self, position: Position) -> i32 {
        self.cell(position).cover_bonus
    }

    /// Replace the terrain of a cell.
    pub fn set_cell(&mut self, position: Position, cell: TerrainCell) -> GridResult<()> {
        if !self.in_bounds(position) {
            return Err(GridError::OutOfBounds(position));
        }
        if cell == TerrainCell::default() {
            self.cells.remove(&position);
        } else {
            self.cells.insert(position, cell);
        }
        Ok(())
    }

    /// Returns true if a combatant may stand on or pass through the cell.
    pub fn is_passable(&self, position: Position) -> bool {
        self.in_bounds(position) && self.terrain_at(position) != Terrain::Obstacle
    }

    /// Check that a combatant may be placed here.
    pub fn validate_placement(&self, position: Position) -> GridResult<()> {
        if !self.in_bounds(position) {
            return Err(GridError::OutOfBounds(position));
        }
        if self.terrain_at(position) == Terrain::Obstacle {
            return Err(GridError::Obstacle(position));
        }
        Ok(())
    }

    /// In-bounds neighbours of a position.
    pub fn neighbors_in_bounds(&self, position: Position) -> impl Iterator<Item = Position> + '_ {
        position.neighbors().filter(|p| self.in_bounds(*p))
    }

    /// Every position on the grid, row by row.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }

    /// The explicitly set cells.
    pub fn cells(&self) -> &HashMap<Position, TerrainCell> {
        &self.cells
    }
}

impl TryFrom<GridLayout> for TacticalGrid {
    type Error = GridError;

    fn try_from(layout: GridLayout) -> Result<Self, Self::Error> {
        let mut grid =
            Self::new(layout.width, layout.height)?.with_feet_per_square(layout.feet_per_square);
        for placement in layout.terrain {
            grid.set_cell(Position::new(placement.x, placement.y), placement.cell)?;
        }
        Ok(grid)
    }
}

impl From<TacticalGrid> for GridLayout {
    fn from(grid: TacticalGrid) -> Self {
        let mut terrain: Vec<TerrainPlacement> = grid
            .cells
            .into_iter()
            .map(|(pos, cell)| TerrainPlacement {
                x: pos.x,
                y: pos.y,
                cell,
            })
            .collect();
        terrain.sort_by_key(|p| (p.y, p.x));
        Self {
            width: grid.width,
            height: grid.height,
            feet_per_square: grid.feet_per_square,
            terrain,
        }
    }
}
