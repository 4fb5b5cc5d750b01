//! Terrain kinds and what a cell costs, hides and shields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Movement class of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    /// Normal ground, cost multiplier 1.
    #[default]
    Open,
    /// Rubble, undergrowth, shallow water: cost multiplier 2.
    Difficult,
    /// Impassable: walls, pillars, deep chasms.
    Obstacle,
}

impl Terrain {
    /// Movement cost multiplier, or `None` for impassable terrain.
    pub fn cost_multiplier(self) -> Option<u32> {
        match self {
            Self::Open => Some(1),
            Self::Difficult => Some(2),
            Self::Obstacle => None,
        }
    }

    /// Single-character map glyph.
    pub fn glyph(self) -> char {
        match self {
            Self::Open => '.',
            Self::Difficult => '~',
            Self::Obstacle => '#',
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Difficult => write!(f, "difficult"),
            Self::Obstacle => write!(f, "obstacle"),
        }
    }
}

/// Everything the grid knows about one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainCell {
    /// Movement class.
    pub terrain: Terrain,
    /// Whether the cell interrupts line of sight.
    pub blocks_line_of_sight: bool,
    /// AC bonus for a creature standing here, against ranged attacks only.
    pub cover_bonus: i32,
}

impl TerrainCell {
    /// An open cell with no cover.
    pub fn open() -> Self {
        Self::default()
    }

    /// A difficult-terrain cell.
    pub fn difficult() -> Self {
        Self {
            terrain: Terrain::Difficult,
            ..Self::default()
        }
    }

    /// An impassable cell that also blocks sight.
    pub fn obstacle() -> Self {
        Self {
            terrain: Terrain::Obstacle,
            blocks_line_of_sight: true,
            cover_bonus: 0,
        }
    }

    /// Set the cover bonus.
    pub fn with_cover(mut self, bonus: i32) -> Self {
        self.cover_bonus = bonus;
        self
    }

    /// Set whether the cell blocks sight.
    pub fn with_blocks_sight(mut self, blocks: bool) -> Self {
        self.blocks_line_of_sight = blocks;
        self
    }

    /// Returns true if sight cannot pass through this cell.
    pub fn occludes(&self) -> bool {
        self.blocks_line_of_sight || self.terrain == Terrain::Obstacle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipliers() {
        assert_eq!(Terrain::Open.cost_multiplier(), Some(1));
        assert_eq!(Terrain::Difficult.cost_multiplier(), Some(2));
        assert_eq!(Terrain::Obstacle.cost_multiplier(), None);
    }

    #[test]
    fn obstacles_occlude() {
        assert!(TerrainCell::obstacle().occludes());
        assert!(!TerrainCell::difficult().occludes());
        assert!(TerrainCell::open().with_blocks_sight(true).occludes());
        // an obstacle with the flag cleared still occludes
        assert!(TerrainCell::obstacle().with_blocks_sight(false).occludes());
    }

    #[test]
    fn cell_from_partial_json() {
        let cell: TerrainCell = serde_json::from_str(r#"{"cover_bonus": 2}"#).unwrap();
        assert_eq!(cell.terrain, Terrain::Open);
        assert_eq!(cell.cover_bonus, 2);
    }
}
