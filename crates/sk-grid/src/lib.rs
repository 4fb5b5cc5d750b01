//! Tactical grid for Skirmish.
//!
//! A purely spatial model of the battlefield: terrain costs and obstacles,
//! weighted reachability, attack coverage, line of sight, and threat
//! zones. Knows nothing about combat rules; callers pass in the positions
//! of occupants and hostiles.

/// Error types for grid operations.
pub mod error;
/// Grid bounds, per-cell terrain and the serialized layout.
pub mod grid;
/// Weighted movement and reachability.
pub mod reach;
/// Line of sight, attack coverage and threat zones.
pub mod sight;
/// Terrain kinds and per-cell properties.
pub mod terrain;

pub use error::{GridError, GridResult};
pub use grid::{GridLayout, TacticalGrid, TerrainPlacement};
pub use terrain::{Terrain, TerrainCell};
