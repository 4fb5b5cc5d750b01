//! Line of sight, attack coverage, and threat zones.

use std::collections::HashSet;

use sk_core::Position;

use crate::grid::TacticalGrid;

impl TacticalGrid {
    /// Cells strictly between `a` and `b` along the straight line, one per
    /// step of the larger axis.
    ///
    /// Intermediate coordinates round half up (`floor(t + 1/2)`), which
    /// shifts cleanly by whole cells, so walking `b` to `a` visits the same
    /// cells as `a` to `b`.
    pub fn line_between(a: Position, b: Position) -> Vec<Position> {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let steps = dx.abs().max(dy.abs());
        (1..steps)
            .map(|i| {
                Position::new(
                    a.x + round_half_up(dx * i, steps),
                    a.y + round_half_up(dy * i, steps),
                )
            })
            .collect()
    }

    /// Returns true if nothing between `a` and `b` blocks sight. The
    /// endpoints themselves never block.
    pub fn has_line_of_sight(&self, a: Position, b: Position) -> bool {
        Self::line_between(a, b)
            .into_iter()
            .all(|p| !self.cell(p).occludes())
    }

    /// Returns true if a combatant at `origin` can attack `target`.
    ///
    /// Adjacent in-bounds cells always qualify. Ranged combatants also
    /// reach cells within `radius_squares` (Chebyshev) that are in line of
    /// sight. An obstacle can be a target cell; it only blocks what lies
    /// behind it.
    pub fn in_attack_range(
        &self,
        origin: Position,
        target: Position,
        ranged: bool,
        radius_squares: u32,
    ) -> bool {
        if target == origin || !self.in_bounds(target) {
            return false;
        }
        if origin.is_adjacent(target) {
            return true;
        }
        ranged
            && origin.chebyshev(target) <= radius_squares
            && self.has_line_of_sight(origin, target)
    }

    /// Every cell a combatant at `origin` can attack (see
    /// [`in_attack_range`](Self::in_attack_range)).
    pub fn attack_range(
        &self,
        origin: Position,
        ranged: bool,
        radius_squares: u32,
    ) -> HashSet<Position> {
        let r = if ranged { radius_squares.max(1) } else { 1 } as i32;
        let mut cells = HashSet::new();
        for y in (origin.y - r)..=(origin.y + r) {
            for x in (origin.x - r)..=(origin.x + r) {
                let target = Position::new(x, y);
                if self.in_attack_range(origin, target, ranged, radius_squares) {
                    cells.insert(target);
                }
            }
        }
        cells
    }

    /// Cells within reach 1 of any of the given hostile positions, clipped
    /// to the grid. Callers pass only living hostiles.
    pub fn threat_zone(&self, hostiles: impl IntoIterator<Item = Position>) -> HashSet<Position> {
        hostiles
            .into_iter()
            .flat_map(|h| self.neighbors_in_bounds(h).collect::<Vec<_>>())
            .collect()
    }
}

fn round_half_up(numerator: i32, denominator: i32) -> i32 {
    (2 * numerator + denominator).div_euclid(2 * denominator)
}
