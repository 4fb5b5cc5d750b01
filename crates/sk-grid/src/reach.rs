//! Weighted reachability over the 8-connected grid.
//!
//! Costs are tracked in half-squares so diagonal steps (1.5 squares) stay
//! integral: a straight step costs 2, a diagonal step 3, each multiplied by
//! the destination cell's terrain multiplier.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use sk_core::Position;

use crate::grid::TacticalGrid;

/// Cost of a straight step, in half-squares.
pub const STRAIGHT_STEP: u32 = 2;
/// Cost of a diagonal step, in half-squares.
pub const DIAGONAL_STEP: u32 = 3;

impl TacticalGrid {
    /// Movement budget in half-squares for a number of feet.
    pub fn budget_half_squares(&self, movement_feet: u32) -> u32 {
        movement_feet * 2 / self.feet_per_square()
    }

    /// Feet spent for a path cost in half-squares, rounded up.
    pub fn half_squares_to_feet(&self, half_squares: u32) -> u32 {
        (half_squares * self.feet_per_square()).div_ceil(2)
    }

    /// Minimal cost, in half-squares, of every cell reachable from `origin`
    /// within `movement_feet`.
    ///
    /// Obstacles and `occupied` cells are neither entered nor returned. The
    /// origin itself is not part of the result.
    pub fn reachable_costs(
        &self,
        origin: Position,
        movement_feet: u32,
        occupied: &HashSet<Position>,
    ) -> HashMap<Position, u32> {
        let budget = self.budget_half_squares(movement_feet);
        let mut best: HashMap<Position, u32> = HashMap::new();
        let mut frontier = BinaryHeap::new();

        best.insert(origin, 0);
        frontier.push(Reverse((0u32, origin)));

        while let Some(Reverse((cost, current))) = frontier.pop() {
            if best.get(&current).is_some_and(|&known| cost > known) {
                continue;
            }

            for next in self.neighbors_in_bounds(current) {
                if occupied.contains(&next) {
                    continue;
                }
                let Some(multiplier) = self.terrain_at(next).cost_multiplier() else {
                    continue;
                };
                let step = if next.x != current.x && next.y != current.y {
                    DIAGONAL_STEP
                } else {
                    STRAIGHT_STEP
                };
                let total = cost + step * multiplier;
                if total > budget {
                    continue;
                }
                if best.get(&next).is_none_or(|&known| total < known) {
                    best.insert(next, total);
                    frontier.push(Reverse((total, next)));
                }
            }
        }

        best.remove(&origin);
        best
    }

    /// Cells reachable from `origin` within `movement_feet`.
    pub fn reachable(
        &self,
        origin: Position,
        movement_feet: u32,
        occupied: &HashSet<Position>,
    ) -> HashSet<Position> {
        self.reachable_costs(origin, movement_feet, occupied)
            .into_keys()
            .collect()
    }

    /// Feet needed to move from `origin` to `destination`, if it is
    /// reachable within `movement_feet`.
    pub fn movement_cost(
        &self,
        origin: Position,
        destination: Position,
        movement_feet: u32,
        occupied: &HashSet<Position>,
    ) -> Option<u32> {
        self.reachable_costs(origin, movement_feet, occupied)
            .get(&destination)
            .map(|&half| self.half_squares_to_feet(half))
    }

    /// The reachable cell closest (Chebyshev) to `goal`, ties broken by
    /// cheaper path cost. `None` if nothing is reachable.
    pub fn step_toward(
        &self,
        origin: Position,
        goal: Position,
        movement_feet: u32,
        occupied: &HashSet<Position>,
    ) -> Option<Position> {
        self.reachable_costs(origin, movement_feet, occupied)
            .into_iter()
            .min_by_key(|&(pos, cost)| (pos.chebyshev(goal), cost, pos))
            .map(|(pos, _)| pos)
    }
}
