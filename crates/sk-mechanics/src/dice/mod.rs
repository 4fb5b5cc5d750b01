//! Dice and the `NdS+B` damage formulas attacks are written in.

/// `NdS+B` damage formulas.
pub mod formula;
/// Seeded dice throws.
pub mod roll;

pub use formula::{DamageFormula, FormulaRoll};
pub use roll::{DiceRoll, roll_d20};

use serde::{Deserialize, Serialize};

/// A polyhedral die type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Die {
    /// Four-sided die.
    D4,
    /// Six-sided die.
    D6,
    /// Eight-sided die.
    D8,
    /// Ten-sided die.
    D10,
    /// Twelve-sided die.
    D12,
    /// Twenty-sided die.
    D20,
    /// Percentile die (1-100).
    D100,
    /// A die with a custom number of sides.
    Custom(u32),
}

impl Die {
    /// Returns the number of sides on this die.
    pub fn sides(self) -> u32 {
        match self {
            Self::D4 => 4,
            Self::D6 => 6,
            Self::D8 => 8,
            Self::D10 => 10,
            Self::D12 => 12,
            Self::D20 => 20,
            Self::D100 => 100,
            Self::Custom(n) => n,
        }
    }

    /// The die with the given number of sides, or `None` below two sides.
    pub fn from_sides(sides: u32) -> Option<Self> {
        match sides {
            0 | 1 => None,
            4 => Some(Self::D4),
            6 => Some(Self::D6),
            8 => Some(Self::D8),
            10 => Some(Self::D10),
            12 => Some(Self::D12),
            20 => Some(Self::D20),
            100 => Some(Self::D100),
            n => Some(Self::Custom(n)),
        }
    }

    /// Mean face value: `(sides + 1) / 2`.
    pub fn average(self) -> f64 {
        (self.sides() as f64 + 1.0) / 2.0
    }
}

impl std::fmt::Display for Die {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_sizes_map_to_named_dice() {
        for die in [Die::D4, Die::D6, Die::D8, Die::D10, Die::D12, Die::D20, Die::D100] {
            assert_eq!(Die::from_sides(die.sides()), Some(die));
        }
        assert_eq!(Die::from_sides(7), Some(Die::Custom(7)));
        assert_eq!(Die::from_sides(1), None);
        assert_eq!(Die::from_sides(0), None);
    }

    #[test]
    fn average_face() {
        assert!((Die::D8.average() - 4.5).abs() < f64::EPSILON);
        assert!((Die::Custom(3).average() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn shown_as_d_notation() {
        assert_eq!(Die::D12.to_string(), "d12");
        assert_eq!(Die::Custom(7).to_string(), "d7");
    }
}
