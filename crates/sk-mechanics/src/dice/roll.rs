//! Rolling dice with a seeded generator.

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::Die;

/// The faces shown by a handful of identical dice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Which die was thrown, if any were.
    pub die: Option<Die>,
    /// Face values in throw order.
    pub faces: Vec<u32>,
}

impl DiceRoll {
    /// Throw `count` copies of `die`.
    pub fn throw(die: Die, count: u32, rng: &mut StdRng) -> Self {
        let faces = (0..count)
            .map(|_| rng.random_range(1..=die.sides()))
            .collect();
        Self {
            die: (count > 0).then_some(die),
            faces,
        }
    }

    /// Sum of the faces.
    pub fn total(&self) -> u32 {
        self.faces.iter().sum()
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown: Vec<String> = self.faces.iter().map(u32::to_string).collect();
        write!(f, "[{}]", shown.join(" "))
    }
}

/// A single d20 for attack rolls, initiative and checks.
pub fn roll_d20(rng: &mut StdRng) -> u32 {
    rng.random_range(1..=20)
}
