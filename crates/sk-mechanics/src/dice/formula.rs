//! Damage formulas in `NdS+B` notation.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::roll::DiceRoll;
use super::Die;
use crate::error::{MechError, MechResult};

/// Upper bound on dice in a single formula.
const MAX_DICE: u32 = 100;

/// A damage formula such as `2d6+3`, `d8`, `1d4-1`, or a flat `5`.
///
/// Rolling sums the dice plus the bonus, never going below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DamageFormula {
    /// Number of dice rolled (0 for a flat formula).
    pub dice: u32,
    /// Which die is rolled.
    pub die: Die,
    /// Flat bonus (may be negative).
    pub bonus: i32,
}

/// The outcome of rolling a damage formula.
#[derive(Debug, Clone)]
pub struct FormulaRoll {
    /// The individual dice.
    pub roll: DiceRoll,
    /// The bonus that was added.
    pub bonus: i32,
    /// Dice plus bonus, floored at zero.
    pub total: u32,
}

impl DamageFormula {
    /// A formula of `dice` × `die` plus `bonus`.
    pub fn new(dice: u32, die: Die, bonus: i32) -> Self {
        Self { dice, die, bonus }
    }

    /// A formula that always yields `amount` (no dice).
    pub fn flat(amount: i32) -> Self {
        Self {
            dice: 0,
            die: Die::D4,
            bonus: amount,
        }
    }

    /// Parse a formula string.
    pub fn parse(input: &str) -> MechResult<Self> {
        let cleaned: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        let invalid = || MechError::InvalidFormula(input.to_string());

        if cleaned.is_empty() {
            return Err(invalid());
        }

        let Some(d_pos) = cleaned.find('d') else {
            let amount = cleaned.parse::<i32>().map_err(|_| invalid())?;
            return Ok(Self::flat(amount));
        };

        let count_part = &cleaned[..d_pos];
        let dice = if count_part.is_empty() {
            1
        } else {
            count_part.parse::<u32>().map_err(|_| invalid())?
        };
        if dice > MAX_DICE {
            return Err(invalid());
        }

        let rest = &cleaned[d_pos + 1..];
        let (sides_part, bonus_part) = match rest.find(['+', '-']) {
            Some(idx) => (&rest[..idx], Some(&rest[idx..])),
            None => (rest, None),
        };
        let sides = sides_part.parse::<u32>().map_err(|_| invalid())?;
        let die = Die::from_sides(sides).ok_or_else(invalid)?;
        let bonus = match bonus_part {
            Some(b) => b.parse::<i32>().map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self { dice, die, bonus })
    }

    /// Expected value: `dice * (sides + 1) / 2 + bonus`.
    pub fn average(&self) -> f64 {
        self.dice as f64 * self.die.average() + self.bonus as f64
    }

    /// Roll the formula.
    pub fn roll(&self, rng: &mut StdRng) -> FormulaRoll {
        self.roll_dice(self.dice, rng)
    }

    /// Roll the formula with its dice doubled (critical hit).
    pub fn roll_critical(&self, rng: &mut StdRng) -> FormulaRoll {
        self.roll_dice(self.dice * 2, rng)
    }

    fn roll_dice(&self, count: u32, rng: &mut StdRng) -> FormulaRoll {
        let roll = DiceRoll::throw(self.die, count, rng);
        let total = (roll.total() as i64 + self.bonus as i64).max(0) as u32;
        FormulaRoll {
            roll,
            bonus: self.bonus,
            total,
        }
    }
}

impl fmt::Display for DamageFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dice == 0 {
            return write!(f, "{}", self.bonus);
        }
        write!(f, "{}{}", self.dice, self.die)?;
        match self.bonus {
            0 => Ok(()),
            b if b > 0 => write!(f, "+{b}"),
            b => write!(f, "{b}"),
        }
    }
}

impl FromStr for DamageFormula {
    type Err = MechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for DamageFormula {
    type Error = MechError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DamageFormula> for String {
    fn from(formula: DamageFormula) -> Self {
        formula.to_string()
    }
}
