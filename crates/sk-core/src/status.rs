use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known status effects, extensible via `Custom(String)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// A player character at 0 HP. Death saves are handled elsewhere.
    Unconscious,
    /// A monster at 0 HP. Excluded from turn order and targeting.
    Dead,
    /// Took the defend action: raised effective AC until next turn start.
    Defending,
    /// Successfully fled the fight; permanently out of combat.
    Fled,
    /// A named effect with no built-in rule (e.g. a monster special).
    Custom(String),
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconscious => write!(f, "Unconscious"),
            Self::Dead => write!(f, "Dead"),
            Self::Defending => write!(f, "Defending"),
            Self::Fled => write!(f, "Fled"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// How long a status effect lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationRule {
    /// Removed when the owner's next turn starts.
    UntilTurnStart,
    /// Lasts this many of the owner's turn starts.
    Rounds(u32),
    /// Never expires on its own.
    Permanent,
}

/// A status effect attached to a combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    /// Which effect this is.
    pub kind: StatusKind,
    /// When it expires.
    pub duration: DurationRule,
}

impl StatusEffect {
    /// Create a status effect.
    pub fn new(kind: StatusKind, duration: DurationRule) -> Self {
        Self { kind, duration }
    }

    /// A permanent effect.
    pub fn permanent(kind: StatusKind) -> Self {
        Self::new(kind, DurationRule::Permanent)
    }

    /// Display name of the effect.
    pub fn name(&self) -> String {
        self.kind.to_string()
    }

    /// Advance the effect by one owner turn start. Returns true if it expired.
    pub fn tick_turn_start(&mut self) -> bool {
        match &mut self.duration {
            DurationRule::UntilTurnStart => true,
            DurationRule::Rounds(n) => {
                *n = n.saturating_sub(1);
                *n == 0
            }
            DurationRule::Permanent => false,
        }
    }
}
