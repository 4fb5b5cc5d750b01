//! Per-turn action economy: action, bonus action, movement, reaction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MechError, MechResult};

/// A spendable per-turn resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// The main action.
    Action,
    /// The bonus action.
    Bonus,
    /// The reaction.
    Reaction,
    /// Movement in feet.
    Movement(u32),
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action => write!(f, "action"),
            Self::Bonus => write!(f, "bonus action"),
            Self::Reaction => write!(f, "reaction"),
            Self::Movement(feet) => write!(f, "{feet} ft of movement"),
        }
    }
}

/// The resources a combatant has left this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEconomy {
    /// Main action available.
    pub action: bool,
    /// Bonus action available.
    pub bonus: bool,
    /// Remaining movement in feet.
    pub movement: u32,
    /// Reaction available.
    pub reaction: bool,
}

impl Default for ActionEconomy {
    fn default() -> Self {
        Self::exhausted()
    }
}

impl ActionEconomy {
    /// An economy with nothing left to spend.
    pub fn exhausted() -> Self {
        Self {
            action: false,
            bonus: false,
            movement: 0,
            reaction: false,
        }
    }

    /// A full economy for a combatant with the given speed.
    pub fn fresh(speed: u32) -> Self {
        Self {
            action: true,
            bonus: true,
            movement: speed,
            reaction: true,
        }
    }

    /// Restore every resource at the start of a turn.
    pub fn reset_for_turn(&mut self, speed: u32) {
        *self = Self::fresh(speed);
    }

    /// Returns true if the resource can be spent.
    pub fn has(&self, resource: Resource) -> bool {
        match resource {
            Resource::Action => self.action,
            Resource::Bonus => self.bonus,
            Resource::Reaction => self.reaction,
            Resource::Movement(feet) => self.movement >= feet,
        }
    }

    /// Spend a resource. Fails without changing anything if it is exhausted.
    ///
    /// Spending never ends the turn; that is the session's call.
    pub fn spend(&mut self, resource: Resource) -> MechResult<()> {
        if !self.has(resource) {
            return Err(MechError::InsufficientResource(resource));
        }
        match resource {
            Resource::Action => self.action = false,
            Resource::Bonus => self.bonus = false,
            Resource::Reaction => self.reaction = false,
            Resource::Movement(feet) => self.movement -= feet,
        }
        Ok(())
    }

    /// Add extra movement (dash).
    pub fn grant_movement(&mut self, feet: u32) {
        self.movement = self.movement.saturating_add(feet);
    }

    /// Drop all remaining movement.
    pub fn forfeit_movement(&mut self) {
        self.movement = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_restores_everything() {
        let mut economy = ActionEconomy::exhausted();
        economy.reset_for_turn(30);
        assert_eq!(economy, ActionEconomy::fresh(30));
        assert!(economy.action && economy.bonus && economy.reaction);
        assert_eq!(economy.movement, 30);
    }

    #[test]
    fn spend_once_then_fail() {
        let mut economy = ActionEconomy::fresh(30);
        economy.spend(Resource::Action).unwrap();
        assert!(!economy.action);
        let err = economy.spend(Resource::Action).unwrap_err();
        assert!(matches!(
            err,
            MechError::InsufficientResource(Resource::Action)
        ));
    }

    #[test]
    fn movement_is_partial() {
        let mut economy = ActionEconomy::fresh(30);
        economy.spend(Resource::Movement(20)).unwrap();
        assert_eq!(economy.movement, 10);
        assert!(economy.spend(Resource::Movement(15)).is_err());
        // a failed spend changes nothing
        assert_eq!(economy.movement, 10);
        economy.spend(Resource::Movement(10)).unwrap();
        assert_eq!(economy.movement, 0);
    }

    #[test]
    fn dash_adds_movement() {
        let mut economy = ActionEconomy::fresh(25);
        economy.grant_movement(25);
        assert_eq!(economy.movement, 50);
        economy.forfeit_movement();
        assert_eq!(economy.movement, 0);
    }

    #[test]
    fn resource_display() {
        assert_eq!(Resource::Bonus.to_string(), "bonus action");
        assert_eq!(Resource::Movement(15).to_string(), "15 ft of movement");
    }
}
