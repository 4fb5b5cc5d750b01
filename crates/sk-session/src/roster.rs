//! What the surrounding application hands a session: player templates and
//! enemy spawns.

use serde::{Deserialize, Serialize};

use sk_core::{AbilityScores, CombatantId, Position, Side};
use sk_mechanics::{Attack, Combatant};
use sk_monster::MonsterStatblock;

fn default_speed() -> u32 {
    30
}

fn default_level() -> u32 {
    1
}

/// A player character as supplied by the template provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerTemplate {
    /// Stable id, unique within a session.
    pub id: CombatantId,
    /// Display name.
    pub name: String,
    /// Maximum (and starting) hit points.
    pub hit_points: u32,
    /// Armor class.
    pub armor_class: i32,
    /// Walking speed in feet.
    #[serde(default = "default_speed")]
    pub speed: u32,
    /// Ability scores.
    #[serde(default)]
    pub abilities: AbilityScores,
    /// Character level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Attacks the character can make.
    #[serde(default)]
    pub attacks: Vec<Attack>,
    /// Free-form tags such as `spellcaster`.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Starting cell.
    pub position: Position,
}

impl PlayerTemplate {
    /// A level 1 template with default speed and abilities.
    pub fn new(
        id: impl Into<CombatantId>,
        name: impl Into<String>,
        hit_points: u32,
        armor_class: i32,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hit_points,
            armor_class,
            speed: default_speed(),
            abilities: AbilityScores::default(),
            level: default_level(),
            attacks: Vec::new(),
            tags: Vec::new(),
            position,
        }
    }

    /// Add an attack.
    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    /// Set the ability scores.
    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    /// Set the level.
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    /// Set the speed in feet.
    pub fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Build the player-side combatant.
    pub fn into_combatant(self) -> Combatant {
        let mut combatant = Combatant::new(self.id, self.name, Side::Player)
            .with_hit_points(self.hit_points)
            .with_armor_class(self.armor_class)
            .with_speed(self.speed)
            .with_abilities(self.abilities)
            .with_level(self.level)
            .at(self.position);
        combatant.attacks = self.attacks;
        combatant.tags = self.tags;
        combatant
    }
}

/// A monster to place on the grid. The statblock is scaled to the party
/// before it spawns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Explicit combatant id. Defaults to `<statblock id>-<n>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CombatantId>,
    /// The unscaled statblock.
    pub statblock: MonsterStatblock,
    /// Starting cell.
    pub position: Position,
}

impl EnemySpawn {
    /// Spawn a statblock at a position with a generated id.
    pub fn new(statblock: MonsterStatblock, position: Position) -> Self {
        Self {
            id: None,
            statblock,
            position,
        }
    }

    /// Use an explicit combatant id.
    pub fn with_id(mut self, id: impl Into<CombatantId>) -> Self {
        self.id = Some(id.into());
        self
    }
}
