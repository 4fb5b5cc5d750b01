//! A quick read of the fight from one monster's point of view.

use sk_core::CombatantId;
use sk_mechanics::Combatant;

/// Counts and health of both sides, as seen by an acting combatant.
#[derive(Debug, Clone, PartialEq)]
pub struct BattlefieldAnalysis {
    /// Living allies, the actor included.
    pub ally_count: usize,
    /// Living enemies.
    pub enemy_count: usize,
    /// Mean health fraction of living allies.
    pub ally_health: f64,
    /// Mean health fraction of living enemies.
    pub enemy_health: f64,
    /// Living enemies at or below the near-death threshold, weakest first.
    pub near_death_enemies: Vec<CombatantId>,
    /// `ally_count / enemy_count` (infinite with no enemies left).
    pub ally_advantage: f64,
}

impl BattlefieldAnalysis {
    /// Analyze the living combatants from `actor`'s side.
    pub fn analyze<'a>(
        actor: &Combatant,
        combatants: impl IntoIterator<Item = &'a Combatant>,
        near_death_threshold: f64,
    ) -> Self {
        let mut allies = Vec::new();
        let mut enemies = Vec::new();
        for c in combatants.into_iter().filter(|c| c.is_living()) {
            if c.side == actor.side {
                allies.push(c);
            } else {
                enemies.push(c);
            }
        }

        let mut near_death: Vec<&Combatant> = enemies
            .iter()
            .copied()
            .filter(|e| e.health_fraction() <= near_death_threshold)
            .collect();
        near_death.sort_by(|a, b| {
            a.health_fraction()
                .total_cmp(&b.health_fraction())
                .then_with(|| a.id.cmp(&b.id))
        });

        let ally_advantage = if enemies.is_empty() {
            f64::INFINITY
        } else {
            allies.len() as f64 / enemies.len() as f64
        };

        Self {
            ally_count: allies.len(),
            enemy_count: enemies.len(),
            ally_health: mean_health(&allies),
            enemy_health: mean_health(&enemies),
            near_death_enemies: near_death.into_iter().map(|c| c.id.clone()).collect(),
            ally_advantage,
        }
    }

    /// Returns true if the actor's side has fewer living combatants.
    pub fn outnumbered(&self) -> bool {
        self.ally_advantage < 1.0
    }

    /// Returns true if any enemy is near death.
    pub fn has_near_death_enemy(&self) -> bool {
        !self.near_death_enemies.is_empty()
    }
}

fn mean_health(side: &[&Combatant]) -> f64 {
    if side.is_empty() {
        return 0.0;
    }
    side.iter().map(|c| c.health_fraction()).sum::<f64>() / side.len() as f64
}
