//! Monster turns: decide, execute, record how the tactic went.
//!
//! The decision itself lives in [`DecisionEngine`](sk_monster::DecisionEngine).
//! This module turns it into grid moves and actions and feeds the outcome
//! back into the monster's learning state. The turn is not ended here.

use std::collections::HashSet;

use tracing::{debug, warn};

use sk_core::{CombatantId, DurationRule, Position, StatusKind};
use sk_mechanics::{Combatant, Resource};
use sk_monster::{AiActionKind, AiDecision, MonsterAiProfile};

use super::CombatSession;
use crate::error::{SessionError, SessionResult};
use crate::event::CombatEventKind;

impl CombatSession {
    pub(super) fn run_ai_turn(&mut self, id: &CombatantId) -> SessionResult<()> {
        let profile = self.profile_for(id)?;
        let in_reach = self.enemies_in_reach(id)?;
        let decision = {
            let actor = self
                .participants
                .get(id)
                .ok_or_else(|| SessionError::CombatantNotFound(id.clone()))?;
            let everyone: Vec<&Combatant> = self.participants.values().collect();
            self.decider
                .choose_action(&profile, actor, &everyone, &in_reach, &mut self.rng)
        };

        let description = match &decision {
            AiDecision::Flee => format!("{} looks for a way out", self.name_of(id)),
            AiDecision::Act {
                action,
                target: Some(target),
            } => format!("{} chooses {action} on {}", self.name_of(id), self.name_of(target)),
            AiDecision::Act { action, .. } => format!("{} chooses {action}", self.name_of(id)),
        };
        self.emit(
            CombatEventKind::AiDecided {
                combatant_id: id.clone(),
                decision: decision.clone(),
            },
            description,
        );

        let executed = match decision {
            AiDecision::Flee => self.attempt_flee(id).map(|_| ()),
            AiDecision::Act {
                action: AiActionKind::Defend,
                ..
            }
            | AiDecision::Act { target: None, .. } => self.ai_defend(id),
            AiDecision::Act {
                action,
                target: Some(target),
            } => {
                let success = match action {
                    AiActionKind::Attack => self.ai_attack(id, &target),
                    AiActionKind::Move => self.ai_advance(id, &target),
                    AiActionKind::Special => self.ai_special(id, &target, &profile),
                    AiActionKind::Defend => Ok(false),
                };
                success.map(|success| self.record_tactic(id, action, success))
            }
        };

        match executed {
            Err(err) if err.is_validation() => {
                warn!(session = %self.id, monster = %id, error = %err, "monster action rejected");
                Ok(())
            }
            other => other,
        }
    }

    /// The monster's profile, or a neutral one if it has none registered.
    fn profile_for(&mut self, id: &CombatantId) -> SessionResult<MonsterAiProfile> {
        let combatant = self.participant(id)?;
        let profile_id = combatant
            .ai_profile_id
            .clone()
            .unwrap_or_else(|| id.to_string());
        if let Some(profile) = self.profiles.get(&profile_id) {
            return Ok(profile.clone());
        }
        warn!(session = %self.id, monster = %id, "no AI profile, deriving one");
        let profile = MonsterAiProfile::from_combatant(combatant);
        self.profiles.insert(profile_id, profile.clone());
        Ok(profile)
    }

    /// Living hostiles the actor could attack this turn, moving first if
    /// needed.
    fn enemies_in_reach(&self, id: &CombatantId) -> SessionResult<Vec<CombatantId>> {
        let actor = self.participant(id)?;
        let mut spots: Vec<Position> = self
            .grid
            .reachable(
                actor.position,
                actor.economy.movement,
                &self.occupied_by_others(id),
            )
            .into_iter()
            .collect();
        spots.push(actor.position);

        Ok(self
            .participants
            .values()
            .filter(|c| c.is_living() && c.is_hostile_to(actor))
            .filter(|c| spots.iter().any(|&p| self.strikes_from(actor, p, c.position)))
            .map(|c| c.id.clone())
            .collect())
    }

    /// Returns true if any of the actor's attacks reaches `target` from
    /// `from`. A combatant without attacks reaches adjacent cells.
    fn strikes_from(&self, actor: &Combatant, from: Position, target: Position) -> bool {
        let radius = self.config.rules.ranged_radius_squares;
        if actor.attacks.is_empty() {
            return self.grid.in_attack_range(from, target, false, radius);
        }
        actor
            .attacks
            .iter()
            .any(|a| self.grid.in_attack_range(from, target, a.is_ranged(), radius))
    }

    fn strikes_now(&self, id: &CombatantId, target: &CombatantId) -> bool {
        match (self.participants.get(id), self.participants.get(target)) {
            (Some(actor), Some(victim)) => {
                self.strikes_from(actor, actor.position, victim.position)
            }
            _ => false,
        }
    }

    /// The hardest-hitting attack that reaches `target` from where the
    /// actor stands.
    fn best_attack_here(&self, id: &CombatantId, target: &CombatantId) -> Option<usize> {
        let actor = self.participants.get(id)?;
        let goal = self.participants.get(target)?.position;
        let radius = self.config.rules.ranged_radius_squares;
        actor
            .attacks
            .iter()
            .enumerate()
            .filter(|(_, a)| {
                self.grid
                    .in_attack_range(actor.position, goal, a.is_ranged(), radius)
            })
            .max_by(|(i, a), (j, b)| {
                expected_damage(a)
                    .total_cmp(&expected_damage(b))
                    .then_with(|| j.cmp(i))
            })
            .map(|(i, _)| i)
    }

    /// The cheapest reachable cell from which the actor can strike
    /// `target`, if any.
    fn strike_position(&self, id: &CombatantId, target: &CombatantId) -> Option<Position> {
        let actor = self.participants.get(id)?;
        let goal = self.participants.get(target)?.position;
        let occupied: HashSet<Position> = self.occupied_by_others(id);
        self.grid
            .reachable_costs(actor.position, actor.economy.movement, &occupied)
            .into_iter()
            .filter(|&(pos, _)| self.strikes_from(actor, pos, goal))
            .min_by_key(|&(pos, cost)| (cost, pos))
            .map(|(pos, _)| pos)
    }

    /// Move into striking position if needed, then attack. Succeeds on a hit.
    fn ai_attack(&mut self, id: &CombatantId, target: &CombatantId) -> SessionResult<bool> {
        if self.best_attack_here(id, target).is_none() {
            match self.strike_position(id, target) {
                Some(spot) => {
                    self.move_combatant(id, spot)?;
                }
                None => {
                    self.close_distance(id, target)?;
                    return Ok(false);
                }
            }
        }
        match self.best_attack_here(id, target) {
            Some(index) => Ok(self.perform_attack(id, target, index)?.hit),
            None => Ok(false),
        }
    }

    /// Close in on the target, attacking if that puts it in reach. Succeeds
    /// if the monster ends its move able to strike.
    fn ai_advance(&mut self, id: &CombatantId, target: &CombatantId) -> SessionResult<bool> {
        if self.best_attack_here(id, target).is_none() {
            self.close_distance(id, target)?;
        }
        let Some(index) = self.best_attack_here(id, target) else {
            return Ok(false);
        };
        let has_action = self
            .participants
            .get(id)
            .is_some_and(|c| c.economy.has(Resource::Action));
        if has_action {
            self.perform_attack(id, target, index)?;
        }
        Ok(true)
    }

    /// Use the monster's first special ability on the target: a one-round
    /// named status effect. Spends the action.
    fn ai_special(
        &mut self,
        id: &CombatantId,
        target: &CombatantId,
        profile: &MonsterAiProfile,
    ) -> SessionResult<bool> {
        let Some(special) = profile.specials.first().cloned() else {
            return self.ai_attack(id, target);
        };
        if !self.strikes_now(id, target) {
            match self.strike_position(id, target) {
                Some(spot) => {
                    self.move_combatant(id, spot)?;
                }
                None => {
                    self.close_distance(id, target)?;
                    return Ok(false);
                }
            }
        }
        if !self.strikes_now(id, target) {
            return Ok(false);
        }

        let name = self.name_of(id);
        self.participant_mut(id)?.spend(Resource::Action)?;
        let status = StatusKind::Custom(special.clone());
        let victim = self.participant_mut(target)?;
        victim.add_status(status.clone(), DurationRule::Rounds(1));
        let victim_name = victim.name.clone();
        self.emit(
            CombatEventKind::StatusApplied {
                combatant_id: target.clone(),
                status,
            },
            format!("{name} uses {special} on {victim_name}"),
        );
        Ok(true)
    }

    /// Defend now; whether it worked is judged at the monster's next turn.
    fn ai_defend(&mut self, id: &CombatantId) -> SessionResult<()> {
        self.take_defend(id)?;
        let hit_points = self.participant(id)?.hit_points;
        self.pending_defense.insert(id.clone(), hit_points);
        Ok(())
    }

    /// Step as close to the target as the remaining movement allows.
    fn close_distance(&mut self, id: &CombatantId, target: &CombatantId) -> SessionResult<()> {
        let Some(actor) = self.participants.get(id) else {
            return Ok(());
        };
        let Some(goal) = self.participants.get(target).map(|c| c.position) else {
            return Ok(());
        };
        let origin = actor.position;
        let occupied = self.occupied_by_others(id);
        let step = self
            .grid
            .step_toward(origin, goal, actor.economy.movement, &occupied);
        match step {
            Some(spot) if spot.chebyshev(goal) < origin.chebyshev(goal) => {
                self.move_combatant(id, spot)?;
            }
            _ => debug!(session = %self.id, monster = %id, "no closer cell in reach"),
        }
        Ok(())
    }

    /// A defend pays off if the monster took no damage before its next turn.
    pub(super) fn resolve_pending_defense(&mut self, id: &CombatantId) {
        let Some(before) = self.pending_defense.remove(id) else {
            return;
        };
        let unharmed = self
            .participants
            .get(id)
            .is_some_and(|c| c.hit_points >= before);
        self.record_tactic(id, AiActionKind::Defend, unharmed);
    }

    fn record_tactic(&mut self, id: &CombatantId, action: AiActionKind, success: bool) {
        let Some(profile_id) = self
            .participants
            .get(id)
            .and_then(|c| c.ai_profile_id.clone())
        else {
            return;
        };
        let Some(profile) = self.profiles.get_mut(&profile_id) else {
            return;
        };
        let key = action.tactic_key();
        profile.record_outcome(key, success);
        let stats = self
            .session_tactics
            .entry(profile.monster_type.clone())
            .or_default()
            .entry(key.to_string())
            .or_default();
        stats.uses += 1;
        if success {
            stats.successes += 1;
        }
        debug!(session = %self.id, monster = %id, tactic = key, success, "tactic recorded");
    }
}

fn expected_damage(attack: &sk_mechanics::Attack) -> f64 {
    attack
        .scaled_damage
        .map_or_else(|| attack.damage.average(), f64::from)
}
