//! Actions a combatant can take on its own turn.
//!
//! The public methods validate that the session is active and that the
//! actor owns the turn, then share their execution with the AI turn.
//! A rejected action changes nothing.

use tracing::info;

use sk_core::{CombatantId, DurationRule, Position, StatusKind};
use sk_mechanics::dice::roll_d20;
use sk_mechanics::{ActionEconomy, AttackOutcome, Resource};

use super::CombatSession;
use crate::error::{SessionError, SessionResult, ValidationError};
use crate::event::CombatEventKind;

impl CombatSession {
    /// Move the actor to `destination`, spending the path cost in feet.
    ///
    /// The destination must be reachable with the remaining movement,
    /// around obstacles and other living combatants. Returns the feet
    /// spent.
    pub fn move_to(&mut self, actor: &CombatantId, destination: Position) -> SessionResult<u32> {
        self.ensure_turn(actor)?;
        self.move_combatant(actor, destination)
    }

    /// Attack `target` with the actor's attack at `attack_index`.
    ///
    /// The target must be a living hostile inside that attack's range.
    /// Spends the action.
    pub fn attack(
        &mut self,
        actor: &CombatantId,
        target: &CombatantId,
        attack_index: usize,
    ) -> SessionResult<AttackOutcome> {
        self.ensure_turn(actor)?;
        self.perform_attack(actor, target, attack_index)
    }

    /// Take the defend action: +AC until the actor's next turn starts.
    pub fn defend(&mut self, actor: &CombatantId) -> SessionResult<()> {
        self.ensure_turn(actor)?;
        self.take_defend(actor)
    }

    /// Take the dash action: spend the action for another speed's worth of
    /// movement. Returns the movement now available.
    pub fn dash(&mut self, actor: &CombatantId) -> SessionResult<u32> {
        self.ensure_turn(actor)?;
        let combatant = self.participant_mut(actor)?;
        combatant.spend(Resource::Action)?;
        let speed = combatant.speed;
        combatant.economy.grant_movement(speed);
        let movement = combatant.economy.movement;
        let name = combatant.name.clone();
        self.emit(
            CombatEventKind::Dashed {
                combatant_id: actor.clone(),
                movement,
            },
            format!("{name} dashes ({movement} ft of movement)"),
        );
        Ok(movement)
    }

    /// Try to leave the fight: d20 against the flee DC. On success the
    /// actor is out of combat for good; on failure it loses its action and
    /// remaining movement. Returns whether it escaped.
    pub fn flee(&mut self, actor: &CombatantId) -> SessionResult<bool> {
        self.ensure_turn(actor)?;
        self.attempt_flee(actor)
    }

    pub(super) fn ensure_turn(&self, actor: &CombatantId) -> SessionResult<()> {
        self.ensure_active()?;
        self.participant(actor)?;
        if self.order.current() != Some(actor) {
            return Err(ValidationError::NotYourTurn {
                actor: actor.clone(),
            }
            .into());
        }
        Ok(())
    }

    pub(super) fn move_combatant(
        &mut self,
        id: &CombatantId,
        destination: Position,
    ) -> SessionResult<u32> {
        let combatant = self.participant(id)?;
        let from = combatant.position;
        let budget = combatant.economy.movement;
        let illegal = ValidationError::IllegalMove {
            from,
            to: destination,
        };
        if destination == from {
            return Err(illegal.into());
        }
        let occupied = self.occupied_by_others(id);
        let feet = self
            .grid
            .movement_cost(from, destination, budget, &occupied)
            .ok_or(illegal)?;

        let combatant = self.participant_mut(id)?;
        combatant.spend(Resource::Movement(feet))?;
        combatant.position = destination;
        let name = combatant.name.clone();
        self.emit(
            CombatEventKind::CombatantMoved {
                combatant_id: id.clone(),
                from,
                to: destination,
                feet,
            },
            format!("{name} moves {from} -> {destination} ({feet} ft)"),
        );
        Ok(feet)
    }

    pub(super) fn perform_attack(
        &mut self,
        actor: &CombatantId,
        target_id: &CombatantId,
        attack_index: usize,
    ) -> SessionResult<AttackOutcome> {
        let attacker = self.participant(actor)?.clone();
        let attack = attacker.attack(attack_index)?.clone();
        let target = self.participant(target_id)?;

        let invalid = |reason: &str| ValidationError::InvalidTarget {
            target: target_id.clone(),
            reason: reason.to_string(),
        };
        if !target.is_living() {
            return Err(invalid("not in the fight").into());
        }
        if !target.is_hostile_to(&attacker) {
            return Err(invalid("not hostile").into());
        }
        let in_range = self.grid.in_attack_range(
            attacker.position,
            target.position,
            attack.is_ranged(),
            self.config.rules.ranged_radius_squares,
        );
        if !in_range {
            return Err(ValidationError::OutOfRange {
                target: target_id.clone(),
            }
            .into());
        }
        let cover = self.grid.cover_at(target.position);
        let target_name = target.name.clone();

        self.participant_mut(actor)?.spend(Resource::Action)?;
        let target = self
            .participants
            .get_mut(target_id)
            .ok_or_else(|| SessionError::CombatantNotFound(target_id.clone()))?;
        let (outcome, report) =
            self.resolver
                .resolve_attack(&attacker, target, attack_index, cover, &mut self.rng)?;
        let target_side = target.side;

        let verdict = match (outcome.hit, outcome.critical) {
            (true, true) => format!("critical hit for {}", outcome.damage),
            (true, false) => format!("hit for {}", outcome.damage),
            (false, _) => "miss".to_string(),
        };
        self.emit(
            CombatEventKind::AttackResolved {
                outcome: outcome.clone(),
            },
            format!(
                "{} attacks {target_name} with {}: {} vs AC {}, {verdict}",
                attacker.name, attack.name, outcome.total, outcome.target_ac
            ),
        );

        if let Some(report) = report {
            self.emit(
                CombatEventKind::DamageApplied {
                    target_id: target_id.clone(),
                    amount: report.amount,
                    remaining_hp: report.remaining,
                },
                format!(
                    "{target_name} takes {} damage ({} HP left)",
                    report.amount, report.remaining
                ),
            );
            if let Some(status) = report.downed {
                info!(
                    session = %self.id,
                    combatant = %target_id,
                    %status,
                    "combatant down"
                );
                self.emit(
                    CombatEventKind::CombatantDown {
                        combatant_id: target_id.clone(),
                        side: target_side,
                    },
                    format!("{target_name} is down ({status})"),
                );
            }
        }
        Ok(outcome)
    }

    pub(super) fn take_defend(&mut self, id: &CombatantId) -> SessionResult<()> {
        let combatant = self.participant_mut(id)?;
        combatant.spend(Resource::Action)?;
        combatant.add_status(StatusKind::Defending, DurationRule::UntilTurnStart);
        let name = combatant.name.clone();
        self.emit(
            CombatEventKind::StatusApplied {
                combatant_id: id.clone(),
                status: StatusKind::Defending,
            },
            format!("{name} takes a defensive stance"),
        );
        Ok(())
    }

    pub(super) fn attempt_flee(&mut self, id: &CombatantId) -> SessionResult<bool> {
        let combatant = self.participant(id)?;
        if !combatant.economy.has(Resource::Action) {
            return Err(ValidationError::InsufficientResource(Resource::Action).into());
        }
        let name = combatant.name.clone();
        let roll = roll_d20(&mut self.rng);
        let success = roll >= self.config.rules.flee_dc;

        let combatant = self.participant_mut(id)?;
        if success {
            combatant.economy = ActionEconomy::exhausted();
            combatant.add_status(StatusKind::Fled, DurationRule::Permanent);
        } else {
            combatant.spend(Resource::Action)?;
            combatant.economy.forfeit_movement();
        }

        self.emit(
            CombatEventKind::FleeAttempted {
                combatant_id: id.clone(),
                roll,
                success,
            },
            if success {
                format!("{name} tries to flee (rolled {roll}) and escapes")
            } else {
                format!("{name} tries to flee (rolled {roll}) but is held in place")
            },
        );
        if success {
            info!(session = %self.id, combatant = %id, "combatant fled");
            self.emit(
                CombatEventKind::CombatantFled {
                    combatant_id: id.clone(),
                },
                format!("{name} has fled the fight"),
            );
        }
        Ok(success)
    }
}
