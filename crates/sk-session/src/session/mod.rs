//! The combat session state machine.
//!
//! A session moves `Pending → Active → Completed`. While active, exactly
//! one combatant owns the turn. Player turns are driven by the caller
//! through the action methods; monster turns are decided and executed
//! synchronously when they start. Nothing advances on its own: the caller
//! ends every turn with [`CombatSession::end_turn`].

mod actions;
mod ai_turn;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use sk_core::{CombatantId, Position, SessionId, Side};
use sk_grid::TacticalGrid;
use sk_mechanics::{Combatant, DamageResolver, InitiativeScheduler, TurnOrder};
use sk_monster::{
    CombatMemory, DecisionEngine, EncounterRecord, MonsterAiProfile, ScalingEngine, TacticStats,
};

use crate::collaborator::Collaborators;
use crate::config::EngineConfig;
use crate::error::{SessionError, SessionResult, ValidationError};
use crate::event::{CombatEventKind, EventLog};
use crate::outcome::{CombatOutcome, CombatResult};
use crate::roster::{EnemySpawn, PlayerTemplate};
use crate::snapshot::SessionSnapshot;

/// Reason recorded when one side has nobody left standing.
pub const SIDE_ELIMINATED: &str = "side_eliminated";
/// Reason recorded when turn state was found to be corrupt.
pub const INVARIANT_VIOLATION: &str = "invariant_violation";

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, not yet started.
    Pending,
    /// Turns are being taken.
    Active,
    /// Finished; results are available.
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// An enemy ready to join: scaled, spawned, and profiled.
struct PreparedEnemy {
    combatant: Combatant,
    profile: MonsterAiProfile,
    monster_type: String,
    factor: f64,
}

/// One tactical fight between the party and a group of monsters.
pub struct CombatSession {
    id: SessionId,
    status: SessionStatus,
    trigger: String,
    location_ref: Option<String>,
    round: u32,
    order: TurnOrder,
    participants: BTreeMap<CombatantId, Combatant>,
    profiles: HashMap<String, MonsterAiProfile>,
    scaling_factors: BTreeMap<String, f64>,
    session_tactics: BTreeMap<String, BTreeMap<String, TacticStats>>,
    pending_defense: HashMap<CombatantId, u32>,
    spawn_counts: HashMap<String, u32>,
    grid: TacticalGrid,
    memory: CombatMemory,
    config: EngineConfig,
    rng: StdRng,
    resolver: DamageResolver,
    scaler: ScalingEngine,
    decider: DecisionEngine,
    events: EventLog,
    collaborators: Collaborators,
    result: Option<CombatResult>,
    records: Vec<EncounterRecord>,
}

impl fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatSession")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("round", &self.round)
            .field("turn_index", &self.order.index())
            .field("participants", &self.participants.len())
            .field("events", &self.events.len())
            .finish()
    }
}

impl CombatSession {
    /// Create a pending session on a grid.
    ///
    /// `memory` is read while the session runs (difficulty bias and learned
    /// tactics) and receives one record per monster type when it completes.
    /// Take it back with [`into_memory`](Self::into_memory).
    pub fn new(config: EngineConfig, grid: TacticalGrid, memory: CombatMemory) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        let events = EventLog::new(config.max_events);
        Self {
            id: SessionId::new(),
            status: SessionStatus::Pending,
            trigger: String::new(),
            location_ref: None,
            round: 0,
            order: TurnOrder::default(),
            participants: BTreeMap::new(),
            profiles: HashMap::new(),
            scaling_factors: BTreeMap::new(),
            session_tactics: BTreeMap::new(),
            pending_defense: HashMap::new(),
            spawn_counts: HashMap::new(),
            grid,
            memory,
            rng,
            resolver: DamageResolver::new(config.rules.clone()),
            scaler: ScalingEngine::new(config.scaling.clone()),
            decider: DecisionEngine::new(config.ai.clone()),
            events,
            collaborators: Collaborators::default(),
            result: None,
            records: Vec::new(),
            config,
        }
    }

    /// Attach narration and persistence sinks.
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Attach an opaque location reference from the host application.
    pub fn with_location(mut self, location_ref: impl Into<String>) -> Self {
        self.location_ref = Some(location_ref.into());
        self
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Seed the fight and start the first turn.
    ///
    /// Players are built from their templates. Each enemy statblock is
    /// validated, then scaled to the party (biased by combat memory) before
    /// it spawns. Every placement is checked before anything changes.
    /// Initiative is rolled for everyone, round 1 begins and the first
    /// combatant's turn starts; if that is a monster, it acts immediately.
    pub fn start(
        &mut self,
        trigger: impl Into<String>,
        players: Vec<PlayerTemplate>,
        enemies: Vec<EnemySpawn>,
    ) -> SessionResult<()> {
        if self.status != SessionStatus::Pending {
            return Err(ValidationError::AlreadyStarted.into());
        }
        if players.is_empty() {
            return Err(ValidationError::EmptyRoster(Side::Player).into());
        }
        if enemies.is_empty() {
            return Err(ValidationError::EmptyRoster(Side::Enemy).into());
        }

        let party: Vec<Combatant> = players
            .into_iter()
            .map(PlayerTemplate::into_combatant)
            .collect();
        let party_refs: Vec<&Combatant> = party.iter().collect();

        let mut counts = self.spawn_counts.clone();
        let mut prepared = Vec::with_capacity(enemies.len());
        for spawn in enemies {
            prepared.push(self.prepare_enemy(spawn, &party_refs, &mut counts)?);
        }

        let mut roster: BTreeMap<CombatantId, Combatant> = BTreeMap::new();
        let mut occupied = HashSet::new();
        let everyone = party
            .iter()
            .chain(prepared.iter().map(|p| &p.combatant));
        for combatant in everyone {
            if roster.contains_key(&combatant.id) {
                return Err(ValidationError::DuplicateCombatant(combatant.id.clone()).into());
            }
            self.check_placement(combatant, &occupied)?;
            occupied.insert(combatant.position);
            roster.insert(combatant.id.clone(), combatant.clone());
        }

        for enemy in prepared {
            self.scaling_factors
                .insert(enemy.monster_type, enemy.factor);
            if let Some(profile_id) = &enemy.combatant.ai_profile_id {
                self.profiles.insert(profile_id.clone(), enemy.profile);
            }
        }
        self.spawn_counts = counts;
        self.trigger = trigger.into();
        self.participants = roster;
        self.order =
            InitiativeScheduler::roll_initiative(self.participants.values_mut(), &mut self.rng);
        self.round = 1;
        self.status = SessionStatus::Active;

        info!(
            session = %self.id,
            trigger = %self.trigger,
            participants = self.participants.len(),
            "combat started"
        );
        let participants = self.order.ids();
        let description = format!("Combat begins: {}", self.trigger);
        self.emit(
            CombatEventKind::SessionStarted {
                session_id: self.id,
                participants,
            },
            description,
        );
        self.start_turn()
    }

    /// End the current turn.
    ///
    /// Checks termination first: if one side has no living combatants the
    /// session completes and no further turn starts. Otherwise the turn
    /// passes to the next living combatant. Wrapping past the end of the
    /// order starts a new round and rebuilds the order from the living.
    pub fn end_turn(&mut self) -> SessionResult<()> {
        self.ensure_active()?;
        if let Some(outcome) = self.check_termination() {
            self.complete_session(outcome, SIDE_ELIMINATED);
            return Ok(());
        }

        let mut skipped = 0;
        loop {
            if self.order.advance() {
                self.begin_round();
            }
            match self.order.current() {
                Some(id) if self.is_living(id) => break,
                // downed mid-round; dropped when the next round starts
                Some(id) if self.participants.contains_key(id) => {}
                _ => break,
            }
            skipped += 1;
            if skipped > self.order.len() {
                let detail = "no living combatant left in the turn order".to_string();
                return Err(self.invariant_violation(detail));
            }
        }
        self.start_turn()
    }

    /// End the session early. Calling it on a completed session does
    /// nothing and returns the existing result.
    pub fn force_end(&mut self, reason: &str) -> Option<&CombatResult> {
        if self.status == SessionStatus::Completed {
            debug!(session = %self.id, reason, "force_end on completed session ignored");
        } else {
            self.complete_session(CombatOutcome::Interrupted, reason);
        }
        self.result.as_ref()
    }

    /// Add a prebuilt combatant mid-fight. It rolls initiative once and
    /// slots into the order without disturbing whose turn it is. Enemies
    /// without an AI profile get a neutral one derived from their scores.
    ///
    /// Returns the combatant's index in the turn order.
    pub fn insert_combatant(&mut self, combatant: Combatant) -> SessionResult<usize> {
        self.ensure_active()?;
        self.admit(combatant, None)
    }

    /// Bring in a monster as a reinforcement, scaled against the living
    /// party first.
    pub fn insert_enemy(&mut self, spawn: EnemySpawn) -> SessionResult<CombatantId> {
        self.ensure_active()?;
        let party: Vec<&Combatant> = self
            .participants
            .values()
            .filter(|c| c.side == Side::Player && c.is_living())
            .collect();
        let mut counts = self.spawn_counts.clone();
        let enemy = self.prepare_enemy(spawn, &party, &mut counts)?;
        let id = enemy.combatant.id.clone();
        let monster_type = enemy.monster_type.clone();
        let factor = enemy.factor;
        self.admit(enemy.combatant, Some(enemy.profile))?;
        self.spawn_counts = counts;
        self.scaling_factors.insert(monster_type, factor);
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Session id.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Lifecycle state.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// What started the fight.
    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// The host's location reference, if any.
    pub fn location_ref(&self) -> Option<&str> {
        self.location_ref.as_deref()
    }

    /// Current round (0 before the session starts).
    pub fn round(&self) -> u32 {
        self.round
    }

    /// The turn order.
    pub fn turn_order(&self) -> &TurnOrder {
        &self.order
    }

    /// Id of the combatant whose turn it is.
    pub fn current_turn(&self) -> Option<&CombatantId> {
        if self.status != SessionStatus::Active {
            return None;
        }
        self.order.current()
    }

    /// The combatant whose turn it is.
    pub fn current_combatant(&self) -> Option<&Combatant> {
        self.current_turn().and_then(|id| self.participants.get(id))
    }

    /// Look up a combatant. Unknown ids are logged and return `None`.
    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        let found = self.participants.get(id);
        if found.is_none() {
            warn!(session = %self.id, combatant = %id, "combatant not found");
        }
        found
    }

    /// Every participant, living or not, ordered by id.
    pub fn combatants(&self) -> impl Iterator<Item = &Combatant> {
        self.participants.values()
    }

    /// Living combatants on a side.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.participants
            .values()
            .filter(move |c| c.side == side && c.is_living())
    }

    /// Cells a combatant on `side` would step into next to a living
    /// opponent. The fallen and the fled threaten nothing.
    pub fn threat_zone(&self, side: Side) -> HashSet<Position> {
        self.grid
            .threat_zone(self.living(side.opponent()).map(|c| c.position))
    }

    /// AI profile of a monster.
    pub fn profile(&self, id: &CombatantId) -> Option<&MonsterAiProfile> {
        let profile_id = self.participants.get(id)?.ai_profile_id.as_ref()?;
        self.profiles.get(profile_id)
    }

    /// Scaling factor applied to a monster type in this session.
    pub fn scaling_factor(&self, monster_type: &str) -> Option<f64> {
        self.scaling_factors.get(monster_type).copied()
    }

    /// The battlefield.
    pub fn grid(&self) -> &TacticalGrid {
        &self.grid
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take every retained event out of the log.
    pub fn drain_events(&mut self) -> Vec<crate::event::CombatEvent> {
        self.events.drain()
    }

    /// Results, once completed.
    pub fn result(&self) -> Option<&CombatResult> {
        self.result.as_ref()
    }

    /// Records handed to combat memory on completion.
    pub fn encounter_records(&self) -> &[EncounterRecord] {
        &self.records
    }

    /// The combat memory lent to this session.
    pub fn memory(&self) -> &CombatMemory {
        &self.memory
    }

    /// Give the combat memory back to the host.
    pub fn into_memory(self) -> CombatMemory {
        self.memory
    }

    /// A read-only copy of the session's public state.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            status: self.status,
            round: self.round,
            turn_index: self.order.index(),
            turn_order: self.order.ids(),
            current_turn: self.current_turn().cloned(),
            combatants: self.participants.values().cloned().collect(),
            location_ref: self.location_ref.clone(),
            result: self.result.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Turn lifecycle internals
    // -----------------------------------------------------------------------

    fn start_turn(&mut self) -> SessionResult<()> {
        let Some(id) = self.order.current().cloned() else {
            let detail = format!(
                "turn index {} out of bounds for {} entries",
                self.order.index(),
                self.order.len()
            );
            return Err(self.invariant_violation(detail));
        };
        match self.participants.get(&id).map(Combatant::is_living) {
            None => {
                let detail = format!("turn order references unknown combatant {id}");
                return Err(self.invariant_violation(detail));
            }
            Some(false) => {
                let detail = format!("turn order references downed combatant {id}");
                return Err(self.invariant_violation(detail));
            }
            Some(true) => {}
        }

        let combatant = self.participant_mut(&id)?;
        let expired = combatant.reset_for_turn();
        let name = combatant.name.clone();
        let player = combatant.is_player_controlled();
        for status in expired {
            let description = format!("{status} wears off {name}");
            self.emit(
                CombatEventKind::StatusExpired {
                    combatant_id: id.clone(),
                    status,
                },
                description,
            );
        }
        self.resolve_pending_defense(&id);

        debug!(session = %self.id, round = self.round, combatant = %id, "turn started");
        self.emit(
            CombatEventKind::TurnStarted {
                combatant_id: id.clone(),
                round: self.round,
            },
            format!("Round {}: {name}'s turn", self.round),
        );

        if !player {
            self.run_ai_turn(&id)?;
        }
        Ok(())
    }

    fn begin_round(&mut self) {
        self.round += 1;
        let participants = &self.participants;
        self.order
            .retain(|entry| participants.get(&entry.id).is_some_and(Combatant::is_living));
        let order = self.order.ids();
        info!(session = %self.id, round = self.round, living = order.len(), "round started");
        let description = format!("Round {} begins", self.round);
        self.emit(
            CombatEventKind::RoundStarted {
                round: self.round,
                order,
            },
            description,
        );
    }

    fn check_termination(&self) -> Option<CombatOutcome> {
        if self.living(Side::Player).next().is_none() {
            Some(CombatOutcome::Defeat)
        } else if self.living(Side::Enemy).next().is_none() {
            Some(CombatOutcome::Victory)
        } else {
            None
        }
    }

    fn complete_session(&mut self, outcome: CombatOutcome, reason: &str) {
        if self.status == SessionStatus::Completed {
            return;
        }
        let was_active = self.status == SessionStatus::Active;
        self.status = SessionStatus::Completed;

        let result = self.compute_result(outcome, reason);
        info!(
            session = %self.id,
            %outcome,
            reason,
            rounds = result.rounds,
            total_xp = result.total_xp,
            "combat ended"
        );
        self.emit(
            CombatEventKind::SessionEnded {
                session_id: self.id,
                outcome,
                reason: reason.to_string(),
                rounds: result.rounds,
                total_xp: result.total_xp,
            },
            format!("Combat ends in {outcome} after {} rounds", result.rounds),
        );

        if was_active {
            self.records = self.build_records(outcome);
            for record in &self.records {
                self.memory.record(record);
            }
            if let Some(recorder) = self.collaborators.recorder.as_mut()
                && let Err(err) = recorder.record_encounter(self.id, &result, &self.records)
            {
                warn!(session = %self.id, error = %err, "encounter recorder failed");
            }
        }
        self.result = Some(result);
    }

    fn compute_result(&self, outcome: CombatOutcome, reason: &str) -> CombatResult {
        let surviving_players = self.living(Side::Player).map(|c| c.id.clone()).collect();
        let defeated: Vec<&Combatant> = self
            .participants
            .values()
            .filter(|c| c.side == Side::Enemy && !c.is_living())
            .collect();
        CombatResult {
            outcome,
            reason: reason.to_string(),
            surviving_players,
            defeated_enemies: defeated.iter().map(|c| c.id.clone()).collect(),
            total_xp: defeated.iter().map(|c| c.xp).sum(),
            rounds: self.round,
        }
    }

    fn build_records(&self, outcome: CombatOutcome) -> Vec<EncounterRecord> {
        let monster_types: BTreeSet<&String> = self
            .participants
            .values()
            .filter_map(|c| c.monster_type.as_ref())
            .collect();
        let recorded_at = Utc::now();
        monster_types
            .into_iter()
            .map(|monster_type| EncounterRecord {
                session_id: self.id,
                monster_type: monster_type.clone(),
                outcome: outcome.for_monsters(),
                rounds: self.round,
                scaling_factor: self.scaling_factor(monster_type).unwrap_or(1.0),
                tactics: self
                    .session_tactics
                    .get(monster_type)
                    .cloned()
                    .unwrap_or_default(),
                recorded_at,
            })
            .collect()
    }

    /// Report a corrupt turn state: the session completes immediately.
    fn invariant_violation(&mut self, detail: String) -> SessionError {
        error!(session = %self.id, %detail, "invariant violation");
        self.emit(
            CombatEventKind::InvariantViolation {
                detail: detail.clone(),
            },
            format!("Combat halted: {detail}"),
        );
        self.complete_session(CombatOutcome::Interrupted, INVARIANT_VIOLATION);
        SessionError::InvariantViolation(detail)
    }

    // -----------------------------------------------------------------------
    // Roster internals
    // -----------------------------------------------------------------------

    fn prepare_enemy(
        &self,
        spawn: EnemySpawn,
        party: &[&Combatant],
        counts: &mut HashMap<String, u32>,
    ) -> SessionResult<PreparedEnemy> {
        spawn.statblock.validate()?;
        let monster_type = spawn.statblock.id.clone();
        let bias = self.memory.difficulty_bias(&monster_type);
        let scaled = self
            .scaler
            .scale_for_party(&spawn.statblock, party.iter().copied(), bias);

        let id = match spawn.id {
            Some(id) => id,
            None => {
                let n = counts.entry(monster_type.clone()).or_insert(0);
                *n += 1;
                CombatantId::new(format!("{monster_type}-{n}"))
            }
        };
        let combatant = scaled.spawn(id.clone(), spawn.position);
        let profile = MonsterAiProfile::from_statblock(id.as_str(), &scaled.statblock)
            .with_learning(self.memory.tactic_stats(&monster_type));
        Ok(PreparedEnemy {
            combatant,
            profile,
            monster_type,
            factor: scaled.record.factor,
        })
    }

    fn admit(
        &mut self,
        mut combatant: Combatant,
        profile: Option<MonsterAiProfile>,
    ) -> SessionResult<usize> {
        if self.participants.contains_key(&combatant.id) {
            return Err(ValidationError::DuplicateCombatant(combatant.id.clone()).into());
        }
        let occupied = self.occupied_by_others(&combatant.id);
        self.check_placement(&combatant, &occupied)?;

        if combatant.side == Side::Enemy {
            let profile_id = combatant
                .ai_profile_id
                .get_or_insert_with(|| combatant.id.to_string())
                .clone();
            let profile = profile.unwrap_or_else(|| MonsterAiProfile::from_combatant(&combatant));
            self.profiles.insert(profile_id, profile);
        }

        let index =
            InitiativeScheduler::insert_combatant(&mut self.order, &mut combatant, &mut self.rng);
        let id = combatant.id.clone();
        let side = combatant.side;
        let initiative = combatant.initiative;
        let description = format!("{} joins the fight", combatant.name);
        self.participants.insert(id.clone(), combatant);
        info!(session = %self.id, combatant = %id, initiative, index, "combatant joined");
        self.emit(
            CombatEventKind::CombatantJoined {
                combatant_id: id,
                side,
                initiative,
            },
            description,
        );
        Ok(index)
    }

    fn check_placement(
        &self,
        combatant: &Combatant,
        occupied: &HashSet<Position>,
    ) -> Result<(), ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidPlacement {
            id: combatant.id.clone(),
            position: combatant.position,
            reason,
        };
        self.grid
            .validate_placement(combatant.position)
            .map_err(|err| invalid(err.to_string()))?;
        if occupied.contains(&combatant.position) {
            return Err(invalid("cell is occupied".to_string()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shared helpers
    // -----------------------------------------------------------------------

    fn ensure_active(&self) -> Result<(), ValidationError> {
        if self.status != SessionStatus::Active {
            return Err(ValidationError::SessionNotActive {
                status: self.status,
            });
        }
        Ok(())
    }

    fn is_living(&self, id: &CombatantId) -> bool {
        self.participants.get(id).is_some_and(Combatant::is_living)
    }

    fn participant(&self, id: &CombatantId) -> SessionResult<&Combatant> {
        self.participants.get(id).ok_or_else(|| {
            warn!(session = %self.id, combatant = %id, "combatant not found");
            SessionError::CombatantNotFound(id.clone())
        })
    }

    fn participant_mut(&mut self, id: &CombatantId) -> SessionResult<&mut Combatant> {
        let session = self.id;
        self.participants.get_mut(id).ok_or_else(|| {
            warn!(session = %session, combatant = %id, "combatant not found");
            SessionError::CombatantNotFound(id.clone())
        })
    }

    fn name_of(&self, id: &CombatantId) -> String {
        self.participants
            .get(id)
            .map_or_else(|| id.to_string(), |c| c.name.clone())
    }

    /// Cells held by living combatants other than `id`.
    /// Cells held by anyone still on the field, fallen bodies included.
    fn occupied_by_others(&self, id: &CombatantId) -> HashSet<Position> {
        self.participants
            .values()
            .filter(|c| &c.id != id && !c.has_fled())
            .map(|c| c.position)
            .collect()
    }

    fn emit(&mut self, kind: CombatEventKind, description: String) {
        if let Some(narrator) = self.collaborators.narrator.as_mut()
            && let Err(err) = narrator.announce(&description)
        {
            warn!(session = %self.id, event = kind.name(), error = %err, "narrator failed");
        }
        self.events.push(self.round, kind, description);
    }
}

#[cfg(test)]
mod tests;
