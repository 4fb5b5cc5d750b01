use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use sk_core::{CombatantId, Position, SessionId, Side, StatusKind};
use sk_grid::{TacticalGrid, TerrainCell};
use sk_mechanics::{Attack, Combatant, DamageFormula, Resource, RuleConfig};
use sk_monster::{CombatMemory, EncounterOutcome, EncounterRecord, MonsterStatblock};

use super::*;
use crate::collaborator::{Collaborators, EncounterRecorder, Narrator};
use crate::error::CollaboratorError;

fn pos(x: i32, y: i32) -> Position {
    Position::new(x, y)
}

fn open_grid() -> TacticalGrid {
    TacticalGrid::new(12, 12).unwrap()
}

fn goblin() -> MonsterStatblock {
    MonsterStatblock::new("goblin", "Goblin", 7, 13)
        .with_attack(Attack::melee(
            "Scimitar",
            4,
            DamageFormula::parse("1d6").unwrap(),
        ))
        .with_xp(50)
}

/// A monster that will not go down or run in any test that doesn't mean
/// it to.
fn ogre() -> MonsterStatblock {
    MonsterStatblock::new("ogre", "Ogre", 500, 11)
        .with_attack(Attack::melee("Club", 2, DamageFormula::parse("1d4").unwrap()))
        .with_xp(450)
}

fn fighter(id: &str, position: Position) -> PlayerTemplate {
    PlayerTemplate::new(id, format!("Fighter {id}"), 40, 16, position)
        .with_level(3)
        .with_attack(Attack::melee(
            "Longsword",
            5,
            DamageFormula::parse("1d8").unwrap(),
        ))
}

/// Always hits and always drops whatever it hits.
fn executioner(id: &str, position: Position) -> PlayerTemplate {
    PlayerTemplate::new(id, "Executioner", 1000, 16, position)
        .with_attack(Attack::melee("Greataxe", 40, DamageFormula::flat(1000)))
}

fn session(config: EngineConfig) -> CombatSession {
    CombatSession::new(config, open_grid(), CombatMemory::new())
}

fn started(players: Vec<PlayerTemplate>, enemies: Vec<EnemySpawn>) -> CombatSession {
    let mut s = session(EngineConfig::default());
    s.start("ambush", players, enemies).unwrap();
    s
}

/// End turns until a player owns the turn. Monster turns run on the way.
fn until_player_turn(s: &mut CombatSession) -> CombatantId {
    for _ in 0..50 {
        assert_eq!(s.status(), SessionStatus::Active, "session ended early");
        if let Some(c) = s.current_combatant()
            && c.is_player_controlled()
        {
            return c.id.clone();
        }
        s.end_turn().unwrap();
    }
    panic!("no player turn within 50 turns");
}

/// Attack an adjacent enemy if there is one, otherwise do nothing.
fn autoplay(s: &mut CombatSession) {
    let Some(actor) = s
        .current_combatant()
        .filter(|c| c.is_player_controlled())
        .cloned()
    else {
        return;
    };
    let target = s
        .living(Side::Enemy)
        .find(|e| e.position.is_adjacent(actor.position))
        .map(|e| e.id.clone());
    if let Some(target) = target {
        let _ = s.attack(&actor.id, &target, 0);
    }
}

fn id(s: &str) -> CombatantId {
    CombatantId::new(s)
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

#[test]
fn start_rolls_initiative_and_opens_round_one() {
    let s = started(
        vec![fighter("aria", pos(0, 0)), fighter("bram", pos(1, 0))],
        vec![EnemySpawn::new(goblin(), pos(10, 10))],
    );

    assert_eq!(s.status(), SessionStatus::Active);
    assert_eq!(s.round(), 1);
    assert_eq!(s.trigger(), "ambush");
    assert_eq!(s.turn_order().len(), 3);
    assert!(s.turn_order().contains(&id("goblin-1")));

    let entries = s.turn_order().entries();
    for pair in entries.windows(2) {
        assert!(pair[0].total >= pair[1].total);
    }

    let first = &s.events().events()[0];
    assert!(matches!(first.kind, CombatEventKind::SessionStarted { .. }));
    assert!(
        s.events()
            .events()
            .iter()
            .any(|e| matches!(e.kind, CombatEventKind::TurnStarted { round: 1, .. }))
    );
}

#[test]
fn enemies_are_scaled_and_profiled() {
    let s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![
            EnemySpawn::new(goblin(), pos(10, 10)),
            EnemySpawn::new(goblin(), pos(11, 10)),
        ],
    );

    let factor = s.scaling_factor("goblin").unwrap();
    assert!((0.5..=2.0).contains(&factor));
    for name in ["goblin-1", "goblin-2"] {
        let goblin = s.combatant(&id(name)).unwrap();
        assert_eq!(goblin.side, Side::Enemy);
        assert_eq!(goblin.monster_type.as_deref(), Some("goblin"));
        assert!(s.profile(&id(name)).is_some());
    }
}

#[test]
fn explicit_enemy_ids_are_kept() {
    let s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(10, 10)).with_id("boss")],
    );
    assert!(s.combatant(&id("boss")).is_some());
}

#[test]
fn start_twice_is_rejected() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(10, 10))],
    );
    let err = s
        .start(
            "again",
            vec![fighter("aria", pos(0, 0))],
            vec![EnemySpawn::new(goblin(), pos(10, 10))],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::AlreadyStarted)
    ));
}

#[test]
fn empty_rosters_are_rejected() {
    let mut s = session(EngineConfig::default());
    let err = s
        .start("ambush", vec![], vec![EnemySpawn::new(goblin(), pos(5, 5))])
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyRoster(Side::Player))
    ));

    let err = s
        .start("ambush", vec![fighter("aria", pos(0, 0))], vec![])
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::EmptyRoster(Side::Enemy))
    ));
    assert_eq!(s.status(), SessionStatus::Pending);
}

#[test]
fn bad_placement_leaves_the_session_untouched() {
    let grid = open_grid()
        .with_cell(pos(3, 3), TerrainCell::obstacle())
        .unwrap();
    let mut s = CombatSession::new(EngineConfig::default(), grid, CombatMemory::new());

    let err = s
        .start(
            "ambush",
            vec![fighter("aria", pos(0, 0))],
            vec![EnemySpawn::new(goblin(), pos(3, 3))],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::InvalidPlacement { .. })
    ));

    let err = s
        .start(
            "ambush",
            vec![fighter("aria", pos(0, 0))],
            vec![EnemySpawn::new(goblin(), pos(40, 0))],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::InvalidPlacement { .. })
    ));

    let err = s
        .start(
            "ambush",
            vec![fighter("aria", pos(0, 0))],
            vec![EnemySpawn::new(goblin(), pos(0, 0))],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::InvalidPlacement { .. })
    ));

    assert_eq!(s.status(), SessionStatus::Pending);
    assert_eq!(s.round(), 0);
    assert_eq!(s.combatants().count(), 0);
    assert!(s.events().is_empty());
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut s = session(EngineConfig::default());
    let err = s
        .start(
            "ambush",
            vec![fighter("aria", pos(0, 0)), fighter("aria", pos(1, 0))],
            vec![EnemySpawn::new(goblin(), pos(10, 10))],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::DuplicateCombatant(_))
    ));
}

#[test]
fn invalid_statblock_is_rejected() {
    let mut s = session(EngineConfig::default());
    let broken = MonsterStatblock::new("wisp", "Wisp", 0, 12);
    let err = s
        .start(
            "ambush",
            vec![fighter("aria", pos(0, 0))],
            vec![EnemySpawn::new(broken, pos(5, 5))],
        )
        .unwrap_err();
    assert!(matches!(err, SessionError::Monster(_)));
    assert_eq!(s.status(), SessionStatus::Pending);
}

// ---------------------------------------------------------------------------
// Player actions
// ---------------------------------------------------------------------------

#[test]
fn acting_out_of_turn_is_rejected() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0)), fighter("bram", pos(0, 2))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let current = until_player_turn(&mut s);
    let other = if current == id("aria") {
        id("bram")
    } else {
        id("aria")
    };

    let err = s.move_to(&other, pos(1, 1)).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::NotYourTurn { .. })
    ));
    let err = s.defend(&id("nobody")).unwrap_err();
    assert!(matches!(err, SessionError::CombatantNotFound(_)));
}

#[test]
fn moving_spends_movement() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let aria = until_player_turn(&mut s);

    assert_eq!(s.move_to(&aria, pos(2, 0)).unwrap(), 10);
    let me = s.combatant(&aria).unwrap();
    assert_eq!(me.position, pos(2, 0));
    assert_eq!(me.economy.movement, 20);
    assert!(
        s.events()
            .events()
            .iter()
            .any(|e| matches!(e.kind, CombatEventKind::CombatantMoved { feet: 10, .. }))
    );
}

#[test]
fn illegal_moves_change_nothing() {
    let grid = open_grid()
        .with_cell(pos(1, 0), TerrainCell::obstacle())
        .unwrap();
    let mut s = CombatSession::new(EngineConfig::default(), grid, CombatMemory::new());
    s.start(
        "ambush",
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    )
    .unwrap();
    let aria = until_player_turn(&mut s);

    for destination in [pos(0, 0), pos(1, 0), pos(11, 0), pos(-1, 0)] {
        let err = s.move_to(&aria, destination).unwrap_err();
        assert!(
            matches!(
                err,
                SessionError::Validation(ValidationError::IllegalMove { .. })
            ),
            "{destination} should be rejected"
        );
    }
    let me = s.combatant(&aria).unwrap();
    assert_eq!(me.position, pos(0, 0));
    assert_eq!(me.economy.movement, 30);
}

#[test]
fn attack_validation() {
    let mut s = started(
        vec![executioner("exe", pos(0, 0)), fighter("bram", pos(0, 1))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let actor = until_player_turn(&mut s);
    let ally = if actor == id("exe") { id("bram") } else { id("exe") };

    let err = s.attack(&actor, &id("goblin-1"), 0).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::OutOfRange { .. })
    ));
    let err = s.attack(&actor, &ally, 0).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::InvalidTarget { .. })
    ));
    let err = s.attack(&actor, &id("goblin-1"), 7).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::UnknownAttack { index: 7, .. })
    ));
    assert!(s.combatant(&actor).unwrap().economy.has(Resource::Action));
}

#[test]
fn downing_the_last_enemy_ends_in_victory() {
    let mut s = started(
        vec![executioner("exe", pos(5, 5))],
        vec![EnemySpawn::new(goblin(), pos(6, 5))],
    );
    let exe = until_player_turn(&mut s);

    let outcome = s.attack(&exe, &id("goblin-1"), 0).unwrap();
    assert!(outcome.hit);
    assert!(!s.combatant(&id("goblin-1")).unwrap().is_living());
    assert!(
        s.combatant(&id("goblin-1"))
            .unwrap()
            .has_status(&StatusKind::Dead)
    );
    assert_eq!(s.status(), SessionStatus::Active);

    s.end_turn().unwrap();
    assert_eq!(s.status(), SessionStatus::Completed);
    let result = s.result().unwrap();
    assert_eq!(result.outcome, CombatOutcome::Victory);
    assert_eq!(result.reason, SIDE_ELIMINATED);
    assert_eq!(result.defeated_enemies, vec![id("goblin-1")]);
    assert_eq!(result.surviving_players, vec![exe]);
    assert_eq!(result.total_xp, 50);

    let kinds: Vec<&str> = s.events().events().iter().map(|e| e.kind.name()).collect();
    assert!(kinds.contains(&"combatant-down"));
    assert_eq!(kinds.last(), Some(&"session-ended"));

    assert_eq!(s.memory().record_count(), 1);
    let record = &s.encounter_records()[0];
    assert_eq!(record.monster_type, "goblin");
    assert_eq!(record.outcome, EncounterOutcome::MonsterDefeat);
}

#[test]
fn the_fallen_still_hold_their_cell() {
    let mut s = started(
        vec![executioner("exe", pos(5, 0))],
        vec![
            EnemySpawn::new(goblin(), pos(6, 0)),
            EnemySpawn::new(goblin(), pos(0, 11)),
        ],
    );
    let exe = until_player_turn(&mut s);
    let body = s.combatant(&id("goblin-1")).unwrap().position;

    assert!(s.attack(&exe, &id("goblin-1"), 0).unwrap().hit);
    assert!(!s.combatant(&id("goblin-1")).unwrap().is_living());

    let err = s.move_to(&exe, body).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::IllegalMove { .. })
    ));
    assert_eq!(s.combatant(&exe).unwrap().position, pos(5, 0));
    assert_eq!(s.combatant(&exe).unwrap().economy.movement, 30);
}

#[test]
fn threat_zone_covers_only_living_opponents() {
    let mut s = started(
        vec![executioner("exe", pos(5, 0))],
        vec![
            EnemySpawn::new(goblin(), pos(6, 0)),
            EnemySpawn::new(goblin(), pos(0, 11)),
        ],
    );
    let exe = until_player_turn(&mut s);
    let goblin_at = s.combatant(&id("goblin-1")).unwrap().position;
    let beside = Position::new(goblin_at.x + 1, goblin_at.y + 1);
    assert!(s.threat_zone(Side::Player).contains(&beside));
    assert!(s.threat_zone(Side::Enemy).contains(&goblin_at));

    s.attack(&exe, &id("goblin-1"), 0).unwrap();

    let zone = s.threat_zone(Side::Player);
    assert!(!zone.contains(&beside));
    assert!(!zone.is_empty());
    let far = s.combatant(&id("goblin-2")).unwrap().position;
    assert!(far.neighbors().all(|n| !s.grid().in_bounds(n) || zone.contains(&n)));
}

#[test]
fn defend_lasts_until_the_next_turn() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let aria = until_player_turn(&mut s);

    s.defend(&aria).unwrap();
    assert!(
        s.combatant(&aria)
            .unwrap()
            .has_status(&StatusKind::Defending)
    );
    let err = s.defend(&aria).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Validation(ValidationError::InsufficientResource(Resource::Action))
    ));

    s.end_turn().unwrap();
    until_player_turn(&mut s);
    assert!(
        !s.combatant(&aria)
            .unwrap()
            .has_status(&StatusKind::Defending)
    );
    assert!(s.events().events().iter().any(|e| matches!(
        &e.kind,
        CombatEventKind::StatusExpired { combatant_id, status: StatusKind::Defending }
            if combatant_id == &aria
    )));
}

#[test]
fn dash_doubles_movement_once() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let aria = until_player_turn(&mut s);

    assert_eq!(s.dash(&aria).unwrap(), 60);
    assert!(s.dash(&aria).is_err());
    assert_eq!(s.move_to(&aria, pos(0, 10)).unwrap(), 50);
}

#[test]
fn a_fled_party_loses() {
    let config = EngineConfig::default().with_rules(RuleConfig::default().with_flee_dc(1));
    let mut s = session(config);
    s.start(
        "ambush",
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    )
    .unwrap();
    let aria = until_player_turn(&mut s);

    assert!(s.flee(&aria).unwrap());
    let me = s.combatant(&aria).unwrap();
    assert!(me.has_fled());
    assert!(!me.is_living());

    s.end_turn().unwrap();
    let result = s.result().unwrap();
    assert_eq!(result.outcome, CombatOutcome::Defeat);
    assert!(result.surviving_players.is_empty());
    assert_eq!(
        s.encounter_records()[0].outcome,
        EncounterOutcome::MonsterVictory
    );
}

#[test]
fn failed_flee_costs_the_action_and_movement() {
    let config = EngineConfig::default().with_rules(RuleConfig::default().with_flee_dc(21));
    let mut s = session(config);
    s.start(
        "ambush",
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    )
    .unwrap();
    let aria = until_player_turn(&mut s);

    assert!(!s.flee(&aria).unwrap());
    let me = s.combatant(&aria).unwrap();
    assert!(me.is_living());
    assert_eq!(me.economy.movement, 0);
    assert!(!me.economy.has(Resource::Action));
    assert!(s.events().events().iter().any(|e| matches!(
        e.kind,
        CombatEventKind::FleeAttempted { success: false, .. }
    )));
}

// ---------------------------------------------------------------------------
// Ending
// ---------------------------------------------------------------------------

#[test]
fn force_end_is_idempotent() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let first = s.force_end("player_retreat").cloned().unwrap();
    assert_eq!(first.outcome, CombatOutcome::Interrupted);
    assert_eq!(first.reason, "player_retreat");

    let events = s.events().len();
    let second = s.force_end("something_else").cloned().unwrap();
    assert_eq!(second.reason, "player_retreat");
    assert_eq!(s.events().len(), events);
    assert_eq!(s.memory().record_count(), 1);

    assert!(matches!(
        s.end_turn(),
        Err(SessionError::Validation(
            ValidationError::SessionNotActive {
                status: SessionStatus::Completed
            }
        ))
    ));
    assert!(s.defend(&id("aria")).is_err());
}

#[test]
fn force_end_before_start_writes_no_memory() {
    let mut s = session(EngineConfig::default());
    let result = s.force_end("cancelled").cloned().unwrap();
    assert_eq!(result.outcome, CombatOutcome::Interrupted);
    assert_eq!(s.status(), SessionStatus::Completed);
    assert_eq!(s.memory().record_count(), 0);
}

#[test]
fn corrupt_turn_order_halts_the_session() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0)), fighter("bram", pos(0, 2))],
        vec![
            EnemySpawn::new(ogre(), pos(11, 11)),
            EnemySpawn::new(ogre(), pos(11, 9)),
        ],
    );
    while s.order.index() + 1 >= s.order.len() {
        s.end_turn().unwrap();
    }
    let next = s.order.entries()[s.order.index() + 1].id.clone();
    s.participants.remove(&next);

    let err = s.end_turn().unwrap_err();
    assert!(matches!(err, SessionError::InvariantViolation(_)));
    assert_eq!(s.status(), SessionStatus::Completed);
    let result = s.result().unwrap();
    assert_eq!(result.outcome, CombatOutcome::Interrupted);
    assert_eq!(result.reason, INVARIANT_VIOLATION);
    assert!(
        s.events()
            .events()
            .iter()
            .any(|e| matches!(e.kind, CombatEventKind::InvariantViolation { .. }))
    );
}

// ---------------------------------------------------------------------------
// Reinforcements
// ---------------------------------------------------------------------------

#[test]
fn reinforcements_keep_the_current_turn() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let aria = until_player_turn(&mut s);

    let joined = s
        .insert_enemy(EnemySpawn::new(goblin(), pos(11, 0)))
        .unwrap();
    assert_eq!(joined, id("goblin-2"));
    assert_eq!(s.current_turn(), Some(&aria));
    assert_eq!(s.turn_order().len(), 3);
    assert!(s.profile(&joined).is_some());
    assert!(s.events().events().iter().any(|e| matches!(
        &e.kind,
        CombatEventKind::CombatantJoined { combatant_id, .. } if combatant_id == &joined
    )));
}

#[test]
fn prebuilt_combatants_are_checked_and_profiled() {
    let mut s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let aria = until_player_turn(&mut s);

    let duplicate = Combatant::new("goblin-1", "Goblin", Side::Enemy).at(pos(5, 5));
    assert!(matches!(
        s.insert_combatant(duplicate),
        Err(SessionError::Validation(
            ValidationError::DuplicateCombatant(_)
        ))
    ));
    let here = s.combatant(&aria).unwrap().position;
    let stacked = Combatant::new("wolf", "Wolf", Side::Enemy).at(here);
    assert!(matches!(
        s.insert_combatant(stacked),
        Err(SessionError::Validation(
            ValidationError::InvalidPlacement { .. }
        ))
    ));

    let wolf = Combatant::new("wolf", "Wolf", Side::Enemy)
        .with_hit_points(11)
        .at(pos(6, 6));
    s.insert_combatant(wolf).unwrap();
    assert_eq!(s.current_turn(), Some(&aria));
    assert!(s.profile(&id("wolf")).is_some());
}

// ---------------------------------------------------------------------------
// Memory, collaborators, determinism
// ---------------------------------------------------------------------------

#[test]
fn memory_bias_raises_scaling() {
    let mut beaten = CombatMemory::new();
    for _ in 0..3 {
        beaten.record(&EncounterRecord {
            session_id: SessionId::new(),
            monster_type: "goblin".to_string(),
            outcome: EncounterOutcome::MonsterDefeat,
            rounds: 1,
            scaling_factor: 1.0,
            tactics: Default::default(),
            recorded_at: chrono::Utc::now(),
        });
    }
    let players = || vec![fighter("aria", pos(0, 0))];
    let enemies = || vec![EnemySpawn::new(goblin(), pos(11, 11))];

    let mut plain = session(EngineConfig::default());
    plain.start("ambush", players(), enemies()).unwrap();
    let mut biased = CombatSession::new(EngineConfig::default(), open_grid(), beaten);
    biased.start("ambush", players(), enemies()).unwrap();

    assert!(biased.scaling_factor("goblin").unwrap() > plain.scaling_factor("goblin").unwrap());
}

#[derive(Debug, Default)]
struct Transcript(Rc<RefCell<Vec<String>>>);

impl Narrator for Transcript {
    fn announce(&mut self, text: &str) -> Result<(), CollaboratorError> {
        self.0.borrow_mut().push(text.to_string());
        Ok(())
    }
}

#[derive(Debug)]
struct BrokenNarrator;

impl Narrator for BrokenNarrator {
    fn announce(&mut self, _text: &str) -> Result<(), CollaboratorError> {
        Err(CollaboratorError("speaker unplugged".to_string()))
    }
}

#[derive(Debug, Default)]
struct Archive(Rc<RefCell<Vec<(CombatOutcome, usize)>>>);

impl EncounterRecorder for Archive {
    fn record_encounter(
        &mut self,
        _session_id: SessionId,
        result: &CombatResult,
        records: &[EncounterRecord],
    ) -> Result<(), CollaboratorError> {
        self.0.borrow_mut().push((result.outcome, records.len()));
        Ok(())
    }
}

#[test]
fn narrator_hears_every_event() {
    let lines = Rc::new(RefCell::new(Vec::new()));
    let mut s = session(EngineConfig::default()).with_collaborators(
        Collaborators::new().with_narrator(Transcript(Rc::clone(&lines))),
    );
    s.start(
        "ambush",
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    )
    .unwrap();

    let described: Vec<String> = s
        .events()
        .events()
        .iter()
        .map(|e| e.description.clone())
        .collect();
    assert_eq!(*lines.borrow(), described);
}

#[test]
fn collaborator_failures_do_not_stop_the_fight() {
    let archive = Rc::new(RefCell::new(Vec::new()));
    let mut s = session(EngineConfig::default()).with_collaborators(
        Collaborators::new()
            .with_narrator(BrokenNarrator)
            .with_recorder(Archive(Rc::clone(&archive))),
    );
    s.start(
        "ambush",
        vec![fighter("aria", pos(0, 0))],
        vec![
            EnemySpawn::new(goblin(), pos(11, 11)),
            EnemySpawn::new(ogre(), pos(10, 11)),
        ],
    )
    .unwrap();
    until_player_turn(&mut s);
    s.force_end("player_retreat");

    assert_eq!(
        *archive.borrow(),
        vec![(CombatOutcome::Interrupted, 2usize)]
    );
}

fn play_out(seed: u64, turns: usize) -> Vec<String> {
    let mut s = session(EngineConfig::default().with_seed(seed));
    s.start(
        "ambush",
        vec![fighter("aria", pos(2, 2)), fighter("bram", pos(3, 2))],
        vec![
            EnemySpawn::new(goblin(), pos(5, 5)),
            EnemySpawn::new(goblin(), pos(6, 5)),
        ],
    )
    .unwrap();
    for _ in 0..turns {
        if s.status() != SessionStatus::Active {
            break;
        }
        autoplay(&mut s);
        s.end_turn().unwrap();
    }
    s.events()
        .events()
        .iter()
        .map(|e| e.description.clone())
        .collect()
}

#[test]
fn same_seed_same_fight() {
    assert_eq!(play_out(7, 30), play_out(7, 30));
}

#[test]
fn snapshot_mirrors_the_session() {
    let s = started(
        vec![fighter("aria", pos(0, 0))],
        vec![EnemySpawn::new(goblin(), pos(11, 11))],
    );
    let snap = s.snapshot();
    assert_eq!(snap.session_id, s.id());
    assert_eq!(snap.round, 1);
    assert_eq!(snap.turn_order, s.turn_order().ids());
    assert_eq!(snap.current_turn.as_ref(), s.current_turn());
    assert_eq!(snap.combatants.len(), 2);
    assert!(snap.result.is_none());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn rounds_start_with_exactly_the_living(seed in any::<u64>(), gx in 3i32..8, gy in 3i32..8) {
        let mut s = session(EngineConfig::default().with_seed(seed));
        s.start(
            "ambush",
            vec![fighter("aria", pos(0, 0)), fighter("bram", pos(1, 0))],
            vec![
                EnemySpawn::new(goblin(), pos(gx, gy)),
                EnemySpawn::new(goblin(), pos(gx + 1, gy)),
                EnemySpawn::new(goblin(), pos(gx, gy + 1)),
            ],
        )
        .unwrap();
        s.drain_events();

        for _ in 0..60 {
            if s.status() != SessionStatus::Active {
                break;
            }
            autoplay(&mut s);
            let mut living_before: Vec<CombatantId> = s
                .combatants()
                .filter(|c| c.is_living())
                .map(|c| c.id.clone())
                .collect();
            living_before.sort();

            s.end_turn().unwrap();
            for event in s.drain_events() {
                if let CombatEventKind::RoundStarted { order, .. } = event.kind {
                    let mut order = order;
                    order.sort();
                    prop_assert_eq!(&order, &living_before);
                }
            }
        }
    }

    #[test]
    fn eliminating_a_side_ends_on_the_next_turn_end(seed in any::<u64>(), players_lose in any::<bool>()) {
        let mut s = session(EngineConfig::default().with_seed(seed));
        s.start(
            "ambush",
            vec![fighter("aria", pos(0, 0))],
            vec![
                EnemySpawn::new(ogre(), pos(11, 11)),
                EnemySpawn::new(ogre(), pos(11, 9)),
            ],
        )
        .unwrap();

        let side = if players_lose { Side::Player } else { Side::Enemy };
        for c in s.participants.values_mut().filter(|c| c.side == side) {
            c.hit_points = 0;
            let status = if side == Side::Player { StatusKind::Unconscious } else { StatusKind::Dead };
            c.add_status(status, sk_core::DurationRule::Permanent);
        }

        s.end_turn().unwrap();
        prop_assert_eq!(s.status(), SessionStatus::Completed);
        let expected = if players_lose { CombatOutcome::Defeat } else { CombatOutcome::Victory };
        prop_assert_eq!(s.result().unwrap().outcome, expected);
    }
}
