use serde::{Deserialize, Serialize};

use sk_core::{CombatantId, Position, SessionId, Side, StatusKind};
use sk_mechanics::AttackOutcome;
use sk_monster::AiDecision;

use crate::outcome::CombatOutcome;

/// What kind of combat event occurred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CombatEventKind {
    // Lifecycle
    /// Initiative was rolled and the first round began.
    SessionStarted {
        /// The session.
        session_id: SessionId,
        /// Participants in turn order.
        participants: Vec<CombatantId>,
    },
    /// A new round began and the turn order was rebuilt.
    RoundStarted {
        /// The new round number.
        round: u32,
        /// Living combatants in turn order.
        order: Vec<CombatantId>,
    },
    /// A combatant's turn began and its economy was reset.
    TurnStarted {
        /// The acting combatant.
        combatant_id: CombatantId,
        /// The current round.
        round: u32,
    },
    /// The session completed.
    SessionEnded {
        /// The session.
        session_id: SessionId,
        /// How it ended.
        outcome: CombatOutcome,
        /// Why it ended.
        reason: String,
        /// Rounds fought.
        rounds: u32,
        /// Experience from defeated enemies.
        total_xp: u32,
    },
    /// Turn state referenced something that does not exist.
    InvariantViolation {
        /// What went wrong.
        detail: String,
    },

    // Combat
    /// An attack roll was made.
    AttackResolved {
        /// The roll and its result.
        outcome: AttackOutcome,
    },
    /// Damage reduced a combatant's hit points.
    DamageApplied {
        /// Who was hit.
        target_id: CombatantId,
        /// Damage dealt.
        amount: u32,
        /// HP left.
        remaining_hp: u32,
    },
    /// A combatant dropped to 0 HP.
    CombatantDown {
        /// Who went down.
        combatant_id: CombatantId,
        /// Their side.
        side: Side,
    },

    // Movement and actions
    /// A combatant moved on the grid.
    CombatantMoved {
        /// Who moved.
        combatant_id: CombatantId,
        /// Starting cell.
        from: Position,
        /// Destination cell.
        to: Position,
        /// Movement spent.
        feet: u32,
    },
    /// A combatant took the dash action.
    Dashed {
        /// Who dashed.
        combatant_id: CombatantId,
        /// Movement left after the dash.
        movement: u32,
    },
    /// A status effect was attached.
    StatusApplied {
        /// Who received it.
        combatant_id: CombatantId,
        /// The effect.
        status: StatusKind,
    },
    /// A status effect ran out at its owner's turn start.
    StatusExpired {
        /// Whose effect.
        combatant_id: CombatantId,
        /// The effect.
        status: StatusKind,
    },
    /// A flee check was rolled.
    FleeAttempted {
        /// Who tried to flee.
        combatant_id: CombatantId,
        /// The d20 roll.
        roll: u32,
        /// Whether it beat the DC.
        success: bool,
    },
    /// A combatant left the fight for good.
    CombatantFled {
        /// Who fled.
        combatant_id: CombatantId,
    },
    /// A combatant joined mid-fight.
    CombatantJoined {
        /// Who joined.
        combatant_id: CombatantId,
        /// Their side.
        side: Side,
        /// Their initiative total.
        initiative: i32,
    },
    /// A monster chose its action.
    AiDecided {
        /// The monster.
        combatant_id: CombatantId,
        /// What it chose.
        decision: AiDecision,
    },
}

impl CombatEventKind {
    /// Check whether a given combatant is involved in this event.
    pub fn involves(&self, id: &CombatantId) -> bool {
        match self {
            Self::SessionStarted { participants, .. } => participants.contains(id),
            Self::RoundStarted { order, .. } => order.contains(id),
            Self::TurnStarted { combatant_id, .. }
            | Self::CombatantDown { combatant_id, .. }
            | Self::CombatantMoved { combatant_id, .. }
            | Self::Dashed { combatant_id, .. }
            | Self::StatusApplied { combatant_id, .. }
            | Self::StatusExpired { combatant_id, .. }
            | Self::FleeAttempted { combatant_id, .. }
            | Self::CombatantFled { combatant_id }
            | Self::CombatantJoined { combatant_id, .. }
            | Self::AiDecided { combatant_id, .. } => combatant_id == id,
            Self::DamageApplied { target_id, .. } => target_id == id,
            Self::AttackResolved { outcome } => &outcome.attacker == id || &outcome.target == id,
            Self::SessionEnded { .. } | Self::InvariantViolation { .. } => false,
        }
    }

    /// The kebab-case event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session-started",
            Self::RoundStarted { .. } => "round-started",
            Self::TurnStarted { .. } => "turn-started",
            Self::SessionEnded { .. } => "session-ended",
            Self::InvariantViolation { .. } => "invariant-violation",
            Self::AttackResolved { .. } => "attack-resolved",
            Self::DamageApplied { .. } => "damage-applied",
            Self::CombatantDown { .. } => "combatant-down",
            Self::CombatantMoved { .. } => "combatant-moved",
            Self::Dashed { .. } => "dashed",
            Self::StatusApplied { .. } => "status-applied",
            Self::StatusExpired { .. } => "status-expired",
            Self::FleeAttempted { .. } => "flee-attempted",
            Self::CombatantFled { .. } => "combatant-fled",
            Self::CombatantJoined { .. } => "combatant-joined",
            Self::AiDecided { .. } => "ai-decided",
        }
    }
}

/// A record of something that happened during a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatEvent {
    /// Position in the session's event stream, starting at 0.
    pub seq: u64,
    /// The round when this event occurred (0 before the fight starts).
    pub round: u32,
    /// The specific kind of event.
    pub kind: CombatEventKind,
    /// A human-readable description, suitable for narration.
    pub description: String,
}

/// Accumulates events during a session.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<CombatEvent>,
    max_events: usize,
    next_seq: u64,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
            next_seq: 0,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its
    /// capacity. Returns the event's sequence number.
    pub fn push(
        &mut self,
        round: u32,
        kind: CombatEventKind,
        description: impl Into<String>,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(CombatEvent {
            seq,
            round,
            kind,
            description: description.into(),
        });
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
        seq
    }

    /// Return a slice of all retained events.
    pub fn events(&self) -> &[CombatEvent] {
        &self.events
    }

    /// Return all retained events involving the given combatant.
    pub fn events_for(&self, id: &CombatantId) -> Vec<&CombatEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return retained events with a sequence number of at least `seq`.
    pub fn since(&self, seq: u64) -> &[CombatEvent] {
        let start = self.events.partition_point(|e| e.seq < seq);
        &self.events[start..]
    }

    /// Return all retained events from the given round.
    pub fn events_in_round(&self, round: u32) -> Vec<&CombatEvent> {
        self.events.iter().filter(|e| e.round == round).collect()
    }

    /// Take every retained event, leaving the log empty. Sequence numbers
    /// keep counting.
    pub fn drain(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sequence number the next event will get.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Return the number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if the log contains no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(id: &str, round: u32) -> CombatEventKind {
        CombatEventKind::TurnStarted {
            combatant_id: CombatantId::from(id),
            round,
        }
    }

    #[test]
    fn event_log_push_and_query() {
        let mut log = EventLog::new(0);
        let kael = CombatantId::from("kael");
        let orc = CombatantId::from("orc-1");

        log.push(1, turn("kael", 1), "Kael's turn");
        log.push(
            1,
            CombatEventKind::DamageApplied {
                target_id: orc.clone(),
                amount: 5,
                remaining_hp: 10,
            },
            "Orc takes 5 damage",
        );
        log.push(2, turn("orc-1", 2), "Orc's turn");

        assert_eq!(log.len(), 3);
        assert_eq!(log.events_in_round(1).len(), 2);
        assert_eq!(log.events_for(&kael).len(), 1);
        assert_eq!(log.events_for(&orc).len(), 2);
        assert_eq!(log.since(1).len(), 2);
        assert_eq!(log.since(3).len(), 0);
    }

    #[test]
    fn event_log_max_capacity() {
        let mut log = EventLog::new(3);
        for i in 0..5 {
            log.push(i, turn("kael", i), format!("turn {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.events()[0].seq, 2);
        // trimmed events are gone, later ones are still addressable by seq
        assert_eq!(log.since(0).len(), 3);
        assert_eq!(log.since(4).len(), 1);
    }

    #[test]
    fn drain_keeps_sequence() {
        let mut log = EventLog::new(0);
        log.push(1, turn("kael", 1), "a");
        log.push(1, turn("kael", 1), "b");
        let drained = log.drain();
        assert_eq!(drained.len(), 2);
        assert!(log.is_empty());
        assert_eq!(log.push(1, turn("kael", 1), "c"), 2);
        assert_eq!(log.next_seq(), 3);
    }

    #[test]
    fn attack_involves_both_sides() {
        let outcome = AttackOutcome {
            attacker: CombatantId::from("kael"),
            target: CombatantId::from("orc-1"),
            attack: "Sword".into(),
            natural: 12,
            total: 17,
            target_ac: 13,
            hit: true,
            critical: false,
            damage: 6,
        };
        let kind = CombatEventKind::AttackResolved { outcome };
        assert!(kind.involves(&CombatantId::from("kael")));
        assert!(kind.involves(&CombatantId::from("orc-1")));
        assert!(!kind.involves(&CombatantId::from("mira")));
        assert_eq!(kind.name(), "attack-resolved");
    }

    #[test]
    fn serializes_with_kebab_tag() {
        let json = serde_json::to_value(turn("kael", 3)).unwrap();
        assert_eq!(json["type"], "turn-started");
        assert_eq!(json["combatant_id"], "kael");
        assert_eq!(json["round"], 3);
    }
}
