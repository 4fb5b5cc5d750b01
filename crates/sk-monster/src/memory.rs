//! Encounter history across sessions.
//!
//! The hosting application owns a [`CombatMemory`] and lends it to each
//! session. Sessions only read from it while running and append one record
//! per monster type once they complete.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sk_core::SessionId;

use crate::profile::TacticStats;

/// Encounters a monster type needs before its difficulty bias moves.
pub const MIN_HISTORY: u32 = 3;
/// Recent outcomes kept per monster type for the bias.
pub const RECENT_WINDOW: usize = 5;
/// A defeat in at most this many rounds counts as quick.
pub const QUICK_DEFEAT_ROUNDS: u32 = 3;
/// Maximum deviation of the bias from 1.0.
const MAX_BIAS_SHIFT: f64 = 0.1;

/// How an encounter ended, from the monsters' side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterOutcome {
    /// The players were defeated.
    MonsterVictory,
    /// The monsters were defeated or fled.
    MonsterDefeat,
    /// The session was ended early.
    Interrupted,
}

impl fmt::Display for EncounterOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MonsterVictory => write!(f, "monster victory"),
            Self::MonsterDefeat => write!(f, "monster defeat"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// One completed encounter for one monster type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterRecord {
    /// Session the encounter came from.
    pub session_id: SessionId,
    /// Statblock id.
    pub monster_type: String,
    /// Final outcome.
    pub outcome: EncounterOutcome,
    /// Rounds fought.
    pub rounds: u32,
    /// Scaling factor applied to this monster type.
    pub scaling_factor: f64,
    /// Tactic outcomes gathered during this session only.
    pub tactics: BTreeMap<String, TacticStats>,
    /// When the record was made.
    pub recorded_at: DateTime<Utc>,
}

/// A short summary of a recent encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentOutcome {
    /// Final outcome.
    pub outcome: EncounterOutcome,
    /// Rounds fought.
    pub rounds: u32,
}

/// Aggregated history for one monster type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonsterHistory {
    /// Encounters recorded.
    pub encounters: u32,
    /// Encounters the monsters won.
    pub wins: u32,
    /// Encounters the monsters lost.
    pub losses: u32,
    /// Rounds fought across all encounters.
    pub total_rounds: u32,
    /// Scaling factor of the most recent encounter.
    pub last_factor: Option<f64>,
    /// Tactic outcomes across all encounters.
    pub tactics: BTreeMap<String, TacticStats>,
    /// The most recent outcomes, oldest first.
    pub recent: Vec<RecentOutcome>,
}

impl MonsterHistory {
    /// Average rounds per encounter.
    pub fn average_rounds(&self) -> f64 {
        if self.encounters == 0 {
            return 0.0;
        }
        self.total_rounds as f64 / self.encounters as f64
    }

    fn absorb(&mut self, record: &EncounterRecord) {
        self.encounters += 1;
        match record.outcome {
            EncounterOutcome::MonsterVictory => self.wins += 1,
            EncounterOutcome::MonsterDefeat => self.losses += 1,
            EncounterOutcome::Interrupted => {}
        }
        self.total_rounds += record.rounds;
        self.last_factor = Some(record.scaling_factor);
        for (tactic, stats) in &record.tactics {
            self.tactics.entry(tactic.clone()).or_default().merge(*stats);
        }
        self.recent.push(RecentOutcome {
            outcome: record.outcome,
            rounds: record.rounds,
        });
        if self.recent.len() > RECENT_WINDOW {
            let excess = self.recent.len() - RECENT_WINDOW;
            self.recent.drain(..excess);
        }
    }
}

/// Serializable copy of a [`CombatMemory`], handed to the persistence sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    /// Total records ever appended.
    pub records: u64,
    /// Per-type history.
    pub histories: BTreeMap<String, MonsterHistory>,
}

/// Per-monster-type encounter history and tactic effectiveness.
#[derive(Debug, Clone, Default)]
pub struct CombatMemory {
    records: u64,
    histories: BTreeMap<String, MonsterHistory>,
}

impl CombatMemory {
    /// An empty memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a memory from a snapshot.
    pub fn from_snapshot(snapshot: MemorySnapshot) -> Self {
        Self {
            records: snapshot.records,
            histories: snapshot.histories,
        }
    }

    /// Copy the memory into a snapshot.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            records: self.records,
            histories: self.histories.clone(),
        }
    }

    /// Append one encounter record.
    pub fn record(&mut self, record: &EncounterRecord) {
        self.histories
            .entry(record.monster_type.clone())
            .or_default()
            .absorb(record);
        self.records += 1;
        debug!(
            monster_type = %record.monster_type,
            outcome = %record.outcome,
            rounds = record.rounds,
            "encounter recorded"
        );
    }

    /// History for a monster type.
    pub fn history(&self, monster_type: &str) -> Option<&MonsterHistory> {
        self.histories.get(monster_type)
    }

    /// Total records appended.
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Accumulated tactic outcomes for a monster type (empty if unknown).
    pub fn tactic_stats(&self, monster_type: &str) -> BTreeMap<String, TacticStats> {
        self.histories
            .get(monster_type)
            .map(|h| h.tactics.clone())
            .unwrap_or_default()
    }

    /// Multiplier in `[0.9, 1.1]` on party power when scaling this type.
    ///
    /// Quick defeats push it up, slow defeats half as much, victories push
    /// it down. Interrupted encounters count as neutral. Returns 1.0 until
    /// the type has [`MIN_HISTORY`] encounters.
    pub fn difficulty_bias(&self, monster_type: &str) -> f64 {
        let Some(history) = self.histories.get(monster_type) else {
            return 1.0;
        };
        if history.encounters < MIN_HISTORY || history.recent.is_empty() {
            return 1.0;
        }
        let pressure: f64 = history
            .recent
            .iter()
            .map(|r| match r.outcome {
                EncounterOutcome::MonsterVictory => -1.0,
                EncounterOutcome::MonsterDefeat if r.rounds <= QUICK_DEFEAT_ROUNDS => 1.0,
                EncounterOutcome::MonsterDefeat => 0.5,
                EncounterOutcome::Interrupted => 0.0,
            })
            .sum::<f64>()
            / history.recent.len() as f64;
        (1.0 + MAX_BIAS_SHIFT * pressure).clamp(1.0 - MAX_BIAS_SHIFT, 1.0 + MAX_BIAS_SHIFT)
    }
}
