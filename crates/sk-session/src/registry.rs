//! Sessions owned by id, plus the host's combat memory.

use std::collections::HashMap;

use tracing::{info, warn};

use sk_core::SessionId;
use sk_grid::TacticalGrid;
use sk_monster::CombatMemory;

use crate::config::EngineConfig;
use crate::error::SessionResult;
use crate::roster::{EnemySpawn, PlayerTemplate};
use crate::session::{CombatSession, SessionStatus};
use crate::snapshot::SessionSnapshot;

/// Owns running sessions and the combat memory they learn from.
///
/// Each session gets a copy of the memory when it starts. Records from a
/// completed session are folded back in when it is removed.
#[derive(Debug)]
pub struct SessionRegistry {
    config: EngineConfig,
    memory: CombatMemory,
    sessions: HashMap<SessionId, CombatSession>,
    started: u64,
}

impl SessionRegistry {
    /// An empty registry with a fresh memory.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            memory: CombatMemory::new(),
            sessions: HashMap::new(),
            started: 0,
        }
    }

    /// Start from an existing memory.
    pub fn with_memory(mut self, memory: CombatMemory) -> Self {
        self.memory = memory;
        self
    }

    /// The host's combat memory.
    pub fn memory(&self) -> &CombatMemory {
        &self.memory
    }

    /// Create and start a session. Each session gets its own seed derived
    /// from the configured one.
    pub fn start_combat(
        &mut self,
        trigger: &str,
        grid: TacticalGrid,
        players: Vec<PlayerTemplate>,
        enemies: Vec<EnemySpawn>,
    ) -> SessionResult<SessionId> {
        let config = self
            .config
            .clone()
            .with_seed(self.config.seed.wrapping_add(self.started));
        let mut session = CombatSession::new(config, grid, self.memory.clone());
        session.start(trigger, players, enemies)?;
        self.started += 1;
        let id = session.id();
        info!(session = %id, trigger, "session registered");
        self.sessions.insert(id, session);
        Ok(id)
    }

    /// Look up a session. Unknown ids are logged and return `None`.
    pub fn get(&self, id: SessionId) -> Option<&CombatSession> {
        let found = self.sessions.get(&id);
        if found.is_none() {
            warn!(session = %id, "session not found");
        }
        found
    }

    /// Look up a session for mutation. Unknown ids are logged and return
    /// `None`.
    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut CombatSession> {
        let found = self.sessions.get_mut(&id);
        if found.is_none() {
            warn!(session = %id, "session not found");
        }
        found
    }

    /// A read-only copy of a session's state.
    pub fn snapshot(&self, id: SessionId) -> Option<SessionSnapshot> {
        self.get(id).map(CombatSession::snapshot)
    }

    /// Remove a session. If it completed, its encounter records are added
    /// to the registry's memory.
    pub fn remove(&mut self, id: SessionId) -> Option<CombatSession> {
        let Some(session) = self.sessions.remove(&id) else {
            warn!(session = %id, "session not found");
            return None;
        };
        if session.status() == SessionStatus::Completed {
            for record in session.encounter_records() {
                self.memory.record(record);
            }
        }
        Some(session)
    }

    /// Ids of every registered session.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    /// Number of registered sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns true if no sessions are registered.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
