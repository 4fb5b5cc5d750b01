//! Read-only views of a session.

use serde::{Deserialize, Serialize};

use sk_core::{CombatantId, SessionId, Side};
use sk_mechanics::Combatant;

use crate::outcome::CombatResult;
use crate::session::SessionStatus;

/// A value copy of a session's public state. Changing it has no effect on
/// the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The session.
    pub session_id: SessionId,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Current round (0 before start).
    pub round: u32,
    /// Index of the acting combatant in `turn_order`.
    pub turn_index: usize,
    /// Combatant ids in initiative order.
    pub turn_order: Vec<CombatantId>,
    /// Whose turn it is, while active.
    pub current_turn: Option<CombatantId>,
    /// Every participant, ordered by id.
    pub combatants: Vec<Combatant>,
    /// The host's location reference.
    pub location_ref: Option<String>,
    /// Results, once completed.
    pub result: Option<CombatResult>,
}

impl SessionSnapshot {
    /// Look up a combatant by id.
    pub fn combatant(&self, id: &CombatantId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| &c.id == id)
    }

    /// Living combatants on a side.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Combatant> {
        self.combatants
            .iter()
            .filter(move |c| c.side == side && c.is_living())
    }
}
