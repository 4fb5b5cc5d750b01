//! Optional sinks the session talks to: narration and persistence.
//!
//! Both are fire-and-forget. A failure is logged at `warn` and never rolls
//! back or retries anything that affected the fight.

use sk_core::SessionId;
use sk_monster::EncounterRecord;

use crate::error::CollaboratorError;
use crate::outcome::CombatResult;

/// Receives a line of narration for every combat event.
pub trait Narrator: std::fmt::Debug {
    /// Announce an event. The session does not wait on or act on the result.
    fn announce(&mut self, text: &str) -> Result<(), CollaboratorError>;
}

/// Receives the results of a completed session.
pub trait EncounterRecorder: std::fmt::Debug {
    /// Persist the outcome and the per-monster-type records.
    fn record_encounter(
        &mut self,
        session_id: SessionId,
        result: &CombatResult,
        records: &[EncounterRecord],
    ) -> Result<(), CollaboratorError>;
}

/// The collaborators attached to a session. Both default to none.
#[derive(Debug, Default)]
pub struct Collaborators {
    pub(crate) narrator: Option<Box<dyn Narrator>>,
    pub(crate) recorder: Option<Box<dyn EncounterRecorder>>,
}

impl Collaborators {
    /// No collaborators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a narrator.
    pub fn with_narrator<N: Narrator + 'static>(mut self, narrator: N) -> Self {
        self.narrator = Some(Box::new(narrator));
        self
    }

    /// Attach an encounter recorder.
    pub fn with_recorder<R: EncounterRecorder + 'static>(mut self, recorder: R) -> Self {
        self.recorder = Some(Box::new(recorder));
        self
    }
}
