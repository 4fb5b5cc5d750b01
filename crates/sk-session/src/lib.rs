//! Combat sessions for Skirmish.
//!
//! A [`CombatSession`] owns everything about one fight: the combatants, the
//! turn order, the grid, and a seeded RNG. It drives the round and turn
//! lifecycle, runs monster turns through the AI layer, and reports what
//! happened as structured [`CombatEvent`]s. Hosts that juggle several
//! fights keep them in a [`SessionRegistry`].

/// Narration and persistence sinks.
pub mod collaborator;
/// Engine configuration.
pub mod config;
/// Error types for the session layer.
pub mod error;
/// Combat events and the event log.
pub mod event;
/// Session outcomes and results.
pub mod outcome;
/// Sessions owned by id.
pub mod registry;
/// Player templates and enemy spawns.
pub mod roster;
/// The combat session state machine.
pub mod session;
/// Read-only session views.
pub mod snapshot;

/// Re-exports of the collaborator traits.
pub use collaborator::{Collaborators, EncounterRecorder, Narrator};
/// Re-export of [`config::EngineConfig`].
pub use config::EngineConfig;
/// Re-exports of the session error types.
pub use error::{CollaboratorError, SessionError, SessionResult, ValidationError};
/// Re-exports of the event types.
pub use event::{CombatEvent, CombatEventKind, EventLog};
/// Re-exports of the outcome types.
pub use outcome::{CombatOutcome, CombatResult};
/// Re-export of [`registry::SessionRegistry`].
pub use registry::SessionRegistry;
/// Re-exports of the roster types.
pub use roster::{EnemySpawn, PlayerTemplate};
/// Re-exports of the session types.
pub use session::{CombatSession, INVARIANT_VIOLATION, SIDE_ELIMINATED, SessionStatus};
/// Re-export of [`snapshot::SessionSnapshot`].
pub use snapshot::SessionSnapshot;
