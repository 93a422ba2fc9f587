//! Arena Session — reference caller for the arena interview engine
//!
//! Wires the engine, a dialogue model and the response processor into a
//! per-turn driver. Session state lives in a [`SessionSnapshot`] the caller
//! persists between turns.

pub mod config;
pub mod dialogue;
pub mod guard;
pub mod session;
pub mod transcript;

pub use config::SessionConfig;
pub use dialogue::{
    DialogueModel, DialogueRequest, FollowUpDialogue, HistoryEntry, Role, ScriptedDialogue,
};
pub use guard::{InFlightGuard, InFlightTicket};
pub use session::{SessionDriver, SessionError, SessionSnapshot, TurnReport};
pub use transcript::{replay, ReplaySummary, Transcript, TranscriptTurn};
