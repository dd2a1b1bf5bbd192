use thiserror::Error;

use crate::sim::GamePhase;

/// Precondition violations raised by the session. Idempotent no-ops are not errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Level index {index} out of range (0..{count})")]
    LevelOutOfRange { index: usize, count: usize },

    #[error("Invalid mote count: {0}")]
    InvalidMoteCount(usize),

    #[error("Unknown mote id: {0}")]
    UnknownMote(u32),

    #[error("Not playing (phase is {0:?})")]
    NotPlaying(GamePhase),

    #[error("No active run; call start_new_run first")]
    NoActiveRun,

    #[error("Run is over; call start_new_run first")]
    RunOver,

    #[error("Settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
