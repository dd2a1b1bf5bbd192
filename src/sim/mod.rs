//! Deterministic session engine
//!
//! All run bookkeeping lives here. This module must stay pure:
//! - Seeded RNG only
//! - Simulated time only (no wall clock)
//! - No rendering or platform dependencies

pub mod completion;
pub mod drone;
pub mod motes;
pub mod rarity;
pub mod session;
pub mod state;
pub mod tick;

pub use completion::{LevelRecord, evaluate};
pub use drone::{ContactEffect, Drone, DroneDrop, DroneKind};
pub use motes::{CollectOutcome, shuffled_sequence};
pub use rarity::{Badge, LevelFacts, Rarity, base_win_tier, boost_score, derive_badges, resolve_rarity};
pub use session::{DeathResolution, Session, grid_cell};
pub use state::{
    DeathType, EnergySource, GamePhase, Mote, Outcome, PathPoint, RngState, SessionState,
};
pub use tick::{FrameInput, FrameReport, GameplayEvent, step_frame};
