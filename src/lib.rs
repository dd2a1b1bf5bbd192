//! Spectral Quest - session and reward engine for a vertical-arena arcade platformer
//!
//! Core modules:
//! - `config`: Static level and difficulty tables
//! - `sim`: Deterministic session state, mote sequencing, level evaluation
//! - `rewards`: Reward card sink collaborators
//! - `settings`: Runtime settings loaded from JSON
//! - `platform`: Browser facade for the JS engine

pub mod config;
pub mod error;
pub mod platform;
pub mod rewards;
pub mod settings;
pub mod sim;

pub use config::{Difficulty, DifficultyConfig, LEVELS, LevelConfig};
pub use error::{Result, SessionError};
pub use rewards::{CardAlbum, NullSink, RewardCard, RewardSink};
pub use settings::Settings;
pub use sim::{LevelRecord, Rarity, Session, SessionState};

/// Game configuration constants
pub mod consts {
    /// Lives at the start of a run
    pub const STARTING_LIVES: u8 = 3;
    /// Lives cap (extra lives beyond this are discarded)
    pub const MAX_LIVES: u8 = 4;

    /// Energy tank size; every level starts full
    pub const MAX_ENERGY: f32 = 150.0;
    /// Energy needed to recover from a tumble
    pub const FALL_RECOVERY_THRESHOLD: f32 = 10.0;
    /// Energy cost per shot
    pub const ENERGY_DRAIN_SHOOTING: f32 = 10.0;
    /// Energy per collected particle
    pub const ENERGY_FROM_PARTICLE: f32 = 30.0;

    /// Seconds added per mentor touch
    pub const MENTOR_TIME_BONUS: f32 = 5.0;
    pub const TOKENS_PER_MENTOR_TOUCH: u32 = 1;
    /// Consecutive mentor levels for an extra life
    pub const MENTOR_STREAK_FOR_LIFE: u32 = 3;

    /// Binary wrap growth split: 70% from time, 30% from harvester deliveries
    pub const WRAP_BASE_GROWTH: f32 = 0.7;
    pub const WRAP_DRONE_GROWTH: f32 = 0.3;
    /// Harvester deliveries that saturate the drone share of the wrap
    pub const WRAP_MAX_HARVESTERS: f32 = 20.0;
    /// No wrap deaths during the first seconds of a level
    pub const WRAP_GRACE_SECONDS: f32 = 3.0;
    /// Wrap must reach this height before it can kill
    pub const WRAP_MIN_LETHAL_HEIGHT: f32 = 0.05;
    /// Extra reach of the wrap above its visible top (pixels)
    pub const WRAP_CONTACT_MARGIN: f32 = 30.0;

    /// Arena dimensions (4 screen heights tall)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 2400.0;
    /// Exploration grid is EXPLORATION_GRID x EXPLORATION_GRID cells
    pub const EXPLORATION_GRID: u32 = 10;
    pub const EXPLORATION_CELLS: f32 = (EXPLORATION_GRID * EXPLORATION_GRID) as f32;

    /// Motes a hostile drone steals per contact
    pub const HOSTILE_STEAL: usize = 2;
    /// Seconds between hostile drone attacks
    pub const HOSTILE_ATTACK_COOLDOWN: f32 = 2.0;
    /// Energy lost when bumping a harvester
    pub const HARVESTER_CONTACT_DRAIN: f32 = 5.0;
    pub const DRONE_HARVESTER_SPEED: f32 = 80.0;
    pub const DRONE_HOSTILE_SPEED: f32 = 120.0;

    /// Minimum seconds between recorded path samples
    pub const PATH_SAMPLE_INTERVAL: f32 = 0.1;

    /// Loss badge: died with this many seconds or fewer on the clock
    pub const LAST_BREATH_SECONDS: f32 = 3.0;
    /// Loss badge: explored share of the arena
    pub const CARTOGRAPHER_THRESHOLD: f32 = 0.9;
    /// Levels from this index on grant a life for a perfect sequence
    pub const PERFECT_LIFE_FROM_LEVEL: usize = 4;
}
