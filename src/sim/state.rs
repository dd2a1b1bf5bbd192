//! Session data model
//!
//! Everything a run accumulates lives here. The struct is plain data; all
//! mutation goes through [`Session`](super::Session).

use std::collections::BTreeSet;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::completion::LevelRecord;
use crate::config::{self, Difficulty, LevelConfig};
use crate::consts::*;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Between runs or before the first level
    #[default]
    Menu,
    /// Active gameplay; the only phase in which gameplay mutators apply
    Playing,
    /// Transient hold while death/completion UI is shown
    Paused,
    LevelComplete,
    /// Terminal for the run
    GameOver,
    Boss,
}

/// How a level attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathType {
    Crash,
    TimeOut,
}

/// What an energy drain is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergySource {
    Flying,
    Shooting,
}

/// A collectible with a hidden required collection order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mote {
    /// Stable within a level, 0-based
    pub id: u32,
    /// Required collection order (1..=N), independent of id
    pub sequence_number: u32,
    pub collected: bool,
    /// Logical collection stamp, 0 when uncollected
    pub collected_at: u64,
    /// World position, mirrored from the rendering layer
    pub pos: Vec2,
}

/// A sampled player position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub pos: Vec2,
    /// Level-elapsed seconds
    pub t: f32,
}

/// Seed the session RNG was built from. The live generator is not
/// snapshotted; replaying the same calls from this seed reproduces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete run state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    /// Assigned by `start_new_run`; `None` until a run exists
    pub run_id: Option<Uuid>,
    pub rng_state: RngState,
    pub difficulty: Difficulty,
    pub current_level_index: usize,

    // === Lives (run-scoped) ===
    pub lives: u8,
    /// Lives when the current level was first entered
    pub lives_at_level_start: u8,

    // === Timer ===
    pub time_remaining: f32,
    /// Running total of mentor time for the current level
    pub time_added_from_mentors: f32,
    /// Simulated seconds since the level started
    pub level_elapsed: f32,

    // === Energy ===
    pub energy: f32,
    pub is_tumbling: bool,

    // === Motes ===
    pub motes: Vec<Mote>,
    pub motes_collected: usize,
    /// Highest sequence number collected in unbroken order from 1
    pub last_collected_sequence: u32,
    /// Motes collected exactly in order
    pub sequence_correct: usize,

    // === Combat ===
    pub can_shoot: bool,
    pub shots_fired: u32,
    pub shots_hit: u32,

    // === Drones ===
    pub harvesters_destroyed: u32,
    pub harvesters_reached_maxim: u32,
    pub hostile_drones_destroyed: u32,

    /// Rising floor hazard, 0-1 share of the arena height
    pub binary_wrap_height: f32,

    // === Mentor ===
    pub mentor_touches_this_level: u32,
    /// Consecutive levels with mentor contact (run-scoped)
    pub mentor_streak: u32,
    /// Level index whose contact already advanced the streak
    pub(crate) streak_credited_level: Option<usize>,

    // === Tokens ===
    pub tokens_this_run: u32,
    pub tokens_total: u32,

    // === Exploration ===
    pub path_data: Vec<PathPoint>,
    /// Visited grid cells as "gx,gy" keys
    pub explored_areas: BTreeSet<String>,
    pub clouds_entered: u32,

    // === Energy tracking ===
    pub energy_collected: f32,
    pub energy_spent_flying: f32,
    pub energy_spent_shooting: f32,

    // === History (run-scoped) ===
    pub completed_levels: Vec<LevelRecord>,
    /// Cleared permanently by the first imperfect win
    pub all_sequences_perfect: bool,

    /// Last value handed out as a collection stamp
    pub(crate) collection_clock: u64,
    /// Level time of the last recorded path sample
    pub(crate) last_path_sample: Option<f32>,
    /// Set by a death that still has lives left; keeps `lives_at_level_start`
    /// across the restart of the same level
    pub(crate) retry_pending: bool,
}

impl SessionState {
    pub fn new(seed: u64) -> Self {
        Self {
            phase: GamePhase::Menu,
            run_id: None,
            rng_state: RngState::new(seed),
            difficulty: Difficulty::default(),
            current_level_index: 0,
            lives: STARTING_LIVES,
            lives_at_level_start: STARTING_LIVES,
            time_remaining: 0.0,
            time_added_from_mentors: 0.0,
            level_elapsed: 0.0,
            energy: MAX_ENERGY,
            is_tumbling: false,
            motes: Vec::new(),
            motes_collected: 0,
            last_collected_sequence: 0,
            sequence_correct: 0,
            can_shoot: false,
            shots_fired: 0,
            shots_hit: 0,
            harvesters_destroyed: 0,
            harvesters_reached_maxim: 0,
            hostile_drones_destroyed: 0,
            binary_wrap_height: 0.0,
            mentor_touches_this_level: 0,
            mentor_streak: 0,
            streak_credited_level: None,
            tokens_this_run: 0,
            tokens_total: 0,
            path_data: Vec::new(),
            explored_areas: BTreeSet::new(),
            clouds_entered: 0,
            energy_collected: 0.0,
            energy_spent_flying: 0.0,
            energy_spent_shooting: 0.0,
            completed_levels: Vec::new(),
            all_sequences_perfect: true,
            collection_clock: 0,
            last_path_sample: None,
            retry_pending: false,
        }
    }

    /// Clear every level-scoped field for a fresh level attempt
    pub(crate) fn reset_level(&mut self, level_index: usize, time: f32) {
        self.current_level_index = level_index;
        self.time_remaining = time;
        self.time_added_from_mentors = 0.0;
        self.level_elapsed = 0.0;
        self.energy = MAX_ENERGY;
        self.is_tumbling = false;
        self.motes.clear();
        self.motes_collected = 0;
        self.last_collected_sequence = 0;
        self.sequence_correct = 0;
        self.can_shoot = false;
        self.shots_fired = 0;
        self.shots_hit = 0;
        self.harvesters_destroyed = 0;
        self.harvesters_reached_maxim = 0;
        self.hostile_drones_destroyed = 0;
        self.binary_wrap_height = 0.0;
        self.mentor_touches_this_level = 0;
        self.path_data.clear();
        self.explored_areas.clear();
        self.clouds_entered = 0;
        self.energy_collected = 0.0;
        self.energy_spent_flying = 0.0;
        self.energy_spent_shooting = 0.0;
        self.collection_clock = 0;
        self.last_path_sample = None;
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Config of the level being played
    pub fn level_config(&self) -> &'static LevelConfig {
        // current_level_index is only ever set from a validated index
        &config::LEVELS[self.current_level_index.min(config::LEVEL_COUNT - 1)]
    }

    /// Difficulty-scaled timer without mentor additions (not floored)
    pub fn scaled_base_time(&self) -> f32 {
        self.level_config().base_time * self.difficulty.config().time_multiplier
    }

    /// Scaled base time plus all mentor time added this level
    pub fn total_time(&self) -> f32 {
        self.scaled_base_time() + self.time_added_from_mentors
    }

    /// Explored share of the fixed 10x10 grid
    pub fn explored_percent(&self) -> f32 {
        self.explored_areas.len() as f32 / EXPLORATION_CELLS
    }

    pub fn mote(&self, id: u32) -> Option<&Mote> {
        self.motes.iter().find(|m| m.id == id)
    }

    /// Every mote collected and every one in order
    pub fn sequence_perfect(&self) -> bool {
        self.sequence_correct == self.motes_collected
            && self.motes_collected == self.level_config().mote_count
    }

    /// In-order streak holds for whatever was collected (loss cards)
    pub fn partial_sequence_perfect(&self) -> bool {
        self.sequence_correct == self.motes_collected && self.motes_collected > 0
    }

    /// Every configured mote is currently held
    pub fn all_motes_collected(&self) -> bool {
        self.motes_collected == self.level_config().mote_count
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = SessionState::new(7);
        assert_eq!(state.phase, GamePhase::Menu);
        assert!(state.run_id.is_none());
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.energy, MAX_ENERGY);
        assert!(state.all_sequences_perfect);
        assert_eq!(state.rng_state.seed, 7);
    }

    #[test]
    fn test_rng_state_reproduces_generator() {
        use rand::RngCore;
        let state = SessionState::new(99);
        let mut a = state.rng_state.to_rng();
        let mut b = Pcg32::seed_from_u64(99);
        assert_eq!(a.next_u64(), b.next_u64());
        assert!(!state.to_json().unwrap().contains("stream"));
    }

    #[test]
    fn test_explored_percent_uses_fixed_grid() {
        let mut state = SessionState::new(0);
        for x in 0..5 {
            state.explored_areas.insert(format!("{x},0"));
        }
        assert!((state.explored_percent() - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_reset_level_keeps_run_fields() {
        let mut state = SessionState::new(0);
        state.lives = 2;
        state.mentor_streak = 2;
        state.tokens_total = 5;
        state.all_sequences_perfect = false;
        state.shots_fired = 9;
        state.explored_areas.insert("1,1".to_string());

        state.reset_level(3, 150.0);

        assert_eq!(state.current_level_index, 3);
        assert_eq!(state.time_remaining, 150.0);
        assert_eq!(state.shots_fired, 0);
        assert!(state.explored_areas.is_empty());
        assert_eq!(state.lives, 2);
        assert_eq!(state.mentor_streak, 2);
        assert_eq!(state.tokens_total, 5);
        assert!(!state.all_sequences_perfect);
    }

    #[test]
    fn test_serializes_to_json() {
        let state = SessionState::new(1);
        let json = state.to_json().unwrap();
        assert!(json.contains("\"phase\":\"menu\""));
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lives, state.lives);
    }
}
