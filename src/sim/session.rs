//! Session state manager
//!
//! [`Session`] is the single owner of a run's [`SessionState`]. The engine and
//! UI read it through [`Session::state`] and change it only through the
//! methods here. Gameplay mutators are no-ops unless the phase is `Playing`.

use glam::Vec2;
use rand::RngCore;
use rand_pcg::Pcg32;

use super::completion::LevelRecord;
use super::state::{DeathType, EnergySource, GamePhase, Outcome, PathPoint, SessionState};
use crate::config::{self, Difficulty, LevelConfig};
use crate::consts::*;
use crate::error::{Result, SessionError};
use crate::settings::Settings;

/// Result of the death handler
#[derive(Debug, Clone, PartialEq)]
pub enum DeathResolution {
    /// Lives remain; the phase is `Paused` until the level is restarted
    Retry { lives: u8 },
    /// Last life lost; the level was completed as a loss
    GameOver(Box<LevelRecord>),
}

/// A run in progress
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) state: SessionState,
    pub(crate) rng: Pcg32,
    path_sample_interval: f32,
}

impl Session {
    /// Create a session in the menu phase with a seeded RNG
    pub fn new(seed: u64) -> Self {
        let state = SessionState::new(seed);
        let rng = state.rng_state.to_rng();
        Self {
            state,
            rng,
            path_sample_interval: PATH_SAMPLE_INTERVAL,
        }
    }

    /// Create a session and start a run with the configured difficulty
    pub fn from_settings(settings: &Settings, fallback_seed: u64) -> Self {
        let mut session = Self::new(settings.seed.unwrap_or(fallback_seed));
        session.path_sample_interval = settings.path_sample_interval.max(0.0);
        session.start_new_run(settings.difficulty);
        session
    }

    /// Read-only snapshot for display
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn level_config(&self) -> &'static LevelConfig {
        self.state.level_config()
    }

    // === Run lifecycle ===

    /// Reset all run- and level-scoped fields and assign a fresh run id
    pub fn start_new_run(&mut self, difficulty: Difficulty) {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        let run_id = uuid::Builder::from_random_bytes(bytes).into_uuid();

        self.state = SessionState::new(self.state.rng_state.seed);
        self.state.run_id = Some(run_id);
        self.state.difficulty = difficulty;

        log::info!("New run {} on {}", run_id, difficulty);
    }

    /// Begin (or restart) a level. Fails fast on an out-of-range index and
    /// once the run has ended.
    pub fn start_level(&mut self, level_index: usize) -> Result<()> {
        let Some(level) = config::level(level_index) else {
            log::warn!("start_level rejected: index {} out of range", level_index);
            return Err(SessionError::LevelOutOfRange {
                index: level_index,
                count: config::LEVEL_COUNT,
            });
        };
        if self.state.run_id.is_none() {
            log::warn!("start_level rejected: no active run");
            return Err(SessionError::NoActiveRun);
        }
        if self.state.phase == GamePhase::GameOver {
            log::warn!("start_level rejected: run is over");
            return Err(SessionError::RunOver);
        }

        let effective_time = config::effective_time(level, self.state.difficulty);
        let restarting =
            self.state.retry_pending && self.state.current_level_index == level_index;
        if !restarting {
            self.state.lives_at_level_start = self.state.lives;
        }
        self.state.retry_pending = false;

        self.state.reset_level(level_index, effective_time);
        self.state.phase = GamePhase::Playing;

        log::info!(
            "Level {} ({}) started: {}s, {} motes, lives {}",
            level_index + 1,
            level.name,
            effective_time,
            level.mote_count,
            self.state.lives
        );
        Ok(())
    }

    /// Whether a level follows the current one
    pub fn has_next_level(&self) -> bool {
        self.state.current_level_index + 1 < config::LEVEL_COUNT
    }

    /// The final level has been won
    pub fn is_run_complete(&self) -> bool {
        self.state.completed_levels.last().is_some_and(|r| {
            r.outcome == Outcome::Win && r.level_index + 1 == config::LEVEL_COUNT
        })
    }

    /// Hold gameplay while UI is shown
    pub fn pause(&mut self) -> bool {
        if self.state.is_playing() {
            self.state.phase = GamePhase::Paused;
            true
        } else {
            false
        }
    }

    pub fn resume(&mut self) -> bool {
        if self.state.phase == GamePhase::Paused {
            self.state.phase = GamePhase::Playing;
            true
        } else {
            false
        }
    }

    // === Lives ===

    /// Lose one life. Returns false (and ends the run) when none remain.
    pub fn lose_life(&mut self, death_type: DeathType) -> bool {
        self.state.lives = self.state.lives.saturating_sub(1);
        if self.state.lives == 0 {
            self.state.phase = GamePhase::GameOver;
            log::info!("Last life lost ({:?})", death_type);
            return false;
        }
        log::info!("Life lost ({:?}), {} remaining", death_type, self.state.lives);
        true
    }

    /// Gain a life unless at the cap. Returns whether it applied.
    pub fn gain_life(&mut self) -> bool {
        if self.state.lives >= MAX_LIVES {
            return false;
        }
        self.state.lives += 1;
        log::info!("Extra life! Lives: {}", self.state.lives);
        true
    }

    /// Single entry point for a death event.
    ///
    /// Acts only while playing and leaves `Playing` before any other effect,
    /// so a second death reported in the same frame is rejected.
    pub fn handle_death(&mut self, death_type: DeathType) -> Result<DeathResolution> {
        if !self.state.is_playing() {
            log::warn!("Ignoring duplicate death ({:?}) in {:?}", death_type, self.state.phase);
            return Err(SessionError::NotPlaying(self.state.phase));
        }
        self.state.phase = GamePhase::Paused;

        if self.lose_life(death_type) {
            self.state.retry_pending = true;
            return Ok(DeathResolution::Retry {
                lives: self.state.lives,
            });
        }

        // lose_life moved us to GameOver; completion runs from the paused hold
        self.state.phase = GamePhase::Paused;
        let record = self.complete_level(Outcome::Lose, Some(death_type))?;
        Ok(DeathResolution::GameOver(Box::new(record)))
    }

    // === Timer ===

    /// Advance the level timer. Returns the loss record if time ran out.
    pub fn tick(&mut self, delta_seconds: f32) -> Option<LevelRecord> {
        if !self.state.is_playing() {
            return None;
        }
        let delta = delta_seconds.max(0.0);
        self.state.time_remaining = (self.state.time_remaining - delta).max(0.0);
        self.state.level_elapsed += delta;
        self.update_binary_wrap();

        if self.state.time_remaining <= 0.0 {
            log::info!("Time out on level {}", self.state.current_level_index + 1);
            return self.complete_level(Outcome::Lose, Some(DeathType::TimeOut)).ok();
        }
        None
    }

    /// Extend the timer; counted toward the level's total time
    pub fn add_time(&mut self, seconds: f32) {
        if !self.state.is_playing() {
            return;
        }
        self.state.time_remaining += seconds;
        self.state.time_added_from_mentors += seconds;
    }

    // === Energy ===

    pub fn add_energy(&mut self, amount: f32) {
        if !self.state.is_playing() || amount <= 0.0 {
            return;
        }
        self.state.energy = (self.state.energy + amount).min(MAX_ENERGY);
        self.state.energy_collected += amount;
        if self.state.is_tumbling && self.state.energy >= FALL_RECOVERY_THRESHOLD {
            self.state.is_tumbling = false;
        }
    }

    pub fn drain_energy(&mut self, amount: f32, source: EnergySource) {
        if !self.state.is_playing() || amount <= 0.0 {
            return;
        }
        self.state.energy = (self.state.energy - amount).max(0.0);
        match source {
            EnergySource::Flying => self.state.energy_spent_flying += amount,
            EnergySource::Shooting => self.state.energy_spent_shooting += amount,
        }
        if self.state.energy <= 0.0 && !self.state.is_tumbling {
            self.state.is_tumbling = true;
            log::debug!("Out of energy, tumbling");
        }
    }

    /// Drain for continuous flight, scaled by the difficulty
    pub fn drain_flight(&mut self, base_rate: f32, delta_seconds: f32) {
        let multiplier = self.state.difficulty.config().energy_drain_multiplier;
        self.drain_energy(base_rate * multiplier * delta_seconds, EnergySource::Flying);
    }

    pub fn set_tumbling(&mut self, tumbling: bool) {
        self.state.is_tumbling = tumbling;
    }

    // === Combat ===

    /// One-way latch, normally tripped by mote collection
    pub fn unlock_shooting(&mut self) {
        if !self.state.can_shoot {
            self.state.can_shoot = true;
            log::debug!("Shooting unlocked");
        }
    }

    /// Fire if shooting is unlocked and energy covers the cost
    pub fn fire_shot(&mut self) -> bool {
        if !self.state.is_playing()
            || !self.state.can_shoot
            || self.state.energy < ENERGY_DRAIN_SHOOTING
        {
            return false;
        }
        self.state.shots_fired += 1;
        self.drain_energy(ENERGY_DRAIN_SHOOTING, EnergySource::Shooting);
        true
    }

    pub fn register_hit(&mut self) {
        if self.state.is_playing() {
            self.state.shots_hit += 1;
        }
    }

    // === Drones ===

    pub fn destroy_harvester(&mut self) {
        if self.state.is_playing() {
            self.state.harvesters_destroyed += 1;
        }
    }

    pub fn harvester_reached_maxim(&mut self) {
        if self.state.is_playing() {
            self.state.harvesters_reached_maxim += 1;
            self.update_binary_wrap();
            log::debug!(
                "Harvester delivery {}, wrap at {:.3}",
                self.state.harvesters_reached_maxim,
                self.state.binary_wrap_height
            );
        }
    }

    pub fn destroy_hostile_drone(&mut self) {
        if self.state.is_playing() {
            self.state.hostile_drones_destroyed += 1;
        }
    }

    // === Binary wrap ===

    /// Recompute the wrap from elapsed time and harvester deliveries.
    /// The height never drops within a level.
    pub fn update_binary_wrap(&mut self) {
        let total_time = self.state.scaled_base_time();
        let time_percent = if total_time > 0.0 {
            ((total_time - self.state.time_remaining) / total_time).max(0.0)
        } else {
            1.0
        };
        let drone_percent =
            (self.state.harvesters_reached_maxim as f32 / WRAP_MAX_HARVESTERS).min(1.0);
        let wrap = (time_percent * WRAP_BASE_GROWTH + drone_percent * WRAP_DRONE_GROWTH)
            .clamp(0.0, 1.0);

        self.state.binary_wrap_height = self.state.binary_wrap_height.max(wrap);
    }

    /// Whether a player at `player_y` is inside the wrap
    pub fn wrap_contact(&self, player_y: f32) -> bool {
        if !self.state.is_playing()
            || self.state.level_elapsed < WRAP_GRACE_SECONDS
            || self.state.binary_wrap_height < WRAP_MIN_LETHAL_HEIGHT
        {
            return false;
        }
        let wrap_top = ARENA_HEIGHT * (1.0 - self.state.binary_wrap_height);
        player_y >= wrap_top - WRAP_CONTACT_MARGIN
    }

    // === Mentor ===

    /// Touch the mentor: token + time always. The streak advances once per
    /// level index, so a retried level does not count twice.
    pub fn touch_mentor(&mut self) {
        if !self.state.is_playing() {
            return;
        }
        let level = self.state.current_level_index;
        let first_touch = self.state.mentor_touches_this_level == 0
            && self.state.streak_credited_level != Some(level);

        self.state.mentor_touches_this_level += 1;
        self.state.tokens_this_run += TOKENS_PER_MENTOR_TOUCH;
        self.state.tokens_total += TOKENS_PER_MENTOR_TOUCH;
        self.add_time(MENTOR_TIME_BONUS);

        if first_touch {
            self.state.streak_credited_level = Some(level);
            self.state.mentor_streak += 1;
            log::debug!("Mentor streak: {}", self.state.mentor_streak);
            if self.state.mentor_streak >= MENTOR_STREAK_FOR_LIFE {
                self.gain_life();
                self.state.mentor_streak = 0;
            }
        }
    }

    // === Path / exploration ===

    pub fn record_position(&mut self, x: f32, y: f32) {
        if !self.state.is_playing() {
            return;
        }
        self.state.path_data.push(PathPoint {
            pos: Vec2::new(x, y),
            t: self.state.level_elapsed,
        });
        self.state.last_path_sample = Some(self.state.level_elapsed);
    }

    /// Idempotent per cell
    pub fn mark_area_explored(&mut self, grid_x: i32, grid_y: i32) {
        if !self.state.is_playing() {
            return;
        }
        self.state.explored_areas.insert(format!("{grid_x},{grid_y}"));
    }

    /// Per-frame position feed: rate-limited path sample plus exploration cell
    pub fn sample_position(&mut self, pos: Vec2) {
        if !self.state.is_playing() {
            return;
        }
        let due = match self.state.last_path_sample {
            Some(t) => self.state.level_elapsed - t >= self.path_sample_interval,
            None => true,
        };
        if due {
            self.record_position(pos.x, pos.y);
        }

        let (gx, gy) = grid_cell(pos);
        self.mark_area_explored(gx, gy);
    }

    pub fn enter_cloud(&mut self) {
        if self.state.is_playing() {
            self.state.clouds_entered += 1;
        }
    }
}

/// Exploration grid cell containing a world position, clamped to the grid
pub fn grid_cell(pos: Vec2) -> (i32, i32) {
    let max = EXPLORATION_GRID as i32 - 1;
    let gx = (pos.x / (ARENA_WIDTH / EXPLORATION_GRID as f32)).floor() as i32;
    let gy = (pos.y / (ARENA_HEIGHT / EXPLORATION_GRID as f32)).floor() as i32;
    (gx.clamp(0, max), gy.clamp(0, max))
}
