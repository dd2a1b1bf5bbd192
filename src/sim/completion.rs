//! Level completion
//!
//! [`evaluate`] is a pure function of the final session snapshot. It produces
//! the immutable [`LevelRecord`] for one level attempt. [`Session::complete_level`]
//! applies the few run-wide consequences and appends the record to history.

use serde::{Deserialize, Serialize};

use super::rarity::{self, Badge, LevelFacts, Rarity};
use super::session::Session;
use super::state::{DeathType, GamePhase, Outcome, PathPoint, SessionState};
use crate::consts::*;
use crate::error::{Result, SessionError};

/// Stats for one finished level attempt; never mutated once appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelRecord {
    // Identity
    pub level_index: usize,
    pub level_key: String,
    pub outcome: Outcome,

    // Timing
    pub time_base: f32,
    pub time_added_from_mentors: f32,
    pub time_remaining: f32,
    pub time_survived: f32,
    pub died_in_final_seconds: bool,

    // Motes
    pub motes_total: usize,
    pub motes_collected: usize,
    pub motes_sequence_correct: usize,
    pub sequence_perfect: bool,
    pub partial_sequence_perfect: bool,

    // Combat
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub harvesters_destroyed: u32,
    pub harvesters_reached_maxim: u32,
    pub hostile_drones_destroyed: u32,

    // Survival
    pub lives_before: u8,
    pub lives_after: u8,
    pub death_type: Option<DeathType>,

    // Exploration
    pub explored_percent: f32,
    pub clouds_entered: u32,

    // Mentor
    pub mentor_name: String,
    pub mentor_touches: u32,
    pub mentor_contacted: bool,
    pub tokens_earned: u32,

    // Energy
    pub energy_collected: f32,
    pub energy_spent_flying: f32,
    pub energy_spent_shooting: f32,

    pub path: Vec<PathPoint>,
    pub badges: Vec<Badge>,
    pub final_rarity: Rarity,
}

impl LevelRecord {
    pub fn has_badge(&self, badge: Badge) -> bool {
        self.badges.contains(&badge)
    }

    /// Shots that hit, 0 when nothing was fired
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            self.shots_hit as f32 / self.shots_fired as f32
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Build the record for the current level without touching the session
pub fn evaluate(state: &SessionState, outcome: Outcome, death_type: Option<DeathType>) -> LevelRecord {
    let level = state.level_config();
    let facts = LevelFacts::from_state(state, outcome);
    let badges = rarity::derive_badges(&facts);
    let final_rarity = rarity::resolve_rarity(&facts, &badges);
    let total_time = state.total_time();

    LevelRecord {
        level_index: state.current_level_index,
        level_key: level.key.to_string(),
        outcome,
        time_base: level.base_time,
        time_added_from_mentors: state.time_added_from_mentors,
        time_remaining: state.time_remaining,
        time_survived: (total_time - state.time_remaining).max(0.0),
        died_in_final_seconds: outcome == Outcome::Lose
            && state.time_remaining <= LAST_BREATH_SECONDS,
        motes_total: level.mote_count,
        motes_collected: state.motes_collected,
        motes_sequence_correct: state.sequence_correct,
        sequence_perfect: facts.sequence_perfect(),
        partial_sequence_perfect: facts.partial_sequence_perfect(),
        shots_fired: state.shots_fired,
        shots_hit: state.shots_hit,
        harvesters_destroyed: state.harvesters_destroyed,
        harvesters_reached_maxim: state.harvesters_reached_maxim,
        hostile_drones_destroyed: state.hostile_drones_destroyed,
        lives_before: state.lives_at_level_start,
        lives_after: state.lives,
        death_type,
        explored_percent: facts.explored_percent,
        clouds_entered: state.clouds_entered,
        mentor_name: level.mentor_name.to_string(),
        mentor_touches: state.mentor_touches_this_level,
        mentor_contacted: state.mentor_touches_this_level > 0,
        tokens_earned: state.mentor_touches_this_level * TOKENS_PER_MENTOR_TOUCH,
        energy_collected: state.energy_collected,
        energy_spent_flying: state.energy_spent_flying,
        energy_spent_shooting: state.energy_spent_shooting,
        path: state.path_data.clone(),
        badges,
        final_rarity,
    }
}

impl Session {
    /// End the current level. Runs once per attempt, from `Playing` or the
    /// `Paused` hold; anything else is a duplicate terminal event.
    pub fn complete_level(
        &mut self,
        outcome: Outcome,
        death_type: Option<DeathType>,
    ) -> Result<LevelRecord> {
        if !matches!(self.state.phase, GamePhase::Playing | GamePhase::Paused) {
            log::warn!("Ignoring completion ({:?}) in {:?}", outcome, self.state.phase);
            return Err(SessionError::NotPlaying(self.state.phase));
        }
        // Leave the playing phase before any other effect
        self.state.phase = match outcome {
            Outcome::Win => GamePhase::LevelComplete,
            Outcome::Lose => GamePhase::GameOver,
        };

        let mut record = evaluate(&self.state, outcome, death_type);

        if outcome == Outcome::Win {
            if !record.sequence_perfect && self.state.all_sequences_perfect {
                self.state.all_sequences_perfect = false;
                log::info!("Run is no longer sequence-perfect");
            }
            if !record.mentor_contacted {
                self.state.mentor_streak = 0;
            }
            if record.sequence_perfect && record.level_index >= PERFECT_LIFE_FROM_LEVEL {
                self.gain_life();
                record.lives_after = self.state.lives;
            }
        }

        log::info!(
            "Level {} {:?}: {} rarity, badges [{}]",
            record.level_index + 1,
            outcome,
            record.final_rarity,
            record
                .badges
                .iter()
                .map(Badge::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.state.completed_levels.push(record.clone());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;

    fn start(session: &mut Session, level: usize) {
        session.start_level(level).unwrap();
        let count = session.level_config().mote_count;
        session.initialize_motes(count).unwrap();
    }

    fn collect_in_order(session: &mut Session, order: &[u32]) {
        for &seq in order {
            let id = session
                .state()
                .motes
                .iter()
                .find(|m| m.sequence_number == seq)
                .map(|m| m.id)
                .unwrap();
            session.collect_mote(id).unwrap();
        }
    }

    fn perfect_win(session: &mut Session, level: usize) -> LevelRecord {
        start(session, level);
        let count = session.level_config().mote_count as u32;
        let order: Vec<u32> = (1..=count).collect();
        collect_in_order(session, &order);
        session.complete_level(Outcome::Win, None).unwrap()
    }

    fn new_run() -> Session {
        let mut session = Session::new(77);
        session.start_new_run(Difficulty::Weaver);
        session
    }

    #[test]
    fn test_perfect_first_level_is_ultimate() {
        let mut session = new_run();
        let record = perfect_win(&mut session, 0);
        assert_eq!(record.motes_sequence_correct, 7);
        assert_eq!(record.motes_collected, 7);
        assert!(record.sequence_perfect);
        assert!(record.has_badge(Badge::Harmonic));
        assert_eq!(record.final_rarity, Rarity::Ultimate);
        assert_eq!(session.phase(), GamePhase::LevelComplete);
        assert_eq!(session.state().completed_levels.len(), 1);
        assert!(session.state().all_sequences_perfect);
    }

    #[test]
    fn test_swapped_order_clears_perfect_flag() {
        let mut session = new_run();
        start(&mut session, 0);
        collect_in_order(&mut session, &[2, 1, 3, 4, 5, 6, 7]);
        // Drain the clock below half so only badge boosts apply
        session.tick(70.0);
        session.lose_life(DeathType::Crash);

        let record = session.complete_level(Outcome::Win, None).unwrap();
        assert_eq!(record.motes_sequence_correct, 1);
        assert!(!record.sequence_perfect);
        // Rare base + drone denial (+0.5) rounds down to no step
        assert_eq!(record.badges, vec![Badge::DroneDenial]);
        assert_eq!(record.final_rarity, Rarity::Rare);
        assert!(!session.state().all_sequences_perfect);
    }

    #[test]
    fn test_time_and_survival_stats() {
        let mut session = new_run();
        start(&mut session, 1);
        session.touch_mentor();
        session.tick(40.0);
        let record = session.complete_level(Outcome::Lose, Some(DeathType::Crash)).unwrap();
        assert_eq!(record.time_added_from_mentors, MENTOR_TIME_BONUS);
        assert_eq!(record.time_remaining, 95.0);
        assert_eq!(record.time_survived, 40.0);
        assert!(record.mentor_contacted);
        assert_eq!(record.tokens_earned, 1);
        assert_eq!(record.mentor_name, "Calen");
        assert_eq!(record.death_type, Some(DeathType::Crash));
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_defiant_loss() {
        let mut session = new_run();
        start(&mut session, 0);
        collect_in_order(&mut session, &[1, 2, 3, 4, 5]);
        for gx in 0..10 {
            for gy in 0..10 {
                if gx * 10 + gy < 95 {
                    session.mark_area_explored(gx, gy);
                }
            }
        }
        session.tick(118.0);
        assert_eq!(session.state().time_remaining, 2.0);

        let record = session.complete_level(Outcome::Lose, Some(DeathType::Crash)).unwrap();
        assert_eq!(
            record.badges,
            vec![
                Badge::LastBreath,
                Badge::PartialHarmony,
                Badge::DroneDenial,
                Badge::Cartographer,
                Badge::DefiantUltimate,
            ]
        );
        assert_eq!(record.final_rarity, Rarity::DefiantUltimate);
        assert!(record.died_in_final_seconds);
        assert!((record.explored_percent - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_duplicate_completion_rejected() {
        let mut session = new_run();
        start(&mut session, 0);
        session.complete_level(Outcome::Lose, Some(DeathType::Crash)).unwrap();
        assert!(matches!(
            session.complete_level(Outcome::Lose, Some(DeathType::TimeOut)),
            Err(SessionError::NotPlaying(GamePhase::GameOver))
        ));
        assert_eq!(session.state().completed_levels.len(), 1);
    }

    #[test]
    fn test_seven_perfect_wins_is_prismatic() {
        let mut session = new_run();
        let mut rarities = Vec::new();
        for level in 0..7 {
            rarities.push(perfect_win(&mut session, level).final_rarity);
        }
        assert!(rarities[..6].iter().all(|r| *r == Rarity::Ultimate));
        assert_eq!(rarities[6], Rarity::PrismaticUltimate);
        assert!(session.is_run_complete());
        assert!(!session.has_next_level());
    }

    #[test]
    fn test_imperfect_win_blocks_prismatic() {
        let mut session = new_run();
        start(&mut session, 0);
        collect_in_order(&mut session, &[1, 3, 2, 4, 5, 6, 7]);
        session.complete_level(Outcome::Win, None).unwrap();
        for level in 1..7 {
            let record = perfect_win(&mut session, level);
            assert_eq!(record.final_rarity, Rarity::Ultimate);
        }
        assert!(!session.state().all_sequences_perfect);
    }

    #[test]
    fn test_perfect_late_levels_grant_life() {
        let mut session = new_run();
        session.state.lives = 2;
        let record = perfect_win(&mut session, 3);
        assert_eq!(record.lives_after, 2);

        let record = perfect_win(&mut session, 4);
        assert_eq!(record.lives_before, 2);
        assert_eq!(record.lives_after, 3);
        assert_eq!(session.state().lives, 3);
    }

    #[test]
    fn test_mentor_streak_over_three_levels() {
        let mut session = new_run();
        session.state.lives = 2;
        for level in 0..3 {
            start(&mut session, level);
            session.touch_mentor();
            session.touch_mentor();
            if level < 2 {
                assert_eq!(session.state().mentor_streak, level as u32 + 1);
            }
            session.complete_level(Outcome::Win, None).unwrap();
        }
        assert_eq!(session.state().mentor_streak, 0);
        assert_eq!(session.state().lives, 3);
    }

    #[test]
    fn test_mentorless_win_breaks_streak() {
        let mut session = new_run();
        start(&mut session, 0);
        session.touch_mentor();
        session.complete_level(Outcome::Win, None).unwrap();
        assert_eq!(session.state().mentor_streak, 1);
        start(&mut session, 1);
        session.complete_level(Outcome::Win, None).unwrap();
        assert_eq!(session.state().mentor_streak, 0);
    }

    #[test]
    fn test_record_serializes() {
        let mut session = new_run();
        let record = perfect_win(&mut session, 0);
        let json = record.to_json().unwrap();
        assert!(json.contains("\"final_rarity\":\"ultimate\""));
        assert!(json.contains("\"harmonic\""));
        assert_eq!(record.accuracy(), 0.0);
    }
}
