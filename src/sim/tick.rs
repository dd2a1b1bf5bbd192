//! Per-frame session step
//!
//! The engine collects what happened during a frame and hands it over in one
//! [`FrameInput`]. [`step_frame`] applies it in a fixed order so that two
//! terminal events in the same frame can never both take effect.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::completion::LevelRecord;
use super::drone::DroneKind;
use super::motes::CollectOutcome;
use super::session::{DeathResolution, Session};
use super::state::{DeathType, EnergySource, Outcome};
use crate::consts::*;

/// Something the engine observed this frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayEvent {
    MoteTouched(u32),
    MentorTouched,
    EnergyCollected(f32),
    EnergyDrained(f32, EnergySource),
    ShotFired,
    ShotHit,
    DroneDestroyed(DroneKind),
    HarvesterReachedMaxim,
    /// A hostile drone got through its cooldown and hit the player
    HostileContact,
    CloudEntered,
    PlayerCrashed,
    EjectMote,
}

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Simulated seconds since the previous frame
    pub dt: f32,
    /// Player position, if the player is on screen
    pub position: Option<Vec2>,
    /// Events in the order they happened
    pub events: Vec<GameplayEvent>,
}

/// What a frame changed
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    /// Set when the level ended this frame
    pub record: Option<LevelRecord>,
    /// Set when a death was handled this frame
    pub death: Option<DeathResolution>,
    /// The player touched the binary wrap
    pub wrap_hit: bool,
    /// Newly collected mote ids
    pub collected: Vec<u32>,
    /// Mote ids to respawn, most recent first
    pub dropped: Vec<u32>,
    pub shots_fired: u32,
    /// Events skipped because play ended earlier in the frame
    pub suppressed: usize,
}

impl FrameReport {
    pub fn level_ended(&self) -> bool {
        self.record.is_some()
    }
}

/// Advance the session by one frame
pub fn step_frame(session: &mut Session, input: &FrameInput) -> FrameReport {
    let mut report = FrameReport::default();

    if !session.state().is_playing() {
        report.suppressed = input.events.len();
        return report;
    }

    // Timer first; the wrap grows with it
    if let Some(record) = session.tick(input.dt) {
        report.record = Some(record);
        report.suppressed = input.events.len();
        return report;
    }

    if let Some(pos) = input.position {
        session.sample_position(pos);
        if session.wrap_contact(pos.y) {
            report.wrap_hit = true;
            handle_crash(session, &mut report);
        }
    }

    for (index, event) in input.events.iter().enumerate() {
        if !session.state().is_playing() {
            report.suppressed = input.events.len() - index;
            break;
        }
        apply_event(session, event, &mut report);
    }

    let state = session.state();
    if state.is_playing() && !state.motes.is_empty() && state.all_motes_collected() {
        match session.complete_level(Outcome::Win, None) {
            Ok(record) => report.record = Some(record),
            Err(err) => log::warn!("Level win rejected: {}", err),
        }
    }

    report
}

fn apply_event(session: &mut Session, event: &GameplayEvent, report: &mut FrameReport) {
    match event {
        GameplayEvent::MoteTouched(id) => match session.collect_mote(*id) {
            Ok(CollectOutcome::Collected { .. }) => report.collected.push(*id),
            Ok(_) => {}
            Err(err) => log::warn!("Mote touch ignored: {}", err),
        },
        GameplayEvent::MentorTouched => session.touch_mentor(),
        GameplayEvent::EnergyCollected(amount) => session.add_energy(*amount),
        GameplayEvent::EnergyDrained(amount, source) => session.drain_energy(*amount, *source),
        GameplayEvent::ShotFired => {
            if session.fire_shot() {
                report.shots_fired += 1;
            }
        }
        GameplayEvent::ShotHit => session.register_hit(),
        GameplayEvent::DroneDestroyed(DroneKind::Harvester) => session.destroy_harvester(),
        GameplayEvent::DroneDestroyed(DroneKind::Hostile) => session.destroy_hostile_drone(),
        GameplayEvent::HarvesterReachedMaxim => session.harvester_reached_maxim(),
        GameplayEvent::HostileContact => {
            let steal = HOSTILE_STEAL.min(session.state().motes_collected);
            report.dropped.extend(session.drop_motes(steal));
        }
        GameplayEvent::CloudEntered => session.enter_cloud(),
        GameplayEvent::PlayerCrashed => handle_crash(session, report),
        GameplayEvent::EjectMote => report.dropped.extend(session.eject_mote()),
    }
}

fn handle_crash(session: &mut Session, report: &mut FrameReport) {
    match session.handle_death(DeathType::Crash) {
        Ok(resolution) => {
            if let DeathResolution::GameOver(record) = &resolution {
                report.record = Some(record.as_ref().clone());
            }
            report.death = Some(resolution);
        }
        Err(err) => log::debug!("Crash ignored: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::sim::GamePhase;

    fn playing(level: usize) -> Session {
        let mut session = Session::new(12345);
        session.start_new_run(Difficulty::Weaver);
        session.start_level(level).unwrap();
        let count = session.level_config().mote_count;
        session.initialize_motes(count).unwrap();
        session
    }

    fn id_for(session: &Session, seq: u32) -> u32 {
        session
            .state()
            .motes
            .iter()
            .find(|m| m.sequence_number == seq)
            .map(|m| m.id)
            .unwrap()
    }

    #[test]
    fn test_frame_advances_timer() {
        let mut session = playing(0);
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.5,
                ..Default::default()
            },
        );
        assert!(!report.level_ended());
        assert_eq!(session.state().time_remaining, 119.5);
        assert_eq!(session.state().level_elapsed, 0.5);
    }

    #[test]
    fn test_double_crash_same_frame() {
        let mut session = playing(0);
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.016,
                events: vec![GameplayEvent::PlayerCrashed, GameplayEvent::PlayerCrashed],
                ..Default::default()
            },
        );
        assert_eq!(report.death, Some(DeathResolution::Retry { lives: 2 }));
        assert_eq!(report.suppressed, 1);
        assert_eq!(session.state().lives, 2);
        assert_eq!(session.phase(), GamePhase::Paused);
    }

    #[test]
    fn test_wrap_and_crash_same_frame() {
        let mut session = playing(0);
        session.tick(60.0);
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.016,
                position: Some(Vec2::new(400.0, ARENA_HEIGHT - 1.0)),
                events: vec![GameplayEvent::PlayerCrashed],
            },
        );
        assert!(report.wrap_hit);
        assert_eq!(report.suppressed, 1);
        assert_eq!(session.state().lives, 2);
    }

    #[test]
    fn test_time_out_suppresses_frame_events() {
        let mut session = playing(0);
        session.tick(119.9);
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.2,
                events: vec![GameplayEvent::PlayerCrashed, GameplayEvent::MentorTouched],
                ..Default::default()
            },
        );
        let record = report.record.expect("time out ends the level");
        assert_eq!(record.death_type, Some(DeathType::TimeOut));
        assert_eq!(report.suppressed, 2);
        assert_eq!(session.state().lives, STARTING_LIVES);
        assert_eq!(session.phase(), GamePhase::GameOver);
    }

    #[test]
    fn test_last_mote_wins_level() {
        let mut session = playing(0);
        let events = (1..=7)
            .map(|seq| GameplayEvent::MoteTouched(id_for(&session, seq)))
            .collect();
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.016,
                events,
                ..Default::default()
            },
        );
        assert_eq!(report.collected.len(), 7);
        let record = report.record.expect("all motes collected wins");
        assert_eq!(record.outcome, Outcome::Win);
        assert_eq!(session.phase(), GamePhase::LevelComplete);
    }

    #[test]
    fn test_hostile_contact_drops_motes() {
        let mut session = playing(1);
        let events = vec![
            GameplayEvent::MoteTouched(id_for(&session, 1)),
            GameplayEvent::MoteTouched(id_for(&session, 2)),
            GameplayEvent::MoteTouched(id_for(&session, 3)),
            GameplayEvent::HostileContact,
        ];
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.016,
                events,
                ..Default::default()
            },
        );
        assert_eq!(report.dropped, vec![id_for(&session, 3), id_for(&session, 2)]);
        assert_eq!(session.state().motes_collected, 1);
    }

    #[test]
    fn test_shots_and_drones() {
        let mut session = playing(0);
        let first = id_for(&session, 1);
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 0.016,
                events: vec![
                    GameplayEvent::ShotFired,
                    GameplayEvent::MoteTouched(first),
                    GameplayEvent::ShotFired,
                    GameplayEvent::ShotHit,
                    GameplayEvent::DroneDestroyed(DroneKind::Hostile),
                    GameplayEvent::CloudEntered,
                ],
                ..Default::default()
            },
        );
        // First shot happens before shooting unlocks
        assert_eq!(report.shots_fired, 1);
        let s = session.state();
        assert_eq!(s.shots_fired, 1);
        assert_eq!(s.shots_hit, 1);
        assert_eq!(s.hostile_drones_destroyed, 1);
        assert_eq!(s.clouds_entered, 1);
    }

    #[test]
    fn test_paused_frame_is_inert() {
        let mut session = playing(0);
        session.pause();
        let report = step_frame(
            &mut session,
            &FrameInput {
                dt: 1.0,
                position: Some(Vec2::new(10.0, 10.0)),
                events: vec![GameplayEvent::MentorTouched],
            },
        );
        assert_eq!(report.suppressed, 1);
        assert_eq!(session.state().time_remaining, 120.0);
        assert!(session.state().path_data.is_empty());
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut session = playing(2);
            for i in 0..50 {
                step_frame(
                    &mut session,
                    &FrameInput {
                        dt: 0.05,
                        position: Some(Vec2::new(i as f32 * 15.0, 2300.0 - i as f32 * 40.0)),
                        events: vec![GameplayEvent::MoteTouched(i % 18)],
                    },
                );
            }
            session.state().to_json().unwrap()
        };
        assert_eq!(run(), run());
    }
}
