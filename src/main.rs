//! Spectral Quest entry point
//!
//! Native builds play a scripted run through the session engine and print the
//! minted cards. The browser build loads the library's wasm facade instead.

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Spectral Quest (native) starting...");

    let settings = match std::env::args().nth(1) {
        Some(path) => match load_settings(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::error!("Could not load settings from {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => spectral_quest::Settings::default(),
    };

    demo::run(&settings);
}

#[cfg(not(target_arch = "wasm32"))]
fn load_settings(path: &str) -> Result<spectral_quest::Settings, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(spectral_quest::Settings::from_json(&json)?)
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is platform::web::start, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use spectral_quest::consts::*;
    use spectral_quest::platform::entropy_seed;
    use spectral_quest::sim::{FrameInput, GameplayEvent, Outcome, step_frame};
    use spectral_quest::{CardAlbum, RewardSink, Session, Settings};

    const FRAME_DT: f32 = 1.0 / 60.0;

    /// Play every level with a bot that mostly follows the sequence
    pub fn run(settings: &Settings) {
        let seed = settings.seed.unwrap_or_else(entropy_seed);
        let mut session = Session::from_settings(settings, seed);
        let mut bot = Pcg32::seed_from_u64(seed ^ 0x5eed);
        let mut album = CardAlbum::new();

        let mut level = 0;
        loop {
            if let Err(err) = session.start_level(level) {
                log::error!("{}", err);
                return;
            }
            let count = session.level_config().mote_count;
            if let Err(err) = session.initialize_motes(count) {
                log::error!("{}", err);
                return;
            }

            let record = loop {
                let input = next_frame(&session, &mut bot);
                let report = step_frame(&mut session, &input);
                if let Some(record) = report.record {
                    break Some(record);
                }
                if report.death.is_some() {
                    // Retry keeps the level-start life count
                    break None;
                }
            };

            match record {
                Some(record) => {
                    album.mint(&record);
                    println!(
                        "{:<16} {:?} {:>3}/{:<3} in order, {} ({})",
                        session.level_config().name,
                        record.outcome,
                        record.motes_sequence_correct,
                        record.motes_total,
                        record.final_rarity,
                        record
                            .badges
                            .iter()
                            .map(|b| b.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    if session.is_run_complete() || record.outcome == Outcome::Lose {
                        break;
                    }
                    level += 1;
                }
                None => continue,
            }
        }

        println!(
            "\n{} cards minted, best: {}",
            album.len(),
            album
                .best_rarity()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "none".to_string())
        );
    }

    /// Scripted player: fly up the arena, touch motes (occasionally out of
    /// order), meet the mentor once, and bump into the odd hostile drone
    fn next_frame(session: &Session, bot: &mut Pcg32) -> FrameInput {
        let state = session.state();
        let progress = state.level_elapsed / 20.0;
        let pos = Vec2::new(
            ARENA_WIDTH * (0.5 + 0.4 * (state.level_elapsed * 0.7).sin()),
            (ARENA_HEIGHT * (1.0 - progress)).clamp(0.0, ARENA_HEIGHT - 200.0),
        );

        let mut events = vec![GameplayEvent::EnergyCollected(0.2)];
        if bot.random_bool(0.03) {
            let skip = if bot.random_bool(0.1) { 2 } else { 1 };
            let wanted = state.last_collected_sequence + skip;
            let uncollected = state.motes.iter().filter(|m| !m.collected);
            let target = uncollected
                .clone()
                .find(|m| m.sequence_number == wanted)
                .or_else(|| uncollected.min_by_key(|m| m.sequence_number));
            if let Some(mote) = target {
                events.push(GameplayEvent::MoteTouched(mote.id));
            }
        }
        if state.mentor_touches_this_level == 0 && state.level_elapsed > 5.0 {
            events.push(GameplayEvent::MentorTouched);
        }
        if bot.random_bool(0.002) {
            events.push(GameplayEvent::HostileContact);
        }

        FrameInput {
            dt: FRAME_DT,
            position: Some(pos),
            events,
        }
    }
}
