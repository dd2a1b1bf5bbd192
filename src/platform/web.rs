//! wasm-bindgen facade for the JS engine
//!
//! Mirrors the session's call surface with JS-friendly types. Snapshots and
//! level records cross the boundary as JSON strings.

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::config::Difficulty;
use crate::rewards::{CardAlbum, RewardSink};
use crate::settings::Settings;
use crate::sim::{
    DeathResolution, DeathType, EnergySource, FrameInput, LevelRecord, Outcome, Session,
    step_frame,
};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    // A second init (hot reload) keeps the existing logger
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Spectral Quest session engine loaded");
}

fn to_js<E: std::fmt::Display>(err: E) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_difficulty(key: &str) -> Result<Difficulty, JsValue> {
    key.parse::<Difficulty>().map_err(to_js)
}

fn death_type(key: &str) -> Result<DeathType, JsValue> {
    match key {
        "crash" => Ok(DeathType::Crash),
        "time_out" | "timeout" => Ok(DeathType::TimeOut),
        other => Err(JsValue::from_str(&format!("unknown death type '{other}'"))),
    }
}

/// Session handle owned by the JS engine
#[wasm_bindgen]
pub struct WebSession {
    session: Session,
    album: CardAlbum,
}

#[wasm_bindgen]
impl WebSession {
    /// `seed` comes from the page (JS numbers are f64)
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64) -> WebSession {
        WebSession {
            session: Session::new(seed as u64),
            album: CardAlbum::new(),
        }
    }

    /// Build from settings JSON and start a run
    #[wasm_bindgen(js_name = fromSettings)]
    pub fn from_settings(json: &str, fallback_seed: f64) -> Result<WebSession, JsValue> {
        let settings = Settings::from_json(json).map_err(to_js)?;
        Ok(WebSession {
            session: Session::from_settings(&settings, fallback_seed as u64),
            album: CardAlbum::new(),
        })
    }

    /// Full state snapshot as JSON
    pub fn snapshot(&self) -> Result<String, JsValue> {
        self.session.state().to_json().map_err(to_js)
    }

    /// Minted cards as JSON
    pub fn cards(&self) -> Result<String, JsValue> {
        self.album.to_json().map_err(to_js)
    }

    #[wasm_bindgen(js_name = startNewRun)]
    pub fn start_new_run(&mut self, difficulty: &str) -> Result<(), JsValue> {
        let difficulty = parse_difficulty(difficulty)?;
        self.session.start_new_run(difficulty);
        Ok(())
    }

    #[wasm_bindgen(js_name = startLevel)]
    pub fn start_level(&mut self, level_index: usize) -> Result<(), JsValue> {
        self.session.start_level(level_index).map_err(to_js)
    }

    #[wasm_bindgen(js_name = hasNextLevel)]
    pub fn has_next_level(&self) -> bool {
        self.session.has_next_level()
    }

    #[wasm_bindgen(js_name = isRunComplete)]
    pub fn is_run_complete(&self) -> bool {
        self.session.is_run_complete()
    }

    pub fn pause(&mut self) -> bool {
        self.session.pause()
    }

    pub fn resume(&mut self) -> bool {
        self.session.resume()
    }

    #[wasm_bindgen(js_name = loseLife)]
    pub fn lose_life(&mut self, death: &str) -> Result<bool, JsValue> {
        Ok(self.session.lose_life(death_type(death)?))
    }

    #[wasm_bindgen(js_name = gainLife)]
    pub fn gain_life(&mut self) -> bool {
        self.session.gain_life()
    }

    /// Returns "retry" or the loss record JSON
    #[wasm_bindgen(js_name = handleDeath)]
    pub fn handle_death(&mut self, death: &str) -> Result<String, JsValue> {
        match self.session.handle_death(death_type(death)?).map_err(to_js)? {
            DeathResolution::Retry { .. } => Ok("retry".to_string()),
            DeathResolution::GameOver(record) => self.mint(&record),
        }
    }

    /// Returns the loss record JSON when time ran out, otherwise undefined
    pub fn tick(&mut self, delta_seconds: f32) -> Result<Option<String>, JsValue> {
        self.session
            .tick(delta_seconds)
            .map(|record| self.mint(&record))
            .transpose()
    }

    /// One frame: dt, player position, then the frame's events as JSON
    #[wasm_bindgen(js_name = stepFrame)]
    pub fn step_frame(&mut self, dt: f32, x: f32, y: f32, events_json: &str) -> Result<Option<String>, JsValue> {
        let events = if events_json.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(events_json).map_err(to_js)?
        };
        let input = FrameInput {
            dt,
            position: Some(Vec2::new(x, y)),
            events,
        };
        let report = step_frame(&mut self.session, &input);
        report.record.map(|record| self.mint(&record)).transpose()
    }

    #[wasm_bindgen(js_name = addTime)]
    pub fn add_time(&mut self, seconds: f32) {
        self.session.add_time(seconds);
    }

    #[wasm_bindgen(js_name = addEnergy)]
    pub fn add_energy(&mut self, amount: f32) {
        self.session.add_energy(amount);
    }

    /// `source` is "flying" or "shooting"
    #[wasm_bindgen(js_name = drainEnergy)]
    pub fn drain_energy(&mut self, amount: f32, source: &str) -> Result<(), JsValue> {
        let source = match source {
            "flying" => EnergySource::Flying,
            "shooting" => EnergySource::Shooting,
            other => return Err(JsValue::from_str(&format!("unknown energy source '{other}'"))),
        };
        self.session.drain_energy(amount, source);
        Ok(())
    }

    #[wasm_bindgen(js_name = setTumbling)]
    pub fn set_tumbling(&mut self, tumbling: bool) {
        self.session.set_tumbling(tumbling);
    }

    #[wasm_bindgen(js_name = initializeMotes)]
    pub fn initialize_motes(&mut self, count: usize) -> Result<(), JsValue> {
        self.session.initialize_motes(count).map_err(to_js)
    }

    /// Returns whether the mote was newly collected
    #[wasm_bindgen(js_name = collectMote)]
    pub fn collect_mote(&mut self, id: u32) -> Result<bool, JsValue> {
        Ok(self.session.collect_mote(id).map_err(to_js)?.is_collected())
    }

    #[wasm_bindgen(js_name = dropMotes)]
    pub fn drop_motes(&mut self, count: usize) -> Vec<u32> {
        self.session.drop_motes(count)
    }

    #[wasm_bindgen(js_name = ejectMote)]
    pub fn eject_mote(&mut self) -> Option<u32> {
        self.session.eject_mote()
    }

    #[wasm_bindgen(js_name = fireShot)]
    pub fn fire_shot(&mut self) -> bool {
        self.session.fire_shot()
    }

    #[wasm_bindgen(js_name = registerHit)]
    pub fn register_hit(&mut self) {
        self.session.register_hit();
    }

    #[wasm_bindgen(js_name = destroyHarvester)]
    pub fn destroy_harvester(&mut self) {
        self.session.destroy_harvester();
    }

    #[wasm_bindgen(js_name = harvesterReachedMaxim)]
    pub fn harvester_reached_maxim(&mut self) {
        self.session.harvester_reached_maxim();
    }

    #[wasm_bindgen(js_name = destroyHostileDrone)]
    pub fn destroy_hostile_drone(&mut self) {
        self.session.destroy_hostile_drone();
    }

    #[wasm_bindgen(js_name = wrapContact)]
    pub fn wrap_contact(&self, player_y: f32) -> bool {
        self.session.wrap_contact(player_y)
    }

    #[wasm_bindgen(js_name = touchMentor)]
    pub fn touch_mentor(&mut self) {
        self.session.touch_mentor();
    }

    #[wasm_bindgen(js_name = recordPosition)]
    pub fn record_position(&mut self, x: f32, y: f32) {
        self.session.record_position(x, y);
    }

    #[wasm_bindgen(js_name = samplePosition)]
    pub fn sample_position(&mut self, x: f32, y: f32) {
        self.session.sample_position(Vec2::new(x, y));
    }

    #[wasm_bindgen(js_name = enterCloud)]
    pub fn enter_cloud(&mut self) {
        self.session.enter_cloud();
    }

    #[wasm_bindgen(js_name = markAreaExplored)]
    pub fn mark_area_explored(&mut self, grid_x: i32, grid_y: i32) {
        self.session.mark_area_explored(grid_x, grid_y);
    }

    /// `outcome` is "win" or "lose"; returns the record JSON
    #[wasm_bindgen(js_name = completeLevel)]
    pub fn complete_level(&mut self, outcome: &str, death: Option<String>) -> Result<String, JsValue> {
        let outcome = match outcome {
            "win" => Outcome::Win,
            "lose" => Outcome::Lose,
            other => return Err(JsValue::from_str(&format!("unknown outcome '{other}'"))),
        };
        let death = death.as_deref().map(death_type).transpose()?;
        let record = self.session.complete_level(outcome, death).map_err(to_js)?;
        self.mint(&record)
    }
}

impl WebSession {
    /// Hand the record to the album and serialize it for JS
    fn mint(&mut self, record: &LevelRecord) -> Result<String, JsValue> {
        self.album.mint(record);
        record.to_json().map_err(to_js)
    }
}
