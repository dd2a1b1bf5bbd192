//! Maxim's drones
//!
//! Harvesters gather energy and fly it to Maxim at the bottom of the arena;
//! every delivery feeds the binary wrap. Hostiles chase a player who holds
//! more than one mote and steal motes on contact.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::session::Session;
use super::state::EnergySource;
use crate::config::Difficulty;
use crate::consts::*;

/// Energy a harvester carries before heading home
pub const HARVESTER_CAPACITY: u32 = 15;
/// Stolen motes a hostile holds at most
pub const HOSTILE_MAX_STOLEN: u32 = 3;
/// Hostiles only chase inside this range
pub const HOSTILE_AGGRO_RANGE: f32 = 300.0;
/// Distance at which a returning harvester delivers
pub const MAXIM_REACH: f32 = 50.0;

const CHASE_SPEED_FACTOR: f32 = 1.2;
const RETURN_SPEED_FACTOR: f32 = 1.5;
/// Height above the wrap each kind keeps clear of
const HARVESTER_WRAP_CLEARANCE: f32 = 100.0;
const HOSTILE_WRAP_CLEARANCE: f32 = 50.0;

/// Maxim's position at the bottom center of the arena
pub fn maxim_position() -> Vec2 {
    Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT - MAXIM_REACH)
}

/// Where a harvester relaunches after a delivery
fn launch_position() -> Vec2 {
    Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT - 80.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DroneKind {
    Harvester,
    Hostile,
}

impl DroneKind {
    pub fn base_speed(&self) -> f32 {
        match self {
            DroneKind::Harvester => DRONE_HARVESTER_SPEED,
            DroneKind::Hostile => DRONE_HOSTILE_SPEED,
        }
    }

    fn wrap_clearance(&self) -> f32 {
        match self {
            DroneKind::Harvester => HARVESTER_WRAP_CLEARANCE,
            DroneKind::Hostile => HOSTILE_WRAP_CLEARANCE,
        }
    }
}

/// What touching the player did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactEffect {
    /// Hostile on cooldown, or not playing
    Nothing,
    /// Harvester scattered this much of its load
    EnergyScattered(u32),
    /// Hostile knocked these mote ids loose, most recent first
    MotesStolen(Vec<u32>),
}

/// What a destroyed drone leaves behind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneDrop {
    Nothing,
    Energy(u32),
    Motes(u32),
}

/// A single drone. The engine owns the physics body; this tracks what the
/// session cares about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub id: u32,
    pub kind: DroneKind,
    pub pos: Vec2,
    /// Energy (harvester) or stolen motes (hostile)
    pub carried: u32,
    /// Seconds until a hostile can attack again
    pub cooldown: f32,
    /// Harvester is full and flying home
    pub returning: bool,
    pub destroyed: bool,
}

impl Drone {
    pub fn new(id: u32, kind: DroneKind, pos: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            carried: 0,
            cooldown: 0.0,
            returning: false,
            destroyed: false,
        }
    }

    pub fn harvester(id: u32, pos: Vec2) -> Self {
        Self::new(id, DroneKind::Harvester, pos)
    }

    pub fn hostile(id: u32, pos: Vec2) -> Self {
        Self::new(id, DroneKind::Hostile, pos)
    }

    /// Movement speed in pixels per second
    pub fn speed(&self, difficulty: Difficulty) -> f32 {
        self.kind.base_speed() * difficulty.config().drone_speed_multiplier
    }

    /// Advance one frame. Returns true when a harvester arrives at Maxim; the
    /// caller then reports the delivery with [`Drone::on_reached_maxim`].
    pub fn update(&mut self, dt: f32, session: &Session, player: Option<Vec2>) -> bool {
        if self.destroyed || dt <= 0.0 {
            return false;
        }
        let state = session.state();
        let speed = self.speed(state.difficulty);
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }

        let arrived = match self.kind {
            DroneKind::Harvester if self.returning => {
                let home = maxim_position();
                if self.pos.distance(home) < MAXIM_REACH {
                    true
                } else {
                    self.pos = step_toward(self.pos, home, speed * RETURN_SPEED_FACTOR * dt);
                    self.pos.distance(home) < MAXIM_REACH
                }
            }
            DroneKind::Harvester => false,
            DroneKind::Hostile => {
                let chase = player.filter(|target| {
                    state.motes_collected > 1 && self.pos.distance(*target) <= HOSTILE_AGGRO_RANGE
                });
                if let Some(target) = chase {
                    self.pos = step_toward(self.pos, target, speed * CHASE_SPEED_FACTOR * dt);
                }
                false
            }
        };

        // Keep clear of the wrap unless delivering
        if !(self.kind == DroneKind::Harvester && self.returning) {
            let safe_y =
                ARENA_HEIGHT * (1.0 - state.binary_wrap_height) - self.kind.wrap_clearance();
            self.pos.y = self.pos.y.min(safe_y);
        }
        self.pos = self
            .pos
            .clamp(Vec2::ZERO, Vec2::new(ARENA_WIDTH, ARENA_HEIGHT));

        arrived
    }

    /// Harvester picks up energy; turns for home once full
    pub fn collect_energy(&mut self, amount: u32) {
        if self.kind != DroneKind::Harvester || self.destroyed {
            return;
        }
        self.carried = (self.carried + amount).min(HARVESTER_CAPACITY);
        if self.carried >= HARVESTER_CAPACITY {
            self.returning = true;
        }
    }

    /// The player touched this drone
    pub fn on_player_contact(&mut self, session: &mut Session) -> ContactEffect {
        if self.destroyed || !session.state().is_playing() {
            return ContactEffect::Nothing;
        }
        match self.kind {
            DroneKind::Harvester => {
                let scattered = self.carried / 2;
                self.carried -= scattered;
                session.drain_energy(HARVESTER_CONTACT_DRAIN, EnergySource::Flying);
                ContactEffect::EnergyScattered(scattered)
            }
            DroneKind::Hostile => {
                if self.cooldown > 0.0 {
                    return ContactEffect::Nothing;
                }
                self.cooldown = HOSTILE_ATTACK_COOLDOWN;

                let steal = HOSTILE_STEAL.min(session.state().motes_collected);
                let stolen = session.drop_motes(steal);
                self.carried = (self.carried + stolen.len() as u32).min(HOSTILE_MAX_STOLEN);
                if !stolen.is_empty() {
                    log::debug!("Hostile drone {} stole {} motes", self.id, stolen.len());
                }
                ContactEffect::MotesStolen(stolen)
            }
        }
    }

    /// Shot down. Counts once; returns what spills out.
    pub fn on_destroyed(&mut self, session: &mut Session) -> DroneDrop {
        if self.destroyed {
            return DroneDrop::Nothing;
        }
        self.destroyed = true;
        let carried = std::mem::take(&mut self.carried);
        match self.kind {
            DroneKind::Harvester => {
                session.destroy_harvester();
                DroneDrop::Energy(carried)
            }
            DroneKind::Hostile => {
                session.destroy_hostile_drone();
                DroneDrop::Motes(carried)
            }
        }
    }

    /// Harvester delivers its load and relaunches from Maxim
    pub fn on_reached_maxim(&mut self, session: &mut Session) {
        if self.kind != DroneKind::Harvester || self.destroyed {
            return;
        }
        session.harvester_reached_maxim();
        log::debug!("Harvester {} delivered {} energy", self.id, self.carried);
        self.carried = 0;
        self.returning = false;
        self.pos = launch_position();
    }
}

fn step_toward(from: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let delta = to - from;
    let dist = delta.length();
    if dist <= max_step || dist == 0.0 {
        to
    } else {
        from + delta / dist * max_step
    }
}
