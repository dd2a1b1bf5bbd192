//! Static level and difficulty tables
//!
//! Loaded once at startup and never mutated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Per-level parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelConfig {
    pub key: &'static str,
    pub name: &'static str,
    pub color: &'static str,
    pub mote_count: usize,
    /// Base timer in seconds, before the difficulty multiplier
    pub base_time: f32,
    pub motes_to_unlock_shooting: usize,
    pub mentor_name: &'static str,
    /// How many times the mentor can appear during the level
    pub mentor_appearances: u32,
}

/// The seven arenas, in play order
pub const LEVELS: [LevelConfig; 7] = [
    LevelConfig {
        key: "crimson",
        name: "Crimson Aether",
        color: "#DC143C",
        mote_count: 7,
        base_time: 120.0,
        motes_to_unlock_shooting: 1,
        mentor_name: "Umber",
        mentor_appearances: 4,
    },
    LevelConfig {
        key: "amber",
        name: "Amber Flux",
        color: "#FF8C00",
        mote_count: 12,
        base_time: 130.0,
        motes_to_unlock_shooting: 2,
        mentor_name: "Calen",
        mentor_appearances: 3,
    },
    LevelConfig {
        key: "yellow",
        name: "Solar Rift",
        color: "#FFD700",
        mote_count: 18,
        base_time: 140.0,
        motes_to_unlock_shooting: 3,
        mentor_name: "Sol",
        mentor_appearances: 3,
    },
    LevelConfig {
        key: "green",
        name: "Verdant Pulse",
        color: "#32CD32",
        mote_count: 24,
        base_time: 150.0,
        motes_to_unlock_shooting: 4,
        mentor_name: "Veyra",
        mentor_appearances: 3,
    },
    LevelConfig {
        key: "blue",
        name: "Azure Void",
        color: "#1E90FF",
        mote_count: 35,
        base_time: 160.0,
        motes_to_unlock_shooting: 5,
        mentor_name: "Zorah",
        mentor_appearances: 3,
    },
    LevelConfig {
        key: "indigo",
        name: "Indigo Veil",
        color: "#4B0082",
        mote_count: 44,
        base_time: 170.0,
        motes_to_unlock_shooting: 6,
        mentor_name: "Nyx",
        mentor_appearances: 2,
    },
    LevelConfig {
        key: "violet",
        name: "Violet Crown",
        color: "#8B00FF",
        mote_count: 49,
        base_time: 180.0,
        motes_to_unlock_shooting: 7,
        mentor_name: "Sylvara",
        mentor_appearances: 2,
    },
];

/// Number of levels in a full run
pub const LEVEL_COUNT: usize = LEVELS.len();

/// Look up a level by index
pub fn level(index: usize) -> Option<&'static LevelConfig> {
    LEVELS.get(index)
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Dreamer,
    #[default]
    Weaver,
    Dancer,
    Master,
}

/// Multipliers applied by a difficulty preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyConfig {
    pub name: &'static str,
    pub description: &'static str,
    /// 1.0 = normal
    pub time_multiplier: f32,
    pub drone_speed_multiplier: f32,
    pub energy_drain_multiplier: f32,
}

const DREAMER: DifficultyConfig = DifficultyConfig {
    name: "Dreamer",
    description: "Relaxed pace, forgiving energy",
    time_multiplier: 1.5,
    drone_speed_multiplier: 0.7,
    energy_drain_multiplier: 0.7,
};

const WEAVER: DifficultyConfig = DifficultyConfig {
    name: "Weaver",
    description: "Standard challenge",
    time_multiplier: 1.0,
    drone_speed_multiplier: 1.0,
    energy_drain_multiplier: 1.0,
};

const DANCER: DifficultyConfig = DifficultyConfig {
    name: "Dancer",
    description: "Fast and demanding",
    time_multiplier: 0.8,
    drone_speed_multiplier: 1.2,
    energy_drain_multiplier: 1.2,
};

const MASTER: DifficultyConfig = DifficultyConfig {
    name: "Master",
    description: "Brutal precision required",
    time_multiplier: 0.6,
    drone_speed_multiplier: 1.5,
    energy_drain_multiplier: 1.4,
};

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Dreamer,
        Difficulty::Weaver,
        Difficulty::Dancer,
        Difficulty::Master,
    ];

    pub fn config(&self) -> &'static DifficultyConfig {
        match self {
            Difficulty::Dreamer => &DREAMER,
            Difficulty::Weaver => &WEAVER,
            Difficulty::Dancer => &DANCER,
            Difficulty::Master => &MASTER,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Dreamer => "dreamer",
            Difficulty::Weaver => "weaver",
            Difficulty::Dancer => "dancer",
            Difficulty::Master => "master",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dreamer" => Ok(Difficulty::Dreamer),
            "weaver" => Ok(Difficulty::Weaver),
            "dancer" => Ok(Difficulty::Dancer),
            "master" => Ok(Difficulty::Master),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

/// Timer a level starts with: floor(base_time * time_multiplier)
pub fn effective_time(level: &LevelConfig, difficulty: Difficulty) -> f32 {
    (level.base_time * difficulty.config().time_multiplier).floor()
}
