//! Badges and reward rarity
//!
//! Wins climb an eight-step ladder from `common` to `prismatic_ultimate`.
//! Losses resolve on a separate short path that tops out at the orthogonal
//! `defiant_ultimate` tier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::state::{Outcome, SessionState};
use crate::config::LEVEL_COUNT;
use crate::consts::*;

/// Reward card rarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
    Mythic,
    Ultimate,
    /// Perfect sequence on every level of a full run
    PrismaticUltimate,
    /// Loss-only tier for earning every defiant badge
    DefiantUltimate,
}

impl Rarity {
    /// The win ladder, lowest first
    pub const LADDER: [Rarity; 8] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
        Rarity::Mythic,
        Rarity::Ultimate,
        Rarity::PrismaticUltimate,
    ];

    /// Position on the win ladder; `None` for `defiant_ultimate`
    pub fn ladder_index(&self) -> Option<usize> {
        Self::LADDER.iter().position(|r| r == self)
    }

    /// Climb `steps` rungs, never past `ultimate`
    pub fn boosted(self, steps: usize) -> Rarity {
        let ceiling = Rarity::Ultimate as usize;
        match self.ladder_index() {
            Some(index) if index < ceiling => Self::LADDER[(index + steps).min(ceiling)],
            _ => self,
        }
    }

    /// Ordering used to pick a "best" card; defiant ranks with ultimate
    pub fn rank(&self) -> usize {
        match self {
            Rarity::DefiantUltimate => Rarity::Ultimate as usize,
            other => other.ladder_index().unwrap_or(0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
            Rarity::Mythic => "mythic",
            Rarity::Ultimate => "ultimate",
            Rarity::PrismaticUltimate => "prismatic_ultimate",
            Rarity::DefiantUltimate => "defiant_ultimate",
        }
    }

    /// Card frame colour (CSS)
    pub fn color(&self) -> &'static str {
        match self {
            Rarity::Common => "#9CA3AF",
            Rarity::Uncommon => "#22C55E",
            Rarity::Rare => "#3B82F6",
            Rarity::Epic => "#A855F7",
            Rarity::Legendary => "#F59E0B",
            Rarity::Mythic => "#EF4444",
            Rarity::Ultimate => "#EC4899",
            Rarity::PrismaticUltimate => {
                "linear-gradient(90deg, #FF0000, #FF8000, #FFFF00, #00FF00, #0080FF, #8000FF)"
            }
            Rarity::DefiantUltimate => "#1F2937",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::LADDER
            .iter()
            .chain(std::iter::once(&Rarity::DefiantUltimate))
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown rarity '{s}'"))
    }
}

/// Achievement flags computed from final level stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    // Win
    Flawless,
    Harmonic,
    MentorBlessed,
    DroneDenial,
    // Loss
    LastBreath,
    PartialHarmony,
    Cartographer,
    DefiantUltimate,
}

impl Badge {
    pub fn as_str(&self) -> &'static str {
        match self {
            Badge::Flawless => "flawless",
            Badge::Harmonic => "harmonic",
            Badge::MentorBlessed => "mentor_blessed",
            Badge::DroneDenial => "drone_denial",
            Badge::LastBreath => "last_breath",
            Badge::PartialHarmony => "partial_harmony",
            Badge::Cartographer => "cartographer",
            Badge::DefiantUltimate => "defiant_ultimate",
        }
    }

    /// Win-path boost contributed by this badge
    fn boost(&self) -> f32 {
        match self {
            Badge::Flawless | Badge::Harmonic => 1.0,
            Badge::MentorBlessed | Badge::DroneDenial => 0.5,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Badge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything badge and rarity resolution looks at
#[derive(Debug, Clone, PartialEq)]
pub struct LevelFacts {
    pub outcome: Outcome,
    pub mote_count: usize,
    pub motes_collected: usize,
    pub sequence_correct: usize,
    pub lives_at_start: u8,
    pub lives: u8,
    pub mentor_touches: u32,
    pub harvesters_reached_maxim: u32,
    pub time_remaining: f32,
    pub total_time: f32,
    pub explored_percent: f32,
    /// Run-wide perfect flag as it stood before this level
    pub all_sequences_perfect_before: bool,
    /// Level records in the run, counting this one
    pub levels_completed: usize,
}

impl LevelFacts {
    pub fn from_state(state: &SessionState, outcome: Outcome) -> Self {
        Self {
            outcome,
            mote_count: state.level_config().mote_count,
            motes_collected: state.motes_collected,
            sequence_correct: state.sequence_correct,
            lives_at_start: state.lives_at_level_start,
            lives: state.lives,
            mentor_touches: state.mentor_touches_this_level,
            harvesters_reached_maxim: state.harvesters_reached_maxim,
            time_remaining: state.time_remaining,
            total_time: state.total_time(),
            explored_percent: state.explored_percent(),
            all_sequences_perfect_before: state.all_sequences_perfect,
            levels_completed: state.completed_levels.len() + 1,
        }
    }

    /// Every mote collected, every one in order
    pub fn sequence_perfect(&self) -> bool {
        self.sequence_correct == self.motes_collected && self.motes_collected == self.mote_count
    }

    pub fn partial_sequence_perfect(&self) -> bool {
        self.sequence_correct == self.motes_collected && self.motes_collected > 0
    }

    pub fn all_motes_collected(&self) -> bool {
        self.motes_collected == self.mote_count
    }

    /// In-order share of the level's motes (win path)
    pub fn win_sequence_ratio(&self) -> f32 {
        ratio(self.sequence_correct as f32, self.mote_count as f32)
    }

    /// In-order share of the collected motes (loss path)
    pub fn loss_sequence_ratio(&self) -> f32 {
        ratio(self.sequence_correct as f32, self.motes_collected as f32)
    }

    /// Share of the total time still on the clock
    pub fn time_ratio(&self) -> f32 {
        ratio(self.time_remaining, self.total_time)
    }
}

/// Division that resolves to 0 on an empty denominator
fn ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Badges earned, in award order
pub fn derive_badges(facts: &LevelFacts) -> Vec<Badge> {
    let mut badges = Vec::new();
    let drone_denial = facts.harvesters_reached_maxim == 0;

    match facts.outcome {
        Outcome::Win => {
            if facts.lives == facts.lives_at_start {
                badges.push(Badge::Flawless);
            }
            if facts.sequence_perfect() {
                badges.push(Badge::Harmonic);
            }
            if facts.mentor_touches > 0 {
                badges.push(Badge::MentorBlessed);
            }
            if drone_denial {
                badges.push(Badge::DroneDenial);
            }
        }
        Outcome::Lose => {
            if facts.time_remaining <= LAST_BREATH_SECONDS {
                badges.push(Badge::LastBreath);
            }
            if facts.partial_sequence_perfect() {
                badges.push(Badge::PartialHarmony);
            }
            if drone_denial {
                badges.push(Badge::DroneDenial);
            }
            if facts.explored_percent >= CARTOGRAPHER_THRESHOLD {
                badges.push(Badge::Cartographer);
            }
            if badges.len() == 4 {
                badges.push(Badge::DefiantUltimate);
            }
        }
    }
    badges
}

/// Win tier before badge boosts
pub fn base_win_tier(facts: &LevelFacts) -> Rarity {
    let ratio = facts.win_sequence_ratio();
    let all = facts.all_motes_collected();

    if facts.sequence_perfect() && all {
        Rarity::Ultimate
    } else if all && ratio >= 0.9 {
        Rarity::Mythic
    } else if all && ratio >= 0.7 {
        Rarity::Legendary
    } else if all && ratio >= 0.5 {
        Rarity::Epic
    } else if all {
        Rarity::Rare
    } else if ratio >= 0.8 {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

/// Boost score from badges plus one time bonus
pub fn boost_score(facts: &LevelFacts, badges: &[Badge]) -> f32 {
    let badge_boost: f32 = badges.iter().map(Badge::boost).sum();
    let time_ratio = facts.time_ratio();
    // Over 75% and over 50% are the same half point, never both
    let time_boost = if time_ratio > 0.5 { 0.5 } else { 0.0 };
    badge_boost + time_boost
}

/// Final rarity for a level attempt
pub fn resolve_rarity(facts: &LevelFacts, badges: &[Badge]) -> Rarity {
    match facts.outcome {
        Outcome::Lose => resolve_loss(facts, badges),
        Outcome::Win => resolve_win(facts, badges),
    }
}

fn resolve_loss(facts: &LevelFacts, badges: &[Badge]) -> Rarity {
    if badges.contains(&Badge::DefiantUltimate) {
        Rarity::DefiantUltimate
    } else if facts.partial_sequence_perfect()
        && facts.motes_collected as f32 >= 0.8 * facts.mote_count as f32
    {
        Rarity::Uncommon
    } else if facts.motes_collected > 0 && facts.loss_sequence_ratio() >= 0.7 {
        Rarity::Rare
    } else if facts.motes_collected > 0 {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

fn resolve_win(facts: &LevelFacts, badges: &[Badge]) -> Rarity {
    if facts.all_sequences_perfect_before
        && facts.sequence_perfect()
        && facts.levels_completed >= LEVEL_COUNT
    {
        return Rarity::PrismaticUltimate;
    }

    let base = base_win_tier(facts);
    if base == Rarity::Ultimate {
        return base;
    }
    let steps = boost_score(facts, badges).floor() as usize;
    base.boosted(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win_facts() -> LevelFacts {
        LevelFacts {
            outcome: Outcome::Win,
            mote_count: 7,
            motes_collected: 7,
            sequence_correct: 7,
            lives_at_start: 3,
            lives: 3,
            mentor_touches: 0,
            harvesters_reached_maxim: 0,
            time_remaining: 60.0,
            total_time: 120.0,
            explored_percent: 0.2,
            all_sequences_perfect_before: true,
            levels_completed: 1,
        }
    }

    fn loss_facts() -> LevelFacts {
        LevelFacts {
            outcome: Outcome::Lose,
            lives: 0,
            ..win_facts()
        }
    }

    #[test]
    fn test_ladder_order() {
        assert_eq!(Rarity::Common.ladder_index(), Some(0));
        assert_eq!(Rarity::PrismaticUltimate.ladder_index(), Some(7));
        assert_eq!(Rarity::DefiantUltimate.ladder_index(), None);
        assert_eq!(Rarity::Ultimate as usize, 6);
    }

    #[test]
    fn test_boost_clamps_at_ultimate() {
        assert_eq!(Rarity::Rare.boosted(2), Rarity::Legendary);
        assert_eq!(Rarity::Mythic.boosted(3), Rarity::Ultimate);
        assert_eq!(Rarity::Ultimate.boosted(1), Rarity::Ultimate);
        assert_eq!(Rarity::DefiantUltimate.boosted(1), Rarity::DefiantUltimate);
    }

    #[test]
    fn test_rarity_parse_and_display() {
        assert_eq!("prismatic_ultimate".parse::<Rarity>(), Ok(Rarity::PrismaticUltimate));
        assert_eq!("defiant_ultimate".parse::<Rarity>(), Ok(Rarity::DefiantUltimate));
        assert!("shiny".parse::<Rarity>().is_err());
        assert_eq!(Rarity::Mythic.to_string(), "mythic");
        assert_eq!(
            serde_json::to_string(&Badge::MentorBlessed).unwrap(),
            "\"mentor_blessed\""
        );
    }

    #[test]
    fn test_perfect_win_is_ultimate() {
        let facts = win_facts();
        let badges = derive_badges(&facts);
        assert_eq!(badges, vec![Badge::Flawless, Badge::Harmonic, Badge::DroneDenial]);
        assert_eq!(base_win_tier(&facts), Rarity::Ultimate);
        assert_eq!(resolve_rarity(&facts, &badges), Rarity::Ultimate);
    }

    #[test]
    fn test_flawless_needs_unchanged_lives() {
        // A life gained mid-level is still a change
        let facts = LevelFacts {
            lives_at_start: 2,
            lives: 3,
            ..win_facts()
        };
        assert!(!derive_badges(&facts).contains(&Badge::Flawless));

        let facts = LevelFacts {
            lives: 2,
            ..win_facts()
        };
        assert!(!derive_badges(&facts).contains(&Badge::Flawless));
    }

    #[test]
    fn test_base_tiers() {
        let tier = |collected, correct| {
            base_win_tier(&LevelFacts {
                mote_count: 10,
                motes_collected: collected,
                sequence_correct: correct,
                ..win_facts()
            })
        };
        assert_eq!(tier(10, 9), Rarity::Mythic);
        assert_eq!(tier(10, 7), Rarity::Legendary);
        assert_eq!(tier(10, 5), Rarity::Epic);
        assert_eq!(tier(10, 1), Rarity::Rare);
        assert_eq!(tier(9, 8), Rarity::Uncommon);
        assert_eq!(tier(9, 7), Rarity::Common);
    }

    #[test]
    fn test_swapped_sequence_base_is_rare() {
        let facts = LevelFacts {
            sequence_correct: 1,
            ..win_facts()
        };
        assert_eq!(base_win_tier(&facts), Rarity::Rare);
    }

    #[test]
    fn test_boost_pass() {
        // Rare base; flawless (+1) + drone denial (+0.5) + time > 0.75 (+0.5) = 2
        let facts = LevelFacts {
            sequence_correct: 1,
            time_remaining: 100.0,
            ..win_facts()
        };
        let badges = derive_badges(&facts);
        assert_eq!(boost_score(&facts, &badges), 2.0);
        assert_eq!(resolve_rarity(&facts, &badges), Rarity::Legendary);

        // Lost a life, harvesters delivered, low clock: no boost
        let facts = LevelFacts {
            sequence_correct: 1,
            lives: 2,
            harvesters_reached_maxim: 3,
            time_remaining: 10.0,
            ..win_facts()
        };
        let badges = derive_badges(&facts);
        assert!(badges.is_empty());
        assert_eq!(resolve_rarity(&facts, &badges), Rarity::Rare);
    }

    #[test]
    fn test_half_points_floor() {
        // mentor (+0.5) alone does not step
        let facts = LevelFacts {
            sequence_correct: 1,
            lives: 2,
            mentor_touches: 1,
            harvesters_reached_maxim: 1,
            time_remaining: 10.0,
            ..win_facts()
        };
        let badges = derive_badges(&facts);
        assert_eq!(badges, vec![Badge::MentorBlessed]);
        assert_eq!(resolve_rarity(&facts, &badges), Rarity::Rare);
    }

    #[test]
    fn test_time_bonuses_exclusive() {
        let facts = LevelFacts {
            time_remaining: 110.0,
            ..win_facts()
        };
        assert_eq!(boost_score(&facts, &[]), 0.5);
    }

    #[test]
    fn test_prismatic_needs_full_perfect_run() {
        let facts = LevelFacts {
            levels_completed: 7,
            ..win_facts()
        };
        assert_eq!(resolve_rarity(&facts, &derive_badges(&facts)), Rarity::PrismaticUltimate);

        let broken_run = LevelFacts {
            all_sequences_perfect_before: false,
            ..facts.clone()
        };
        assert_eq!(resolve_rarity(&broken_run, &[]), Rarity::Ultimate);

        let imperfect_final = LevelFacts {
            sequence_correct: 6,
            ..facts
        };
        assert_ne!(resolve_rarity(&imperfect_final, &[]), Rarity::PrismaticUltimate);
    }

    #[test]
    fn test_defiant_ultimate() {
        let facts = LevelFacts {
            motes_collected: 5,
            sequence_correct: 5,
            time_remaining: 2.0,
            explored_percent: 0.95,
            ..loss_facts()
        };
        let badges = derive_badges(&facts);
        assert_eq!(
            badges,
            vec![
                Badge::LastBreath,
                Badge::PartialHarmony,
                Badge::DroneDenial,
                Badge::Cartographer,
                Badge::DefiantUltimate,
            ]
        );
        assert_eq!(resolve_rarity(&facts, &badges), Rarity::DefiantUltimate);
    }

    #[test]
    fn test_loss_path() {
        let resolve = |collected, correct| {
            let facts = LevelFacts {
                motes_collected: collected,
                sequence_correct: correct,
                harvesters_reached_maxim: 1,
                ..loss_facts()
            };
            resolve_rarity(&facts, &derive_badges(&facts))
        };
        // Perfect and at least 80% collected
        assert_eq!(resolve(6, 6), Rarity::Uncommon);
        // Perfect but short of 80%
        assert_eq!(resolve(3, 3), Rarity::Rare);
        // 3 of 4 in order
        assert_eq!(resolve(4, 3), Rarity::Rare);
        assert_eq!(resolve(4, 1), Rarity::Uncommon);
        assert_eq!(resolve(0, 0), Rarity::Common);
    }

    #[test]
    fn test_zero_denominators() {
        let facts = LevelFacts {
            mote_count: 0,
            motes_collected: 0,
            sequence_correct: 0,
            total_time: 0.0,
            time_remaining: 0.0,
            ..win_facts()
        };
        assert_eq!(facts.win_sequence_ratio(), 0.0);
        assert_eq!(facts.time_ratio(), 0.0);
        assert_eq!(facts.loss_sequence_ratio(), 0.0);
        let badges = derive_badges(&facts);
        // Vacuously perfect with no motes configured
        assert_eq!(resolve_rarity(&facts, &badges), Rarity::Ultimate);

        let lost = LevelFacts {
            outcome: Outcome::Lose,
            ..facts
        };
        assert_eq!(resolve_rarity(&lost, &derive_badges(&lost)), Rarity::Common);
    }
}
