//! Reward cards
//!
//! Every finished level can be minted into a card by a [`RewardSink`]. The
//! session only hands records over; nothing it does depends on what the sink
//! does with them.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::LEVELS;
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH};
use crate::sim::{Badge, LevelRecord, Outcome, PathPoint, Rarity};

/// Stroke width of the drawn route
const ROUTE_STROKE_WIDTH: u32 = 4;

/// Receives level records as they are produced
pub trait RewardSink {
    fn mint(&mut self, record: &LevelRecord);
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl RewardSink for NullSink {
    fn mint(&mut self, _record: &LevelRecord) {}
}

/// Card art family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    /// Won level
    Rainbow,
    /// Lost level
    Binary,
}

impl From<Outcome> for CardKind {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Win => CardKind::Rainbow,
            Outcome::Lose => CardKind::Binary,
        }
    }
}

/// A minted card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardCard {
    /// Mint order within the album, from 1
    pub serial: u32,
    pub kind: CardKind,
    pub rarity: Rarity,
    /// CSS colour (or gradient) for the card frame
    pub frame_color: String,
    pub badges: Vec<Badge>,
    pub level_index: usize,
    pub level_key: String,
    /// Flown route, absent when fewer than two points were recorded
    pub route_svg: Option<String>,
}

impl RewardCard {
    pub fn from_record(serial: u32, record: &LevelRecord) -> Self {
        Self {
            serial,
            kind: record.outcome.into(),
            rarity: record.final_rarity,
            frame_color: record.final_rarity.color().to_string(),
            badges: record.badges.clone(),
            level_index: record.level_index,
            level_key: record.level_key.clone(),
            route_svg: route_svg(&record.path, ARENA_WIDTH, ARENA_HEIGHT),
        }
    }
}

/// In-memory card collection, lives as long as the process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardAlbum {
    pub cards: Vec<RewardCard>,
}

impl CardAlbum {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Highest-ranked rarity held, if any
    pub fn best_rarity(&self) -> Option<Rarity> {
        self.cards
            .iter()
            .map(|c| c.rarity)
            .max_by_key(|r| r.rank())
    }

    pub fn cards_for_level<'a>(&'a self, level_key: &'a str) -> impl Iterator<Item = &'a RewardCard> {
        self.cards.iter().filter(move |c| c.level_key == level_key)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl RewardSink for CardAlbum {
    fn mint(&mut self, record: &LevelRecord) {
        let serial = self.cards.len() as u32 + 1;
        let card = RewardCard::from_record(serial, record);
        log::info!(
            "Minted {:?} card #{} for {} ({})",
            card.kind,
            serial,
            card.level_key,
            card.rarity
        );
        self.cards.push(card);
    }
}

/// Render a flown route as an SVG path stroked with the seven level colours,
/// top to bottom. `None` when there is nothing to draw.
pub fn route_svg(points: &[PathPoint], width: f32, height: f32) -> Option<String> {
    let (first, rest) = points.split_first()?;
    if rest.is_empty() {
        return None;
    }

    let mut path = format!("M {} {}", first.pos.x, first.pos.y);
    for point in rest {
        let _ = write!(path, " L {} {}", point.pos.x, point.pos.y);
    }

    let last = LEVELS.len().saturating_sub(1).max(1) as f32;
    let mut stops = String::new();
    for (i, level) in LEVELS.iter().enumerate() {
        let offset = i as f32 / last * 100.0;
        let _ = write!(
            stops,
            r#"<stop offset="{:.2}%" style="stop-color:{};stop-opacity:1"/>"#,
            offset, level.color
        );
    }

    Some(format!(
        concat!(
            r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg">"#,
            r#"<defs><linearGradient id="rainbow" x1="0%" y1="0%" x2="0%" y2="100%">{stops}</linearGradient></defs>"#,
            r#"<path d="{path}" stroke="url(#rainbow)" stroke-width="{stroke}" fill="none"/>"#,
            "</svg>"
        ),
        w = width,
        h = height,
        stops = stops,
        path = path,
        stroke = ROUTE_STROKE_WIDTH,
    ))
}
