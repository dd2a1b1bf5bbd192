//! Mote sequence tracking
//!
//! Each level's motes carry a hidden collection order. Sequence numbers are a
//! uniform random permutation of 1..=N over mote ids, so where a mote spawns
//! says nothing about when it should be collected.
//!
//! The in-order chain always covers sequence numbers 1..=`last_collected_sequence`,
//! and every mote in it is currently held. A collected mote with a higher
//! number was taken out of order and blocks the chain until it is dropped.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use super::session::Session;
use super::state::Mote;
use crate::error::{Result, SessionError};

/// What a `collect_mote` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Not playing; nothing changed
    Suppressed,
    AlreadyCollected,
    Collected {
        sequence_number: u32,
        /// Extended the in-order chain
        in_sequence: bool,
        /// This collection tripped the shooting latch
        unlocked_shooting: bool,
    },
}

impl CollectOutcome {
    pub fn is_collected(&self) -> bool {
        matches!(self, CollectOutcome::Collected { .. })
    }
}

/// Sequence numbers 1..=count in uniformly shuffled order; index = mote id
pub fn shuffled_sequence<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<u32> {
    let mut numbers: Vec<u32> = (1..=count as u32).collect();
    numbers.shuffle(rng);
    numbers
}

impl Session {
    /// Create `count` uncollected motes using the session RNG
    pub fn initialize_motes(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            log::warn!("initialize_motes rejected: count is 0");
            return Err(SessionError::InvalidMoteCount(count));
        }
        let sequence = shuffled_sequence(count, &mut self.rng);
        self.install_motes(sequence);
        Ok(())
    }

    /// Create `count` uncollected motes using a caller-supplied RNG
    pub fn initialize_motes_with<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Result<()> {
        if count == 0 {
            log::warn!("initialize_motes rejected: count is 0");
            return Err(SessionError::InvalidMoteCount(count));
        }
        let sequence = shuffled_sequence(count, rng);
        self.install_motes(sequence);
        Ok(())
    }

    fn install_motes(&mut self, sequence: Vec<u32>) {
        let state = &mut self.state;
        state.motes = sequence
            .into_iter()
            .enumerate()
            .map(|(id, sequence_number)| Mote {
                id: id as u32,
                sequence_number,
                collected: false,
                collected_at: 0,
                pos: Vec2::ZERO,
            })
            .collect();
        state.motes_collected = 0;
        state.last_collected_sequence = 0;
        state.sequence_correct = 0;
        state.collection_clock = 0;
        log::debug!("Initialized {} motes", state.motes.len());
    }

    /// Mirror a mote's world position from the rendering layer
    pub fn set_mote_position(&mut self, id: u32, pos: Vec2) -> Result<()> {
        let mote = self
            .state
            .motes
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(SessionError::UnknownMote(id))?;
        mote.pos = pos;
        Ok(())
    }

    /// Collect a mote, extending the in-order chain when it is the next number
    pub fn collect_mote(&mut self, id: u32) -> Result<CollectOutcome> {
        if !self.state.is_playing() {
            return Ok(CollectOutcome::Suppressed);
        }
        let state = &mut self.state;
        let expected = state.last_collected_sequence + 1;
        let clock = state.collection_clock + 1;

        let mote = state
            .motes
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(SessionError::UnknownMote(id))?;
        if mote.collected {
            return Ok(CollectOutcome::AlreadyCollected);
        }
        mote.collected = true;
        mote.collected_at = clock;
        let sequence_number = mote.sequence_number;

        state.collection_clock = clock;
        state.motes_collected += 1;
        let in_sequence = sequence_number == expected;
        if in_sequence {
            state.last_collected_sequence = expected;
            state.sequence_correct += 1;
        }
        log::debug!(
            "Mote {} (seq {}) collected, expected {}: {}/{} in order",
            id,
            sequence_number,
            expected,
            state.sequence_correct,
            state.motes_collected
        );

        let unlocked_shooting = !state.can_shoot
            && state.motes_collected >= state.level_config().motes_to_unlock_shooting;
        if unlocked_shooting {
            self.unlock_shooting();
        }

        Ok(CollectOutcome::Collected {
            sequence_number,
            in_sequence,
            unlocked_shooting,
        })
    }

    /// Revert up to `count` of the most recently collected motes.
    ///
    /// Returns the affected ids, most recent first, for the caller to respawn.
    /// Dropped motes that belonged to the in-order chain shorten it.
    pub fn drop_motes(&mut self, count: usize) -> Vec<u32> {
        if !self.state.is_playing() || count == 0 {
            return Vec::new();
        }
        let state = &mut self.state;

        let mut held: Vec<(u64, u32)> = state
            .motes
            .iter()
            .filter(|m| m.collected)
            .map(|m| (m.collected_at, m.id))
            .collect();
        held.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
        held.truncate(count);
        let dropped: Vec<u32> = held.into_iter().map(|(_, id)| id).collect();

        let chain_top = state.last_collected_sequence;
        let mut chain_dropped = 0u32;
        for mote in state.motes.iter_mut().filter(|m| dropped.contains(&m.id)) {
            if mote.sequence_number <= chain_top {
                chain_dropped += 1;
            }
            mote.collected = false;
            mote.collected_at = 0;
        }

        state.motes_collected -= dropped.len();
        state.last_collected_sequence -= chain_dropped;
        state.sequence_correct -= chain_dropped as usize;

        if !dropped.is_empty() {
            log::debug!("Dropped motes {:?}, {} still held", dropped, state.motes_collected);
        }
        dropped
    }

    /// Voluntarily release the most recently collected mote
    pub fn eject_mote(&mut self) -> Option<u32> {
        self.drop_motes(1).into_iter().next()
    }
}
