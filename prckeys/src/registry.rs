//! Table of public keys indexed by trust level

use crate::error::{KeyError, Result};
use tracing::debug;

/// Highest trust level accepted anywhere in the tool.
pub const MAX_KEY_NUMBER: u32 = 1024;

/// One populated slot of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// PEM-encoded SubjectPublicKeyInfo
    pub public_key: Vec<u8>,
    /// Unix time the key was generated
    pub generated_time: i64,
}

/// Public keys by trust level.
///
/// Slot `n` holds the key for trust level `n`, so slot 0 is never populated
/// and unused levels in between stay empty. The slot count is therefore one
/// more than the highest level recorded.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    slots: Vec<Option<KeyRecord>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the key for `level`.
    pub fn record(&mut self, level: u32, public_key: Vec<u8>, generated_time: i64) -> Result<()> {
        if level == 0 || level > MAX_KEY_NUMBER {
            return Err(KeyError::Usage(format!(
                "Key numbers must be between 1 and {}; you specified {}.",
                MAX_KEY_NUMBER, level
            )));
        }

        let index = level as usize;
        if self.slots.len() <= index {
            self.slots.resize(index + 1, None);
        }
        if self.slots[index].is_some() {
            debug!("Replacing public key for trust level {}", level);
        }
        self.slots[index] = Some(KeyRecord {
            public_key,
            generated_time,
        });
        Ok(())
    }

    /// The key for `level`, or `None` for an empty or out-of-range slot.
    pub fn get(&self, level: u32) -> Option<&KeyRecord> {
        self.slots.get(level as usize).and_then(Option::as_ref)
    }

    /// Number of populated slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Size of the key-number space, including empty slots.
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// All slots in index order, empty ones included.
    pub fn slots(&self) -> impl Iterator<Item = (u32, Option<&KeyRecord>)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (i as u32, slot.as_ref()))
    }

    /// Populated slots only.
    pub fn keys(&self) -> impl Iterator<Item = (u32, &KeyRecord)> {
        self.slots().filter_map(|(i, slot)| slot.map(|r| (i, r)))
    }

    /// Widen the slot space without populating anything.
    pub fn reserve_slots(&mut self, num_slots: usize) {
        if self.slots.len() < num_slots {
            self.slots.resize(num_slots, None);
        }
    }
}
