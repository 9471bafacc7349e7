use std::collections::HashSet;

use tracing::{debug, warn};

use crate::errors::{PersistenceParseError, PersistenceWriteError};
use crate::storage::KeyValueStore;
use crate::workout::Workout;

pub const WORKOUTS_KEY: &str = "workouts";

/// Whole-list persistence of the workout log. Every save rewrites the entry.
#[derive(Debug)]
pub struct WorkoutStore<K> {
    kv: K,
}

impl<K: KeyValueStore> WorkoutStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    pub fn save(&mut self, workouts: &[Workout]) -> Result<(), PersistenceWriteError> {
        let json = serde_json::to_string(workouts)?;
        self.kv.set(WORKOUTS_KEY, &json)?;
        debug!(count = workouts.len(), "saved workouts");
        Ok(())
    }

    /// Stored list, or empty when nothing usable is stored
    pub fn load(&self) -> Vec<Workout> {
        match self.try_load() {
            Ok(workouts) => workouts,
            Err(e) => {
                warn!("discarding stored workouts: {e}");
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<Workout>, PersistenceParseError> {
        let Some(json) = self.kv.get(WORKOUTS_KEY)? else {
            return Ok(Vec::new());
        };
        let workouts: Vec<Workout> = serde_json::from_str(&json)?;
        let mut seen = HashSet::new();
        if let Some(dup) = workouts.iter().find(|w| !seen.insert(w.id())) {
            return Err(PersistenceParseError::DuplicateId(dup.id().to_string()));
        }
        Ok(workouts)
    }

    pub fn clear(&mut self) {
        if let Err(e) = self.kv.remove(WORKOUTS_KEY) {
            warn!("failed to clear stored workouts: {e}");
        }
    }

    #[cfg(test)]
    pub(crate) fn kv(&self) -> &K {
        &self.kv
    }
}
