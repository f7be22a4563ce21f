//! Persistence of the worker roster and the treasury balance.
//!
//! Only identity, rank, specialty and experience are stored per worker.
//! Rank is written for human inspection but never trusted on load: it is
//! recomputed from experience, and the derived prompt/model profile is
//! rebuilt from config.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::worker::{Rank, Specialty, Worker};

/// Persisted form of a worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub id: String,
    pub rank: Rank,
    pub specialty: Specialty,
    pub experience: u64,
}

impl WorkerRecord {
    pub fn from_worker(worker: &Worker) -> Self {
        Self {
            id: worker.id.clone(),
            rank: worker.rank,
            specialty: worker.specialty,
            experience: worker.experience,
        }
    }

    /// Rebuild a live worker, recomputing rank from experience.
    pub fn into_worker(self) -> Worker {
        Worker::from_stored(self.id, self.specialty, self.experience)
    }
}

/// Everything that survives process restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedState {
    pub workers: BTreeMap<String, WorkerRecord>,
    pub treasury: i64,
}

impl SavedState {
    /// Load state from disk. A missing file means a fresh installation.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
