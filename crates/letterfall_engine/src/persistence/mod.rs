//! Persistence boundary: plain data records handed to an external store
//!
//! The core knows nothing about SQL or file formats; gameplay outcomes are
//! packaged as [`ScoreRecord`]s and pushed through the [`ScoreStore`] trait.
//! Stores that perform real I/O should run it off the update thread and
//! marshal results back themselves.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-level errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing storage failed
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A record could not be encoded or decoded
    #[error("record format error: {0}")]
    Format(String),
}

/// A gameplay outcome handed off for persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    /// Player name
    pub player: String,
    /// Final score
    pub score: u32,
    /// Letters caught during the round
    pub letters_caught: u32,
    /// Words completed during the round
    pub words_completed: u32,
}

/// External data-store interface for gameplay outcomes
pub trait ScoreStore {
    /// Persist one score record
    fn save_score(&mut self, record: &ScoreRecord) -> Result<(), StoreError>;

    /// The best scores on record, highest first
    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError>;
}

/// In-memory store used by tests and as a session-local fallback
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    records: Vec<ScoreRecord>,
}

impl MemoryScoreStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn save_score(&mut self, record: &ScoreRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.score.cmp(&a.score));
        records.truncate(limit);
        Ok(records)
    }
}
