//! RON-file-backed score store

use letterfall_engine::persistence::{ScoreRecord, ScoreStore, StoreError};
use std::path::{Path, PathBuf};

/// Persists score records as a RON document on disk
pub struct RonScoreStore {
    path: PathBuf,
}

impl RonScoreStore {
    /// Create a store backed by the given file path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn load(&self) -> Result<Vec<ScoreRecord>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        ron::from_str(&contents).map_err(|e| StoreError::Format(e.to_string()))
    }
}

impl ScoreStore for RonScoreStore {
    fn save_score(&mut self, record: &ScoreRecord) -> Result<(), StoreError> {
        let mut records = self.load()?;
        records.push(record.clone());
        let contents = ron::ser::to_string_pretty(&records, Default::default())
            .map_err(|e| StoreError::Format(e.to_string()))?;
        std::fs::write(&self.path, contents).map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn top_scores(&self, limit: usize) -> Result<Vec<ScoreRecord>, StoreError> {
        let mut records = self.load()?;
        records.sort_by(|a, b| b.score.cmp(&a.score));
        records.truncate(limit);
        Ok(records)
    }
}
