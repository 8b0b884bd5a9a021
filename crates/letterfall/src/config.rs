//! Level configuration

use letterfall_engine::assembly::EntityConfig;
use letterfall_engine::config::ConfigError;
use serde::Deserialize;

/// A complete level description
#[derive(Debug, Clone, Deserialize)]
pub struct LevelConfig {
    /// Level name shown in logs
    pub name: String,
    /// Gravity applied to the level's simulation
    pub gravity: (f32, f32),
    /// Seconds between letter spawns
    pub spawn_interval: f32,
    /// Letters the spawner draws from
    pub letter_pool: String,
    /// Words the player is asked to build
    pub target_words: Vec<String>,
    /// Round length in seconds
    pub round_time: f32,
    /// Horizontal extent letters spawn across
    pub spawn_width: f32,
    /// Height letters spawn at
    pub spawn_height: f32,
    /// The player entity
    pub player: EntityConfig,
    /// The ground entity
    pub ground: EntityConfig,
    /// Template used for every spawned letter
    pub letter_template: EntityConfig,
}

impl LevelConfig {
    /// Parse a level from RON text
    pub fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Basic sanity checks before a level is played
    pub fn validate(&self) -> Result<(), String> {
        if self.letter_pool.is_empty() {
            return Err("letter pool must not be empty".to_string());
        }
        if self.spawn_interval <= 0.0 {
            return Err("spawn interval must be positive".to_string());
        }
        if self.target_words.is_empty() {
            return Err("at least one target word is required".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_level_parses_and_validates() {
        let level = LevelConfig::from_ron_str(include_str!("../resources/level_default.ron"))
            .expect("bundled level must parse");
        level.validate().expect("bundled level must validate");
        assert!(!level.player.components.is_empty());
        assert!(!level.letter_template.components.is_empty());
    }

    #[test]
    fn test_empty_pool_fails_validation() {
        let mut level =
            LevelConfig::from_ron_str(include_str!("../resources/level_default.ron")).unwrap();
        level.letter_pool.clear();
        assert!(level.validate().is_err());
    }
}
