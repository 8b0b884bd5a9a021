//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Format is picked by extension
        if path.ends_with(".toml") {
            Self::from_toml_str(&contents)
        } else if path.ends_with(".ron") {
            Self::from_ron_str(&contents)
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Parse configuration from TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Parse configuration from RON text
    fn from_ron_str(contents: &str) -> Result<Self, ConfigError> {
        ron::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Engine-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSettings {
    /// Log filter used when the environment does not set one
    pub log_level: String,
    /// Gravity applied to the shared simulation
    pub gravity: (f32, f32),
    /// Fixed simulation timestep in seconds
    pub timestep: f32,
    /// Virtual canvas width in world units
    pub virtual_width: f32,
    /// Virtual canvas height in world units
    pub virtual_height: f32,
}

impl GameSettings {
    /// Create settings with defaults
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            gravity: (0.0, 0.0),
            timestep: 1.0 / 60.0,
            virtual_width: 16.0,
            virtual_height: 9.0,
        }
    }

    /// Set the log filter
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the simulation gravity
    pub fn with_gravity(mut self, x: f32, y: f32) -> Self {
        self.gravity = (x, y);
        self
    }

    /// Set the fixed timestep
    pub fn with_timestep(mut self, timestep: f32) -> Self {
        self.timestep = timestep;
        self
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), String> {
        if self.timestep <= 0.0 {
            return Err("timestep must be positive".to_string());
        }
        if self.virtual_width <= 0.0 || self.virtual_height <= 0.0 {
            return Err("virtual canvas must have positive extent".to_string());
        }
        Ok(())
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for GameSettings {}
