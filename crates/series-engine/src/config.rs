//! Engine configuration.
//!
//! Every constant the engine depends on (grid geometry, expansion caps,
//! history depth, interaction timings) lives here as data and is passed
//! explicitly to the components that need it. Nothing is process-global.
//!
//! Configuration can be built in code (`EngineConfig::default()`) or loaded
//! from TOML. Missing keys fall back to their defaults:
//!
//! ```
//! use series_engine::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     [grid]
//!     hour_height_px = 60.0
//!
//!     [expansion]
//!     custom_never_cap = 26
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.grid.hour_height_px, 60.0);
//! assert_eq!(config.grid.day_columns, 7);
//! assert_eq!(config.expansion.custom_never_cap, 26);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub grid: GridConfig,
    pub expansion: ExpansionLimits,
    pub history: HistoryConfig,
    pub interaction: InteractionConfig,
}

/// Geometry of the week time grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Height of one hour row in pixels.
    pub hour_height_px: f64,
    /// Number of equal-width day columns.
    pub day_columns: u32,
    /// Length of an event created by clicking an empty slot.
    pub slot_minutes: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hour_height_px: 50.0,
            day_columns: 7,
            slot_minutes: 60,
        }
    }
}

/// Safety caps applied by the recurrence expander.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionLimits {
    /// Horizon for simple rules that never end, in months from the anchor.
    pub never_horizon_months: u32,
    /// Occurrence (and aligned-week) cap for custom weekly rules that never end.
    pub custom_never_cap: u32,
    /// Absolute cap on the number of occurrences any single expansion emits.
    pub max_occurrences: u32,
}

impl Default for ExpansionLimits {
    fn default() -> Self {
        Self {
            never_horizon_months: 12,
            custom_never_cap: 52,
            max_occurrences: 1000,
        }
    }
}

/// Undo/redo history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of snapshots retained. The oldest are dropped first.
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 200 }
    }
}

/// Pointer and animation timings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub double_click_ms: u64,
    pub fade_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            double_click_ms: 300,
            fade_ms: 300,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the document is not valid
    /// TOML, has mistyped keys, or fails [`EngineConfig::validate`].
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(s).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the file cannot be read or
    /// parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidConfig(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reject geometry and caps that would make the engine divide by zero or
    /// never emit anything.
    pub fn validate(&self) -> Result<()> {
        if !(self.grid.hour_height_px.is_finite() && self.grid.hour_height_px > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "grid.hour_height_px must be positive, got {}",
                self.grid.hour_height_px
            )));
        }
        if self.grid.day_columns == 0 {
            return Err(EngineError::InvalidConfig(
                "grid.day_columns must be at least 1".to_string(),
            ));
        }
        if self.grid.slot_minutes == 0 {
            return Err(EngineError::InvalidConfig(
                "grid.slot_minutes must be at least 1".to_string(),
            ));
        }
        if self.expansion.max_occurrences == 0 {
            return Err(EngineError::InvalidConfig(
                "expansion.max_occurrences must be at least 1".to_string(),
            ));
        }
        if self.history.limit == 0 {
            return Err(EngineError::InvalidConfig(
                "history.limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_grid_constants() {
        let config = EngineConfig::default();
        assert_eq!(config.grid.hour_height_px, 50.0);
        assert_eq!(config.grid.day_columns, 7);
        assert_eq!(config.expansion.never_horizon_months, 12);
        assert_eq!(config.expansion.custom_never_cap, 52);
        assert_eq!(config.interaction.double_click_ms, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str("[history]\nlimit = 5\n").unwrap();
        assert_eq!(config.history.limit, 5);
        assert_eq!(config.grid, GridConfig::default());
    }

    #[test]
    fn test_rejects_zero_columns() {
        let err = EngineConfig::from_toml_str("[grid]\nday_columns = 0\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let err = EngineConfig::from_toml_str("[grid\n").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[interaction]\ndouble_click_ms = 250").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.interaction.double_click_ms, 250);
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }
}
