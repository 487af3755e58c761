//! Dashboard configuration.
//!
//! Settings are read from TOML. The default configuration is embedded at
//! compile time from `config/default.toml`; any field omitted from a user
//! file falls back to the same defaults.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use swipe_map_geography_models::ZoomTarget;
use swipe_map_scale::ColorRamp;
use swipe_map_swipes_models::Week;
use thiserror::Error;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration is not valid TOML for [`DashboardConfig`].
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `percentile_cap` is outside `(0, 1]`.
    #[error("percentile_cap must be in (0, 1], got {value}")]
    InvalidPercentile {
        /// The configured value.
        value: f64,
    },

    /// A region has an empty NTA code.
    #[error("Region {index} has an empty code")]
    EmptyRegionCode {
        /// Position of the region in the list.
        index: usize,
    },

    /// Two regions share a zoom target.
    #[error("Zoom target {target} is used by more than one region")]
    DuplicateZoomTarget {
        /// The repeated target.
        target: ZoomTarget,
    },
}

/// A focus neighborhood the map can zoom to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    /// NTA code (e.g. `"MN24"`).
    pub code: String,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Camera framing this region backs.
    pub zoom_target: ZoomTarget,
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// First week kept by the swipe filter.
    #[serde(default = "defaults::start_week")]
    pub start_week: Week,
    /// `BoroCode` of NTAs removed from the map.
    #[serde(default = "defaults::excluded_boro_code")]
    pub excluded_boro_code: u8,
    /// Quantile used for capped extents.
    #[serde(default = "defaults::percentile_cap")]
    pub percentile_cap: f64,
    /// Ramp the swipe color scale draws from.
    #[serde(default)]
    pub color_ramp: ColorRamp,
    /// Focus neighborhoods, in display order.
    #[serde(default = "defaults::regions")]
    pub regions: Vec<RegionConfig>,
}

impl DashboardConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out of
    /// range.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML fails to parse. It is a compile-time
    /// constant, so a failure is a development error caught by tests.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded default config: {e}"))
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.percentile_cap > 0.0 && self.percentile_cap <= 1.0) {
            return Err(ConfigError::InvalidPercentile {
                value: self.percentile_cap,
            });
        }

        let mut targets = BTreeSet::new();
        for (index, region) in self.regions.iter().enumerate() {
            if region.code.trim().is_empty() {
                return Err(ConfigError::EmptyRegionCode { index });
            }
            if !targets.insert(&region.zoom_target) {
                return Err(ConfigError::DuplicateZoomTarget {
                    target: region.zoom_target.clone(),
                });
            }
        }

        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::embedded()
    }
}

mod defaults {
    use chrono::NaiveDate;

    use super::{RegionConfig, Week};

    pub fn start_week() -> Week {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
    }

    pub const fn excluded_boro_code() -> u8 {
        5
    }

    pub const fn percentile_cap() -> f64 {
        0.99
    }

    pub fn regions() -> Vec<RegionConfig> {
        vec![
            RegionConfig {
                code: "MN24".to_string(),
                name: Some("SoHo-TriBeCa-Civic Center-Little Italy".to_string()),
                zoom_target: "ZOOM_SOHO".into(),
            },
            RegionConfig {
                code: "BK81".to_string(),
                name: Some("Brownsville".to_string()),
                zoom_target: "ZOOM_BROWNSVILLE".into(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = DashboardConfig::embedded();

        assert_eq!(config.excluded_boro_code, 5);
        assert!((config.percentile_cap - 0.99).abs() < f64::EPSILON);
        assert_eq!(config.color_ramp, ColorRamp::RdYlGn);
        assert_eq!(
            config
                .regions
                .iter()
                .map(|r| (r.code.as_str(), r.zoom_target.as_str()))
                .collect::<Vec<_>>(),
            vec![("MN24", "ZOOM_SOHO"), ("BK81", "ZOOM_BROWNSVILLE")]
        );
    }

    #[test]
    fn embedded_default_matches_fallbacks() {
        assert_eq!(
            DashboardConfig::embedded(),
            DashboardConfig::from_toml_str("").unwrap()
        );
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = DashboardConfig::from_toml_str(
            r#"
            start_week = "2020-03-07"
            color_ramp = "blues"

            [[regions]]
            code = "QN68"
            zoom_target = "ZOOM_SUNNYSIDE"
            "#,
        )
        .unwrap();

        assert_eq!(config.start_week, NaiveDate::from_ymd_opt(2020, 3, 7).unwrap());
        assert_eq!(config.color_ramp, ColorRamp::Blues);
        assert_eq!(config.excluded_boro_code, 5);
        assert_eq!(config.regions.len(), 1);
        assert_eq!(config.regions[0].name, None);
    }

    #[test]
    fn rejects_bad_percentile() {
        assert!(matches!(
            DashboardConfig::from_toml_str("percentile_cap = 1.5"),
            Err(ConfigError::InvalidPercentile { .. })
        ));
        assert!(matches!(
            DashboardConfig::from_toml_str("percentile_cap = 0.0"),
            Err(ConfigError::InvalidPercentile { .. })
        ));
    }

    #[test]
    fn rejects_bad_regions() {
        let blank = r#"
            [[regions]]
            code = " "
            zoom_target = "ZOOM_X"
        "#;
        assert!(matches!(
            DashboardConfig::from_toml_str(blank),
            Err(ConfigError::EmptyRegionCode { index: 0 })
        ));

        let duplicate = r#"
            [[regions]]
            code = "MN24"
            zoom_target = "ZOOM_X"

            [[regions]]
            code = "BK81"
            zoom_target = "ZOOM_X"
        "#;
        assert!(matches!(
            DashboardConfig::from_toml_str(duplicate),
            Err(ConfigError::DuplicateZoomTarget { .. })
        ));
    }

    #[test]
    fn rejects_unknown_ramp() {
        assert!(matches!(
            DashboardConfig::from_toml_str(r#"color_ramp = "rainbow""#),
            Err(ConfigError::Toml(_))
        ));
    }
}
