use std::path::{Path, PathBuf};

use layers::raster::TileSource;
use layers::symbology::LineStyle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::ControlPosition;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for a [`crate::MapSurface`]. Every field has a default, so `{}`
/// is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub base_tiles: TileSource,
    /// Seamark layer behind `toggleOverlay`.
    pub overlay_tiles: TileSource,
    pub zoom_control: ControlPosition,
    pub fit: FitConfig,
    pub route_style: LineStyle,
    pub timing: TimingConfig,
    pub visibility: VisibilityConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_tiles: TileSource::openstreetmap(),
            overlay_tiles: TileSource::openseamap(),
            zoom_control: ControlPosition::BottomLeft,
            fit: FitConfig::default(),
            route_style: LineStyle::default(),
            timing: TimingConfig::default(),
            visibility: VisibilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitConfig {
    /// Pixels kept free around fitted bounds (x, y).
    pub padding_px: [f64; 2],
    /// Fitting never zooms in past this.
    pub max_zoom: f64,
    /// Zoom used when there is a single point to show.
    pub single_point_zoom: f64,
    /// Fitted zoom is floored to a multiple of this; 0 keeps fractional zoom.
    pub zoom_snap: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            padding_px: [50.0, 50.0],
            max_zoom: 14.0,
            single_point_zoom: 10.0,
            zoom_snap: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Delay before recalculating size after the map is shown again.
    pub restore_invalidate_delay_ms: u32,
    /// Delay for host-requested `invalidateSize`.
    pub invalidate_delay_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            restore_invalidate_delay_ms: 200,
            invalidate_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Element hidden by `setHidden` when no map was ever mounted.
    pub mount_id: String,
    /// Tag-name prefix of host platform-view wrappers; the upward walk stops
    /// below the first ancestor carrying it. Compared case-insensitively.
    pub boundary_tag_prefix: String,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            mount_id: "leaflet-map-container".to_string(),
            boundary_tag_prefix: "FLT".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fit = &self.fit;
        if fit.padding_px.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(ConfigError::Invalid(
                "fit.padding_px must be finite and non-negative".to_string(),
            ));
        }
        if !fit.max_zoom.is_finite() || fit.max_zoom < 0.0 {
            return Err(ConfigError::Invalid(
                "fit.max_zoom must be a non-negative number".to_string(),
            ));
        }
        if !fit.single_point_zoom.is_finite() || !fit.zoom_snap.is_finite() || fit.zoom_snap < 0.0
        {
            return Err(ConfigError::Invalid(
                "fit.single_point_zoom and fit.zoom_snap must be finite".to_string(),
            ));
        }
        if self.visibility.boundary_tag_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "visibility.boundary_tag_prefix must not be empty".to_string(),
            ));
        }
        let tile_sources = [
            ("base_tiles", &self.base_tiles),
            ("overlay_tiles", &self.overlay_tiles),
        ];
        for (name, tiles) in tile_sources {
            if tiles.url_template.is_empty() {
                return Err(ConfigError::Invalid(format!("{name}.url_template is empty")));
            }
            if !(0.0..=1.0).contains(&tiles.opacity) {
                return Err(ConfigError::Invalid(format!(
                    "{name}.opacity must be within 0..=1"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_default() {
        let config = BridgeConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.fit.max_zoom, 14.0);
        assert_eq!(config.timing.restore_invalidate_delay_ms, 200);
        assert_eq!(config.zoom_control, ControlPosition::BottomLeft);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config =
            BridgeConfig::from_json_str(r#"{"fit":{"max_zoom":12},"zoom_control":"top-right"}"#)
                .unwrap();
        assert_eq!(config.fit.max_zoom, 12.0);
        assert_eq!(config.fit.single_point_zoom, 10.0);
        assert_eq!(config.zoom_control, ControlPosition::TopRight);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{"fit":{"padding_px":[-1,0]}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json_str(r#"{"visibility":{"boundary_tag_prefix":""}}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            BridgeConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BridgeConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
