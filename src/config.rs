// SPDX-License-Identifier: GPL-3.0-only

use crate::calibration::{CalibrationData, ImageSize};
use crate::constants::{self, sampling};
use crate::errors::{AppError, AppResult};
use crate::projection::{ProjectionMode, ProjectionSettings};
use crate::storage::DirectoryStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persisted compositor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Calibration record filename inside `calibration_dir`
    pub calibration_file: String,
    /// Directory holding calibration records (None = data dir)
    pub calibration_dir: Option<PathBuf>,
    /// Virtual render target size override `[width, height]`
    pub render_size: Option<[u32; 2]>,
    /// Use the distortion-aware exact-cover frustum
    pub exact_cover: bool,
    /// Use the calibration's explicit matrix when exact cover is off
    pub use_provided_projection: bool,
    /// Boundary samples per edge for exact cover
    pub samples_per_edge: usize,
    pub near_clip: f64,
    pub far_clip: f64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            calibration_file: constants::DEFAULT_CALIBRATION_FILE.to_string(),
            calibration_dir: None,
            render_size: None,
            exact_cover: true,
            use_provided_projection: true,
            samples_per_edge: sampling::DEFAULT_SAMPLES_PER_EDGE,
            near_clip: constants::DEFAULT_NEAR_CLIP,
            far_clip: constants::DEFAULT_FAR_CLIP,
        }
    }
}

impl CompositorConfig {
    /// Default config location: `<config_dir>/lens-composite/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| {
            dir.join(constants::APP_DIR_NAME)
                .join(constants::CONFIG_FILE_NAME)
        })
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> AppResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("No config directory available, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load from `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(AppError::Config(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded compositor config");
        Ok(config)
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Calibration directory, resolving the data-dir default
    pub fn calibration_dir(&self) -> Option<PathBuf> {
        self.calibration_dir
            .clone()
            .or_else(DirectoryStore::default_root)
    }

    /// Samples per edge clamped to the supported range
    pub fn samples_per_edge(&self) -> usize {
        sampling::clamp_samples_per_edge(self.samples_per_edge)
    }

    /// Mode selection: exact cover if enabled, else provided if enabled, else direct
    ///
    /// `Provided` itself falls back to direct when the calibration has no matrix.
    pub fn projection_mode(&self) -> ProjectionMode {
        if self.exact_cover {
            ProjectionMode::ExactCover {
                samples_per_edge: self.samples_per_edge(),
            }
        } else if self.use_provided_projection {
            ProjectionMode::Provided
        } else {
            ProjectionMode::Direct
        }
    }

    /// Render size: override, then the record's size, then `viewport`
    pub fn render_size(&self, calibration: &CalibrationData, viewport: ImageSize) -> ImageSize {
        match self.render_size {
            Some([width, height]) if width > 0 && height > 0 => ImageSize::new(width, height),
            _ => calibration.image_size(viewport),
        }
    }

    pub fn projection_settings(
        &self,
        calibration: &CalibrationData,
        viewport: ImageSize,
    ) -> ProjectionSettings {
        ProjectionSettings::new(self.projection_mode(), self.render_size(calibration, viewport))
            .with_clip_planes(self.near_clip, self.far_clip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::Intrinsics;
    use crate::distortion::Distortion;

    fn calibration(size: Option<ImageSize>) -> CalibrationData {
        CalibrationData::new(
            "config_test",
            Intrinsics::new(800.0, 800.0, 640.0, 360.0),
            Distortion::NONE,
            size,
        )
        .unwrap()
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: CompositorConfig =
            serde_json::from_str(r#"{ "exact_cover": false, "near_clip": 0.1 }"#).unwrap();
        assert!(!config.exact_cover);
        assert_eq!(config.near_clip, 0.1);
        assert_eq!(config.far_clip, constants::DEFAULT_FAR_CLIP);
        assert_eq!(config.calibration_file, "calibration.json");
    }

    #[test]
    fn test_mode_selection() {
        let mut config = CompositorConfig::default();
        assert_eq!(
            config.projection_mode(),
            ProjectionMode::ExactCover {
                samples_per_edge: 64
            }
        );

        config.exact_cover = false;
        assert_eq!(config.projection_mode(), ProjectionMode::Provided);

        config.use_provided_projection = false;
        assert_eq!(config.projection_mode(), ProjectionMode::Direct);
    }

    #[test]
    fn test_samples_clamped() {
        let config = CompositorConfig {
            samples_per_edge: 4,
            ..Default::default()
        };
        assert_eq!(config.samples_per_edge(), sampling::MIN_SAMPLES_PER_EDGE);

        let config = CompositorConfig {
            samples_per_edge: 100_000,
            ..Default::default()
        };
        assert_eq!(config.samples_per_edge(), sampling::MAX_SAMPLES_PER_EDGE);
    }

    #[test]
    fn test_render_size_precedence() {
        let viewport = ImageSize::new(1920, 1080);
        let mut config = CompositorConfig::default();

        assert_eq!(config.render_size(&calibration(None), viewport), viewport);
        assert_eq!(
            config.render_size(&calibration(Some(ImageSize::new(1280, 720))), viewport),
            ImageSize::new(1280, 720)
        );

        config.render_size = Some([2048, 1152]);
        assert_eq!(
            config.render_size(&calibration(Some(ImageSize::new(1280, 720))), viewport),
            ImageSize::new(2048, 1152)
        );
    }

    #[test]
    fn test_calibration_dir_defaults_to_store_root() {
        let mut config = CompositorConfig::default();
        assert_eq!(config.calibration_dir(), DirectoryStore::default_root());

        config.calibration_dir = Some(PathBuf::from("/srv/calibrations"));
        assert_eq!(
            config.calibration_dir(),
            Some(PathBuf::from("/srv/calibrations"))
        );
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("lens-composite-no-such-config.json");
        let config = CompositorConfig::load_from(&path).unwrap();
        assert_eq!(config, CompositorConfig::default());
    }

    #[test]
    fn test_saved_config_loads_back() {
        let path = std::env::temp_dir()
            .join(format!("lens-composite-config-{}", std::process::id()))
            .join("config.json");
        let config = CompositorConfig {
            exact_cover: false,
            render_size: Some([1920, 1080]),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let loaded = CompositorConfig::load_from(&path);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        assert_eq!(loaded.unwrap(), config);
    }

    #[test]
    fn test_malformed_file_is_config_error() {
        let path = std::env::temp_dir().join(format!(
            "lens-composite-bad-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let result = CompositorConfig::load_from(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
