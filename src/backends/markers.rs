// SPDX-License-Identifier: GPL-3.0-only

//! Fiducial marker detection boundary
//!
//! Detection itself is provided by an external detector; this module defines
//! the interface the compositor talks to and the family registry used to build
//! detectors. Families are registered explicitly with a constructor, there is
//! no runtime discovery.

use crate::errors::{AppError, AppResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Marker family understood by a detector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerFamily {
    #[default]
    TagStandard41h12,
    Tag36h11,
}

impl MarkerFamily {
    pub const ALL: [MarkerFamily; 2] = [MarkerFamily::TagStandard41h12, MarkerFamily::Tag36h11];

    /// Family name as used by native detector libraries
    pub fn native_name(&self) -> &'static str {
        match self {
            MarkerFamily::TagStandard41h12 => "tagStandard41h12",
            MarkerFamily::Tag36h11 => "tag36h11",
        }
    }
}

impl fmt::Display for MarkerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.native_name())
    }
}

impl FromStr for MarkerFamily {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MarkerFamily::ALL
            .into_iter()
            .find(|family| family.native_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| AppError::Other(format!("unknown marker family: {}", s)))
    }
}

/// One detected marker pose in camera space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerDetection {
    pub id: i32,
    /// Translation in meters
    pub position: [f32; 3],
    /// Orientation quaternion `(x, y, z, w)`
    pub rotation: [f32; 4],
}

/// Detector construction parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    pub width: u32,
    pub height: u32,
    /// Input downscale factor applied before quad detection
    pub decimation: u32,
    pub family: MarkerFamily,
}

/// Pose-estimating marker detector
pub trait MarkerDetector: Send {
    fn family(&self) -> MarkerFamily;

    /// Detect markers in one frame
    ///
    /// `fov_radians` is the vertical field of view of the camera that produced
    /// `frame` (see [`crate::calibration::Intrinsics::vertical_fov`]);
    /// `tag_size_m` is the printed tag edge length.
    fn detect(&mut self, frame: &RgbaImage, fov_radians: f64, tag_size_m: f64)
    -> Vec<MarkerDetection>;
}

type DetectorFactory =
    Box<dyn Fn(&DetectorConfig) -> AppResult<Box<dyn MarkerDetector>> + Send + Sync>;

/// Families a build can create detectors for
#[derive(Default)]
pub struct MarkerFamilyRegistry {
    factories: HashMap<MarkerFamily, DetectorFactory>,
}

impl fmt::Debug for MarkerFamilyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerFamilyRegistry")
            .field("families", &self.families())
            .finish()
    }
}

impl MarkerFamilyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor for `family`, replacing any previous one
    pub fn register<F>(&mut self, family: MarkerFamily, factory: F)
    where
        F: Fn(&DetectorConfig) -> AppResult<Box<dyn MarkerDetector>> + Send + Sync + 'static,
    {
        debug!(%family, "Registered marker family");
        self.factories.insert(family, Box::new(factory));
    }

    pub fn supports(&self, family: MarkerFamily) -> bool {
        self.factories.contains_key(&family)
    }

    /// Registered families in declaration order
    pub fn families(&self) -> Vec<MarkerFamily> {
        MarkerFamily::ALL
            .into_iter()
            .filter(|family| self.supports(*family))
            .collect()
    }

    /// Build a detector for `config.family`
    pub fn create(&self, config: &DetectorConfig) -> AppResult<Box<dyn MarkerDetector>> {
        if config.width == 0 || config.height == 0 || config.decimation == 0 {
            return Err(AppError::Other(format!(
                "invalid detector size {}x{} (decimation {})",
                config.width, config.height, config.decimation
            )));
        }

        let factory = self.factories.get(&config.family).ok_or_else(|| {
            AppError::Other(format!(
                "marker family {} is not available in this build; use {}",
                config.family,
                MarkerFamily::default()
            ))
        })?;
        factory(config)
    }
}
