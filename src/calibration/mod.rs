// SPDX-License-Identifier: GPL-3.0-only

//! Camera calibration model
//!
//! A [`CalibrationRecord`] is the lenient, on-disk shape. [`CalibrationData`]
//! is what the rest of the crate consumes: it can only be constructed once the
//! intrinsics and distortion resolve, and it is never mutated afterwards.

mod record;
mod types;

pub use record::CalibrationRecord;
pub use types::{ImageSize, Intrinsics};

use crate::distortion::Distortion;
use crate::errors::CalibrationError;
use crate::projection::Matrix4;
use tracing::debug;

/// Validated, immutable calibration
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationData {
    source: String,
    image_size: Option<ImageSize>,
    intrinsics: Intrinsics,
    distortion: Distortion,
    explicit_projection: Option<Matrix4>,
}

impl CalibrationData {
    /// Parse and validate a JSON calibration record
    ///
    /// `source` names the record in error messages (usually the filename).
    pub fn parse(text: &str, source: &str) -> Result<Self, CalibrationError> {
        let record = CalibrationRecord::from_json(text, source)?;
        Self::from_record(&record)
    }

    /// Validate an already deserialized record
    pub fn from_record(record: &CalibrationRecord) -> Result<Self, CalibrationError> {
        let image_size = record.image_size()?;
        let intrinsics = record.intrinsics()?;
        let distortion = record.distortion()?;
        let explicit_projection = record.explicit_projection();

        debug!(
            source = %record.source,
            image_size = ?image_size,
            fx = intrinsics.fx,
            fy = intrinsics.fy,
            cx = intrinsics.cx,
            cy = intrinsics.cy,
            has_explicit_projection = explicit_projection.is_some(),
            "Calibration record validated"
        );

        Ok(Self {
            source: record.source.clone(),
            image_size,
            intrinsics,
            distortion,
            explicit_projection,
        })
    }

    /// Build calibration data directly, e.g. from a live calibration routine
    pub fn new(
        source: impl Into<String>,
        intrinsics: Intrinsics,
        distortion: Distortion,
        image_size: Option<ImageSize>,
    ) -> Result<Self, CalibrationError> {
        let source = source.into();
        if !intrinsics.is_valid() {
            return Err(CalibrationError::MalformedCalibration {
                record: source,
                field: "camera_matrix",
                reason: "focal lengths must be positive and all terms finite".to_string(),
            });
        }
        if !distortion.is_finite() {
            return Err(CalibrationError::MalformedCalibration {
                record: source,
                field: "distortion_coefficients",
                reason: "coefficients must be finite".to_string(),
            });
        }
        if image_size.is_some_and(|s| s.is_empty()) {
            return Err(CalibrationError::MalformedCalibration {
                record: source,
                field: "image_size",
                reason: "dimensions must be positive".to_string(),
            });
        }

        Ok(Self {
            source,
            image_size,
            intrinsics,
            distortion,
            explicit_projection: None,
        })
    }

    /// Attach an explicit projection matrix
    pub fn with_explicit_projection(mut self, projection: Matrix4) -> Self {
        self.explicit_projection = Some(projection);
        self
    }

    /// Name of the record this calibration was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Declared image size, or `fallback` (e.g. the current viewport) when absent
    pub fn image_size(&self, fallback: ImageSize) -> ImageSize {
        self.image_size.unwrap_or(fallback)
    }

    pub fn declared_image_size(&self) -> Option<ImageSize> {
        self.image_size
    }

    /// `(fx, fy, cx, cy)`
    pub fn intrinsics(&self) -> Intrinsics {
        self.intrinsics
    }

    pub fn distortion(&self) -> Distortion {
        self.distortion
    }

    /// `(k1, k2, k3)`
    pub fn radial_coefficients(&self) -> [f64; 3] {
        self.distortion.radial()
    }

    /// `(p1, p2)`
    pub fn tangential_coefficients(&self) -> [f64; 2] {
        self.distortion.tangential()
    }

    /// Provided 4x4 projection, if the record carried a well-formed one
    pub fn explicit_projection(&self) -> Option<&Matrix4> {
        self.explicit_projection.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RECORD: &str = r#"{
        "image_size": [1280, 720],
        "camera_matrix": [[800.0, 0.0, 640.0], [0.0, 800.0, 360.0], [0.0, 0.0, 1.0]],
        "distortion_coefficients": [-0.2, 0.05, 0.001, -0.002, 0.01]
    }"#;

    #[test]
    fn test_parse_full_record() {
        let calib = CalibrationData::parse(FULL_RECORD, "calibration.json").unwrap();
        assert_eq!(calib.source(), "calibration.json");
        assert_eq!(calib.declared_image_size(), Some(ImageSize::new(1280, 720)));
        assert_eq!(calib.intrinsics(), Intrinsics::new(800.0, 800.0, 640.0, 360.0));
        assert_eq!(calib.radial_coefficients(), [-0.2, 0.05, 0.01]);
        assert_eq!(calib.tangential_coefficients(), [0.001, -0.002]);
        assert!(calib.explicit_projection().is_none());
    }

    #[test]
    fn test_image_size_fallback() {
        let json = r#"{
            "camera_matrix": [[800, 0, 640], [0, 800, 360], [0, 0, 1]],
            "distortion_coefficients": [0, 0, 0, 0]
        }"#;
        let calib = CalibrationData::parse(json, "no_size.json").unwrap();
        let viewport = ImageSize::new(1920, 1080);
        assert_eq!(calib.image_size(viewport), viewport);
    }

    #[test]
    fn test_new_rejects_bad_focal() {
        let err = CalibrationData::new(
            "manual",
            Intrinsics::new(-1.0, 800.0, 640.0, 360.0),
            Distortion::NONE,
            None,
        )
        .unwrap_err();
        assert_eq!(err.field(), "camera_matrix");
    }
}
