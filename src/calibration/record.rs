// SPDX-License-Identifier: GPL-3.0-only

//! Raw calibration record as stored on disk
//!
//! ```json
//! {
//!   "image_size": [1280, 720],
//!   "camera_matrix": [[800, 0, 640], [0, 800, 360], [0, 0, 1]],
//!   "distortion_coefficients": [-0.2, 0.05, 0.0, 0.0, 0.0],
//!   "unity_projection_matrix": [[...4...], [...], [...], [...]]
//! }
//! ```
//!
//! Every field is optional at the serde level so that each accessor can
//! report exactly which field is wrong. [`super::CalibrationData::parse`]
//! runs all accessors up front, so nothing malformed gets past loading.

use super::types::{ImageSize, Intrinsics};
use crate::distortion::Distortion;
use crate::errors::CalibrationError;
use crate::projection::Matrix4;
use serde::{Deserialize, Serialize};

/// Calibration record, field names matching the JSON schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationRecord {
    /// `[width, height]`
    pub image_size: Option<Vec<i64>>,
    /// 3x3 row-major; `[0][0]=fx`, `[1][1]=fy`, `[0][2]=cx`, `[1][2]=cy`
    pub camera_matrix: Option<Vec<Vec<f64>>>,
    /// `[k1, k2, p1, p2]` or `[k1, k2, p1, p2, k3]`
    pub distortion_coefficients: Option<Vec<f64>>,
    /// Optional 4x4 row-major projection; kept untyped because a bad one means "absent"
    pub unity_projection_matrix: Option<serde_json::Value>,
    /// Where the record came from, for error context
    #[serde(skip)]
    pub source: String,
}

impl CalibrationRecord {
    /// Deserialize a record from JSON text
    pub fn from_json(text: &str, source: &str) -> Result<Self, CalibrationError> {
        let mut record: CalibrationRecord =
            serde_json::from_str(text).map_err(|e| CalibrationError::MalformedCalibration {
                record: source.to_string(),
                field: "record",
                reason: e.to_string(),
            })?;
        record.source = source.to_string();
        Ok(record)
    }

    fn malformed(&self, field: &'static str, reason: impl Into<String>) -> CalibrationError {
        CalibrationError::MalformedCalibration {
            record: self.source.clone(),
            field,
            reason: reason.into(),
        }
    }

    /// Declared image size, `None` when the field is absent
    ///
    /// A present but short or non-positive array is an error; only absence
    /// is allowed to fall back to a caller-supplied size.
    pub fn image_size(&self) -> Result<Option<ImageSize>, CalibrationError> {
        let Some(size) = self.image_size.as_deref() else {
            return Ok(None);
        };

        let [width, height, ..] = size else {
            return Err(self.malformed(
                "image_size",
                format!("expected [width, height], got {} value(s)", size.len()),
            ));
        };

        let to_dim = |v: i64| u32::try_from(v).ok().filter(|d| *d > 0);
        match (to_dim(*width), to_dim(*height)) {
            (Some(w), Some(h)) => Ok(Some(ImageSize::new(w, h))),
            _ => Err(self.malformed(
                "image_size",
                format!("dimensions must be positive, got {}x{}", width, height),
            )),
        }
    }

    /// `(fx, fy, cx, cy)` from the camera matrix
    pub fn intrinsics(&self) -> Result<Intrinsics, CalibrationError> {
        let missing = |reason: String| CalibrationError::MissingIntrinsics {
            record: self.source.clone(),
            reason,
        };

        let rows = self
            .camera_matrix
            .as_deref()
            .ok_or_else(|| missing("field is absent".to_string()))?;

        if rows.len() < 3 {
            return Err(missing(format!("expected 3x3, got {} row(s)", rows.len())));
        }
        if let Some((i, row)) = rows.iter().take(3).enumerate().find(|(_, r)| r.len() < 3) {
            return Err(missing(format!(
                "expected 3x3, row {} has {} column(s)",
                i,
                row.len()
            )));
        }

        let intrinsics = Intrinsics::new(rows[0][0], rows[1][1], rows[0][2], rows[1][2]);
        if !intrinsics.is_valid() {
            return Err(self.malformed(
                "camera_matrix",
                format!(
                    "focal lengths must be positive and all terms finite (fx={}, fy={}, cx={}, cy={})",
                    intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy
                ),
            ));
        }

        Ok(intrinsics)
    }

    /// Full coefficient set; `k3` defaults to zero when only four values are given
    pub fn distortion(&self) -> Result<Distortion, CalibrationError> {
        let missing = |reason: String| CalibrationError::MissingDistortion {
            record: self.source.clone(),
            reason,
        };

        let coefficients = self
            .distortion_coefficients
            .as_deref()
            .ok_or_else(|| missing("field is absent".to_string()))?;

        let distortion = Distortion::from_coefficients(coefficients).ok_or_else(|| {
            missing(format!(
                "need at least [k1, k2, p1, p2], got {} value(s)",
                coefficients.len()
            ))
        })?;

        if !distortion.is_finite() {
            return Err(self.malformed(
                "distortion_coefficients",
                "coefficients must be finite",
            ));
        }

        Ok(distortion)
    }

    /// `(k1, k2, k3)`
    pub fn radial_coefficients(&self) -> Result<[f64; 3], CalibrationError> {
        self.distortion().map(|d| d.radial())
    }

    /// `(p1, p2)`
    pub fn tangential_coefficients(&self) -> Result<[f64; 2], CalibrationError> {
        self.distortion().map(|d| d.tangential())
    }

    /// The literal 4x4 projection if present and well-formed
    ///
    /// Anything other than exactly four rows of four finite numbers is
    /// reported as absence, never as an error.
    pub fn explicit_projection(&self) -> Option<Matrix4> {
        let rows = self.unity_projection_matrix.as_ref()?.as_array()?;
        if rows.len() != 4 {
            return None;
        }

        let mut m = [[0.0f64; 4]; 4];
        for (r, row) in rows.iter().enumerate() {
            let cols = row.as_array()?;
            if cols.len() != 4 {
                return None;
            }
            for (c, value) in cols.iter().enumerate() {
                let v = value.as_f64().filter(|v| v.is_finite())?;
                m[r][c] = v;
            }
        }

        Some(Matrix4::from_rows(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> CalibrationRecord {
        CalibrationRecord::from_json(json, "test.json").unwrap()
    }

    #[test]
    fn test_image_size_absent_is_none() {
        assert_eq!(record("{}").image_size().unwrap(), None);
        assert_eq!(record(r#"{"image_size": null}"#).image_size().unwrap(), None);
    }

    #[test]
    fn test_image_size_short_is_malformed() {
        let err = record(r#"{"image_size": [640]}"#).image_size().unwrap_err();
        assert_eq!(err.field(), "image_size");
        assert!(matches!(err, CalibrationError::MalformedCalibration { .. }));
    }

    #[test]
    fn test_image_size_non_positive_is_malformed() {
        assert!(record(r#"{"image_size": [640, 0]}"#).image_size().is_err());
        assert!(record(r#"{"image_size": [-640, 480]}"#).image_size().is_err());
    }

    #[test]
    fn test_intrinsics_rows_short() {
        let r = record(r#"{"camera_matrix": [[800, 0, 640], [0, 800]]}"#);
        assert!(matches!(
            r.intrinsics(),
            Err(CalibrationError::MissingIntrinsics { .. })
        ));
    }

    #[test]
    fn test_intrinsics_zero_focal_is_malformed() {
        let r = record(r#"{"camera_matrix": [[0, 0, 640], [0, 800, 360], [0, 0, 1]]}"#);
        let err = r.intrinsics().unwrap_err();
        assert_eq!(err.field(), "camera_matrix");
        assert!(matches!(err, CalibrationError::MalformedCalibration { .. }));
    }

    #[test]
    fn test_explicit_projection_ragged_is_absent() {
        let r = record(
            r#"{"unity_projection_matrix": [[1,0,0,0],[0,1,0],[0,0,1,0],[0,0,0,1]]}"#,
        );
        assert!(r.explicit_projection().is_none());
    }

    #[test]
    fn test_explicit_projection_non_numeric_is_absent() {
        let r = record(
            r#"{"unity_projection_matrix": [[1,0,0,0],[0,1,0,0],[0,0,"x",0],[0,0,0,1]]}"#,
        );
        assert!(r.explicit_projection().is_none());
    }

    #[test]
    fn test_explicit_projection_row_major() {
        let r = record(
            r#"{"unity_projection_matrix": [[1,2,3,4],[5,6,7,8],[9,10,11,12],[13,14,15,16]]}"#,
        );
        let m = r.explicit_projection().unwrap();
        assert_eq!(m.get(0, 3), 4.0);
        assert_eq!(m.get(3, 0), 13.0);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = CalibrationRecord::from_json("{ not json", "broken.json").unwrap_err();
        assert_eq!(err.record(), "broken.json");
        assert!(matches!(err, CalibrationError::MalformedCalibration { .. }));
    }
}
