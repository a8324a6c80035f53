// SPDX-License-Identifier: GPL-3.0-only

//! Error types for calibration loading, projection setup and compositing

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Calibration record could not be loaded or validated
    Calibration(CalibrationError),
    /// Projection could not be built from the calibration
    Projection(ProjectionError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Image decode/encode errors
    Image(String),
    /// Generic error with message
    Other(String),
}

/// Calibration record errors
///
/// Every variant names the record it came from and the field at fault, so a
/// failed startup can be traced back to the offending file.
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Structurally invalid record (bad JSON, wrong dimensionality, non-positive values)
    MalformedCalibration {
        record: String,
        field: &'static str,
        reason: String,
    },
    /// `camera_matrix` absent or not representable as the needed 3x3 subset
    MissingIntrinsics { record: String, reason: String },
    /// `distortion_coefficients` absent or shorter than `[k1, k2, p1, p2]`
    MissingDistortion { record: String, reason: String },
}

/// Projection setup errors
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Clip planes violate `0 < near < far`
    InvalidClipPlanes { near: f64, far: f64 },
    /// Frustum edges are inverted or not finite
    InvalidFrustum(String),
    /// Render target has a zero dimension
    EmptyRenderSize { width: u32, height: u32 },
}

impl CalibrationError {
    /// Name of the record this error refers to
    pub fn record(&self) -> &str {
        match self {
            CalibrationError::MalformedCalibration { record, .. }
            | CalibrationError::MissingIntrinsics { record, .. }
            | CalibrationError::MissingDistortion { record, .. } => record,
        }
    }

    /// Name of the record field this error refers to
    pub fn field(&self) -> &'static str {
        match self {
            CalibrationError::MalformedCalibration { field, .. } => field,
            CalibrationError::MissingIntrinsics { .. } => "camera_matrix",
            CalibrationError::MissingDistortion { .. } => "distortion_coefficients",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Calibration(e) => write!(f, "Calibration error: {}", e),
            AppError::Projection(e) => write!(f, "Projection error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Image(msg) => write!(f, "Image error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalibrationError::MalformedCalibration {
                record,
                field,
                reason,
            } => write!(f, "[{}] malformed `{}`: {}", record, field, reason),
            CalibrationError::MissingIntrinsics { record, reason } => {
                write!(f, "[{}] missing intrinsics in `camera_matrix`: {}", record, reason)
            }
            CalibrationError::MissingDistortion { record, reason } => write!(
                f,
                "[{}] missing distortion in `distortion_coefficients`: {}",
                record, reason
            ),
        }
    }
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::InvalidClipPlanes { near, far } => {
                write!(f, "Invalid clip planes: near={} far={} (need 0 < near < far)", near, far)
            }
            ProjectionError::InvalidFrustum(msg) => write!(f, "Invalid frustum: {}", msg),
            ProjectionError::EmptyRenderSize { width, height } => {
                write!(f, "Render size {}x{} has a zero dimension", width, height)
            }
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CalibrationError {}
impl std::error::Error for ProjectionError {}

// Conversions from sub-errors to AppError
impl From<CalibrationError> for AppError {
    fn from(err: CalibrationError) -> Self {
        AppError::Calibration(err)
    }
}

impl From<ProjectionError> for AppError {
    fn from(err: ProjectionError) -> Self {
        AppError::Projection(err)
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Image(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_error_context() {
        let err = CalibrationError::MissingDistortion {
            record: "calibration.json".to_string(),
            reason: "need at least 4 values, got 2".to_string(),
        };
        assert_eq!(err.record(), "calibration.json");
        assert_eq!(err.field(), "distortion_coefficients");

        let msg = AppError::from(err).to_string();
        assert!(msg.contains("calibration.json"));
        assert!(msg.contains("distortion_coefficients"));
    }

    #[test]
    fn test_projection_error_display() {
        let err = ProjectionError::InvalidClipPlanes {
            near: 1.0,
            far: 0.5,
        };
        assert!(err.to_string().contains("near=1"));
    }
}
