// SPDX-License-Identifier: GPL-3.0-only

//! Off-axis viewing frustum derived from intrinsics

use super::Matrix4;
use super::bounds::NormalizedBounds;
use crate::calibration::{ImageSize, Intrinsics};
use crate::errors::ProjectionError;
use serde::{Deserialize, Serialize};

/// Off-axis perspective volume, edges measured on the near plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub near: f64,
    pub far: f64,
}

impl Frustum {
    /// Pinhole frustum implied by the intrinsics alone
    ///
    /// Pixel y grows downward while view-space y grows upward, hence the
    /// sign flip on `top`/`bottom`.
    pub fn direct(intrinsics: &Intrinsics, size: ImageSize, near: f64, far: f64) -> Self {
        let Intrinsics { fx, fy, cx, cy } = *intrinsics;
        let w = size.width.max(1) as f64;
        let h = size.height.max(1) as f64;

        Self {
            left: -near * cx / fx,
            right: near * (w - cx) / fx,
            top: near * cy / fy,
            bottom: -near * (h - cy) / fy,
            near,
            far,
        }
    }

    /// Frustum spanning a normalized undistorted extent on the near plane
    pub fn from_normalized_bounds(bounds: &NormalizedBounds, near: f64, far: f64) -> Self {
        Self {
            left: near * bounds.min_x,
            right: near * bounds.max_x,
            top: -near * bounds.min_y,
            bottom: -near * bounds.max_y,
            near,
            far,
        }
    }

    /// Check `near > 0`, `far > near`, `left < right`, `bottom < top`, all finite
    pub fn validate(&self) -> Result<(), ProjectionError> {
        validate_clip_planes(self.near, self.far)?;

        let finite = [self.left, self.right, self.bottom, self.top]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ProjectionError::InvalidFrustum(format!(
                "non-finite edges: {:?}",
                self
            )));
        }
        if self.left >= self.right || self.bottom >= self.top {
            return Err(ProjectionError::InvalidFrustum(format!(
                "inverted or empty edges: l={} r={} b={} t={}",
                self.left, self.right, self.bottom, self.top
            )));
        }
        Ok(())
    }

    /// Projection matrix for this volume
    pub fn to_matrix(&self) -> Matrix4 {
        Matrix4::frustum(
            self.left,
            self.right,
            self.bottom,
            self.top,
            self.near,
            self.far,
        )
    }
}

/// Reject clip planes outside `0 < near < far`
pub fn validate_clip_planes(near: f64, far: f64) -> Result<(), ProjectionError> {
    if near.is_finite() && far.is_finite() && near > 0.0 && far > near {
        Ok(())
    } else {
        Err(ProjectionError::InvalidClipPlanes { near, far })
    }
}
