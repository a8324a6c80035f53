// SPDX-License-Identifier: GPL-3.0-only

//! Projection setup for the synthetic-content renderer
//!
//! Three ways to get a projection matrix out of a calibration:
//!
//! - **Direct**: the pinhole frustum implied by the intrinsics alone.
//! - **Exact cover**: an expanded frustum whose render, once forward-distorted,
//!   fills the whole output frame. Also yields the virtual intrinsics the
//!   compositor needs to address the expanded render.
//! - **Provided**: the calibration's own 4x4 matrix, used verbatim; falls back
//!   to direct when the record has none.

mod bounds;
mod frustum;
mod matrix;

pub use bounds::{CoverBounds, NormalizedBounds, cover_bounds, edge_samples, virtual_intrinsics};
pub use frustum::{Frustum, validate_clip_planes};
pub use matrix::Matrix4;

use crate::calibration::{CalibrationData, ImageSize, Intrinsics};
use crate::constants::{self, sampling};
use crate::distortion::Distortion;
use crate::errors::ProjectionError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Requested projection mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    /// Pinhole frustum from intrinsics, no distortion awareness
    Direct,
    /// Distortion-aware frustum covering the whole distorted frame
    ExactCover { samples_per_edge: usize },
    /// The calibration's explicit matrix, or direct when it has none
    Provided,
}

impl Default for ProjectionMode {
    fn default() -> Self {
        ProjectionMode::ExactCover {
            samples_per_edge: sampling::DEFAULT_SAMPLES_PER_EDGE,
        }
    }
}

/// Mode that actually produced a [`ProjectionSetup`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedMode {
    Direct,
    ExactCover,
    Provided,
}

/// Inputs that, together with a calibration, fully determine a projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSettings {
    pub mode: ProjectionMode,
    /// Size of the rendered layer and of the composite output
    pub render_size: ImageSize,
    pub near: f64,
    pub far: f64,
}

impl ProjectionSettings {
    pub fn new(mode: ProjectionMode, render_size: ImageSize) -> Self {
        Self {
            mode,
            render_size,
            near: constants::DEFAULT_NEAR_CLIP,
            far: constants::DEFAULT_FAR_CLIP,
        }
    }

    pub fn with_clip_planes(mut self, near: f64, far: f64) -> Self {
        self.near = near;
        self.far = far;
        self
    }
}

/// Everything the renderer and compositor need for one configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectionSetup {
    pub mode: ResolvedMode,
    pub render_size: ImageSize,
    /// `None` when the provided matrix was used verbatim
    pub frustum: Option<Frustum>,
    pub projection: Matrix4,
    /// Real-lens intrinsics
    pub intrinsics: Intrinsics,
    /// Intrinsics addressing the rendered layer; equal to `intrinsics` outside exact cover
    pub virtual_intrinsics: Intrinsics,
    /// Undistorted normalized extent of the render (exact cover only)
    pub cover_bounds: Option<NormalizedBounds>,
}

/// Builds projection setups from one calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionBuilder {
    intrinsics: Intrinsics,
    distortion: Distortion,
    explicit_projection: Option<Matrix4>,
}

impl ProjectionBuilder {
    pub fn new(intrinsics: Intrinsics, distortion: Distortion) -> Self {
        Self {
            intrinsics,
            distortion,
            explicit_projection: None,
        }
    }

    pub fn from_calibration(calibration: &CalibrationData) -> Self {
        Self {
            intrinsics: calibration.intrinsics(),
            distortion: calibration.distortion(),
            explicit_projection: calibration.explicit_projection().copied(),
        }
    }

    pub fn with_explicit_projection(mut self, projection: Option<Matrix4>) -> Self {
        self.explicit_projection = projection;
        self
    }

    /// Build the setup requested by `settings`
    pub fn build(&self, settings: &ProjectionSettings) -> Result<ProjectionSetup, ProjectionError> {
        let size = settings.render_size;
        if size.is_empty() {
            return Err(ProjectionError::EmptyRenderSize {
                width: size.width,
                height: size.height,
            });
        }
        validate_clip_planes(settings.near, settings.far)?;

        match settings.mode {
            ProjectionMode::Direct => self.build_direct(size, settings.near, settings.far),
            ProjectionMode::ExactCover { samples_per_edge } => {
                self.build_exact_cover(size, settings.near, settings.far, samples_per_edge)
            }
            ProjectionMode::Provided => match self.explicit_projection {
                Some(projection) => Ok(self.build_provided(size, projection)),
                None => {
                    debug!("No explicit projection in calibration, using direct frustum");
                    self.build_direct(size, settings.near, settings.far)
                }
            },
        }
    }

    /// Pinhole frustum straight from the intrinsics
    pub fn build_direct(
        &self,
        size: ImageSize,
        near: f64,
        far: f64,
    ) -> Result<ProjectionSetup, ProjectionError> {
        let frustum = Frustum::direct(&self.intrinsics, size, near, far);
        frustum.validate()?;

        Ok(ProjectionSetup {
            mode: ResolvedMode::Direct,
            render_size: size,
            frustum: Some(frustum),
            projection: frustum.to_matrix(),
            intrinsics: self.intrinsics,
            virtual_intrinsics: self.intrinsics,
            cover_bounds: None,
        })
    }

    /// Expanded frustum whose distorted render fills the whole frame
    pub fn build_exact_cover(
        &self,
        size: ImageSize,
        near: f64,
        far: f64,
        samples_per_edge: usize,
    ) -> Result<ProjectionSetup, ProjectionError> {
        let cover = cover_bounds(&self.intrinsics, &self.distortion, size, samples_per_edge);

        if cover.non_converged > 0 {
            warn!(
                non_converged = cover.non_converged,
                samples = cover.samples,
                worst_residual = cover.worst_residual,
                "Inverse distortion did not converge for some boundary samples; cover may be approximate"
            );
        }

        let virtual_intrinsics = virtual_intrinsics(&cover.bounds, size, self.intrinsics);

        let frustum = if cover.bounds.is_degenerate() {
            // Nothing meaningful to expand; render the plain pinhole view
            Frustum::direct(&self.intrinsics, size, near, far)
        } else {
            Frustum::from_normalized_bounds(&cover.bounds, near, far)
        };
        frustum.validate()?;

        Ok(ProjectionSetup {
            mode: ResolvedMode::ExactCover,
            render_size: size,
            frustum: Some(frustum),
            projection: frustum.to_matrix(),
            intrinsics: self.intrinsics,
            virtual_intrinsics,
            cover_bounds: Some(cover.bounds),
        })
    }

    fn build_provided(&self, size: ImageSize, projection: Matrix4) -> ProjectionSetup {
        ProjectionSetup {
            mode: ResolvedMode::Provided,
            render_size: size,
            frustum: None,
            projection,
            intrinsics: self.intrinsics,
            virtual_intrinsics: self.intrinsics,
            cover_bounds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ProjectionBuilder {
        ProjectionBuilder::new(
            Intrinsics::new(800.0, 800.0, 640.0, 360.0),
            Distortion::new(-0.2, 0.05, 0.0, 0.0, 0.0),
        )
    }

    #[test]
    fn test_provided_falls_back_to_direct() {
        let settings = ProjectionSettings::new(ProjectionMode::Provided, ImageSize::new(1280, 720));
        let setup = builder().build(&settings).unwrap();
        assert_eq!(setup.mode, ResolvedMode::Direct);
    }

    #[test]
    fn test_provided_used_verbatim() {
        let explicit = Matrix4::frustum(-1.0, 1.0, -1.0, 1.0, 0.5, 50.0);
        let settings = ProjectionSettings::new(ProjectionMode::Provided, ImageSize::new(1280, 720));
        let setup = builder()
            .with_explicit_projection(Some(explicit))
            .build(&settings)
            .unwrap();

        assert_eq!(setup.mode, ResolvedMode::Provided);
        assert_eq!(setup.projection, explicit);
        assert!(setup.frustum.is_none());
        assert_eq!(setup.virtual_intrinsics, setup.intrinsics);
    }

    #[test]
    fn test_build_rejects_bad_clip_planes() {
        let settings = ProjectionSettings::new(ProjectionMode::Direct, ImageSize::new(1280, 720))
            .with_clip_planes(1.0, 0.5);
        assert!(matches!(
            builder().build(&settings),
            Err(ProjectionError::InvalidClipPlanes { .. })
        ));
    }

    #[test]
    fn test_build_rejects_empty_size() {
        let settings = ProjectionSettings::new(ProjectionMode::Direct, ImageSize::new(0, 720));
        assert!(matches!(
            builder().build(&settings),
            Err(ProjectionError::EmptyRenderSize { .. })
        ));
    }

    #[test]
    fn test_exact_cover_expands_frustum() {
        let size = ImageSize::new(1280, 720);
        let direct = builder().build_direct(size, 0.01, 100.0).unwrap();
        let cover = builder().build_exact_cover(size, 0.01, 100.0, 64).unwrap();

        let d = direct.frustum.unwrap();
        let c = cover.frustum.unwrap();
        assert!(c.left < d.left);
        assert!(c.right > d.right);
        assert!(c.top > d.top);
        assert!(c.bottom < d.bottom);
    }
}
