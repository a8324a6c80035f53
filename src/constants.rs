// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Default near clip plane of the virtual camera (meters)
pub const DEFAULT_NEAR_CLIP: f64 = 0.01;

/// Default far clip plane of the virtual camera (meters)
pub const DEFAULT_FAR_CLIP: f64 = 100.0;

/// Boundary sampling density for exact-cover frustums
pub mod sampling {
    /// Default number of samples taken along each frame edge
    pub const DEFAULT_SAMPLES_PER_EDGE: usize = 64;
    /// Fewer samples than this miss the bulge of strongly distorted edges
    pub const MIN_SAMPLES_PER_EDGE: usize = 16;
    /// Upper bound accepted from configuration
    pub const MAX_SAMPLES_PER_EDGE: usize = 1024;

    /// Clamp a configured sample count into the accepted range
    pub fn clamp_samples_per_edge(samples: usize) -> usize {
        samples.clamp(MIN_SAMPLES_PER_EDGE, MAX_SAMPLES_PER_EDGE)
    }
}

/// Newton solver used to invert the lens distortion
pub mod newton {
    /// Hard iteration cap; the inverse always terminates after this many steps
    pub const MAX_ITERATIONS: usize = 5;
    /// Central finite-difference step for the numeric Jacobian
    pub const JACOBIAN_STEP: f64 = 1e-3;
    /// Early exit once the squared update magnitude falls below this
    pub const STEP_TOLERANCE_SQ: f64 = 1e-14;
    /// Residual (squared) below which an estimate counts as converged
    pub const RESIDUAL_TOLERANCE_SQ: f64 = 1e-16;
    /// Jacobians with a smaller |det| are treated as singular
    pub const SINGULAR_DET: f64 = 1e-12;
}

/// Normalized spans at or below this are degenerate and keep the real intrinsics
pub const DEGENERATE_SPAN_EPSILON: f64 = 1e-6;

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "lens-composite";

/// Default calibration record filename
pub const DEFAULT_CALIBRATION_FILE: &str = "calibration.json";

/// Config file name inside the application config dir
pub const CONFIG_FILE_NAME: &str = "config.json";
