// SPDX-License-Identifier: GPL-3.0-only

//! Brown-Conrady lens distortion and its iterative inverse
//!
//! All coordinates here are normalized camera-space coordinates, i.e. pixel
//! coordinates with the principal point subtracted and divided by the focal
//! length: `x = (px - cx) / fx`, `y = (py - cy) / fy`.
//!
//! ```text
//! r²     = x² + y²
//! radial = 1 + k1·r² + k2·r⁴ + k3·r⁶
//! xd     = x·radial + 2·p1·x·y + p2·(r² + 2x²)
//! yd     = y·radial + p1·(r² + 2y²) + 2·p2·x·y
//! ```
//!
//! The forward map has no closed-form inverse. [`Distortion::undistort`] runs a
//! bounded Newton solve with a central-difference Jacobian. The result is the
//! best estimate after at most [`newton::MAX_ITERATIONS`] steps, not a proven
//! root: for extreme coefficients (large |k1|·r⁶) the estimate may be off, and
//! [`Distortion::undistort_with_report`] exposes how far.
//!
//! Both the exact-cover boundary sampling and any per-pixel caller go through
//! the same [`Distortion::undistort_with_report`] routine.

use crate::constants::newton;
use serde::{Deserialize, Serialize};

/// Radial (k1, k2, k3) and tangential (p1, p2) distortion coefficients
///
/// Field order follows the OpenCV `[k1, k2, p1, p2, k3]` layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Distortion {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

/// Outcome of one inverse-distortion solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InverseEstimate {
    /// Undistorted normalized x
    pub x: f64,
    /// Undistorted normalized y
    pub y: f64,
    /// Newton steps taken (0 for the identity fast path)
    pub iterations: usize,
    /// Whether the step or residual tolerance was reached before the cap
    pub converged: bool,
    /// `|distort(x, y) - (xd, yd)|` of the returned estimate
    pub residual: f64,
}

impl Distortion {
    /// No distortion: both directions are the identity
    pub const NONE: Distortion = Distortion {
        k1: 0.0,
        k2: 0.0,
        p1: 0.0,
        p2: 0.0,
        k3: 0.0,
    };

    pub fn new(k1: f64, k2: f64, p1: f64, p2: f64, k3: f64) -> Self {
        Self { k1, k2, p1, p2, k3 }
    }

    /// Build from an OpenCV-ordered coefficient list
    ///
    /// Needs at least `[k1, k2, p1, p2]`; a missing `k3` defaults to zero.
    /// Extra trailing coefficients (rational/thin-prism terms) are ignored.
    pub fn from_coefficients(coefficients: &[f64]) -> Option<Self> {
        match coefficients {
            [k1, k2, p1, p2] => Some(Self::new(*k1, *k2, *p1, *p2, 0.0)),
            [k1, k2, p1, p2, k3, ..] => Some(Self::new(*k1, *k2, *p1, *p2, *k3)),
            _ => None,
        }
    }

    /// `(k1, k2, k3)`
    pub fn radial(&self) -> [f64; 3] {
        [self.k1, self.k2, self.k3]
    }

    /// `(p1, p2)`
    pub fn tangential(&self) -> [f64; 2] {
        [self.p1, self.p2]
    }

    pub fn is_identity(&self) -> bool {
        self.k1 == 0.0 && self.k2 == 0.0 && self.k3 == 0.0 && self.p1 == 0.0 && self.p2 == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.k1.is_finite()
            && self.k2.is_finite()
            && self.k3.is_finite()
            && self.p1.is_finite()
            && self.p2.is_finite()
    }

    /// Apply the lens distortion: undistorted -> distorted normalized coordinates
    #[inline]
    pub fn distort(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;
        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;

        let xt = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yt = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

        (x * radial + xt, y * radial + yt)
    }

    /// Remove the lens distortion: distorted -> undistorted normalized coordinates
    ///
    /// Best estimate of a bounded Newton solve; see the module docs.
    #[inline]
    pub fn undistort(&self, xd: f64, yd: f64) -> (f64, f64) {
        let estimate = self.undistort_with_report(xd, yd);
        (estimate.x, estimate.y)
    }

    /// Invert the distortion and report how well the solve went
    ///
    /// Starts from `(xd, yd)`, then for up to [`newton::MAX_ITERATIONS`] steps
    /// evaluates the residual, estimates the Jacobian by central differences
    /// (step [`newton::JACOBIAN_STEP`]), solves the 2x2 system and subtracts the
    /// update. Stops early when the squared update drops below
    /// [`newton::STEP_TOLERANCE_SQ`] or the Jacobian becomes singular.
    pub fn undistort_with_report(&self, xd: f64, yd: f64) -> InverseEstimate {
        if self.is_identity() {
            return InverseEstimate {
                x: xd,
                y: yd,
                iterations: 0,
                converged: true,
                residual: 0.0,
            };
        }

        let mut x = xd;
        let mut y = yd;
        let mut iterations = 0;
        let mut step_converged = false;

        for _ in 0..newton::MAX_ITERATIONS {
            let (fx, fy) = self.distort(x, y);
            let rx = fx - xd;
            let ry = fy - yd;

            let [[a, b], [c, d]] = self.numeric_jacobian(x, y);
            let det = a * d - b * c;
            if !det.is_finite() || det.abs() < newton::SINGULAR_DET {
                break;
            }

            let dx = (d * rx - b * ry) / det;
            let dy = (-c * rx + a * ry) / det;
            if !dx.is_finite() || !dy.is_finite() {
                break;
            }

            x -= dx;
            y -= dy;
            iterations += 1;

            if dx * dx + dy * dy < newton::STEP_TOLERANCE_SQ {
                step_converged = true;
                break;
            }
        }

        let (fx, fy) = self.distort(x, y);
        let residual_sq = (fx - xd) * (fx - xd) + (fy - yd) * (fy - yd);

        InverseEstimate {
            x,
            y,
            iterations,
            converged: step_converged || residual_sq < newton::RESIDUAL_TOLERANCE_SQ,
            residual: residual_sq.sqrt(),
        }
    }

    /// Central-difference Jacobian of [`Self::distort`], row-major `[[dxd/dx, dxd/dy], [dyd/dx, dyd/dy]]`
    fn numeric_jacobian(&self, x: f64, y: f64) -> [[f64; 2]; 2] {
        let h = newton::JACOBIAN_STEP;
        let inv_2h = 1.0 / (2.0 * h);

        let (xp_x, xp_y) = self.distort(x + h, y);
        let (xm_x, xm_y) = self.distort(x - h, y);
        let (yp_x, yp_y) = self.distort(x, y + h);
        let (ym_x, ym_y) = self.distort(x, y - h);

        [
            [(xp_x - xm_x) * inv_2h, (yp_x - ym_x) * inv_2h],
            [(xp_y - xm_y) * inv_2h, (yp_y - ym_y) * inv_2h],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typical_lens() -> Distortion {
        Distortion::new(-0.2, 0.05, 0.001, -0.0005, 0.0)
    }

    #[test]
    fn test_from_coefficients_lengths() {
        assert_eq!(Distortion::from_coefficients(&[0.1, 0.2]), None);
        assert_eq!(Distortion::from_coefficients(&[0.1, 0.2, 0.3]), None);

        let four = Distortion::from_coefficients(&[0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(four.k3, 0.0);
        assert_eq!(four.tangential(), [0.3, 0.4]);

        let eight = Distortion::from_coefficients(&[0.1, 0.2, 0.3, 0.4, 0.5, 9.0, 9.0, 9.0]).unwrap();
        assert_eq!(eight.radial(), [0.1, 0.2, 0.5]);
    }

    #[test]
    fn test_distort_origin_is_fixed() {
        assert_eq!(typical_lens().distort(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_barrel_pulls_points_inward() {
        let lens = Distortion::new(-0.2, 0.0, 0.0, 0.0, 0.0);
        let (xd, yd) = lens.distort(0.5, 0.5);
        assert!(xd < 0.5 && yd < 0.5);
    }

    #[test]
    fn test_undistort_reports_convergence() {
        let lens = typical_lens();
        let (xd, yd) = lens.distort(0.4, -0.3);
        let estimate = lens.undistort_with_report(xd, yd);

        assert!(estimate.converged);
        assert!(estimate.iterations <= newton::MAX_ITERATIONS);
        assert!(estimate.residual < 1e-8);
        assert!((estimate.x - 0.4).abs() < 1e-6);
        assert!((estimate.y + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_fast_path() {
        let estimate = Distortion::NONE.undistort_with_report(0.7, -0.2);
        assert_eq!(estimate.iterations, 0);
        assert!(estimate.converged);
        assert_eq!((estimate.x, estimate.y), (0.7, -0.2));
    }

    #[test]
    fn test_extreme_distortion_terminates() {
        // Far outside the monotonic region of the model; only termination is guaranteed
        let lens = Distortion::new(-5.0, 0.0, 0.0, 0.0, 3.0);
        let estimate = lens.undistort_with_report(2.0, 2.0);
        assert!(estimate.iterations <= newton::MAX_ITERATIONS);
    }
}
