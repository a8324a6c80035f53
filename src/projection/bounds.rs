// SPDX-License-Identifier: GPL-3.0-only

//! Exact-cover boundary sampling
//!
//! To make a rendered layer fill the whole distorted frame `[0, w] x [0, h]`,
//! walk the four frame edges in pixel space, push every sample through the
//! inverse distortion and keep the bounding box of the undistorted results.
//! The frame boundary maps to the boundary of the distorted region for any
//! continuous, well-formed lens, so this box approximates the minimal
//! undistorted extent that covers the frame. Strongly non-monotonic lenses can
//! bulge between samples; denser sampling narrows that gap but does not close it.

use crate::calibration::{ImageSize, Intrinsics};
use crate::constants::{DEGENERATE_SPAN_EPSILON, sampling};
use crate::distortion::Distortion;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Axis-aligned box in normalized camera space (y down, like pixels)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Result of sampling the frame boundary through the inverse distortion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverBounds {
    pub bounds: NormalizedBounds,
    /// Total number of boundary samples evaluated (4 x samples per edge)
    pub samples: usize,
    /// Samples whose inverse hit the iteration cap without converging
    pub non_converged: usize,
    /// Largest forward residual among all samples
    pub worst_residual: f64,
}

impl NormalizedBounds {
    /// Empty box that any point will expand
    pub const EMPTY: NormalizedBounds = NormalizedBounds {
        min_x: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        min_y: f64::INFINITY,
        max_y: f64::NEG_INFINITY,
    };

    /// Extent of the frame under a pure pinhole model (no distortion)
    pub fn pinhole(intrinsics: &Intrinsics, size: ImageSize) -> Self {
        let (min_x, min_y) = intrinsics.to_normalized(0.0, 0.0);
        let (max_x, max_y) = intrinsics.to_normalized(size.width as f64, size.height as f64);
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    pub fn expand(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn span_x(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn span_y(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Whether `other` lies inside this box, allowing `tolerance` slack
    pub fn contains(&self, other: &NormalizedBounds, tolerance: f64) -> bool {
        self.min_x <= other.min_x + tolerance
            && self.max_x >= other.max_x - tolerance
            && self.min_y <= other.min_y + tolerance
            && self.max_y >= other.max_y - tolerance
    }

    /// Whether `other` lies strictly inside this box on every side
    pub fn strictly_contains(&self, other: &NormalizedBounds) -> bool {
        self.min_x < other.min_x
            && self.max_x > other.max_x
            && self.min_y < other.min_y
            && self.max_y > other.max_y
    }

    /// Both spans are finite and larger than [`DEGENERATE_SPAN_EPSILON`]
    pub fn is_degenerate(&self) -> bool {
        !(self.span_x() > DEGENERATE_SPAN_EPSILON && self.span_y() > DEGENERATE_SPAN_EPSILON)
            || !self.span_x().is_finite()
            || !self.span_y().is_finite()
    }
}

/// Pixel-space points along the frame edges: top, bottom, left, right
///
/// Each edge gets `samples_per_edge` evenly spaced points including both
/// corners, so corners are visited twice. The count is clamped to the
/// configured range.
pub fn edge_samples(size: ImageSize, samples_per_edge: usize) -> impl Iterator<Item = (f64, f64)> {
    let n = sampling::clamp_samples_per_edge(samples_per_edge);
    let w = size.width as f64;
    let h = size.height as f64;
    let t = move |i: usize| i as f64 / (n - 1) as f64;

    let top = (0..n).map(move |i| (w * t(i), 0.0));
    let bottom = (0..n).map(move |i| (w * t(i), h));
    let left = (0..n).map(move |i| (0.0, h * t(i)));
    let right = (0..n).map(move |i| (w, h * t(i)));

    top.chain(bottom).chain(left).chain(right)
}

/// Minimal undistorted normalized extent whose distorted image covers the frame
pub fn cover_bounds(
    intrinsics: &Intrinsics,
    distortion: &Distortion,
    size: ImageSize,
    samples_per_edge: usize,
) -> CoverBounds {
    let mut bounds = NormalizedBounds::EMPTY;
    let mut samples = 0;
    let mut non_converged = 0;
    let mut worst_residual = 0.0f64;

    for (px, py) in edge_samples(size, samples_per_edge) {
        let (xd, yd) = intrinsics.to_normalized(px, py);
        let estimate = distortion.undistort_with_report(xd, yd);

        bounds.expand(estimate.x, estimate.y);
        samples += 1;
        if !estimate.converged {
            non_converged += 1;
        }
        worst_residual = worst_residual.max(estimate.residual);
    }

    debug!(
        samples,
        non_converged,
        worst_residual,
        min_x = bounds.min_x,
        max_x = bounds.max_x,
        min_y = bounds.min_y,
        max_y = bounds.max_y,
        "Sampled exact-cover bounds"
    );

    CoverBounds {
        bounds,
        samples,
        non_converged,
        worst_residual,
    }
}

/// Intrinsics mapping the rendered `size` image linearly onto `bounds`
///
/// Returns `fallback` unchanged when either span is degenerate instead of
/// dividing by a near-zero span.
pub fn virtual_intrinsics(
    bounds: &NormalizedBounds,
    size: ImageSize,
    fallback: Intrinsics,
) -> Intrinsics {
    if bounds.is_degenerate() {
        debug!(
            span_x = bounds.span_x(),
            span_y = bounds.span_y(),
            "Degenerate cover span, keeping real intrinsics"
        );
        return fallback;
    }

    let fx = size.width as f64 / bounds.span_x();
    let fy = size.height as f64 / bounds.span_y();
    Intrinsics::new(fx, fy, -bounds.min_x * fx, -bounds.min_y * fy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_samples_count_and_corners() {
        let size = ImageSize::new(100, 50);
        let points: Vec<_> = edge_samples(size, 16).collect();
        assert_eq!(points.len(), 64);
        assert!(points.contains(&(0.0, 0.0)));
        assert!(points.contains(&(100.0, 0.0)));
        assert!(points.contains(&(0.0, 50.0)));
        assert!(points.contains(&(100.0, 50.0)));
    }

    #[test]
    fn test_edge_samples_clamped_to_minimum() {
        let points: Vec<_> = edge_samples(ImageSize::new(10, 10), 2).collect();
        assert_eq!(points.len(), 4 * sampling::MIN_SAMPLES_PER_EDGE);
    }

    #[test]
    fn test_cover_bounds_without_distortion_is_pinhole() {
        let intr = Intrinsics::new(800.0, 800.0, 640.0, 360.0);
        let size = ImageSize::new(1280, 720);
        let cover = cover_bounds(&intr, &Distortion::NONE, size, 32);
        assert_eq!(cover.bounds, NormalizedBounds::pinhole(&intr, size));
        assert_eq!(cover.non_converged, 0);
        assert_eq!(cover.samples, 128);
    }

    #[test]
    fn test_virtual_intrinsics_maps_bounds_to_frame() {
        let bounds = NormalizedBounds {
            min_x: -1.0,
            max_x: 1.0,
            min_y: -0.5,
            max_y: 0.5,
        };
        let size = ImageSize::new(1000, 500);
        let v = virtual_intrinsics(&bounds, size, Intrinsics::new(1.0, 1.0, 0.0, 0.0));

        let (px0, py0) = v.to_pixel(bounds.min_x, bounds.min_y);
        let (px1, py1) = v.to_pixel(bounds.max_x, bounds.max_y);
        assert!((px0).abs() < 1e-9 && (py0).abs() < 1e-9);
        assert!((px1 - 1000.0).abs() < 1e-9 && (py1 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_virtual_intrinsics_degenerate_falls_back() {
        let real = Intrinsics::new(800.0, 800.0, 640.0, 360.0);
        let point = NormalizedBounds {
            min_x: 0.1,
            max_x: 0.1,
            min_y: 0.2,
            max_y: 0.2,
        };
        assert_eq!(virtual_intrinsics(&point, ImageSize::new(1280, 720), real), real);
        assert_eq!(
            virtual_intrinsics(&NormalizedBounds::EMPTY, ImageSize::new(1280, 720), real),
            real
        );
    }
}
