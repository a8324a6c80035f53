// SPDX-License-Identifier: GPL-3.0-only

//! Intrinsics and image size value types

use serde::{Deserialize, Serialize};

/// Pinhole intrinsics in pixel units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    /// Focal length X (pixels)
    pub fx: f64,
    /// Focal length Y (pixels)
    pub fy: f64,
    /// Principal point X (pixels)
    pub cx: f64,
    /// Principal point Y (pixels)
    pub cy: f64,
}

impl Intrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Pixel -> normalized camera space
    #[inline]
    pub fn to_normalized(&self, px: f64, py: f64) -> (f64, f64) {
        ((px - self.cx) / self.fx, (py - self.cy) / self.fy)
    }

    /// Normalized camera space -> pixel
    #[inline]
    pub fn to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.fx + self.cx, y * self.fy + self.cy)
    }

    /// `(fx, fy, cx, cy)` packed for a GPU uniform
    pub fn to_vec4(&self) -> [f32; 4] {
        [self.fx as f32, self.fy as f32, self.cx as f32, self.cy as f32]
    }

    /// Horizontal field of view (radians) for an image `width` pixels wide
    pub fn horizontal_fov(&self, width: u32) -> f64 {
        2.0 * (width.max(1) as f64 / (2.0 * self.fx)).atan()
    }

    /// Vertical field of view (radians) for an image `height` pixels tall
    pub fn vertical_fov(&self, height: u32) -> f64 {
        2.0 * (height.max(1) as f64 / (2.0 * self.fy)).atan()
    }

    pub fn is_valid(&self) -> bool {
        self.fx.is_finite()
            && self.fy.is_finite()
            && self.cx.is_finite()
            && self.cy.is_finite()
            && self.fx > 0.0
            && self.fy > 0.0
    }
}

/// Image dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// `(w, h, 1/w, 1/h)` packed for a GPU uniform
    pub fn to_vec4(&self) -> [f32; 4] {
        let w = self.width.max(1) as f32;
        let h = self.height.max(1) as f32;
        [w, h, 1.0 / w, 1.0 / h]
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_roundtrip() {
        let intr = Intrinsics::new(800.0, 810.0, 640.0, 360.0);
        let (x, y) = intr.to_normalized(1040.0, 765.0);
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
        assert_eq!(intr.to_pixel(x, y), (1040.0, 765.0));
    }

    #[test]
    fn test_horizontal_fov() {
        // fx equal to half the width gives a 90 degree field of view
        let intr = Intrinsics::new(640.0, 640.0, 640.0, 360.0);
        let fov = intr.horizontal_fov(1280);
        assert!((fov - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_tex_size_vec4() {
        assert_eq!(ImageSize::new(4, 2).to_vec4(), [4.0, 2.0, 0.25, 0.5]);
    }
}
