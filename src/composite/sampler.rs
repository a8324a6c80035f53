// SPDX-License-Identifier: GPL-3.0-only

//! CPU reference of the per-pixel composite pass
//!
//! For every output pixel `p`:
//!
//! 1. normalize `p` with the real intrinsics,
//! 2. apply the forward lens distortion,
//! 3. map the result into the rendered layer with the sampling intrinsics
//!    (virtual intrinsics in exact cover, real intrinsics otherwise),
//! 4. sample the layer bilinearly; texels outside it are fully transparent.
//!
//! Pixels are evaluated at their centres and texel centres sit at `+0.5`, the
//! same convention as GPU texture sampling, so an identity mapping reproduces
//! the layer exactly. Every output pixel depends only on the fixed parameters
//! and the layer, so rows can be processed in any order or in parallel.

use crate::calibration::{ImageSize, Intrinsics};
use crate::distortion::Distortion;
use crate::errors::{AppError, AppResult};
use crate::projection::ProjectionSetup;
use image::{Rgba, RgbaImage};
use tracing::debug;

/// Per-pixel sampling rule for one session configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositeSampler {
    intrinsics: Intrinsics,
    distortion: Distortion,
    sampling_intrinsics: Intrinsics,
    output_size: ImageSize,
}

impl CompositeSampler {
    pub fn new(
        intrinsics: Intrinsics,
        distortion: Distortion,
        sampling_intrinsics: Intrinsics,
        output_size: ImageSize,
    ) -> Self {
        Self {
            intrinsics,
            distortion,
            sampling_intrinsics,
            output_size,
        }
    }

    pub fn from_setup(setup: &ProjectionSetup, distortion: Distortion) -> Self {
        Self::new(
            setup.intrinsics,
            distortion,
            setup.virtual_intrinsics,
            setup.render_size,
        )
    }

    pub fn output_size(&self) -> ImageSize {
        self.output_size
    }

    /// Continuous layer position to sample for output position `(px, py)`
    #[inline]
    pub fn source_position(&self, px: f64, py: f64) -> (f64, f64) {
        let (x, y) = self.intrinsics.to_normalized(px, py);
        let (xd, yd) = self.distortion.distort(x, y);
        self.sampling_intrinsics.to_pixel(xd, yd)
    }

    /// Bilinear sample of `layer` at a continuous position, premultiplied-free RGBA in [0, 255]
    pub fn sample_bilinear(layer: &RgbaImage, x: f64, y: f64) -> [f32; 4] {
        // Past one texel outside the layer every tap is transparent; also keeps
        // the integer casts below in range
        let (w, h) = (layer.width() as f64, layer.height() as f64);
        if !(-1.0..=w + 1.0).contains(&x) || !(-1.0..=h + 1.0).contains(&y) {
            return [0.0; 4];
        }

        let gx = x - 0.5;
        let gy = y - 0.5;
        let x0 = gx.floor();
        let y0 = gy.floor();
        let fx = (gx - x0) as f32;
        let fy = (gy - y0) as f32;
        let x0 = x0 as i64;
        let y0 = y0 as i64;

        let c00 = texel(layer, x0, y0);
        let c10 = texel(layer, x0 + 1, y0);
        let c01 = texel(layer, x0, y0 + 1);
        let c11 = texel(layer, x0 + 1, y0 + 1);

        let mut out = [0.0f32; 4];
        for i in 0..4 {
            let top = c00[i] + (c10[i] - c00[i]) * fx;
            let bottom = c01[i] + (c11[i] - c01[i]) * fx;
            out[i] = top + (bottom - top) * fy;
        }
        out
    }

    /// Color of output pixel `(x, y)`
    pub fn sample_pixel(&self, layer: &RgbaImage, x: u32, y: u32) -> Rgba<u8> {
        let (sx, sy) = self.source_position(x as f64 + 0.5, y as f64 + 0.5);
        let c = Self::sample_bilinear(layer, sx, sy);
        Rgba(c.map(|v| v.round().clamp(0.0, 255.0) as u8))
    }

    /// Warp the undistorted layer into the distorted output frame
    pub fn warp_layer(&self, layer: &RgbaImage) -> RgbaImage {
        let start = std::time::Instant::now();
        let ImageSize { width, height } = self.output_size;

        let warped = RgbaImage::from_fn(width, height, |x, y| self.sample_pixel(layer, x, y));

        debug!(
            width,
            height,
            layer_width = layer.width(),
            layer_height = layer.height(),
            elapsed_ms = start.elapsed().as_millis(),
            "Warped layer through lens distortion"
        );
        warped
    }
}

/// Texel at integer coordinates as f32 RGBA, transparent outside the layer
#[inline]
fn texel(layer: &RgbaImage, x: i64, y: i64) -> [f32; 4] {
    if x < 0 || y < 0 || x >= layer.width() as i64 || y >= layer.height() as i64 {
        return [0.0; 4];
    }
    layer.get_pixel(x as u32, y as u32).0.map(|v| v as f32)
}

/// Source-over blend of `overlay` onto `frame`, in place
///
/// Both images must have the same dimensions.
pub fn overlay(frame: &mut RgbaImage, overlay: &RgbaImage) -> AppResult<()> {
    if frame.dimensions() != overlay.dimensions() {
        return Err(AppError::Image(format!(
            "overlay is {}x{} but frame is {}x{}",
            overlay.width(),
            overlay.height(),
            frame.width(),
            frame.height()
        )));
    }

    for (dst, src) in frame.pixels_mut().zip(overlay.pixels()) {
        let sa = src[3] as f32 / 255.0;
        if sa <= 0.0 {
            continue;
        }
        let da = dst[3] as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);

        for i in 0..3 {
            let s = src[i] as f32 / 255.0;
            let d = dst[i] as f32 / 255.0;
            let c = (s * sa + d * da * (1.0 - sa)) / out_a;
            dst[i] = (c * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    Ok(())
}
