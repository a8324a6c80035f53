// SPDX-License-Identifier: GPL-3.0-only

//! Uniform block handed to the per-pixel distortion pass
//!
//! Layout matches `CompositeParams` in `composite.wgsl`: five `vec4<f32>`,
//! 80 bytes, no padding.

use crate::calibration::{ImageSize, Intrinsics};
use crate::distortion::Distortion;
use crate::projection::ProjectionSetup;
use serde::Serialize;

/// Parameters of the lens-distortion composite pass
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositeParams {
    /// Real lens `(fx, fy, cx, cy)`
    pub cam_intrinsics: [f32; 4],
    /// `(k1, k2, k3, 0)`
    pub dist_radial: [f32; 4],
    /// `(p1, p2, 0, 0)`
    pub dist_tangential: [f32; 4],
    /// `(fx', fy', cx', cy')` of the rendered layer; real intrinsics outside exact cover
    pub virtual_intrinsics: [f32; 4],
    /// `(w, h, 1/w, 1/h)` of the output
    pub tex_size: [f32; 4],
}

impl CompositeParams {
    pub fn new(
        intrinsics: &Intrinsics,
        distortion: &Distortion,
        virtual_intrinsics: &Intrinsics,
        output_size: ImageSize,
    ) -> Self {
        let [k1, k2, k3] = distortion.radial();
        let [p1, p2] = distortion.tangential();

        Self {
            cam_intrinsics: intrinsics.to_vec4(),
            dist_radial: [k1 as f32, k2 as f32, k3 as f32, 0.0],
            dist_tangential: [p1 as f32, p2 as f32, 0.0, 0.0],
            virtual_intrinsics: virtual_intrinsics.to_vec4(),
            tex_size: output_size.to_vec4(),
        }
    }

    /// Parameters for a built projection setup
    pub fn from_setup(setup: &ProjectionSetup, distortion: &Distortion) -> Self {
        Self::new(
            &setup.intrinsics,
            distortion,
            &setup.virtual_intrinsics,
            setup.render_size,
        )
    }

    /// Raw bytes for a uniform buffer upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<CompositeParams>(), 80);
    }

    #[test]
    fn test_packing() {
        let intr = Intrinsics::new(800.0, 810.0, 640.0, 360.0);
        let dist = Distortion::new(-0.2, 0.05, 0.001, 0.002, 0.3);
        let params = CompositeParams::new(&intr, &dist, &intr, ImageSize::new(1280, 720));

        assert_eq!(params.cam_intrinsics, [800.0, 810.0, 640.0, 360.0]);
        assert_eq!(params.dist_radial, [-0.2, 0.05, 0.3, 0.0]);
        assert_eq!(params.dist_tangential, [0.001, 0.002, 0.0, 0.0]);
        assert_eq!(params.virtual_intrinsics, params.cam_intrinsics);
        assert_eq!(params.tex_size[0], 1280.0);
        assert_eq!(params.as_bytes().len(), 80);
    }
}
