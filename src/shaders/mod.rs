// SPDX-License-Identifier: GPL-3.0-only
//! Shader sources for the composite pass
//!
//! The WGSL here is the GPU counterpart of [`crate::composite::CompositeSampler`]
//! and reads its uniforms from [`crate::composite::CompositeParams`]. Bindings:
//! - 0: rendered layer (`texture_2d<f32>`)
//! - 1: output (`texture_storage_2d<rgba8unorm, write>`)
//! - 2: `CompositeParams` uniform

/// Lens-distortion composite compute shader, entry point `main`
pub const COMPOSITE_SHADER: &str = include_str!("composite.wgsl");

/// Compute shader entry point
pub const COMPOSITE_ENTRY_POINT: &str = "main";

/// Workgroup edge length declared by `@workgroup_size` in the shader
pub const WORKGROUP_SIZE: u32 = 16;

/// Workgroup counts `(x, y)` covering a `width x height` output
pub fn compute_dispatch_size(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE))
}
