// SPDX-License-Identifier: GPL-3.0-only

//! Boundary between CPU-side setup and the per-pixel distortion pass
//!
//! [`CompositeParams`] is the uniform block any GPU implementation consumes;
//! [`CompositeSampler`] is the CPU reference of the same sampling rule and is
//! what the CLI and tests use.

mod params;
mod sampler;

pub use params::CompositeParams;
pub use sampler::{CompositeSampler, overlay};
