// SPDX-License-Identifier: GPL-3.0-only

//! Lens Composite - calibration-driven mixed-reality compositing
//!
//! Overlays synthetic 3D content onto a live camera feed so that it lines up
//! with the lens. The camera's intrinsics and Brown-Conrady distortion are
//! loaded from a calibration record; the virtual camera renders through a
//! frustum derived from them, and a per-pixel pass warps the render with the
//! lens distortion before it is blended over the camera frame.
//!
//! # Architecture
//!
//! - [`calibration`]: calibration record parsing and validation
//! - [`distortion`]: forward and inverse lens distortion
//! - [`projection`]: direct and exact-cover frustums, virtual intrinsics
//! - [`composite`]: GPU parameter block and CPU reference compositor
//! - [`shaders`]: WGSL composite pass
//! - [`session`]: per-session projection state
//! - [`config`]: persisted settings
//! - [`storage`]: calibration record storage
//! - [`backends`]: marker detection and network camera interfaces

pub mod backends;
pub mod calibration;
pub mod composite;
pub mod config;
pub mod constants;
pub mod distortion;
pub mod errors;
pub mod projection;
pub mod session;
pub mod shaders;
pub mod storage;

// Re-export commonly used types
pub use calibration::{CalibrationData, ImageSize, Intrinsics};
pub use composite::{CompositeParams, CompositeSampler};
pub use config::CompositorConfig;
pub use distortion::Distortion;
pub use errors::{AppError, AppResult, CalibrationError, ProjectionError};
pub use projection::{ProjectionBuilder, ProjectionMode, ProjectionSettings, ProjectionSetup};
pub use session::CompositorSession;
