// SPDX-License-Identifier: GPL-3.0-only

//! Interfaces to the external collaborators of the compositor
//!
//! - [`markers`]: fiducial marker detection, used to align the virtual camera
//! - [`nvr`]: network video recorder sessions that deliver the camera feed

pub mod markers;
pub mod nvr;
