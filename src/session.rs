// SPDX-License-Identifier: GPL-3.0-only

//! Compositor session
//!
//! Holds the one calibration a session works with and the projection state
//! derived from it. The state is computed in full and then swapped in as a
//! whole; readers hold an [`Arc`] snapshot, so a reconfiguration never exposes
//! a half-updated frustum or parameter block.

use crate::calibration::{CalibrationData, ImageSize};
use crate::composite::{CompositeParams, CompositeSampler};
use crate::config::CompositorConfig;
use crate::errors::AppResult;
use crate::projection::{ProjectionBuilder, ProjectionSettings, ProjectionSetup};
use std::sync::Arc;
use tracing::info;

/// Derived, immutable per-configuration state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub settings: ProjectionSettings,
    pub setup: ProjectionSetup,
    pub params: CompositeParams,
    pub sampler: CompositeSampler,
}

/// Explicit session context passed to the projection and composite stages
#[derive(Debug, Clone)]
pub struct CompositorSession {
    calibration: Arc<CalibrationData>,
    state: Arc<SessionState>,
}

impl CompositorSession {
    /// Build a session for `calibration` with explicit settings
    pub fn new(calibration: CalibrationData, settings: ProjectionSettings) -> AppResult<Self> {
        let state = compute_state(&calibration, settings)?;
        Ok(Self {
            calibration: Arc::new(calibration),
            state: Arc::new(state),
        })
    }

    /// Build a session from persisted configuration
    ///
    /// `viewport` is used for the render size when neither the config nor the
    /// calibration record declares one.
    pub fn from_config(
        calibration: CalibrationData,
        config: &CompositorConfig,
        viewport: ImageSize,
    ) -> AppResult<Self> {
        let settings = config.projection_settings(&calibration, viewport);
        Self::new(calibration, settings)
    }

    pub fn calibration(&self) -> &CalibrationData {
        &self.calibration
    }

    /// Current state snapshot
    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    pub fn setup(&self) -> &ProjectionSetup {
        &self.state.setup
    }

    pub fn params(&self) -> &CompositeParams {
        &self.state.params
    }

    pub fn sampler(&self) -> &CompositeSampler {
        &self.state.sampler
    }

    /// Replace the derived state for new settings
    ///
    /// On error the previous state is kept untouched.
    pub fn reconfigure(&mut self, settings: ProjectionSettings) -> AppResult<()> {
        let state = compute_state(&self.calibration, settings)?;
        self.state = Arc::new(state);
        Ok(())
    }
}

fn compute_state(
    calibration: &CalibrationData,
    settings: ProjectionSettings,
) -> AppResult<SessionState> {
    let distortion = calibration.distortion();
    let setup = ProjectionBuilder::from_calibration(calibration).build(&settings)?;
    let params = CompositeParams::from_setup(&setup, &distortion);
    let sampler = CompositeSampler::from_setup(&setup, distortion);

    let intr = setup.intrinsics;
    info!(
        source = calibration.source(),
        render_size = %setup.render_size,
        fx = intr.fx,
        fy = intr.fy,
        cx = intr.cx,
        cy = intr.cy,
        requested = ?settings.mode,
        resolved = ?setup.mode,
        "Compositor session configured"
    );

    Ok(SessionState {
        settings,
        setup,
        params,
        sampler,
    })
}
