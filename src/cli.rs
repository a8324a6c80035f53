// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for calibration inspection and offline compositing
//!
//! This module provides command-line functionality for:
//! - Inspecting calibration records
//! - Printing the projection setup for a calibration
//! - Compositing a rendered layer over a camera frame

use crate::ProjectionArgs;
use chrono::Local;
use lens_composite::composite::overlay;
use lens_composite::shaders;
use lens_composite::storage::{self, DirectoryStore};
use lens_composite::{
    AppError, CalibrationData, CompositorConfig, CompositorSession, ImageSize, ProjectionMode,
    ProjectionSettings,
};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Load the config from `path` or the default location
pub fn load_config(path: Option<&Path>) -> Result<CompositorConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => CompositorConfig::load_from(path)?,
        None => CompositorConfig::load()?,
    };
    Ok(config)
}

/// Print a summary of a calibration record
pub fn inspect(
    config: &CompositorConfig,
    calibration: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let calib = resolve_calibration(config, calibration)?;
    let intr = calib.intrinsics();
    let [k1, k2, k3] = calib.radial_coefficients();
    let [p1, p2] = calib.tangential_coefficients();

    println!("Calibration: {}", calib.source());
    match calib.declared_image_size() {
        Some(size) => {
            println!("  Image size:  {}", size);
            println!(
                "  FOV:         {:.2}° x {:.2}°",
                intr.horizontal_fov(size.width).to_degrees(),
                intr.vertical_fov(size.height).to_degrees()
            );
        }
        None => println!("  Image size:  (not declared, viewport is used)"),
    }
    println!(
        "  Intrinsics:  fx={:.3} fy={:.3} cx={:.3} cy={:.3}",
        intr.fx, intr.fy, intr.cx, intr.cy
    );
    println!("  Radial:      k1={} k2={} k3={}", k1, k2, k3);
    println!("  Tangential:  p1={} p2={}", p1, p2);
    println!(
        "  Projection:  {}",
        if calib.explicit_projection().is_some() {
            "explicit 4x4 provided"
        } else {
            "none"
        }
    );

    Ok(())
}

/// Print the projection setup and composite parameters as JSON
pub fn print_projection(
    config: &CompositorConfig,
    calibration: Option<PathBuf>,
    args: &ProjectionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let calib = resolve_calibration(config, calibration)?;
    let settings = projection_settings(config, &calib, args, None)?;
    let session = CompositorSession::new(calib, settings)?;

    let size = session.setup().render_size;
    let output = serde_json::json!({
        "settings": settings,
        "setup": session.setup(),
        "column_major": session.setup().projection.to_column_major_f32(),
        "params": session.params(),
        "dispatch": shaders::compute_dispatch_size(size.width, size.height),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Warp `layer` through the lens model and optionally blend it over `frame`
pub fn composite(
    config: &CompositorConfig,
    calibration: Option<PathBuf>,
    layer: &Path,
    frame: Option<PathBuf>,
    output: Option<PathBuf>,
    args: &ProjectionArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let calib = resolve_calibration(config, calibration)?;
    let layer_image = image::open(layer)?.to_rgba8();
    let layer_size = ImageSize::new(layer_image.width(), layer_image.height());

    let settings = projection_settings(config, &calib, args, Some(layer_size))?;
    let session = CompositorSession::new(calib, settings)?;

    if layer_size != settings.render_size {
        warn!(
            layer = %layer_size,
            render = %settings.render_size,
            "Layer size differs from render size; the layer is sampled in render coordinates"
        );
    }

    let mut result = session.sampler().warp_layer(&layer_image);

    if let Some(frame_path) = frame {
        let mut frame_image = image::open(&frame_path)?.to_rgba8();
        overlay(&mut frame_image, &result)?;
        result = frame_image;
    }

    let output_path = output.unwrap_or_else(|| PathBuf::from(default_output_name()));
    result.save(&output_path)?;
    println!("Saved composite to {}", output_path.display());

    Ok(())
}

/// `composite_YYYYmmdd_HHMMSS.png`
fn default_output_name() -> String {
    Local::now().format("composite_%Y%m%d_%H%M%S.png").to_string()
}

/// Calibration from an explicit path, or the configured record
fn resolve_calibration(
    config: &CompositorConfig,
    path: Option<PathBuf>,
) -> Result<CalibrationData, AppError> {
    if let Some(path) = path {
        return storage::load_calibration_file(&path);
    }

    let dir = config.calibration_dir().ok_or_else(|| {
        AppError::Storage("no calibration directory available; pass a calibration file".into())
    })?;
    let store = DirectoryStore::new(dir);
    storage::load_calibration(&store, &config.calibration_file)
}

/// Settings from the config with command-line overrides applied
fn projection_settings(
    config: &CompositorConfig,
    calib: &CalibrationData,
    args: &ProjectionArgs,
    viewport: Option<ImageSize>,
) -> Result<ProjectionSettings, AppError> {
    let samples_per_edge = args
        .samples
        .map(lens_composite::constants::sampling::clamp_samples_per_edge)
        .unwrap_or_else(|| config.samples_per_edge());

    let mode = if args.direct {
        ProjectionMode::Direct
    } else if args.exact_cover {
        ProjectionMode::ExactCover { samples_per_edge }
    } else if args.provided {
        ProjectionMode::Provided
    } else {
        match config.projection_mode() {
            ProjectionMode::ExactCover { .. } => ProjectionMode::ExactCover { samples_per_edge },
            mode => mode,
        }
    };

    let render_size = match (args.width, args.height) {
        (Some(width), Some(height)) => ImageSize::new(width, height),
        _ => {
            let declared = config.render_size.is_some() || calib.declared_image_size().is_some();
            match viewport {
                Some(viewport) => config.render_size(calib, viewport),
                None if declared => config.render_size(calib, ImageSize::new(0, 0)),
                None => {
                    return Err(AppError::Config(
                        "calibration declares no image size; pass --width and --height".into(),
                    ));
                }
            }
        }
    };

    Ok(ProjectionSettings::new(mode, render_size).with_clip_planes(
        args.near.unwrap_or(config.near_clip),
        args.far.unwrap_or(config.far_clip),
    ))
}
