// SPDX-License-Identifier: GPL-3.0-only

//! Calibration record storage
//!
//! Record text is read through [`CalibrationStore`] so the loader can be fed
//! from a directory on disk, or from memory in tests.

use crate::calibration::CalibrationData;
use crate::constants;
use crate::errors::{AppError, AppResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of calibration record text, keyed by filename
pub trait CalibrationStore {
    fn read_record(&self, name: &str) -> AppResult<String>;
}

/// Records stored as files in one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<data_dir>/lens-composite`
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join(constants::APP_DIR_NAME))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl CalibrationStore for DirectoryStore {
    fn read_record(&self, name: &str) -> AppResult<String> {
        let path = self.record_path(name);
        debug!(path = %path.display(), "Reading calibration record");
        std::fs::read_to_string(&path)
            .map_err(|e| AppError::Storage(format!("failed to read {}: {}", path.display(), e)))
    }
}

/// In-memory records
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.records.insert(name.into(), text.into());
    }
}

impl CalibrationStore for MemoryStore {
    fn read_record(&self, name: &str) -> AppResult<String> {
        self.records
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::Storage(format!("no calibration record named {}", name)))
    }
}

/// Read and validate the record `name` from `store`
pub fn load_calibration(store: &dyn CalibrationStore, name: &str) -> AppResult<CalibrationData> {
    let text = store.read_record(name)?;
    Ok(CalibrationData::parse(&text, name)?)
}

/// Read and validate a calibration file at an arbitrary path
pub fn load_calibration_file(path: &Path) -> AppResult<CalibrationData> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::Storage(format!("failed to read {}: {}", path.display(), e)))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(CalibrationData::parse(&text, &name)?)
}

/// Most recently modified `.json` record in `dir`
///
/// Directory scanning runs on the blocking pool.
pub async fn find_latest_record(dir: PathBuf) -> Option<PathBuf> {
    let mut entries = tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        if let Ok(entries) = std::fs::read_dir(&dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"))
                {
                    files.push(entry);
                }
            }
        }
        files
    })
    .await
    .ok()?;

    // Newest first
    entries.sort_by_key(|e| {
        e.metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .map(std::cmp::Reverse)
    });

    let latest = entries.first()?.path();
    debug!(path = %latest.display(), "Latest calibration record");
    Some(latest)
}
