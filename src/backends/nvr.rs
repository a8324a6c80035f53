// SPDX-License-Identifier: GPL-3.0-only

//! Network video recorder boundary
//!
//! The live camera feed comes from an NVR reached through a vendor SDK. This
//! module holds the persisted device list and the session-manager interface;
//! the SDK binding implements [`CameraSessionManager`].

use crate::errors::{AppError, AppResult};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use tracing::{info, warn};

/// One configured recorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NvrDevice {
    pub host: String,
    /// Vendor SDK used to talk to this recorder
    #[serde(alias = "type")]
    pub sdk: String,
}

/// Persisted list of recorders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NvrConfiguration {
    pub nvrs: Vec<NvrDevice>,
}

impl NvrConfiguration {
    pub fn from_json(text: &str) -> AppResult<Self> {
        serde_json::from_str(text).map_err(|e| AppError::Config(format!("NVR configuration: {}", e)))
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn first(&self) -> Option<&NvrDevice> {
        self.nvrs.first()
    }
}

/// Vendor-SDK session handling
pub trait CameraSessionManager: Sync {
    /// Log in to a single recorder
    fn login(&self, device: &NvrDevice) -> impl Future<Output = AppResult<()>> + Send;

    /// Start the live stream of a logged-in recorder
    fn start_live_playback(&self, device: &NvrDevice) -> impl Future<Output = AppResult<()>> + Send;

    /// Log in to every configured recorder concurrently
    ///
    /// Results are in configuration order.
    fn login_all(
        &self,
        config: &NvrConfiguration,
    ) -> impl Future<Output = Vec<AppResult<()>>> + Send {
        async move { join_all(config.nvrs.iter().map(|device| self.login(device))).await }
    }
}

/// Log in to all recorders, then start live playback on the first one
///
/// Returns the device that is playing, or `None` when nothing is configured.
/// Failed logins on other recorders are logged and do not stop playback.
pub async fn connect_first_device<M: CameraSessionManager>(
    manager: &M,
    config: &NvrConfiguration,
) -> AppResult<Option<NvrDevice>> {
    let results = manager.login_all(config).await;
    for (device, result) in config.nvrs.iter().zip(&results) {
        if let Err(e) = result {
            warn!(host = %device.host, error = %e, "NVR login failed");
        }
    }

    let Some(device) = config.first() else {
        warn!("No NVR devices configured");
        return Ok(None);
    };

    manager.start_live_playback(device).await?;
    info!(host = %device.host, sdk = %device.sdk, "Live playback started");
    Ok(Some(device.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingManager {
        calls: Mutex<Vec<String>>,
        fail_host: Option<String>,
    }

    impl CameraSessionManager for RecordingManager {
        async fn login(&self, device: &NvrDevice) -> AppResult<()> {
            self.calls.lock().unwrap().push(format!("login {}", device.host));
            if self.fail_host.as_deref() == Some(device.host.as_str()) {
                return Err(AppError::Other("auth failed".into()));
            }
            Ok(())
        }

        async fn start_live_playback(&self, device: &NvrDevice) -> AppResult<()> {
            self.calls.lock().unwrap().push(format!("play {}", device.host));
            Ok(())
        }
    }

    fn config() -> NvrConfiguration {
        NvrConfiguration::from_json(
            r#"{ "nvrs": [
                { "host": "192.168.1.64", "type": "hikvision" },
                { "host": "192.168.1.65", "sdk": "dahua" }
            ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_configuration() {
        let config = config();
        assert_eq!(config.nvrs.len(), 2);
        assert_eq!(config.nvrs[0].sdk, "hikvision");
        assert_eq!(config.nvrs[1].sdk, "dahua");
        assert_eq!(NvrConfiguration::from_json("{}").unwrap().nvrs.len(), 0);
    }

    #[tokio::test]
    async fn test_plays_first_device() {
        let manager = RecordingManager::default();
        let device = connect_first_device(&manager, &config()).await.unwrap();

        assert_eq!(device.unwrap().host, "192.168.1.64");
        let calls = manager.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls.last().unwrap(), "play 192.168.1.64");
    }

    #[tokio::test]
    async fn test_empty_configuration() {
        let manager = RecordingManager::default();
        let device = connect_first_device(&manager, &NvrConfiguration::default())
            .await
            .unwrap();
        assert!(device.is_none());
        assert!(manager.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_login_does_not_block_playback() {
        let manager = RecordingManager {
            fail_host: Some("192.168.1.65".into()),
            ..Default::default()
        };
        let results = manager.login_all(&config()).await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());

        let device = connect_first_device(&manager, &config()).await.unwrap();
        assert!(device.is_some());
    }
}
