//! Type definitions for stream-saver
//!
//! Source of truth for all data structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamSaverError};

// ============================================
// Session Types
// ============================================

/// Unlock state of the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Session {
    pub authenticated: bool,
}

/// Backend reachability as last observed by the health monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectivityStatus {
    /// No probe has completed yet
    #[default]
    Checking,
    Connected,
    Disconnected,
}

impl ConnectivityStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Checking => "Checking",
            Self::Connected => "Online",
            Self::Disconnected => "Offline",
        }
    }
}

// ============================================
// Link Types
// ============================================

/// Platform guessed from the URL text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformTag {
    YouTube,
    Instagram,
    Twitter,
    TikTok,
    Facebook,
    /// Non-empty text that matched no known platform
    Unknown,
    /// Empty URL text
    #[default]
    None,
}

impl PlatformTag {
    pub fn label(&self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Instagram => "Instagram",
            Self::Twitter => "Twitter",
            Self::TikTok => "TikTok",
            Self::Facebook => "Facebook",
            Self::Unknown => "Link",
            Self::None => "",
        }
    }
}

// ============================================
// Analysis Types
// ============================================

/// A downloadable variant offered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOption {
    /// Key sent back to `/download`
    pub id: String,
    /// e.g. "Video", "Audio Only", "720p"
    pub quality: String,
    pub ext: String,
    /// "video" or "audio" when the backend says so
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl FormatOption {
    /// Display glyph: video, audio, or ringtone
    pub fn glyph(&self) -> &'static str {
        match self.id.as_str() {
            "mp4" => "🎬",
            "mp3" => "🎵",
            _ => "🔔",
        }
    }
}

/// Successful payload of `POST /analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Canonical media reference, preferred over the typed URL for downloads
    #[serde(default)]
    pub resolved_url: Option<String>,
    pub formats: Vec<FormatOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// e.g. "3:45"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Extractor name reported by the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

/// Transient request bookkeeping owned by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub loading: bool,
    pub error: Option<String>,
    pub downloading_format_id: Option<String>,
}

// ============================================
// Download Types
// ============================================

/// A concrete download handed to a launcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Fully built `/download?url=..&format=..` address
    pub url: String,
    pub format_id: String,
}

/// How a selected format is turned into a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DownloadMode {
    /// Hand the URL to the system opener
    #[default]
    Open,
    /// Stream the file into the download directory
    Save,
}

// ============================================
// Config Types
// ============================================

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the extraction backend
    pub backend_url: String,
    /// Shared secret that unlocks the client
    pub access_code: String,
    pub health_interval_ms: u64,
    pub probe_timeout_ms: u64,
    pub analyze_timeout_ms: u64,
    /// How long format selection stays disabled after a download starts
    pub download_cooldown_ms: u64,
    pub download_mode: DownloadMode,
    /// Empty means the platform Downloads directory
    pub download_dir: String,
    /// Editor command (default: "nvim")
    pub editor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".into(),
            access_code: "1512".into(),
            health_interval_ms: 5_000,
            probe_timeout_ms: 5_000,
            analyze_timeout_ms: 60_000,
            download_cooldown_ms: 4_000,
            download_mode: DownloadMode::default(),
            download_dir: String::new(),
            editor: "nvim".into(),
        }
    }
}

impl Config {
    pub fn health_interval(&self) -> Duration {
        Duration::from_millis(self.health_interval_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn analyze_timeout(&self) -> Duration {
        Duration::from_millis(self.analyze_timeout_ms)
    }

    pub fn download_cooldown(&self) -> Duration {
        Duration::from_millis(self.download_cooldown_ms)
    }

    /// Reject values the client cannot run with
    pub fn validate(&self) -> Result<()> {
        let url = self.backend_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StreamSaverError::InvalidConfig(format!(
                "backend_url must start with http:// or https://, got {:?}",
                self.backend_url
            )));
        }
        if self.access_code.is_empty() {
            return Err(StreamSaverError::InvalidConfig(
                "access_code must not be empty".into(),
            ));
        }
        let durations = [
            ("health_interval_ms", self.health_interval_ms),
            ("probe_timeout_ms", self.probe_timeout_ms),
            ("analyze_timeout_ms", self.analyze_timeout_ms),
            ("download_cooldown_ms", self.download_cooldown_ms),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, ms)| *ms == 0) {
            return Err(StreamSaverError::InvalidConfig(format!(
                "{} must be greater than zero",
                name
            )));
        }
        Ok(())
    }
}

// ============================================
// UI Types
// ============================================

/// Item displayed in selector menu
#[derive(Debug, Clone)]
pub struct MenuItem<T> {
    /// Display text
    pub label: String,
    /// Underlying value
    pub value: T,
}

/// Terminal screen state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Waiting for the access code
    Locked,
    /// Waiting for a URL
    Idle,
    /// Submitting the URL for analysis
    Analyze,
    /// Picking a format from the last result
    Choose,
    Exit,
}
