use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::sync::ControlView;

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub base_url: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Only the TUI expires notifications; text mode prints each one once.
    #[cfg(feature = "tui")]
    pub feedback_ttl: Duration,
    pub reload_delay: Duration,
    pub export_dir: PathBuf,
    pub search_query: Option<String>,
    pub user_agent: String,
}

#[cfg(test)]
impl MonitorConfig {
    pub fn for_tests(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            poll_interval: Duration::from_millis(200),
            request_timeout: Duration::from_millis(150),
            #[cfg(feature = "tui")]
            feedback_ttl: Duration::from_secs(5),
            reload_delay: Duration::from_millis(20),
            export_dir: std::env::temp_dir(),
            search_query: None,
            user_agent: "crawl-monitor-tests".into(),
        }
    }
}

/// Lifecycle state reported by the remote crawler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum JobStatus {
    Idle,
    Running,
    Stopping,
    Stopped,
    Error,
}

impl JobStatus {
    pub fn as_label(self) -> &'static str {
        match self {
            JobStatus::Idle => "IDLE",
            JobStatus::Running => "RUNNING",
            JobStatus::Stopping => "STOPPING",
            JobStatus::Stopped => "STOPPED",
            JobStatus::Error => "ERROR",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IDLE" => Ok(JobStatus::Idle),
            "RUNNING" => Ok(JobStatus::Running),
            "STOPPING" => Ok(JobStatus::Stopping),
            "STOPPED" => Ok(JobStatus::Stopped),
            "ERROR" => Ok(JobStatus::Error),
            other => Err(format!("unknown job status {other:?}")),
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = String;

    // `Self::Error` would collide with the `Error` variant.
    fn try_from(value: String) -> Result<Self, String> {
        value.parse()
    }
}

impl From<JobStatus> for String {
    fn from(value: JobStatus) -> Self {
        value.as_label().to_string()
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Body of `GET /scraper_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: JobStatus,
    #[serde(default)]
    pub pages_crawled: u64,
    #[serde(default)]
    pub max_pages: u64,
}

/// Body of the start/stop endpoints and of every `{status}` error payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ControlReply {
    pub status: String,
}

/// Body of the import endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ImportReply {
    #[serde(default)]
    pub success: bool,
    pub status: String,
}

/// The two configuration sets the crawler exposes for import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Sites,
    Terms,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 2] = [ConfigKind::Sites, ConfigKind::Terms];

    pub fn import_path(self) -> &'static str {
        match self {
            ConfigKind::Sites => "/import_sites",
            ConfigKind::Terms => "/import_terms",
        }
    }

    pub fn export_path(self) -> &'static str {
        match self {
            ConfigKind::Sites => "/export_sites",
            ConfigKind::Terms => "/export_terms",
        }
    }

    /// Endpoint that appends a single entry.
    pub fn add_path(self) -> &'static str {
        match self {
            ConfigKind::Sites => "/add_site",
            ConfigKind::Terms => "/add_term",
        }
    }

    /// Form field the add endpoint reads the entry from.
    pub fn add_field(self) -> &'static str {
        match self {
            ConfigKind::Sites => "url",
            ConfigKind::Terms => "term",
        }
    }

    /// Fixed filename an export is saved under.
    pub fn export_filename(self) -> &'static str {
        match self {
            ConfigKind::Sites => "sites_export.txt",
            ConfigKind::Terms => "terms_export.txt",
        }
    }
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Sites => f.write_str("sites"),
            ConfigKind::Terms => f.write_str("terms"),
        }
    }
}

/// What the results reload fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsSummary {
    pub url: String,
    pub bytes: usize,
    /// Article titles listed on the results page, in page order.
    pub titles: Vec<String>,
}

/// Commands emitted by UI layers to drive the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Start,
    Stop,
    /// Only the TUI has a key for an out-of-band poll.
    #[cfg(feature = "tui")]
    Refresh,
    Import { kind: ConfigKind, path: PathBuf },
    Add { kind: ConfigKind, value: String },
    Export { kind: ConfigKind },
    Quit,
}

/// Events the controller emits for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    /// Full view to render; every event replaces the previous view.
    Status { view: ControlView },
    /// One-line notification for the feedback slot.
    Feedback { text: String, success: bool },
    /// The job was observed running and is now stopped; results are reloading.
    CompletionEdge,
    ResultsLoaded(ResultsSummary),
    ResultsFailed(String),
    Exported { kind: ConfigKind, path: PathBuf },
    /// Current contents of a configuration list, or the reason it is unavailable.
    PanelContent {
        kind: ConfigKind,
        lines: Result<Vec<String>, String>,
    },
    /// A full state reload was triggered (after a successful import).
    Reloading,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_body_decodes_any_case() {
        let snap: StatusSnapshot =
            serde_json::from_str(r#"{"status":"error","pages_crawled":3,"max_pages":10}"#)
                .unwrap();
        assert_eq!(snap.status, JobStatus::Error);
        let snap: StatusSnapshot = serde_json::from_str(r#"{"status":" Running "}"#).unwrap();
        assert_eq!(
            snap,
            StatusSnapshot {
                status: JobStatus::Running,
                pages_crawled: 0,
                max_pages: 0,
            }
        );
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        let err = serde_json::from_str::<StatusSnapshot>(r#"{"status":"PAUSED"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown job status \"PAUSED\""));
        assert_eq!(
            JobStatus::try_from("paused".to_string()),
            Err("unknown job status \"PAUSED\"".to_string())
        );
    }

    #[test]
    fn status_serializes_as_label() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Stopping).unwrap(),
            "\"STOPPING\""
        );
    }
}
