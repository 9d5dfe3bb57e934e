use crate::model::{JobStatus, StatusSnapshot};
use serde::Serialize;

const IDLE_PROGRESS_LABEL: &str = "0%";

/// Everything the presentation layer needs to draw the control strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControlView {
    pub label: String,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub progress_visible: bool,
    pub progress_percent: u8,
    pub progress_label: String,
}

impl ControlView {
    /// View shown while a start/stop command is in flight: both controls locked.
    pub fn transitional(label: &str, show_progress: bool) -> Self {
        Self {
            label: label.to_string(),
            start_enabled: false,
            stop_enabled: false,
            progress_visible: show_progress,
            progress_percent: 0,
            progress_label: IDLE_PROGRESS_LABEL.to_string(),
        }
    }

    /// View shown when the status endpoint could not be reached.
    pub fn unreachable() -> Self {
        Self {
            label: JobStatus::Error.as_label().to_string(),
            start_enabled: true,
            stop_enabled: true,
            progress_visible: false,
            progress_percent: 0,
            progress_label: IDLE_PROGRESS_LABEL.to_string(),
        }
    }
}

impl Default for ControlView {
    fn default() -> Self {
        Self::transitional("CONNECTING...", false)
    }
}

/// Map a status snapshot to the view it should produce.
pub fn reduce(snapshot: &StatusSnapshot) -> ControlView {
    let running = snapshot.status == JobStatus::Running;
    let progress_visible = matches!(snapshot.status, JobStatus::Running | JobStatus::Stopping);
    let percent = progress_percent(snapshot.pages_crawled, snapshot.max_pages);

    let progress_label = if progress_visible {
        format!(
            "{percent}% ({}/{})",
            snapshot.pages_crawled, snapshot.max_pages
        )
    } else {
        IDLE_PROGRESS_LABEL.to_string()
    };

    ControlView {
        label: snapshot.status.as_label().to_string(),
        // A stalled or failed job stays both startable and stoppable.
        start_enabled: !running,
        stop_enabled: true,
        progress_visible,
        progress_percent: percent,
        progress_label,
    }
}

fn progress_percent(pages_crawled: u64, max_pages: u64) -> u8 {
    if max_pages == 0 {
        return 0;
    }
    let pct = (pages_crawled as f64 / max_pages as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snap(status: JobStatus, pages_crawled: u64, max_pages: u64) -> StatusSnapshot {
        StatusSnapshot {
            status,
            pages_crawled,
            max_pages,
        }
    }

    #[test]
    fn running_locks_start_and_shows_progress() {
        let view = reduce(&snap(JobStatus::Running, 5, 10));
        assert_eq!(
            view,
            ControlView {
                label: "RUNNING".into(),
                start_enabled: false,
                stop_enabled: true,
                progress_visible: true,
                progress_percent: 50,
                progress_label: "50% (5/10)".into(),
            }
        );
    }

    #[test]
    fn every_other_status_enables_both_controls() {
        for status in [
            JobStatus::Idle,
            JobStatus::Stopping,
            JobStatus::Stopped,
            JobStatus::Error,
        ] {
            let view = reduce(&snap(status, 3, 10));
            assert!(view.start_enabled, "{status} should allow start");
            assert!(view.stop_enabled, "{status} should allow stop");
            assert_eq!(view.label, status.as_label());
        }
    }

    #[test]
    fn progress_only_visible_while_running_or_stopping() {
        assert!(reduce(&snap(JobStatus::Stopping, 9, 10)).progress_visible);
        let stopped = reduce(&snap(JobStatus::Stopped, 10, 10));
        assert!(!stopped.progress_visible);
        assert_eq!(stopped.progress_label, "0%");
    }

    #[test]
    fn zero_max_pages_reports_zero_percent() {
        let view = reduce(&snap(JobStatus::Running, 42, 0));
        assert_eq!(view.progress_percent, 0);
        assert_eq!(view.progress_label, "0% (42/0)");
    }

    #[test]
    fn percent_is_rounded_and_clamped() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 200), 1);
        assert_eq!(progress_percent(25, 10), 100);
        assert_eq!(progress_percent(u64::MAX, 1), 100);
    }

    #[test]
    fn transitional_view_locks_both_controls() {
        let view = ControlView::transitional("STARTING...", true);
        assert!(!view.start_enabled);
        assert!(!view.stop_enabled);
        assert!(view.progress_visible);
        assert_eq!(view.progress_percent, 0);
    }
}
