use crate::feedback::FeedbackChannel;
use crate::model::{ConfigKind, ControllerEvent, UiCommand};
use crate::panel::PanelToggle;
use crate::sync::ControlView;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAction {
    /// Input is a local file path to upload.
    Import,
    /// Input is a single site URL or term.
    Add,
}

/// Text being typed for an import or an add.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: ConfigKind,
    pub action: PromptAction,
    pub input: String,
}

impl Prompt {
    pub fn title(&self) -> String {
        match self.action {
            PromptAction::Import => format!(
                "Import {} from file (Enter to upload, Esc to cancel)",
                self.kind
            ),
            PromptAction::Add => match self.kind {
                ConfigKind::Sites => "Add site URL (Enter to add, Esc to cancel)".into(),
                ConfigKind::Terms => "Add search term (Enter to add, Esc to cancel)".into(),
            },
        }
    }
}

/// What the config panels show before the first fetch completes.
pub type PanelLines = Option<Result<Vec<String>, String>>;

pub struct UiState {
    pub tab: usize,
    pub view: ControlView,
    pub feedback: FeedbackChannel,

    pub sites_panel: PanelToggle,
    pub terms_panel: PanelToggle,
    pub sites: PanelLines,
    pub terms: PanelLines,

    pub results: Option<String>,
    pub activity: Vec<String>,

    pub prompt: Option<Prompt>,
    pub last_exported_path: Option<String>,
}

impl UiState {
    pub fn new(feedback_ttl: Duration) -> Self {
        Self {
            tab: 0,
            view: ControlView::default(),
            feedback: FeedbackChannel::new(feedback_ttl),
            sites_panel: PanelToggle::new("registered sites"),
            terms_panel: PanelToggle::new("current terms"),
            sites: None,
            terms: None,
            results: None,
            activity: Vec::new(),
            prompt: None,
            last_exported_path: None,
        }
    }

    pub fn push_activity(log: &mut Vec<String>, line: String) {
        const MAX: usize = 200;
        log.push(line);
        if log.len() > MAX {
            let _ = log.drain(0..(log.len() - MAX));
        }
    }

    pub fn apply_event(&mut self, ev: ControllerEvent, now: Instant) {
        match ev {
            ControllerEvent::Status { view } => self.view = view,
            ControllerEvent::Feedback { text, success } => {
                Self::push_activity(&mut self.activity, text.clone());
                self.feedback.post(text, success, now);
            }
            ControllerEvent::CompletionEdge => {
                Self::push_activity(&mut self.activity, "Crawl finished".into());
                self.results = Some("Loading results...".into());
            }
            ControllerEvent::ResultsLoaded(summary) => {
                let mut text = format!(
                    "{} article(s) from {}",
                    summary.titles.len(),
                    summary.url
                );
                for title in &summary.titles {
                    text.push_str("\n- ");
                    text.push_str(title);
                }
                self.results = Some(text);
            }
            ControllerEvent::ResultsFailed(reason) => {
                self.results = Some(format!("Results reload failed: {reason}"));
            }
            ControllerEvent::Exported { kind, path } => {
                let shown = path.display().to_string();
                self.feedback.post(
                    format!("Saved {kind} export: {shown} (press 'y' to copy path)"),
                    true,
                    now,
                );
                Self::push_activity(&mut self.activity, format!("Exported {kind} to {shown}"));
                self.last_exported_path = Some(shown);
            }
            ControllerEvent::PanelContent { kind, lines } => match kind {
                ConfigKind::Sites => self.sites = Some(lines),
                ConfigKind::Terms => self.terms = Some(lines),
            },
            ControllerEvent::Reloading => {
                Self::push_activity(&mut self.activity, "Reloading state".into());
            }
        }
    }

    /// Lines a panel renders when expanded.
    pub fn panel_lines(&self, kind: ConfigKind) -> Vec<String> {
        let content = match kind {
            ConfigKind::Sites => &self.sites,
            ConfigKind::Terms => &self.terms,
        };
        match content {
            None => vec!["Loading...".into()],
            Some(Ok(lines)) if lines.is_empty() => vec![format!("No {kind} configured")],
            Some(Ok(lines)) => lines.clone(),
            Some(Err(reason)) => vec![format!("Unavailable: {reason}")],
        }
    }

    pub fn panel(&self, kind: ConfigKind) -> &PanelToggle {
        match kind {
            ConfigKind::Sites => &self.sites_panel,
            ConfigKind::Terms => &self.terms_panel,
        }
    }

    /// Flip a panel, sizing it to its content plus borders.
    pub fn toggle_panel(&mut self, kind: ConfigKind) {
        let natural = u16::try_from(self.panel_lines(kind).len())
            .unwrap_or(u16::MAX)
            .saturating_add(2);
        match kind {
            ConfigKind::Sites => self.sites_panel.toggle(natural),
            ConfigKind::Terms => self.terms_panel.toggle(natural),
        }
    }

    /// Open a prompt. Imports are prefilled with a sensible file name.
    pub fn open_prompt(&mut self, kind: ConfigKind, action: PromptAction) {
        let input = match action {
            PromptAction::Import => format!("{kind}.txt"),
            PromptAction::Add => String::new(),
        };
        self.prompt = Some(Prompt {
            kind,
            action,
            input,
        });
    }

    /// Close the prompt and turn its input into a command, if any text was entered.
    pub fn submit_prompt(&mut self) -> Option<UiCommand> {
        let prompt = self.prompt.take()?;
        let trimmed = prompt.input.trim();
        if trimmed.is_empty() {
            return None;
        }
        let kind = prompt.kind;
        Some(match prompt.action {
            PromptAction::Import => UiCommand::Import {
                kind,
                path: PathBuf::from(trimmed),
            },
            PromptAction::Add => UiCommand::Add {
                kind,
                value: trimmed.to_string(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobStatus, ResultsSummary, StatusSnapshot};
    use crate::sync::reduce;
    use pretty_assertions::assert_eq;

    fn state() -> UiState {
        UiState::new(Duration::from_secs(5))
    }

    #[test]
    fn starts_connecting_with_both_controls_locked() {
        let s = state();
        assert_eq!(s.view.label, "CONNECTING...");
        assert!(!s.view.start_enabled && !s.view.stop_enabled);
        assert!(s.sites_panel.is_collapsed() && s.terms_panel.is_collapsed());
    }

    #[test]
    fn status_event_replaces_view() {
        let mut s = state();
        let view = reduce(&StatusSnapshot {
            status: JobStatus::Running,
            pages_crawled: 1,
            max_pages: 4,
        });
        s.apply_event(ControllerEvent::Status { view: view.clone() }, Instant::now());
        assert_eq!(s.view, view);
    }

    #[test]
    fn feedback_is_shown_until_ttl() {
        let mut s = state();
        let now = Instant::now();
        s.apply_event(
            ControllerEvent::Feedback {
                text: "Crawl started".into(),
                success: true,
            },
            now,
        );
        assert_eq!(
            s.feedback.current(now).map(|m| m.text.as_str()),
            Some("Crawl started")
        );
        assert!(s.feedback.current(now + Duration::from_secs(5)).is_none());
        assert_eq!(s.activity, vec!["Crawl started".to_string()]);
    }

    #[test]
    fn export_remembers_path_for_clipboard() {
        let mut s = state();
        s.apply_event(
            ControllerEvent::Exported {
                kind: ConfigKind::Terms,
                path: PathBuf::from("/tmp/terms_export.txt"),
            },
            Instant::now(),
        );
        assert_eq!(
            s.last_exported_path.as_deref(),
            Some("/tmp/terms_export.txt")
        );
    }

    #[test]
    fn panel_expands_to_content_height() {
        let mut s = state();
        s.apply_event(
            ControllerEvent::PanelContent {
                kind: ConfigKind::Sites,
                lines: Ok(vec!["a.example".into(), "b.example".into(), "c.example".into()]),
            },
            Instant::now(),
        );
        s.toggle_panel(ConfigKind::Sites);
        assert!(!s.sites_panel.is_collapsed());
        assert_eq!(s.sites_panel.height_target(), Some(5));
        assert_eq!(s.sites_panel.label(), "Collapse registered sites");
        // The other panel is untouched.
        assert!(s.terms_panel.is_collapsed());

        s.toggle_panel(ConfigKind::Sites);
        assert!(s.sites_panel.is_collapsed());
        assert_eq!(s.sites_panel.label(), "Show registered sites");
    }

    #[test]
    fn panel_lines_describe_missing_content() {
        let mut s = state();
        assert_eq!(s.panel_lines(ConfigKind::Terms), vec!["Loading...".to_string()]);
        s.terms = Some(Ok(Vec::new()));
        assert_eq!(
            s.panel_lines(ConfigKind::Terms),
            vec!["No terms configured".to_string()]
        );
        s.terms = Some(Err("HTTP 500".into()));
        assert_eq!(
            s.panel_lines(ConfigKind::Terms),
            vec!["Unavailable: HTTP 500".to_string()]
        );
    }

    #[test]
    fn completion_then_results_updates_pane() {
        let mut s = state();
        let now = Instant::now();
        s.apply_event(ControllerEvent::CompletionEdge, now);
        assert_eq!(s.results.as_deref(), Some("Loading results..."));
        s.apply_event(
            ControllerEvent::ResultsLoaded(ResultsSummary {
                url: "http://127.0.0.1:5000/search_articles".into(),
                bytes: 42,
                titles: vec!["Rust 2024 edition".into()],
            }),
            now,
        );
        assert_eq!(
            s.results.as_deref(),
            Some("1 article(s) from http://127.0.0.1:5000/search_articles\n- Rust 2024 edition")
        );
    }

    #[test]
    fn prompt_submit_trims_and_rejects_empty() {
        let mut s = state();
        s.open_prompt(ConfigKind::Sites, PromptAction::Import);
        assert_eq!(s.prompt.as_ref().map(|p| p.input.as_str()), Some("sites.txt"));
        if let Some(p) = s.prompt.as_mut() {
            p.input = "  lists/sites.txt ".into();
        }
        assert_eq!(
            s.submit_prompt(),
            Some(UiCommand::Import {
                kind: ConfigKind::Sites,
                path: PathBuf::from("lists/sites.txt"),
            })
        );
        assert!(s.prompt.is_none());

        s.open_prompt(ConfigKind::Terms, PromptAction::Import);
        if let Some(p) = s.prompt.as_mut() {
            p.input.clear();
        }
        assert_eq!(s.submit_prompt(), None);
    }

    #[test]
    fn add_prompt_starts_empty_and_yields_add_command() {
        let mut s = state();
        s.open_prompt(ConfigKind::Terms, PromptAction::Add);
        let prompt = s.prompt.clone().unwrap();
        assert_eq!(prompt.input, "");
        assert_eq!(
            prompt.title(),
            "Add search term (Enter to add, Esc to cancel)"
        );
        if let Some(p) = s.prompt.as_mut() {
            p.input = " async rust ".into();
        }
        assert_eq!(
            s.submit_prompt(),
            Some(UiCommand::Add {
                kind: ConfigKind::Terms,
                value: "async rust".into(),
            })
        );
    }
}
