//! Line formatting for text mode.
//!
//! Each controller event becomes at most one entry; a results reload lists its articles
//! underneath. Status views are only printed when they differ from the last one, so an idle
//! crawler does not flood the terminal every tick.

use crate::model::ControllerEvent;
use crate::sync::ControlView;

/// Which stream a line belongs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TextLine {
    Stdout(String),
    Stderr(String),
}

#[derive(Debug, Default)]
pub(crate) struct TextFormatter {
    last_view: Option<ControlView>,
}

impl TextFormatter {
    pub fn format(&mut self, ev: &ControllerEvent) -> Option<TextLine> {
        let line = match ev {
            ControllerEvent::Status { view } => {
                if self.last_view.as_ref() == Some(view) {
                    return None;
                }
                self.last_view = Some(view.clone());
                TextLine::Stdout(describe_view(view))
            }
            ControllerEvent::Feedback { text, success } => {
                if *success {
                    TextLine::Stdout(format!("ok: {text}"))
                } else {
                    TextLine::Stderr(format!("error: {text}"))
                }
            }
            ControllerEvent::CompletionEdge => {
                TextLine::Stdout("Crawl finished. Loading results...".into())
            }
            ControllerEvent::ResultsLoaded(summary) => {
                let mut line = format!(
                    "Results reloaded: {} article(s) from {} ({} bytes)",
                    summary.titles.len(),
                    summary.url,
                    summary.bytes
                );
                for title in &summary.titles {
                    line.push_str("\n  - ");
                    line.push_str(title);
                }
                TextLine::Stdout(line)
            }
            ControllerEvent::ResultsFailed(reason) => {
                TextLine::Stderr(format!("Results reload failed: {reason}"))
            }
            ControllerEvent::Exported { kind, path } => {
                TextLine::Stdout(format!("Saved {kind} export: {}", path.display()))
            }
            ControllerEvent::PanelContent { kind, lines } => match lines {
                Ok(entries) => TextLine::Stdout(format!("{} {kind} configured", entries.len())),
                Err(reason) => TextLine::Stderr(format!("{kind} list unavailable: {reason}")),
            },
            ControllerEvent::Reloading => TextLine::Stdout("Reloading state...".into()),
        };
        Some(line)
    }
}

fn describe_view(view: &ControlView) -> String {
    let on_off = |b: bool| if b { "on" } else { "off" };
    let mut line = view.label.clone();
    if view.progress_visible {
        line.push(' ');
        line.push_str(&view.progress_label);
    }
    line.push_str(&format!(
        " [start: {}, stop: {}]",
        on_off(view.start_enabled),
        on_off(view.stop_enabled)
    ));
    line
}

/// Local wall-clock prefix for a line.
pub(crate) fn timestamp() -> String {
    let fmt = time::macros::format_description!("[hour]:[minute]:[second]");
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .format(fmt)
        .unwrap_or_else(|_| "--:--:--".into())
}
