//! Polling controller.
//!
//! Owns the poll timer, the edge memory and the request sequence. Network exchanges run in
//! spawned tasks and report back as [`Outcome`]s, so all controller state is touched from
//! the controller task alone.

use super::transfer::{self, Transfer};
use crate::model::{
    ConfigKind, ControlReply, ControllerEvent, JobStatus, MonitorConfig, ResultsSummary,
    StatusSnapshot, UiCommand,
};
use crate::remote::{RemoteError, RemoteJobClient, RemoteResult};
use crate::sync::{reduce, ControlView, EdgeDetector, PollSequencer};
use anyhow::Result;
use std::future::Future;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Result of a spawned network exchange.
#[derive(Debug)]
pub(crate) enum Outcome {
    Status {
        seq: u64,
        result: RemoteResult<StatusSnapshot>,
    },
    Started(RemoteResult<ControlReply>),
    Stopped(RemoteResult<ControlReply>),
    Results(RemoteResult<ResultsSummary>),
    Added {
        kind: ConfigKind,
        value: String,
        result: RemoteResult<()>,
    },
    Transfer(Transfer),
    ReloadDue,
}

pub(crate) struct PollingController {
    cfg: MonitorConfig,
    client: RemoteJobClient,
    edge: EdgeDetector,
    sequencer: PollSequencer,
    last_status: Option<JobStatus>,
    event_tx: UnboundedSender<ControllerEvent>,
    outcome_tx: UnboundedSender<Outcome>,
}

impl PollingController {
    pub fn new(
        cfg: MonitorConfig,
        client: RemoteJobClient,
        event_tx: UnboundedSender<ControllerEvent>,
    ) -> (Self, UnboundedReceiver<Outcome>) {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let ctl = Self {
            cfg,
            client,
            edge: EdgeDetector::new(),
            sequencer: PollSequencer::new(),
            last_status: None,
            event_tx,
            outcome_tx,
        };
        (ctl, outcome_rx)
    }

    fn emit(&self, ev: ControllerEvent) {
        let _ = self.event_tx.send(ev);
    }

    fn notify(&self, text: impl Into<String>, success: bool) {
        self.emit(ControllerEvent::Feedback {
            text: text.into(),
            success,
        });
    }

    fn render(&self, view: ControlView) {
        self.emit(ControllerEvent::Status { view });
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        let tx = self.outcome_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(fut.await);
        });
    }

    /// Issue a status fetch. Its answer only applies if no newer fetch is issued meanwhile.
    pub fn request_status(&mut self) {
        let seq = self.sequencer.issue();
        debug!(seq, "status poll issued");
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.fetch_status().await;
            Outcome::Status { seq, result }
        });
    }

    fn reload_results(&self) {
        let client = self.client.clone();
        let query = self.cfg.search_query.clone();
        self.spawn(async move { Outcome::Results(client.search_results(query.as_deref()).await) });
    }

    pub fn reload_panels(&self) {
        for kind in ConfigKind::ALL {
            let client = self.client.clone();
            self.spawn(async move {
                let outcome = transfer::list_entries(&client, kind).await;
                Outcome::Transfer(Transfer::Listed { kind, outcome })
            });
        }
    }

    pub fn handle_command(&mut self, cmd: UiCommand) {
        match cmd {
            UiCommand::Start => {
                info!("start requested");
                self.render(ControlView::transitional("STARTING...", true));
                self.notify("Starting the crawler...", true);
                let client = self.client.clone();
                self.spawn(async move { Outcome::Started(client.start_job().await) });
            }
            UiCommand::Stop => {
                info!("stop requested");
                self.render(ControlView::transitional("STOPPING...", false));
                self.notify("Stop command sent...", true);
                let client = self.client.clone();
                self.spawn(async move { Outcome::Stopped(client.stop_job().await) });
            }
            #[cfg(feature = "tui")]
            UiCommand::Refresh => self.request_status(),
            UiCommand::Import { kind, path } => self.start_import(kind, path),
            UiCommand::Add { kind, value } => self.start_add(kind, value),
            UiCommand::Export { kind } => {
                info!(%kind, "export requested");
                let client = self.client.clone();
                let dir = self.cfg.export_dir.clone();
                self.spawn(async move {
                    let outcome = transfer::export_to_dir(&client, kind, &dir).await;
                    Outcome::Transfer(Transfer::Exported { kind, outcome })
                });
            }
            // The run loop exits on Quit before dispatching here.
            UiCommand::Quit => {}
        }
    }

    fn start_import(&self, kind: ConfigKind, path: PathBuf) {
        info!(%kind, path = %path.display(), "import requested");
        let client = self.client.clone();
        self.spawn(async move {
            let outcome = transfer::import_file(&client, kind, &path).await;
            Outcome::Transfer(Transfer::Imported { kind, outcome })
        });
    }

    fn start_add(&self, kind: ConfigKind, value: String) {
        let value = value.trim().to_string();
        if value.is_empty() {
            self.notify(format!("Nothing to add to {kind}"), false);
            return;
        }
        info!(%kind, %value, "add requested");
        let client = self.client.clone();
        self.spawn(async move {
            let result = client.add_entry(kind, &value).await;
            Outcome::Added {
                kind,
                value,
                result,
            }
        });
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Status { seq, result } => self.apply_status(seq, result),
            Outcome::Started(result) => {
                match result {
                    Ok(reply) => self.notify(reply.status, true),
                    Err(RemoteError::Acceptance { code, message }) => {
                        warn!(code, %message, "start not accepted");
                        self.notify(format!("Could not start: {message}"), false);
                    }
                    Err(e) => {
                        warn!(error = %e, "start failed");
                        self.render(ControlView::transitional("START FAILED", false));
                        self.notify(format!("Failed to start the crawler: {e}"), false);
                    }
                }
                self.request_status();
            }
            Outcome::Stopped(result) => {
                match result {
                    Ok(reply) => self.notify(reply.status, true),
                    Err(e) => {
                        warn!(error = %e, "stop failed");
                        self.render(ControlView::transitional("STOP FAILED", false));
                        self.notify(format!("Failed to stop the crawler: {e}"), false);
                    }
                }
                // An acknowledged stop says nothing about the job having stopped.
                self.request_status();
            }
            Outcome::Results(result) => match result {
                Ok(summary) => {
                    info!(
                        url = %summary.url,
                        articles = summary.titles.len(),
                        "results reloaded"
                    );
                    self.emit(ControllerEvent::ResultsLoaded(summary));
                }
                Err(e) => {
                    warn!(error = %e, "results reload failed");
                    self.notify(format!("Could not load results: {e}"), false);
                    self.emit(ControllerEvent::ResultsFailed(e.to_string()));
                }
            },
            Outcome::Added {
                kind,
                value,
                result,
            } => match result {
                Ok(()) => {
                    self.notify(format!("Added to {kind}: {value}"), true);
                    self.reload_panels();
                }
                Err(e) => {
                    warn!(%kind, error = %e, "add failed");
                    self.notify(format!("Error adding to {kind}: {e}"), false);
                }
            },
            Outcome::Transfer(t) => self.apply_transfer(t),
            Outcome::ReloadDue => {
                info!("reloading state");
                self.emit(ControllerEvent::Reloading);
                self.request_status();
                self.reload_panels();
                self.reload_results();
            }
        }
    }

    fn apply_status(&mut self, seq: u64, result: RemoteResult<StatusSnapshot>) {
        if !self.sequencer.is_current(seq) {
            debug!(seq, "dropping stale status response");
            return;
        }
        match result {
            Ok(snapshot) => {
                let view = reduce(&snapshot);
                let completed = self.edge.observe(snapshot.status);
                if snapshot.status == JobStatus::Error && self.last_status != Some(JobStatus::Error)
                {
                    warn!("crawler reports an error state");
                    self.notify("The crawler reported an error.", false);
                }
                self.last_status = Some(snapshot.status);
                self.render(view);
                if completed {
                    info!("crawl finished; reloading results");
                    self.emit(ControllerEvent::CompletionEdge);
                    self.reload_results();
                }
            }
            // Not an observation: edge memory is left alone.
            Err(e) => {
                warn!(seq, error = %e, "status poll failed");
                self.render(ControlView::unreachable());
                if e.is_transport() {
                    self.notify(
                        format!("Cannot reach the crawler at {}", self.cfg.base_url),
                        false,
                    );
                } else {
                    self.notify(format!("Status check failed: {e}"), false);
                }
            }
        }
    }

    fn apply_transfer(&mut self, t: Transfer) {
        match t {
            Transfer::Imported { kind, outcome } => match outcome {
                Ok(reply) => {
                    self.notify(reply.status, reply.success);
                    if reply.success {
                        let delay = self.cfg.reload_delay;
                        self.spawn(async move {
                            tokio::time::sleep(delay).await;
                            Outcome::ReloadDue
                        });
                    }
                }
                Err(e) => {
                    warn!(%kind, error = %e, "import failed");
                    self.notify(format!("Error importing {kind}: {e}"), false);
                }
            },
            Transfer::Exported { kind, outcome } => match outcome {
                Ok(path) => {
                    info!(%kind, path = %path.display(), "export saved");
                    self.emit(ControllerEvent::Exported { kind, path });
                }
                Err(e) => {
                    warn!(%kind, error = %e, "export failed");
                    self.notify(format!("Error exporting {kind}: {e}"), false);
                }
            },
            Transfer::Listed { kind, outcome } => {
                if let Err(e) = &outcome {
                    debug!(%kind, error = %e, "panel listing unavailable");
                }
                self.emit(ControllerEvent::PanelContent {
                    kind,
                    lines: outcome.map_err(|e| e.to_string()),
                });
            }
        }
    }
}

/// Run the poll loop until a `Quit` command arrives or every command sender is dropped.
pub(crate) async fn run_controller(
    cfg: MonitorConfig,
    client: RemoteJobClient,
    event_tx: UnboundedSender<ControllerEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(cfg.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let (mut ctl, mut outcome_rx) = PollingController::new(cfg, client, event_tx);
    ctl.reload_panels();

    loop {
        tokio::select! {
            // First tick completes immediately.
            _ = ticker.tick() => ctl.request_status(),
            cmd = cmd_rx.recv() => match cmd {
                Some(UiCommand::Quit) | None => {
                    info!("controller shutting down");
                    break;
                }
                Some(cmd) => ctl.handle_command(cmd),
            },
            Some(outcome) = outcome_rx.recv() => ctl.apply(outcome),
        }
    }

    Ok(())
}
