use crate::logging::{self, LogTarget};
use crate::model::{ConfigKind, ControllerEvent, MonitorConfig, UiCommand};
use crate::orchestrator;
use crate::remote::RemoteJobClient;
use crate::text_summary::{timestamp, TextFormatter, TextLine};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "crawl-monitor",
    version,
    about = "Start, stop and watch a remote crawler job, with an optional TUI"
)]
pub struct Cli {
    /// Base URL of the crawler's web server
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    pub base_url: String,

    /// How often the job status is polled
    #[arg(long, default_value = "3s")]
    pub poll_interval: humantime::Duration,

    /// Timeout for each HTTP request (must not exceed the poll interval)
    #[arg(long, default_value = "2500ms")]
    pub request_timeout: humantime::Duration,

    /// How long a notification stays on screen
    #[arg(long, default_value = "5s")]
    pub feedback_ttl: humantime::Duration,

    /// Delay between a successful import and the state reload
    #[arg(long, default_value = "1s")]
    pub reload_delay: humantime::Duration,

    /// Directory exports are saved into (defaults to the download directory)
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Query for the results search run when a crawl finishes, as raw key=value pairs joined
    /// by '&' (e.g. "order_by=date_desc&q=rust"); values are percent-encoded when sent
    #[arg(long)]
    pub search_query: Option<String>,

    /// Watch the job and print status changes as text (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Print the current status as JSON and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Send a start command as soon as the controller is up
    #[arg(long)]
    pub start_on_launch: bool,

    /// Text mode: exit once a finished crawl's results have been reloaded
    #[arg(long)]
    pub exit_on_completion: bool,

    /// Import a sites list from this file at launch
    #[arg(long, value_name = "PATH")]
    pub import_sites: Option<PathBuf>,

    /// Import a terms list from this file at launch
    #[arg(long, value_name = "PATH")]
    pub import_terms: Option<PathBuf>,

    /// Add one site URL at launch (repeatable)
    #[arg(long, value_name = "URL")]
    pub add_site: Vec<String>,

    /// Add one search term at launch (repeatable)
    #[arg(long, value_name = "TERM")]
    pub add_term: Vec<String>,

    /// Export the sites list at launch
    #[arg(long)]
    pub export_sites: bool,

    /// Export the terms list at launch
    #[arg(long)]
    pub export_terms: bool,

    /// Append logs to this file (the TUI logs nowhere otherwise)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    fn headless(&self) -> bool {
        self.text || self.json || !cfg!(feature = "tui")
    }
}

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args)?;

    let target = match args.log_file.as_deref() {
        Some(path) => LogTarget::File(path),
        None if args.headless() => LogTarget::Stderr,
        None => LogTarget::Off,
    };
    logging::init_logging(&args.log_level, target)?;

    if args.json {
        return run_status_json(&cfg).await;
    }

    if !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args, cfg).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args, cfg).await;
        }
    }

    run_text(args, cfg).await
}

/// Build a `MonitorConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> Result<MonitorConfig> {
    if args.json && args.text {
        anyhow::bail!("--json and --text are mutually exclusive");
    }
    if !(args.base_url.starts_with("http://") || args.base_url.starts_with("https://")) {
        anyhow::bail!("--base-url must be an http:// or https:// URL");
    }

    let poll_interval = Duration::from(args.poll_interval);
    let request_timeout = Duration::from(args.request_timeout);
    if poll_interval.is_zero() || request_timeout.is_zero() {
        anyhow::bail!("--poll-interval and --request-timeout must be greater than zero");
    }
    if Duration::from(args.feedback_ttl).is_zero() {
        anyhow::bail!("--feedback-ttl must be greater than zero");
    }
    // Only the newest poll is applied, so a poll must be able to finish before the next.
    if request_timeout > poll_interval {
        anyhow::bail!(
            "--request-timeout ({}) must not exceed --poll-interval ({})",
            args.request_timeout,
            args.poll_interval
        );
    }

    let export_dir = args
        .export_dir
        .clone()
        .or_else(dirs::download_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(MonitorConfig {
        base_url: args.base_url.clone(),
        poll_interval,
        request_timeout,
        #[cfg(feature = "tui")]
        feedback_ttl: Duration::from(args.feedback_ttl),
        reload_delay: Duration::from(args.reload_delay),
        export_dir,
        search_query: args.search_query.clone(),
        user_agent: format!("crawl-monitor/{}", env!("CARGO_PKG_VERSION")),
    })
}

/// Commands queued before the controller starts: imports, adds, exports, then start.
pub fn initial_commands(args: &Cli) -> Vec<UiCommand> {
    let mut cmds = Vec::new();
    if let Some(path) = args.import_sites.clone() {
        cmds.push(UiCommand::Import {
            kind: ConfigKind::Sites,
            path,
        });
    }
    if let Some(path) = args.import_terms.clone() {
        cmds.push(UiCommand::Import {
            kind: ConfigKind::Terms,
            path,
        });
    }
    for value in &args.add_site {
        cmds.push(UiCommand::Add {
            kind: ConfigKind::Sites,
            value: value.clone(),
        });
    }
    for value in &args.add_term {
        cmds.push(UiCommand::Add {
            kind: ConfigKind::Terms,
            value: value.clone(),
        });
    }
    if args.export_sites {
        cmds.push(UiCommand::Export {
            kind: ConfigKind::Sites,
        });
    }
    if args.export_terms {
        cmds.push(UiCommand::Export {
            kind: ConfigKind::Terms,
        });
    }
    if args.start_on_launch {
        cmds.push(UiCommand::Start);
    }
    cmds
}

async fn run_status_json(cfg: &MonitorConfig) -> Result<()> {
    let client = RemoteJobClient::new(cfg)?;
    let snapshot = client
        .fetch_status()
        .await
        .context("fetch crawler status")?;
    let out = serde_json::json!({
        "snapshot": snapshot,
        "view": crate::sync::reduce(&snapshot),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run_text(args: Cli, cfg: MonitorConfig) -> Result<()> {
    let client = RemoteJobClient::new(&cfg)?;
    let (out_tx, out_handle) = spawn_output_writer();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    for cmd in initial_commands(&args) {
        let _ = cmd_tx.send(cmd);
    }

    let controller = tokio::spawn(orchestrator::run_controller(
        cfg, client, event_tx, cmd_rx,
    ));

    let mut formatter = TextFormatter::default();
    let mut awaiting_results = false;

    loop {
        tokio::select! {
            ev = event_rx.recv() => {
                // Closed once the controller has shut down.
                let Some(ev) = ev else { break };
                let results_done = awaiting_results
                    && matches!(
                        ev,
                        ControllerEvent::ResultsLoaded(_) | ControllerEvent::ResultsFailed(_)
                    );
                if matches!(ev, ControllerEvent::CompletionEdge) {
                    awaiting_results = true;
                }
                if let Some(line) = formatter.format(&ev) {
                    let routed = match line {
                        TextLine::Stdout(msg) => OutputLine::Stdout(format!("[{}] {msg}", timestamp())),
                        TextLine::Stderr(msg) => OutputLine::Stderr(format!("[{}] {msg}", timestamp())),
                    };
                    let _ = out_tx.send(routed);
                }
                if results_done {
                    awaiting_results = false;
                    if args.exit_on_completion {
                        let _ = cmd_tx.send(UiCommand::Quit);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = cmd_tx.send(UiCommand::Quit);
            }
        }
    }

    controller.await.context("controller task failed")??;
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["crawl-monitor"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn defaults_match_reference_cadence() {
        let cfg = build_config(&parse(&["--export-dir", "/tmp/out"])).unwrap();
        assert_eq!(cfg.poll_interval, Duration::from_secs(3));
        #[cfg(feature = "tui")]
        assert_eq!(cfg.feedback_ttl, Duration::from_secs(5));
        assert_eq!(cfg.reload_delay, Duration::from_secs(1));
        assert_eq!(cfg.export_dir, PathBuf::from("/tmp/out"));
        assert!(cfg.user_agent.starts_with("crawl-monitor/"));
    }

    #[test]
    fn timeout_longer_than_interval_is_rejected() {
        let args = parse(&["--poll-interval", "1s", "--request-timeout", "2s"]);
        let err = build_config(&args).unwrap_err();
        assert!(err.to_string().contains("--request-timeout"));
    }

    #[test]
    fn json_and_text_are_exclusive() {
        assert!(build_config(&parse(&["--json", "--text"])).is_err());
    }

    #[test]
    fn zero_feedback_ttl_is_rejected() {
        let err = build_config(&parse(&["--feedback-ttl", "0s"])).unwrap_err();
        assert!(err.to_string().contains("--feedback-ttl"));
    }

    #[test]
    fn base_url_needs_a_scheme() {
        assert!(build_config(&parse(&["--base-url", "localhost:5000"])).is_err());
    }

    #[test]
    fn launch_commands_queue_transfers_before_start() {
        let args = parse(&[
            "--start-on-launch",
            "--export-terms",
            "--import-sites",
            "sites.txt",
            "--add-term",
            "rust",
            "--add-term",
            "tokio",
        ]);
        assert_eq!(
            initial_commands(&args),
            vec![
                UiCommand::Import {
                    kind: ConfigKind::Sites,
                    path: PathBuf::from("sites.txt"),
                },
                UiCommand::Add {
                    kind: ConfigKind::Terms,
                    value: "rust".into(),
                },
                UiCommand::Add {
                    kind: ConfigKind::Terms,
                    value: "tokio".into(),
                },
                UiCommand::Export {
                    kind: ConfigKind::Terms
                },
                UiCommand::Start,
            ]
        );
    }
}
