//! Interaction Recorder CLI
//!
//! Replays scripted interaction scenarios through the recorder and prints
//! the normalized records as JSON lines.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use interaction_recorder::{
    config::{RecorderConfig, VIEWPORT_RESIZE_THROTTLE},
    core::{Callbacks, HookSet, ManualScheduler, Scheduler, TokioScheduler},
    host::Document,
    scenario::{apply, delay_until, Scenario, SceneNodes},
    sink::{ChannelSink, Envelope, DEFAULT_CAPACITY},
    transparency::create_shared_log,
    Recorder, VERSION,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "interaction-recorder")]
#[command(version = VERSION)]
#[command(about = "Normalize interface change notifications into replayable records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario and print the recorded events
    Record {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Run steps on the wall clock instead of virtual time
        #[arg(long)]
        realtime: bool,

        /// Print session statistics when done
        #[arg(long)]
        stats: bool,

        /// Configuration file (defaults to the user config)
        #[arg(long, short)]
        config: Option<PathBuf>,
    },

    /// Show configuration
    Config,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the records.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interaction_recorder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Record {
            scenario,
            realtime,
            stats,
            config,
        } => cmd_record(&scenario, realtime, stats, config.as_deref()),
        Commands::Config => cmd_config(),
        Commands::Init { force } => cmd_init(force),
    }
}

fn cmd_record(
    scenario_path: &Path,
    realtime: bool,
    show_stats: bool,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => RecorderConfig::load_from(path)
            .with_context(|| format!("Could not load config from {path:?}"))?,
        None => RecorderConfig::load().context("Could not load config")?,
    };
    let scenario = Scenario::load(scenario_path)?;

    let doc = Document::new();
    let scene = scenario.build(&doc)?;

    let log = create_shared_log();
    let (sink, receiver) = ChannelSink::bounded(DEFAULT_CAPACITY);
    let sink = Rc::new(sink.with_log(log.clone()));
    tracing::info!(session = %sink.session_id(), steps = scenario.steps.len(), "Replaying scenario");

    let writer = thread::spawn(move || {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for envelope in receiver {
            if let Err(e) = write_envelope(&mut out, &envelope) {
                tracing::error!("Could not write record: {e}");
                break;
            }
        }
    });

    let callbacks = sink.callbacks();
    drop(sink);

    let settle = settle_window(&config);
    let result = if realtime {
        let running = Arc::new(AtomicBool::new(true));
        ctrlc_handler(running.clone())?;
        run_realtime(&scenario, doc, scene, config, callbacks, log.hooks(), settle, running)
    } else {
        run_virtual(&scenario, doc, scene, config, callbacks, log.hooks(), settle)
    };

    // All senders are gone once the recorder is dropped; the writer drains and exits.
    if writer.join().is_err() {
        tracing::error!("Record writer panicked");
    }
    result?;

    if show_stats {
        eprintln!("{}", log.summary());
    }
    Ok(())
}

fn run_virtual(
    scenario: &Scenario,
    doc: Rc<Document>,
    mut scene: SceneNodes,
    config: RecorderConfig,
    callbacks: Callbacks,
    hooks: HookSet,
    settle: Duration,
) -> anyhow::Result<()> {
    let clock = ManualScheduler::new();
    let recorder = Recorder::new(doc.clone(), clock.clone(), config, callbacks).with_hooks(hooks);
    recorder.start()?;

    scenario.run_virtual(&doc, &mut scene, &clock, settle)?;
    recorder.stop();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_realtime(
    scenario: &Scenario,
    doc: Rc<Document>,
    mut scene: SceneNodes,
    config: RecorderConfig,
    callbacks: Callbacks,
    hooks: HookSet,
    settle: Duration,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Could not start runtime")?;
    let local = tokio::task::LocalSet::new();

    let mut steps = scenario.steps.clone();
    steps.sort_by(|a, b| a.at.total_cmp(&b.at));

    local.block_on(&runtime, async move {
        let scheduler = TokioScheduler::new();
        let recorder =
            Recorder::new(doc.clone(), scheduler.clone(), config, callbacks).with_hooks(hooks);
        recorder.start()?;

        eprintln!("Press Ctrl+C to stop");
        for step in &steps {
            if !running.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(delay_until(step.at, scheduler.now())).await;
            apply(&doc, &mut scene, &step.action)?;
        }
        if running.load(Ordering::SeqCst) {
            tokio::time::sleep(settle).await;
        } else {
            tracing::info!("Interrupted, discarding pending flushes");
        }

        recorder.stop();
        Ok::<(), anyhow::Error>(())
    })
}

/// Long enough for every throttle window to close after the last step.
fn settle_window(config: &RecorderConfig) -> Duration {
    let windows = [
        config.movement_flush(),
        config.sampling.scroll_interval(),
        VIEWPORT_RESIZE_THROTTLE,
    ];
    windows.into_iter().max().unwrap_or_default() + Duration::from_millis(1)
}

fn write_envelope(out: &mut impl Write, envelope: &Envelope) -> std::io::Result<()> {
    let line = serde_json::to_string(envelope).map_err(std::io::Error::other)?;
    writeln!(out, "{line}")
}

fn cmd_config() -> anyhow::Result<()> {
    let config = RecorderConfig::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", RecorderConfig::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = RecorderConfig::config_path();
    if path.exists() && !force {
        bail!("{path:?} already exists (use --force to overwrite)");
    }

    RecorderConfig::default()
        .save()
        .with_context(|| format!("Could not write {path:?}"))?;
    println!("Wrote default configuration to {path:?}");
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}
