//! maxproui - Anycubic 4Max Pro touch panel bridge for Klipper
//!
//! Runs on the Klipper host. The panel's UART carries short ASCII
//! requests (`A0` .. `A42`); this daemon answers them from Klipper's
//! status and turns the actions into G-code scripts, so the stock touch
//! screen keeps working with Klipper firmware.
//!
//! Blocking I/O (the serial reader and the Klipper socket) runs on
//! plain threads; the session, the status tick and the paced panel
//! writer are Embassy tasks on the std executor.

#![deny(unsafe_code)]

mod channels;
mod config;
mod klippy;
mod panel;
mod sdcard;
mod tasks;

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use embassy_executor::Executor;
use static_cell::StaticCell;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use maxproui_core::Session;

use crate::config::load_config;
use crate::klippy::{spawn_worker, ScriptForwarder, StatusCache};
use crate::sdcard::GcodeDirectory;
use crate::tasks::SessionResources;

/// Anycubic 4Max Pro touch panel bridge for Klipper
#[derive(Parser, Debug)]
#[command(name = "maxproui", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, value_name = "FILE", default_value = "maxproui.toml")]
    config: PathBuf,

    /// Panel serial device, overriding [panel] device
    #[arg(short, long, value_name = "DEVICE")]
    device: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset
    #[arg(long, value_name = "FILTER", default_value = "info")]
    log_level: String,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let mut config = load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(device) = args.device {
        config.panel.device = device;
    }

    let sdcard_dir = &config.klipper.sdcard_dir;
    anyhow::ensure!(
        sdcard_dir.is_dir(),
        "[klipper] sdcard_dir {} is not a directory",
        sdcard_dir.display()
    );

    let catalog = config.catalog()?;
    for entry in catalog.shadowed() {
        warn!(name = entry.name(), "menu entry hidden by a later one with the same name");
    }
    for entry in catalog.entries() {
        if entry.navigation().is_some() && entry.script().is_some() {
            warn!(name = entry.name(), "navigation entry ignores its gcode");
        }
    }
    info!(entries = catalog.len(), "special menu loaded");

    if args.check {
        info!("configuration OK");
        return Ok(());
    }

    let (rx_port, tx_port) = panel::open(&config.panel.device, config.panel.baud)?;
    let panel_up = Arc::new(AtomicBool::new(true));
    panel::spawn_reader(rx_port, panel_up.clone()).context("starting panel reader")?;

    let status = StatusCache::default();
    let poll = Duration::from_millis(config.klipper.poll_ms);
    let (script_tx, script_rx) = mpsc::channel();
    spawn_worker(
        config.klipper.socket.clone(),
        poll,
        status.clone(),
        script_rx,
        panel_up,
    )
    .context("starting klippy worker")?;

    let resources = SessionResources {
        session: Session::new(catalog, config.machine.clone()),
        status,
        files: GcodeDirectory::new(config.klipper.sdcard_dir.clone(), poll),
        runner: ScriptForwarder::new(script_tx),
        startup_delay_ms: config.panel.startup_delay_ms,
    };
    let tick_ms = config.panel.tick_ms;
    let cmd_delay_ms = config.panel.cmd_delay_ms;

    info!("starting executor");
    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| {
        spawner.spawn(tasks::tick_task(tick_ms)).unwrap();
        spawner.spawn(tasks::panel_tx_task(tx_port, cmd_delay_ms)).unwrap();
        spawner.spawn(tasks::session_task(resources)).unwrap();
    })
}
