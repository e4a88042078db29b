#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `cleansweep`: removes finished prints from the bed and keeps count.

mod cli;
mod error_fmt;
mod network;
mod printer;
mod status_server;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use eyre::{Result, WrapErr};
use serde_json::json;
use sweep_core::config::StabilizerCfg;
use sweep_core::hw_error::map_hw_error;
use sweep_core::runner::{RunReport, run_bounded};
use sweep_core::scale::TareScale;
use sweep_core::{RemovalController, StatusHandle};
use sweep_traits::{Arm, MonotonicClock, NetworkLink, Scale};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::network::{HostLink, NmcliLink};
use crate::printer::HttpPrinter;

type DynScale = Box<dyn Scale + Send>;
type DynArm = Box<dyn Arm + Send>;

fn main() {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);
    let _ = color_eyre::install();

    if let Err(e) = real_main(cli) {
        if JSON_MODE.get().copied().unwrap_or(false) {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let cfg = load_config(&cli.config)?;
    // Dropping the guard flushes the file sink.
    let _file_guard = init_tracing(cli.json, &cli.log_level, &cfg.logging)?;
    info!(config = %cli.config.display(), "config loaded");

    match cli.cmd {
        Commands::Run { max_ticks } => run(&cfg, max_ticks, cli.json),
        Commands::Weigh => weigh(&cfg, cli.json),
        Commands::Sweep { from, to } => sweep(&cfg, from, to),
        Commands::SelfCheck => self_check(&cfg),
    }
}

fn load_config(path: &Path) -> Result<sweep_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read config {}", path.display()))?;
    let cfg = sweep_config::load_toml(&text).wrap_err("parse config")?;
    cfg.validate().wrap_err("invalid config")?;
    Ok(cfg)
}

fn init_tracing(
    json: bool,
    level: &str,
    logging: &sweep_config::Logging,
) -> Result<Option<WorkerGuard>> {
    use tracing_appender::rolling;
    use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .wrap_err_with(|| format!("invalid --log-level {level:?}"))?;
    let console = if json {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    }
    .with_filter(console_filter);

    let mut guard = None;
    let file = match logging.file.as_deref() {
        Some(path) => {
            let path = Path::new(path);
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| eyre::eyre!("invalid config: logging.file has no file name"))?;
            let appender = match logging.rotation.as_deref() {
                Some("daily") => rolling::daily(dir, name),
                Some("hourly") => rolling::hourly(dir, name),
                _ => rolling::never(dir, name),
            };
            let (writer, worker) = tracing_appender::non_blocking(appender);
            guard = Some(worker);
            let file_filter = EnvFilter::try_new(logging.level.as_deref().unwrap_or("info"))
                .wrap_err("invalid config: logging.level")?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(writer)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .wrap_err("install tracing subscriber")?;
    Ok(guard)
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

const fn channel(c: sweep_config::ScaleChannel) -> sweep_hardware::Channel {
    match c {
        sweep_config::ScaleChannel::A128 => sweep_hardware::Channel::A128,
        sweep_config::ScaleChannel::A64 => sweep_hardware::Channel::A64,
        sweep_config::ScaleChannel::B32 => sweep_hardware::Channel::B32,
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_devices(cfg: &sweep_config::Config) -> Result<(DynScale, DynArm)> {
    use std::time::Duration;
    use sweep_hardware::rpi;

    let scale = rpi::open_hx711(
        cfg.pins.hx711_dt,
        cfg.pins.hx711_sck,
        channel(cfg.scale.channel),
        Duration::from_millis(cfg.scale.ready_timeout_ms),
    )
    .wrap_err("open hx711")?;
    let arm = rpi::open_servo(
        cfg.pins.servo,
        cfg.arm.step_deg,
        Duration::from_millis(cfg.arm.step_delay_ms),
    )
    .wrap_err("open servo")?;
    Ok((Box::new(scale), Box::new(arm)))
}

/// Zero reading of the simulated empty bin.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SIM_ZERO_COUNTS: i32 = 8_000;

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn open_devices(cfg: &sweep_config::Config) -> Result<(DynScale, DynArm)> {
    use sweep_hardware::{SimulatedArm, SimulatedBin, SimulatedScale};

    info!(channel = %channel(cfg.scale.channel), "hardware feature off, using simulated scale and arm");
    let bin = SimulatedBin::new();
    let mut scale = SimulatedScale::new(bin.clone(), SIM_ZERO_COUNTS);
    if std::env::var("CLEANSWEEP_TEST_SIM_TIMEOUT").is_ok_and(|v| v == "1") {
        scale = scale.with_not_ready();
    }
    let mut arm = SimulatedArm::new(bin);
    if let Ok(v) = std::env::var("CLEANSWEEP_TEST_SIM_PRINT_COUNTS") {
        let counts = v
            .parse::<i32>()
            .wrap_err("CLEANSWEEP_TEST_SIM_PRINT_COUNTS must be an integer")?;
        arm = arm.with_print_counts(counts);
    }
    Ok((Box::new(scale), Box::new(arm)))
}

fn open_link(cfg: &sweep_config::Network) -> Box<dyn NetworkLink + Send> {
    if cfg.manage_wifi {
        Box::new(NmcliLink::new())
    } else {
        Box::new(HostLink)
    }
}

fn run(cfg: &sweep_config::Config, max_ticks: Option<u64>, json_out: bool) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        })
        .wrap_err("install Ctrl-C handler")?;
    }

    let (scale, arm) = open_devices(cfg)?;
    let status = StatusHandle::new();
    let page = status.clone();
    let bind = cfg.status.bind.clone();
    let port = cfg.status.port;

    let mut controller = RemovalController::builder()
        .with_printer(HttpPrinter::from_config(&cfg.printer))
        .with_arm(arm)
        .with_scale(scale)
        .with_network(open_link(&cfg.network))
        .with_config(cfg)
        .with_status(status)
        .on_online(move || status_server::start(&bind, port, page).map(|_| ()))
        .try_build()?;

    info!(host = %cfg.printer.host, port = cfg.printer.port, "watching printer");
    let report = run_bounded(&mut controller, &shutdown, max_ticks);
    print_report(&report, json_out);
    match report.fatal {
        Some(fault) => Err(eyre::Report::new(fault).wrap_err("controller stopped")),
        None => Ok(()),
    }
}

fn print_report(report: &RunReport, json_out: bool) {
    if json_out {
        println!(
            "{}",
            json!({
                "timestamp": unix_ts(),
                "ticks": report.ticks,
                "failed_ticks": report.failed_ticks,
                "final_state": report.final_state.name(),
                "collected_prints": report.collected_prints,
            })
        );
    } else {
        println!(
            "Stopped after {} ticks ({} failed) in state {}. Collected prints: {}",
            report.ticks, report.failed_ticks, report.final_state, report.collected_prints
        );
    }
}

fn weigh(cfg: &sweep_config::Config, json_out: bool) -> Result<()> {
    let (scale, _arm) = open_devices(cfg)?;
    let stabilizer = StabilizerCfg::from(&cfg.scale);
    let mut scale = TareScale::new(scale, stabilizer, Arc::new(MonotonicClock::new()));
    let offset = scale.tare().wrap_err("tare")?;
    let weight = scale.stable_value().wrap_err("weigh")?;
    if json_out {
        println!(
            "{}",
            json!({ "timestamp": unix_ts(), "offset": offset, "weight": weight })
        );
    } else {
        println!("Tare offset: {offset} counts");
        println!("Weight: {weight} counts");
    }
    Ok(())
}

fn sweep(cfg: &sweep_config::Config, from: u16, to: u16) -> Result<()> {
    let (_scale, mut arm) = open_devices(cfg)?;
    arm.sweep(from, to)
        .map_err(|e| map_hw_error(&*e))
        .wrap_err_with(|| format!("sweep {from} -> {to}"))?;
    println!("Arm moved {from} -> {to}");
    Ok(())
}

fn self_check(cfg: &sweep_config::Config) -> Result<()> {
    let (scale, mut arm) = open_devices(cfg)?;
    let mut scale = TareScale::new(
        scale,
        StabilizerCfg::from(&cfg.scale),
        Arc::new(MonotonicClock::new()),
    );
    let raw = scale.read().wrap_err("scale read")?;
    info!(raw, "scale responded");
    arm.sweep(cfg.arm.up_deg, cfg.arm.up_deg)
        .map_err(|e| map_hw_error(&*e))
        .wrap_err("arm hold")?;
    if cfg.network.manage_wifi && !NmcliLink::new().is_connected() {
        warn!("network not associated yet; `run` will join it");
    }
    println!("OK");
    Ok(())
}
