//! clinic-sim — runs the clinic patient-flow simulation.
//!
//! ```text
//! clinic-sim [PARAMS_FILE]        # default: input_data/params.ini
//! RUST_LOG=cf_devs=debug clinic-sim
//! ```
//!
//! Reads the parameter file, builds the clinic, writes one event-log row per
//! emitted message and prints a short summary of where patients ended up.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cf_clinic::{Clinic, ClinicConfig, RunConfig};
use cf_output::{CsvWriter, EventLogObserver, ExitTally, OutputWriter};
use cf_schedule::load_params_file;

// ── Constants ─────────────────────────────────────────────────────────────────

const DEFAULT_PARAMS: &str = "input_data/params.ini";

// ── Log destinations ──────────────────────────────────────────────────────────

/// Create `path`'s parent directory if it has one.
fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

fn open_csv(run: &RunConfig) -> Result<CsvWriter> {
    ensure_parent(&run.log_csv)?;
    CsvWriter::create(&run.log_csv, run.csv_sep).with_context(|| format!("opening {}", run.log_csv.display()))
}

#[cfg(feature = "sqlite")]
fn open_log(run: &RunConfig) -> Result<impl OutputWriter> {
    let csv = open_csv(run)?;
    let sqlite = match &run.log_sqlite {
        Some(path) => {
            ensure_parent(path)?;
            let w = cf_output::SqliteWriter::open(path).with_context(|| format!("opening {}", path.display()))?;
            info!(path = %path.display(), "also logging to SQLite");
            Some(w)
        }
        None => None,
    };
    Ok((csv, sqlite))
}

#[cfg(not(feature = "sqlite"))]
fn open_log(run: &RunConfig) -> Result<impl OutputWriter> {
    if let Some(path) = &run.log_sqlite {
        tracing::warn!(path = %path.display(), "built without the `sqlite` feature; simulation.log_sqlite ignored");
    }
    open_csv(run)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic_sim=info".parse()?))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let params_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_PARAMS));

    // 1. Configuration.
    let params = load_params_file(&params_path)?;
    let config = ClinicConfig::from_params(&params)?;
    info!(params = %params_path.display(), keys = params.len(), "configuration loaded");

    println!("=== clinic-sim — primary-care patient flow ===");
    println!(
        "Doctors: {}  |  Horizon: {} s  |  Seed: {}",
        config.staff.servers, config.run.until, config.run.rng_seed
    );
    match &config.arrivals.schedule_path {
        Some(path) => println!("Arrivals: schedule {}", path.display()),
        None => println!(
            "Arrivals: {} / s, at most {} patients",
            config.arrivals.rate, config.arrivals.max_patients
        ),
    }
    println!();

    // 2. Clinic.
    let mut clinic = Clinic::from_config(&config)?;

    // 3. Output.
    let writer = open_log(&config.run)?;
    let mut obs = (EventLogObserver::new(writer), ExitTally::new());

    // 4. Run.
    let t0 = Instant::now();
    let report = clinic.run(&mut obs)?;
    let elapsed = t0.elapsed();

    let (mut log, tally) = obs;
    if let Some(e) = log.take_error() {
        return Err(e).with_context(|| format!("writing {}", config.run.log_csv.display()));
    }

    // 5. Summary.
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!(
        "  {} instants, stopped at t = {} s ({:?})",
        report.iterations, report.final_time, report.reason
    );
    println!(
        "  patients created : {}",
        clinic.arrival_source().map_or(0, |a| a.emitted())
    );
    println!("  patients departed: {}", tally.total());
    println!("  {} : {} rows", config.run.log_csv.display(), log.rows());
    println!();

    println!("{:<12} {:>8} {:>8}", "Doctor", "Served", "Waiting");
    println!("{}", "-".repeat(30));
    for server in (0..clinic.servers.len()).filter_map(|i| clinic.server(i)) {
        println!("{:<12} {:>8} {:>8}", server.index().0, server.completed(), server.queue_len());
    }
    println!();

    println!("{:<12} {:>8}", "Exit", "Patients");
    println!("{}", "-".repeat(21));
    for (exit, n) in tally.exits() {
        println!("{exit:<12} {n:>8}");
    }
    println!();

    println!("{:<12} {:>8}", "Outcome", "Patients");
    println!("{}", "-".repeat(21));
    for (outcome, n) in tally.outcomes() {
        println!("{:<12} {n:>8}", outcome.as_str());
    }
    if let Some(t) = tally.last_exit() {
        println!();
        println!("Last departure at t = {t} s");
    }

    Ok(())
}
