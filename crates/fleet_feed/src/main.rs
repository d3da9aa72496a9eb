use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{debug, info, warn};

use fleet_core::alerts::Alert;
use fleet_core::commands::FleetCommand;
use fleet_core::feed::FleetFeed;
use fleet_core::fleet::{FleetStats, Vehicle, VehicleId};
use fleet_core::playback::PlaybackSpeed;
use fleet_core::scenario::FleetScenario;
use fleet_core::telemetry_export::{write_alert_log_parquet, write_trip_history_parquet};

mod logging;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "fleet_feed",
    about = "Headless fleet tracking feed",
    long_about = "Runs the simulated fleet feed against a scenario, logs geofence\n\
                  entries, alerts and pickups, and optionally replays a vehicle's trip."
)]
struct Cli {
    /// Scenario JSON file; the built-in Bengaluru roster when omitted
    #[arg(long, env = "FLEET_SCENARIO")]
    scenario: Option<PathBuf>,
    /// Seed for the random source (overrides the scenario's seed)
    #[arg(long)]
    seed: Option<u64>,
    /// Write trip history and alert log as Parquet into this directory
    #[arg(long)]
    export_dir: Option<PathBuf>,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live feed for a number of ticks
    Run {
        /// Number of ticks to run
        #[arg(long, default_value_t = 60)]
        ticks: u64,
        /// Vehicle to focus, so it follows its planned route
        #[arg(long)]
        select: Option<String>,
        /// Sleep one tick period between ticks
        #[arg(long)]
        realtime: bool,
    },
    /// Record live ticks, then replay one vehicle's trip
    Playback {
        /// Vehicle to replay
        #[arg(long)]
        vehicle: String,
        /// Playback speed multiplier
        #[arg(value_enum, long, default_value_t = SpeedArg::X1)]
        speed: SpeedArg,
        /// Live ticks recorded before playback starts
        #[arg(long, default_value_t = 30)]
        record_ticks: u64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SpeedArg {
    #[value(name = "1")]
    X1,
    #[value(name = "5")]
    X5,
    #[value(name = "10")]
    X10,
}

impl From<SpeedArg> for PlaybackSpeed {
    fn from(value: SpeedArg) -> Self {
        match value {
            SpeedArg::X1 => PlaybackSpeed::X1,
            SpeedArg::X5 => PlaybackSpeed::X5,
            SpeedArg::X10 => PlaybackSpeed::X10,
        }
    }
}

// ── Summary printed on stdout ──────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedSummary<'a> {
    now_ms: u64,
    stats: FleetStats,
    vehicles: &'a [Vehicle],
    alerts: &'a [Alert],
    handled_alerts: &'a [Alert],
}

fn print_summary(feed: &FleetFeed) -> anyhow::Result<()> {
    let alerts = feed.alerts();
    let summary = FeedSummary {
        now_ms: feed.now_ms(),
        stats: feed.stats(),
        vehicles: &feed.fleet().vehicles,
        alerts: &alerts.alerts,
        handled_alerts: &alerts.handled_alerts,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

// ── Commands ───────────────────────────────────────────────────────

fn load_scenario(path: Option<&Path>, seed: Option<u64>) -> anyhow::Result<FleetScenario> {
    let scenario = match path {
        Some(path) => FleetScenario::from_json_path(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => FleetScenario::default(),
    };
    Ok(match seed {
        Some(seed) => scenario.with_seed(seed),
        None => scenario,
    })
}

/// Logs alerts and pickup banners that appeared since the last call.
fn report_new_events(feed: &FleetFeed, seen_alerts: &mut HashSet<String>, last_pickup: &mut Option<String>) {
    for alert in feed.alerts().alerts.iter().rev() {
        if seen_alerts.insert(alert.id.clone()) {
            warn!(
                id = %alert.id,
                kind = alert.kind.as_str(),
                vehicle = %alert.vehicle_id,
                "{}",
                alert.message
            );
        }
    }

    let pickup = feed
        .fleet()
        .pickup_notification
        .as_ref()
        .map(|notification| notification.message.clone());
    if pickup != *last_pickup {
        if let Some(message) = &pickup {
            info!(at_ms = feed.now_ms(), "{message}");
        }
        *last_pickup = pickup;
    }
}

fn run_live(feed: &mut FleetFeed, ticks: u64, select: Option<String>, realtime: bool) -> anyhow::Result<()> {
    feed.start();
    if let Some(id) = select {
        let id = VehicleId::from(id);
        if feed.fleet().vehicle(&id).is_none() {
            bail!("unknown vehicle {id}");
        }
        feed.dispatch(FleetCommand::select(id));
    }

    let period = feed.scenario().timings.tick_interval_ms;
    let mut seen_alerts = HashSet::new();
    let mut last_pickup = None;
    for tick in 1..=ticks {
        if realtime {
            thread::sleep(Duration::from_millis(period));
        }
        feed.advance_ticks(1);
        report_new_events(feed, &mut seen_alerts, &mut last_pickup);

        let stats = feed.stats();
        debug!(
            tick,
            active = stats.active_trips,
            inside_office = stats.inside_office,
            approaching_pickup = stats.approaching_pickup,
            "tick summary"
        );
        if feed.fleet().vehicles.iter().all(Vehicle::is_arrived) {
            info!(tick, "every vehicle reached the office");
            break;
        }
    }
    Ok(())
}

fn run_playback(
    feed: &mut FleetFeed,
    vehicle: String,
    speed: PlaybackSpeed,
    record_ticks: u64,
) -> anyhow::Result<()> {
    feed.start();
    let id = VehicleId::from(vehicle);
    if feed.fleet().vehicle(&id).is_none() && feed.history().track(&id).is_empty() {
        bail!("unknown vehicle {id}");
    }
    feed.advance_ticks(record_ticks);

    feed.dispatch(FleetCommand::SetSpeedMultiplier(speed));
    feed.dispatch(FleetCommand::StartPlayback(id.clone()));
    let points = feed.playback().track.len();
    if points == 0 {
        bail!("no recorded track for {id}");
    }

    let step = speed.step_interval_ms(feed.scenario().timings.playback_interval_ms);
    while feed.playback().is_active {
        let playback = feed.playback();
        if let Some(position) = playback.current_position() {
            info!(
                vehicle = %id,
                cursor = playback.cursor,
                points,
                lat = position.lat,
                lng = position.lng,
                heading = playback.current_heading(),
                "playback"
            );
        }
        feed.advance_by(step);
    }
    Ok(())
}

fn export(feed: &FleetFeed, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let trips = dir.join("trip_history.parquet");
    write_trip_history_parquet(&trips, feed.history())
        .map_err(|err| anyhow!("failed to write {}: {err}", trips.display()))?;
    let alerts = dir.join("alert_log.parquet");
    write_alert_log_parquet(&alerts, feed.alerts())
        .map_err(|err| anyhow!("failed to write {}: {err}", alerts.display()))?;

    info!(dir = %dir.display(), "telemetry exported");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level, cli.json_logs)?;

    let scenario = load_scenario(cli.scenario.as_deref(), cli.seed)?;
    let mut feed = FleetFeed::new(scenario).context("scenario rejected")?;

    match cli.command.unwrap_or(Commands::Run {
        ticks: 60,
        select: None,
        realtime: false,
    }) {
        Commands::Run {
            ticks,
            select,
            realtime,
        } => run_live(&mut feed, ticks, select, realtime)?,
        Commands::Playback {
            vehicle,
            speed,
            record_ticks,
        } => run_playback(&mut feed, vehicle, speed.into(), record_ticks)?,
    }
    feed.stop();

    if let Some(dir) = cli.export_dir.as_deref() {
        export(&feed, dir)?;
    }
    print_summary(&feed)
}
