use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use linefleet_core::{
    config::{self, EngineConfig},
    run_parallel_phase, Convoy, CostCategory, Direction, Line, LineType, MonthDriver, Mutation,
    PlayerId, Registry, SaveManager, StopId, WorldContext,
};
use tracing::{info, warn};
use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_MONTHS: u32 = 6;

fn main() -> Result<()> {
    let config_path = config::ensure_default_config()?;
    let config = EngineConfig::load()?;
    init_logging(&config.log_filter)?;
    info!(path = %config_path.display(), "configuration loaded");

    let months = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse::<u32>()
            .with_context(|| format!("invalid month count {arg:?}"))?,
        None => DEFAULT_MONTHS,
    };

    let mut ctx = WorldContext::new(0, config.line_settings());
    let shared = build_network(&ctx).into_shared();
    let mut driver = MonthDriver::new(&ctx);

    for _ in 0..months {
        let month = ctx.current_month;
        let report = run_parallel_phase(&shared, config.worker_threads, |_, line| {
            plan_month(line, month)
        });
        if !report.rejected.is_empty() {
            warn!(rejected = report.rejected.len(), "mutations rejected");
        }

        ctx.advance_month();
        let statuses = driver.poll(&ctx, &mut shared.write());
        for (line, status) in statuses {
            info!(?line, ?status, color = ?status.color(), "line status");
        }
    }

    let manager = SaveManager::new(config.save_root());
    let entry = manager.create_save(Some("demo"), &shared.read(), &ctx)?;
    info!(
        path = %entry.path.display(),
        saved_at = %entry.updated_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
        "save written"
    );

    let loaded = manager.load(&entry, config.line_settings())?;
    if !loaded.report.is_clean() {
        warn!(report = ?loaded.report, "save needed repairs while loading");
    }
    for (_, line) in loaded.registry.lines() {
        info!(
            name = line.name(),
            convoys = line.count_convoys(),
            status = ?line.status(),
            profit = line.finance_history(1, CostCategory::Profit)?,
            circular = line.is_alternating_circular_route(),
            "restored line"
        );
    }
    Ok(())
}

fn build_network(ctx: &WorldContext) -> Registry {
    let mut registry = Registry::new();

    let mut loop_schedule = LineType::Bus.create_schedule();
    loop_schedule.set_stops(vec![StopId(1), StopId(2), StopId(3)]);
    let bus_line = registry.create_line_with_schedule(LineType::Bus, PlayerId(0), loop_schedule, ctx);
    if let Some(line) = registry.line_mut(bus_line) {
        line.set_name("Harbour Loop");
    }

    let mut shuttle_schedule = LineType::NarrowGauge.create_schedule();
    shuttle_schedule.set_stops(vec![StopId(10), StopId(11), StopId(12)]);
    shuttle_schedule.set_mirrored(true);
    let shuttle =
        registry.create_line_with_schedule(LineType::NarrowGauge, PlayerId(0), shuttle_schedule, ctx);
    if let Some(line) = registry.line_mut(shuttle) {
        line.set_name("Quarry Shuttle");
    }

    for index in 0..3 {
        let bus = registry.insert_convoy(Convoy::new(format!("Bus {}", index + 1), [0]));
        if let Err(err) = registry.assign_convoy(bus_line, bus) {
            warn!(%err, "bus not assigned");
        }
    }
    for index in 0..2 {
        let train = registry.insert_convoy(Convoy::new(format!("Ore Train {}", index + 1), [3, 4]));
        if let Err(err) = registry.assign_convoy(shuttle, train) {
            warn!(%err, "train not assigned");
        }
    }
    registry
}

/// Deterministic month of traffic for one line.
fn plan_month(line: &Line, month: u32) -> Vec<Mutation> {
    let handle = line.handle();
    let members = line.count_convoys() as i64;
    let month = i64::from(month);
    let legs = line.schedule().legs();
    let outbound = if line.schedule().is_mirrored() {
        legs.len() / 2
    } else {
        legs.len()
    };

    let mut plan: Vec<Mutation> = legs
        .iter()
        .enumerate()
        .map(|(index, leg)| Mutation::RecordLeg {
            line: handle,
            from: leg.from,
            to: leg.to,
            direction: if index < outbound {
                Direction::Forward
            } else {
                Direction::Reverse
            },
            duration: 60 + (leg.from.0 + leg.to.0) * 3 + (month as u32 % 4) * 5,
        })
        .collect();

    let revenue = members * (400 + month * 25);
    let running_cost = -members * 350;
    plan.extend([
        Mutation::Book {
            line: handle,
            category: CostCategory::Revenue,
            amount: revenue,
        },
        Mutation::Book {
            line: handle,
            category: CostCategory::OperatingCost,
            amount: running_cost,
        },
        Mutation::Book {
            line: handle,
            category: CostCategory::Transported,
            amount: members * 120,
        },
        Mutation::Book {
            line: handle,
            category: CostCategory::Distance,
            amount: legs.len() as i64 * members * 8,
        },
        Mutation::Book {
            line: handle,
            category: CostCategory::Comfort,
            amount: 70 + month % 3 * 5,
        },
    ]);
    plan
}

fn init_logging(default_filter: &str) -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("linefleet.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("invalid log filter")?;

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stdout);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_ansi(false)
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(())
}
