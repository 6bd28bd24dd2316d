//! Month-end driving and the read-only parallel phase of a tick.
//!
//! Parallel workers only ever see `&Registry` under a read lock. Whatever
//! they want to change is returned as [`Mutation`]s and applied in order
//! under a single write lock once every worker has joined.

use std::thread;

use tracing::{debug, info, warn};

use crate::context::WorldContext;
use crate::error::RegistryError;
use crate::handle::{ConvoyHandle, LineHandle};
use crate::journey::Direction;
use crate::ledger::CostCategory;
use crate::line::Line;
use crate::registry::{Registry, SharedRegistry};
use crate::schedule::StopId;
use crate::status::LineStatus;

/// Fires month-end processing once for every month the clock advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthDriver {
    last_month: u32,
}

impl MonthDriver {
    /// Driver that considers `ctx.current_month` already processed.
    pub fn new(ctx: &WorldContext) -> Self {
        Self {
            last_month: ctx.current_month,
        }
    }

    /// Last month whose end has been processed.
    pub fn last_month(&self) -> u32 {
        self.last_month
    }

    /// Close every month between the last processed one and the context's
    /// current month. Returns the statuses after the final close, or an
    /// empty list when the month did not change.
    pub fn poll(&mut self, ctx: &WorldContext, registry: &mut Registry) -> Vec<(LineHandle, LineStatus)> {
        let mut statuses = Vec::new();
        while self.last_month < ctx.current_month {
            statuses = registry.month_end();
            self.last_month += 1;
            info!(month = self.last_month, lines = statuses.len(), "month closed");
        }
        statuses
    }
}

/// A change requested during the parallel phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Book an amount on a line's ledger.
    Book {
        /// Target line.
        line: LineHandle,
        /// Ledger column.
        category: CostCategory,
        /// Signed amount.
        amount: i64,
    },
    /// Record a measured leg.
    RecordLeg {
        /// Target line.
        line: LineHandle,
        /// Departure stop.
        from: StopId,
        /// Arrival stop.
        to: StopId,
        /// Journey table.
        direction: Direction,
        /// Measured duration.
        duration: u32,
    },
    /// Assign a convoy to a line.
    AssignConvoy {
        /// Target line.
        line: LineHandle,
        /// Convoy to assign.
        convoy: ConvoyHandle,
    },
    /// Detach a convoy from a line.
    ReleaseConvoy {
        /// Target line.
        line: LineHandle,
        /// Convoy to detach.
        convoy: ConvoyHandle,
    },
    /// Re-derive a line's status.
    RecalcStatus {
        /// Target line.
        line: LineHandle,
    },
}

impl Registry {
    /// Apply one mutation.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), RegistryError> {
        match *mutation {
            Mutation::Book {
                line,
                category,
                amount,
            } => self.book(line, category, amount),
            Mutation::RecordLeg {
                line,
                from,
                to,
                direction,
                duration,
            } => self.record_leg(line, from, to, direction, duration),
            Mutation::AssignConvoy { line, convoy } => self.assign_convoy(line, convoy).map(|_| ()),
            Mutation::ReleaseConvoy { line, convoy } => self.release_convoy(line, convoy).map(|_| ()),
            Mutation::RecalcStatus { line } => self.recalc_status(line).map(|_| ()),
        }
    }
}

/// Outcome of a parallel phase.
#[derive(Debug, Default)]
pub struct PhaseReport {
    /// Mutations applied at the synchronisation point.
    pub applied: usize,
    /// Mutations that referred to entities gone by the time they applied.
    pub rejected: Vec<(Mutation, RegistryError)>,
}

/// Run `plan` for every line on up to `workers` threads, then apply the
/// collected mutations in line order under one write lock.
///
/// `plan` sees the registry read-only. Mutations are applied in the order
/// of the lines that produced them, so the outcome does not depend on
/// thread scheduling.
pub fn run_parallel_phase<F>(shared: &SharedRegistry, workers: usize, plan: F) -> PhaseReport
where
    F: Fn(&Registry, &Line) -> Vec<Mutation> + Sync,
{
    let mutations = {
        let guard = shared.read();
        let registry: &Registry = &guard;
        let handles = registry.line_handles();
        let chunk_size = handles.len().div_ceil(workers.max(1)).max(1);
        let plan = &plan;

        thread::scope(|scope| {
            let jobs: Vec<_> = handles
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .filter_map(|handle| registry.line(*handle))
                            .flat_map(|line| plan(registry, line))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();
            jobs.into_iter()
                .flat_map(|job| match job.join() {
                    Ok(mutations) => mutations,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect::<Vec<_>>()
        })
    };
    debug!(count = mutations.len(), "parallel phase joined");

    let mut registry = shared.write();
    let mut report = PhaseReport::default();
    for mutation in mutations {
        match registry.apply(&mutation) {
            Ok(()) => report.applied += 1,
            Err(err) => {
                warn!(?mutation, %err, "mutation rejected at synchronisation point");
                report.rejected.push((mutation, err));
            }
        }
    }
    report
}
