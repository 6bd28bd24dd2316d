//! Explicit world context handed to engine operations.

use serde::{Deserialize, Serialize};

use crate::ledger::{AveragePolicy, ProfitPolicy};

/// Per-line behaviour knobs taken from the engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSettings {
    /// Sample window of the journey time running average.
    pub journey_time_window: u16,
    /// Month-end handling of rolling-average running sums.
    pub average_policy: AveragePolicy,
    /// How the profit column is maintained.
    pub profit_policy: ProfitPolicy,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            journey_time_window: 16,
            average_policy: AveragePolicy::default(),
            profit_policy: ProfitPolicy::default(),
        }
    }
}

/// Read-only view of the simulated world passed into line operations.
///
/// The engine never owns the clock; the simulation driver advances
/// `current_month` and the [`MonthDriver`](crate::tick::MonthDriver)
/// reacts to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldContext {
    /// Months elapsed since the start of the game.
    pub current_month: u32,
    /// Settings applied to lines created or loaded in this world.
    pub settings: LineSettings,
}

impl WorldContext {
    /// Context at `current_month` using `settings`.
    pub fn new(current_month: u32, settings: LineSettings) -> Self {
        Self {
            current_month,
            settings,
        }
    }

    /// Move the clock forward by one month.
    pub fn advance_month(&mut self) {
        self.current_month += 1;
    }
}
