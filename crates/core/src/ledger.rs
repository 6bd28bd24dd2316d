//! Per-line monthly financial and operational history.

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Number of months kept in the history, including the open month 0.
pub const MAX_MONTHS: usize = 12;

/// Number of cost categories tracked per month.
pub const MAX_LINE_COST: usize = 10;

/// Statistic tracked per month by a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostCategory {
    /// Amount of goods the line could have transported.
    Capacity,
    /// Amount of goods actually transported.
    Transported,
    /// Average speed of all convoys on the line.
    AverageSpeed,
    /// Average comfort rating of the line's vehicles.
    Comfort,
    /// Income generated by the line.
    Revenue,
    /// Operating cost generated by the line, usually negative.
    OperatingCost,
    /// Total profit of the line.
    Profit,
    /// Number of convoys serving the line.
    ConvoyCount,
    /// Distance covered by all convoys.
    Distance,
    /// Refunds paid to passengers and goods kept waiting too long.
    Refunds,
}

impl CostCategory {
    /// Every category in storage order.
    pub const ALL: [CostCategory; MAX_LINE_COST] = [
        CostCategory::Capacity,
        CostCategory::Transported,
        CostCategory::AverageSpeed,
        CostCategory::Comfort,
        CostCategory::Revenue,
        CostCategory::OperatingCost,
        CostCategory::Profit,
        CostCategory::ConvoyCount,
        CostCategory::Distance,
        CostCategory::Refunds,
    ];

    /// Column of this category in the ledger matrix.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Category stored in column `index`, if any.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Whether the displayed value is a running mean instead of a sum.
    pub fn is_rolling_average(self) -> bool {
        match self {
            CostCategory::AverageSpeed | CostCategory::Comfort => true,
            CostCategory::Capacity
            | CostCategory::Transported
            | CostCategory::Revenue
            | CostCategory::OperatingCost
            | CostCategory::Profit
            | CostCategory::ConvoyCount
            | CostCategory::Distance
            | CostCategory::Refunds => false,
        }
    }

    /// Whether this category holds money rather than a physical quantity.
    pub fn is_money(self) -> bool {
        matches!(
            self,
            CostCategory::Revenue
                | CostCategory::OperatingCost
                | CostCategory::Profit
                | CostCategory::Refunds
        )
    }

    /// Line category that a convoy's own statistic rolls up into.
    ///
    /// Convoy-only statistics such as maximum speed have no line column.
    pub fn from_convoy(cost: ConvoyCost) -> Option<Self> {
        match cost {
            ConvoyCost::Capacity => Some(CostCategory::Capacity),
            ConvoyCost::Transported => Some(CostCategory::Transported),
            ConvoyCost::AverageSpeed => Some(CostCategory::AverageSpeed),
            ConvoyCost::Comfort => Some(CostCategory::Comfort),
            ConvoyCost::Revenue => Some(CostCategory::Revenue),
            ConvoyCost::OperatingCost => Some(CostCategory::OperatingCost),
            ConvoyCost::Profit => Some(CostCategory::Profit),
            ConvoyCost::Distance => Some(CostCategory::Distance),
            ConvoyCost::Refunds => Some(CostCategory::Refunds),
            ConvoyCost::MaxSpeed => None,
        }
    }
}

/// Statistic tracked by a single convoy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConvoyCost {
    /// Capacity offered by the convoy.
    Capacity,
    /// Goods transported by the convoy.
    Transported,
    /// Average speed of the convoy.
    AverageSpeed,
    /// Comfort rating of the convoy.
    Comfort,
    /// Income generated by the convoy.
    Revenue,
    /// Operating cost of the convoy.
    OperatingCost,
    /// Profit of the convoy.
    Profit,
    /// Distance covered by the convoy.
    Distance,
    /// Refunds paid by the convoy's operator.
    Refunds,
    /// Maximum speed reached; no line equivalent.
    MaxSpeed,
}

/// What happens to the running sums of rolling-average categories when a
/// month is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AveragePolicy {
    /// Sums and counts survive month rollover; only
    /// [`Ledger::reset_averages`] clears them.
    #[default]
    CarryOver,
    /// Sums and counts are cleared by every [`Ledger::close_month`].
    ResetMonthly,
}

/// How the profit column is maintained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfitPolicy {
    /// Revenue and operating cost bookings also move profit; refunds reduce it.
    #[default]
    Derived,
    /// Profit only changes when it is booked directly.
    Booked,
}

/// Running sum and sample count behind a rolling-average category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunningMean {
    /// Sum of all booked samples.
    pub sum: i64,
    /// Number of booked samples.
    pub count: u32,
}

impl RunningMean {
    fn add(&mut self, amount: i64) -> i64 {
        self.sum = self.sum.saturating_add(amount);
        self.count = self.count.saturating_add(1);
        // integer division truncates toward zero
        self.sum / i64::from(self.count)
    }
}

/// Fixed-width monthly history of every [`CostCategory`].
///
/// Month 0 is the open, current month; months `1..MAX_MONTHS` are closed
/// history with the oldest at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ledger {
    history: [[i64; MAX_LINE_COST]; MAX_MONTHS],
    averages: [RunningMean; 2],
    average_policy: AveragePolicy,
    profit_policy: ProfitPolicy,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(AveragePolicy::default(), ProfitPolicy::default())
    }
}

impl Ledger {
    /// Create a zeroed ledger using the given policies.
    pub fn new(average_policy: AveragePolicy, profit_policy: ProfitPolicy) -> Self {
        Self {
            history: [[0; MAX_LINE_COST]; MAX_MONTHS],
            averages: [RunningMean::default(); 2],
            average_policy,
            profit_policy,
        }
    }

    /// Policy applied to rolling-average sums at month end.
    pub fn average_policy(&self) -> AveragePolicy {
        self.average_policy
    }

    /// Policy used to maintain the profit column.
    pub fn profit_policy(&self) -> ProfitPolicy {
        self.profit_policy
    }

    fn mean_slot(category: CostCategory) -> Option<usize> {
        match category {
            CostCategory::AverageSpeed => Some(0),
            CostCategory::Comfort => Some(1),
            _ => None,
        }
    }

    /// Book `amount` into the open month.
    ///
    /// Additive categories accumulate, saturating at the `i64` bounds.
    /// Rolling-average categories add a sample and store the truncated mean
    /// of every sample so far.
    pub fn book(&mut self, category: CostCategory, amount: i64) {
        let current = &mut self.history[0];
        match Self::mean_slot(category) {
            Some(slot) => {
                current[category.index()] = self.averages[slot].add(amount);
            }
            None => {
                let slot = &mut current[category.index()];
                *slot = slot.saturating_add(amount);
            }
        }

        if self.profit_policy == ProfitPolicy::Derived {
            let profit = &mut current[CostCategory::Profit.index()];
            match category {
                CostCategory::Revenue | CostCategory::OperatingCost => {
                    *profit = profit.saturating_add(amount)
                }
                CostCategory::Refunds => *profit = profit.saturating_sub(amount),
                _ => {}
            }
        }
    }

    /// Overwrite the open month's value for an additive category.
    pub fn set_current(&mut self, category: CostCategory, value: i64) {
        debug_assert!(
            !category.is_rolling_average(),
            "rolling averages are only changed through book()"
        );
        self.history[0][category.index()] = value;
    }

    /// Close the open month: shift history back by one, drop the oldest
    /// month and start a zeroed month 0.
    pub fn close_month(&mut self) {
        self.history.copy_within(0..MAX_MONTHS - 1, 1);
        self.history[0] = [0; MAX_LINE_COST];
        if self.average_policy == AveragePolicy::ResetMonthly {
            self.reset_averages();
        }
    }

    /// Clear the running sums and counts of the rolling-average categories.
    pub fn reset_averages(&mut self) {
        self.averages = [RunningMean::default(); 2];
    }

    /// Running sum and count behind a rolling-average category.
    pub fn running_mean(&self, category: CostCategory) -> Option<RunningMean> {
        Self::mean_slot(category).map(|slot| self.averages[slot])
    }

    /// Stored value for `category` in `month`.
    pub fn value(&self, month: usize, category: CostCategory) -> Result<i64, LedgerError> {
        self.history
            .get(month)
            .map(|row| row[category.index()])
            .ok_or(LedgerError::MonthOutOfRange { month })
    }

    /// Whole row for `month`, indexed by [`CostCategory::index`].
    pub fn month(&self, month: usize) -> Result<&[i64; MAX_LINE_COST], LedgerError> {
        self.history
            .get(month)
            .ok_or(LedgerError::MonthOutOfRange { month })
    }

    pub(crate) fn matrix(&self) -> &[[i64; MAX_LINE_COST]; MAX_MONTHS] {
        &self.history
    }

    pub(crate) fn restore(
        &mut self,
        history: [[i64; MAX_LINE_COST]; MAX_MONTHS],
        averages: [RunningMean; 2],
    ) {
        self.history = history;
        self.averages = averages;
    }

    pub(crate) fn averages(&self) -> &[RunningMean; 2] {
        &self.averages
    }
}
