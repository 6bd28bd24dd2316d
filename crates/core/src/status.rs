//! Derived health indicator of a line.

use serde::{Deserialize, Serialize};

/// Operational health of a line, evaluated from fleet and ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LineStatus {
    /// Nothing to report.
    #[default]
    Healthy,
    /// No convoys are assigned.
    Empty,
    /// No convoy moved during the last period.
    Stalled,
    /// The last closed month ended with a loss.
    Unprofitable,
    /// At least one assigned vehicle is obsolete.
    Obsolete,
}

/// Indicator colour shown for a status in line lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusColor {
    /// Healthy.
    Black,
    /// Empty.
    White,
    /// Stalled.
    Yellow,
    /// Unprofitable.
    Red,
    /// Obsolete.
    Blue,
}

impl LineStatus {
    /// Legacy indicator colour for this status.
    pub fn color(self) -> StatusColor {
        match self {
            LineStatus::Healthy => StatusColor::Black,
            LineStatus::Empty => StatusColor::White,
            LineStatus::Stalled => StatusColor::Yellow,
            LineStatus::Unprofitable => StatusColor::Red,
            LineStatus::Obsolete => StatusColor::Blue,
        }
    }
}

/// Facts the status is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusInputs {
    /// Number of assigned convoys.
    pub member_count: usize,
    /// Whether any member moved during the last period.
    pub any_moved: bool,
    /// Profit of the last closed month.
    pub last_profit: i64,
    /// Whether any member carries an obsolete vehicle.
    pub any_obsolete: bool,
}

/// Evaluate the status. The first matching condition wins:
/// empty, stalled, unprofitable, obsolete, healthy.
pub fn evaluate(inputs: StatusInputs) -> LineStatus {
    if inputs.member_count == 0 {
        LineStatus::Empty
    } else if !inputs.any_moved {
        LineStatus::Stalled
    } else if inputs.last_profit < 0 {
        LineStatus::Unprofitable
    } else if inputs.any_obsolete {
        LineStatus::Obsolete
    } else {
        LineStatus::Healthy
    }
}
