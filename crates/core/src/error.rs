//! Error types surfaced by the engine.

use thiserror::Error;

use crate::handle::{ConvoyHandle, LineHandle};
use crate::ledger::MAX_MONTHS;

/// Failures when reading the financial ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Requested month lies outside the kept history window.
    #[error("month {month} is outside the ledger history (0..{})", MAX_MONTHS)]
    MonthOutOfRange {
        /// The month index that was requested.
        month: usize,
    },
}

/// Failures when resolving handles against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The line handle does not refer to a live line.
    #[error("line handle {0:?} is stale or unknown")]
    StaleLine(LineHandle),
    /// The convoy handle does not refer to a live convoy.
    #[error("convoy handle {0:?} is stale or unknown")]
    StaleConvoy(ConvoyHandle),
}

/// Failures when reading persisted line state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The archive ran out of fields before the record was complete.
    #[error("archive ended while reading {field}")]
    UnexpectedEnd {
        /// Name of the field being read.
        field: &'static str,
    },
    /// The next archive field had the wrong primitive type.
    #[error("expected {expected} for {field}")]
    TypeMismatch {
        /// Name of the field being read.
        field: &'static str,
        /// Primitive type the reader asked for.
        expected: &'static str,
    },
    /// The stored line type tag is not a known variant.
    #[error("unknown line type tag {0}")]
    UnknownLineType(u64),
    /// The archive could not be (de)serialised as JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
