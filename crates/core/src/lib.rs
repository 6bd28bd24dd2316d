#![warn(clippy::all, missing_docs)]

//! Line fleet and financial accounting engine.
//!
//! Groups convoys into scheduled transport lines, keeps a rolling monthly
//! ledger per line, derives line health, and tracks point-to-point journey
//! times. Lines and convoys live in a generation-checked [`Registry`] and
//! refer to each other only through handles.

pub mod config;
pub mod context;
pub mod convoy;
pub mod error;
pub mod fleet;
pub mod handle;
pub mod journey;
pub mod ledger;
pub mod line;
pub mod persist;
pub mod registry;
pub mod save;
pub mod schedule;
pub mod status;
pub mod tick;

pub use config::EngineConfig;
pub use context::{LineSettings, WorldContext};
pub use convoy::{Convoy, ConvoyLookup, ConvoyLookupMut};
pub use error::{LedgerError, PersistError, RegistryError};
pub use handle::{ConvoyHandle, LineHandle, RawHandle};
pub use journey::{Direction, JourneyTimes, StopPair};
pub use ledger::{AveragePolicy, ConvoyCost, CostCategory, Ledger, ProfitPolicy};
pub use line::{Line, LineType, PlayerId};
pub use persist::{JsonArchive, LoadReport, SaveReader, SaveWriter};
pub use registry::{Registry, SharedRegistry};
pub use save::{SaveEntry, SaveManager};
pub use schedule::{Schedule, ScheduleKind, StopDirectory, StopId, StopRegistry};
pub use status::LineStatus;
pub use tick::{run_parallel_phase, MonthDriver, Mutation};
