//! Field-ordered persistence of lines.
//!
//! The engine decides which fields are written and in which order; how the
//! primitives are framed is up to the [`SaveWriter`]/[`SaveReader`]
//! implementation. [`JsonArchive`] is the one used by the save manager.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::context::WorldContext;
use crate::convoy::Convoy;
use crate::error::PersistError;
use crate::handle::{ConvoyHandle, LineHandle, RawHandle};
use crate::journey::{Direction, JourneyAverage, StopPair};
use crate::ledger::{RunningMean, MAX_LINE_COST, MAX_MONTHS};
use crate::line::{Line, LineType, PlayerId};
use crate::registry::Registry;
use crate::schedule::{Schedule, StopId};

/// Sink for primitive values in a fixed order.
pub trait SaveWriter {
    /// Write an unsigned integer.
    fn write_u64(&mut self, value: u64);
    /// Write a signed integer.
    fn write_i64(&mut self, value: i64);
    /// Write a flag.
    fn write_bool(&mut self, value: bool);
    /// Write a string.
    fn write_str(&mut self, value: &str);
}

/// Source of primitive values in the order they were written.
///
/// `field` names the value being read and only appears in errors.
pub trait SaveReader {
    /// Read an unsigned integer.
    fn read_u64(&mut self, field: &'static str) -> Result<u64, PersistError>;
    /// Read a signed integer.
    fn read_i64(&mut self, field: &'static str) -> Result<i64, PersistError>;
    /// Read a flag.
    fn read_bool(&mut self, field: &'static str) -> Result<bool, PersistError>;
    /// Read a string.
    fn read_string(&mut self, field: &'static str) -> Result<String, PersistError>;

    /// Read an unsigned integer that must fit in `T`.
    fn read_narrow<T: TryFrom<u64>>(&mut self, field: &'static str) -> Result<T, PersistError>
    where
        Self: Sized,
    {
        let raw = self.read_u64(field)?;
        T::try_from(raw).map_err(|_| PersistError::TypeMismatch {
            field,
            expected: std::any::type_name::<T>(),
        })
    }
}

/// Ordered list of JSON primitives implementing both archive directions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonArchive {
    values: Vec<Value>,
    cursor: usize,
}

impl JsonArchive {
    /// Empty archive ready for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive positioned at the start of previously written values.
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Written values in order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the archive, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Whether every value has been read.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.values.len()
    }

    fn next(&mut self, field: &'static str) -> Result<&Value, PersistError> {
        let value = self
            .values
            .get(self.cursor)
            .ok_or(PersistError::UnexpectedEnd { field })?;
        self.cursor += 1;
        Ok(value)
    }
}

impl SaveWriter for JsonArchive {
    fn write_u64(&mut self, value: u64) {
        self.values.push(Value::from(value));
    }

    fn write_i64(&mut self, value: i64) {
        self.values.push(Value::from(value));
    }

    fn write_bool(&mut self, value: bool) {
        self.values.push(Value::Bool(value));
    }

    fn write_str(&mut self, value: &str) {
        self.values.push(Value::String(value.to_string()));
    }
}

impl SaveReader for JsonArchive {
    fn read_u64(&mut self, field: &'static str) -> Result<u64, PersistError> {
        self.next(field)?.as_u64().ok_or(PersistError::TypeMismatch {
            field,
            expected: "u64",
        })
    }

    fn read_i64(&mut self, field: &'static str) -> Result<i64, PersistError> {
        self.next(field)?.as_i64().ok_or(PersistError::TypeMismatch {
            field,
            expected: "i64",
        })
    }

    fn read_bool(&mut self, field: &'static str) -> Result<bool, PersistError> {
        self.next(field)?.as_bool().ok_or(PersistError::TypeMismatch {
            field,
            expected: "bool",
        })
    }

    fn read_string(&mut self, field: &'static str) -> Result<String, PersistError> {
        self.next(field)?
            .as_str()
            .map(str::to_string)
            .ok_or(PersistError::TypeMismatch {
                field,
                expected: "string",
            })
    }
}

/// Maps persisted convoy ids to live handles.
pub trait ConvoyResolver {
    /// Live handle for `raw`, or `None` if the convoy no longer exists.
    fn resolve_convoy(&self, raw: u64) -> Option<ConvoyHandle>;
}

impl ConvoyResolver for Registry {
    fn resolve_convoy(&self, raw: u64) -> Option<ConvoyHandle> {
        let handle = ConvoyHandle::from_raw(raw);
        self.convoys.contains_key(handle).then_some(handle)
    }
}

impl ConvoyResolver for HashMap<u64, ConvoyHandle> {
    fn resolve_convoy(&self, raw: u64) -> Option<ConvoyHandle> {
        self.get(&raw).copied()
    }
}

/// Diagnostics collected while restoring lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Persisted convoy ids that no longer resolved, per line.
    pub dropped_convoys: Vec<(LineHandle, u64)>,
    /// Convoys listed by more than one line; kept by the first.
    pub conflicting_convoys: Vec<(LineHandle, ConvoyHandle)>,
}

impl LoadReport {
    /// Whether the load needed no repairs.
    pub fn is_clean(&self) -> bool {
        self.dropped_convoys.is_empty() && self.conflicting_convoys.is_empty()
    }
}

const DIRECTIONS: [Direction; 2] = [Direction::Forward, Direction::Reverse];

impl Line {
    /// Write the line's persistent state.
    ///
    /// Order: name, type, owner, flags, livery, founding month, ledger
    /// matrix, rolling-average sums, membership, schedule, journey times.
    pub fn write(&self, out: &mut impl SaveWriter) {
        out.write_str(&self.name);
        out.write_u64(self.line_type.tag());
        out.write_u64(u64::from(self.owner.0));
        out.write_bool(self.withdraw);
        out.write_u64(u64::from(self.livery_scheme_index));
        out.write_bool(self.start_reversed);
        out.write_u64(u64::from(self.founded_month));

        for row in self.ledger.matrix() {
            for value in row {
                out.write_i64(*value);
            }
        }
        for mean in self.ledger.averages() {
            out.write_i64(mean.sum);
            out.write_u64(u64::from(mean.count));
        }

        let members = self.fleet.members();
        out.write_u64(members.len() as u64);
        for member in members {
            out.write_u64(member.to_raw());
        }

        out.write_bool(self.schedule.is_mirrored());
        out.write_bool(self.schedule.is_bidirectional());
        out.write_u64(self.schedule.stops().len() as u64);
        for stop in self.schedule.stops() {
            out.write_u64(u64::from(stop.0));
        }

        for direction in DIRECTIONS {
            let entries = self.journeys.entries(direction);
            out.write_u64(entries.len() as u64);
            for (pair, average) in entries {
                out.write_u64(u64::from(pair.from.0));
                out.write_u64(u64::from(pair.to.0));
                out.write_u64(u64::from(average.average()));
                out.write_u64(u64::from(average.samples()));
            }
        }
    }

    /// Read a line written by [`Line::write`].
    ///
    /// Membership ids that `convoys` cannot resolve are dropped and noted
    /// in `report`. The line is not registered with its stops yet.
    pub fn read(
        input: &mut impl SaveReader,
        handle: LineHandle,
        ctx: &WorldContext,
        convoys: &impl ConvoyResolver,
        report: &mut LoadReport,
    ) -> Result<Line, PersistError> {
        let name = input.read_string("name")?;
        let tag = input.read_u64("line type")?;
        let line_type = LineType::from_tag(tag).ok_or(PersistError::UnknownLineType(tag))?;
        let owner = PlayerId(input.read_narrow("owner")?);
        let withdraw = input.read_bool("withdraw")?;
        let livery_scheme_index: u16 = input.read_narrow("livery scheme")?;
        let start_reversed = input.read_bool("start reversed")?;
        let founded_month: u32 = input.read_narrow("founded month")?;

        let mut history = [[0i64; MAX_LINE_COST]; MAX_MONTHS];
        for row in history.iter_mut() {
            for value in row.iter_mut() {
                *value = input.read_i64("ledger")?;
            }
        }
        let mut averages = [RunningMean::default(); 2];
        for mean in averages.iter_mut() {
            mean.sum = input.read_i64("average sum")?;
            mean.count = input.read_narrow("average count")?;
        }

        let member_count = input.read_u64("member count")?;
        let mut members = Vec::new();
        for _ in 0..member_count {
            let raw = input.read_u64("member")?;
            match convoys.resolve_convoy(raw) {
                Some(convoy) => members.push(convoy),
                None => {
                    warn!(line = %name, convoy = raw, "dropping convoy that no longer exists");
                    report.dropped_convoys.push((handle, raw));
                }
            }
        }

        let mut schedule = Schedule::new(line_type.schedule_kind());
        schedule.set_mirrored(input.read_bool("mirrored")?);
        schedule.set_bidirectional(input.read_bool("bidirectional")?);
        let stop_count = input.read_u64("stop count")?;
        for _ in 0..stop_count {
            schedule.push_stop(StopId(input.read_narrow("stop")?));
        }

        let mut line = Line::with_schedule(handle, line_type, owner, schedule, ctx);
        line.name = name;
        line.withdraw = withdraw;
        line.livery_scheme_index = livery_scheme_index;
        line.start_reversed = start_reversed;
        line.founded_month = founded_month;
        line.ledger.restore(history, averages);
        for member in members {
            line.fleet.add(member);
        }

        for direction in DIRECTIONS {
            let count = input.read_u64("journey count")?;
            for _ in 0..count {
                let from = StopId(input.read_narrow("journey from")?);
                let to = StopId(input.read_narrow("journey to")?);
                let average: u32 = input.read_narrow("journey average")?;
                let samples: u16 = input.read_narrow("journey samples")?;
                line.journeys.insert(
                    StopPair::new(from, to),
                    direction,
                    JourneyAverage::from_parts(average, samples),
                );
            }
        }

        line.classify_route();
        Ok(line)
    }
}

impl Registry {
    /// Write every line, preceded by the line count.
    pub fn write_lines(&self, out: &mut impl SaveWriter) {
        out.write_u64(self.lines.len() as u64);
        for (_, line) in self.lines.iter() {
            line.write(out);
        }
    }

    /// Rebuild a registry from persisted convoys and lines.
    ///
    /// `convoys` pairs each convoy with the raw id it had when saved; line
    /// membership is resolved through those ids. After restoring, every
    /// line is re-linked with its convoys and stops.
    pub fn restore(
        convoys: Vec<(u64, Convoy)>,
        input: &mut impl SaveReader,
        ctx: &WorldContext,
    ) -> Result<(Registry, LoadReport), PersistError> {
        let mut registry = Registry::new();
        let mut remap = HashMap::with_capacity(convoys.len());
        for (raw, convoy) in convoys {
            remap.insert(raw, registry.insert_convoy(convoy));
        }

        let mut report = LoadReport::default();
        let line_count = input.read_u64("line count")?;
        for _ in 0..line_count {
            registry
                .lines
                .try_insert_with_key(|handle| Line::read(input, handle, ctx, &remap, &mut report))?;
        }

        report.conflicting_convoys = registry.finish_loading();
        Ok((registry, report))
    }
}
