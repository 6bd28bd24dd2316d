//! Minimal schedule and stop collaborators consumed by lines.
//!
//! Routing geometry is out of scope; a schedule here is only the ordered
//! stop sequence plus the flags the line engine reads and writes.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handle::LineHandle;
use crate::journey::StopPair;

/// Identifier of a stop served by schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopId(pub u32);

/// Way type a schedule runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleKind {
    /// Buses and trucks.
    Road,
    /// Standard gauge trains.
    Rail,
    /// Ships.
    Water,
    /// Aircraft.
    Air,
    /// Monorail trains.
    Monorail,
    /// Trams running on street track.
    Tram,
    /// Maglev trains.
    Maglev,
    /// Narrow gauge trains.
    NarrowGauge,
}

/// Ordered stop sequence driven by a line's convoys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    kind: ScheduleKind,
    stops: Vec<StopId>,
    mirrored: bool,
    bidirectional: bool,
    #[serde(skip)]
    needs_revalidation: bool,
}

impl Schedule {
    /// Empty schedule for the given way type.
    pub fn new(kind: ScheduleKind) -> Self {
        Self {
            kind,
            stops: Vec::new(),
            mirrored: false,
            bidirectional: false,
            needs_revalidation: false,
        }
    }

    /// Way type of the schedule.
    pub fn kind(&self) -> ScheduleKind {
        self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: ScheduleKind) {
        self.kind = kind;
    }

    /// Stops in visiting order.
    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    /// Append a stop to the sequence.
    pub fn push_stop(&mut self, stop: StopId) {
        self.stops.push(stop);
    }

    /// Replace the whole stop sequence.
    pub fn set_stops(&mut self, stops: Vec<StopId>) {
        self.stops = stops;
    }

    /// Whether the stop sequence is run forward and then backward.
    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    /// Mark the stop sequence as run forward and then backward.
    pub fn set_mirrored(&mut self, mirrored: bool) {
        self.mirrored = mirrored;
    }

    /// Whether convoys may start the schedule at either end.
    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
    }

    /// Allow convoys to start the schedule at either end.
    pub fn set_bidirectional(&mut self, bidirectional: bool) {
        self.bidirectional = bidirectional;
    }

    /// Whether freight routing over this schedule has to be recomputed.
    pub fn needs_revalidation(&self) -> bool {
        self.needs_revalidation
    }

    /// Flag the schedule for freight routing recomputation.
    pub fn mark_for_revalidation(&mut self) {
        self.needs_revalidation = true;
    }

    /// Acknowledge a pending revalidation request.
    pub fn clear_revalidation(&mut self) {
        self.needs_revalidation = false;
    }

    /// Distinct stops referenced by the schedule.
    pub fn unique_stops(&self) -> BTreeSet<StopId> {
        self.stops.iter().copied().collect()
    }

    /// Every leg the schedule drives in one full cycle.
    ///
    /// Mirrored schedules run the sequence out and back; all others wrap
    /// from the last stop to the first. Legs between repeated stops are
    /// skipped.
    pub fn legs(&self) -> Vec<StopPair> {
        if self.stops.len() < 2 {
            return Vec::new();
        }
        let forward = self
            .stops
            .windows(2)
            .map(|pair| StopPair::new(pair[0], pair[1]));
        let mut legs: Vec<StopPair> = if self.mirrored {
            let back: Vec<StopPair> = forward.clone().map(StopPair::reversed).rev().collect();
            forward.chain(back).collect()
        } else {
            let closing = StopPair::new(self.stops[self.stops.len() - 1], self.stops[0]);
            forward.chain(std::iter::once(closing)).collect()
        };
        legs.retain(|leg| leg.from != leg.to);
        legs
    }
}

/// Stops that keep track of which lines call at them.
pub trait StopDirectory {
    /// Note that `line` serves `stop`.
    fn register_line(&mut self, stop: StopId, line: LineHandle);

    /// Note that `line` no longer serves `stop`.
    fn unregister_line(&mut self, stop: StopId, line: LineHandle);
}

/// In-memory stop directory keyed by stop id.
#[derive(Debug, Clone, Default)]
pub struct StopRegistry {
    lines: HashMap<StopId, Vec<LineHandle>>,
}

impl StopRegistry {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines currently registered at `stop`, in registration order.
    pub fn lines_at(&self, stop: StopId) -> &[LineHandle] {
        self.lines.get(&stop).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl StopDirectory for StopRegistry {
    fn register_line(&mut self, stop: StopId, line: LineHandle) {
        let lines = self.lines.entry(stop).or_default();
        if !lines.contains(&line) {
            lines.push(line);
        }
    }

    fn unregister_line(&mut self, stop: StopId, line: LineHandle) {
        if let Some(lines) = self.lines.get_mut(&stop) {
            lines.retain(|registered| *registered != line);
            if lines.is_empty() {
                self.lines.remove(&stop);
            }
        } else {
            debug!(?stop, ?line, "unregister from a stop without lines");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn stops(ids: &[u32]) -> Vec<StopId> {
        ids.iter().copied().map(StopId).collect()
    }

    #[test]
    fn loop_legs_wrap_to_first_stop() {
        let mut schedule = Schedule::new(ScheduleKind::Road);
        schedule.set_stops(stops(&[1, 2, 3]));
        assert_eq!(
            schedule.legs(),
            vec![
                StopPair::new(StopId(1), StopId(2)),
                StopPair::new(StopId(2), StopId(3)),
                StopPair::new(StopId(3), StopId(1)),
            ]
        );
    }

    #[test]
    fn mirrored_legs_run_out_and_back() {
        let mut schedule = Schedule::new(ScheduleKind::Rail);
        schedule.set_stops(stops(&[1, 2, 3]));
        schedule.set_mirrored(true);
        assert_eq!(
            schedule.legs(),
            vec![
                StopPair::new(StopId(1), StopId(2)),
                StopPair::new(StopId(2), StopId(3)),
                StopPair::new(StopId(3), StopId(2)),
                StopPair::new(StopId(2), StopId(1)),
            ]
        );
    }

    #[test]
    fn stop_registry_ignores_duplicate_registration() {
        let mut lines: SlotMap<LineHandle, ()> = SlotMap::with_key();
        let line = lines.insert(());
        let mut registry = StopRegistry::new();
        registry.register_line(StopId(9), line);
        registry.register_line(StopId(9), line);
        assert_eq!(registry.lines_at(StopId(9)), &[line]);

        registry.unregister_line(StopId(9), line);
        assert!(registry.lines_at(StopId(9)).is_empty());
        registry.unregister_line(StopId(9), line);
    }
}
