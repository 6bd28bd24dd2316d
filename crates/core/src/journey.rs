//! Point-to-point journey time averages and route shape detection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::schedule::{Schedule, StopId};

/// Directed pair of consecutive stops on a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopPair {
    /// Departure stop.
    pub from: StopId,
    /// Arrival stop.
    pub to: StopId,
}

impl StopPair {
    /// Build a pair from departure and arrival stops.
    pub fn new(from: StopId, to: StopId) -> Self {
        Self { from, to }
    }

    /// The same leg traveled the other way.
    pub fn reversed(self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

/// Which table a journey sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Normal traversal of the schedule.
    Forward,
    /// Return traversal of an alternating circular route.
    Reverse,
}

/// Running average of journey times for one leg.
///
/// Until `window` samples have been seen the stored value is the exact
/// mean. After that each new sample is blended in with weight
/// `1 / window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JourneyAverage {
    average: u32,
    samples: u16,
}

impl JourneyAverage {
    /// Current averaged journey time.
    pub fn average(&self) -> u32 {
        self.average
    }

    /// Number of samples folded in, saturating at the window size.
    pub fn samples(&self) -> u16 {
        self.samples
    }

    pub(crate) fn from_parts(average: u32, samples: u16) -> Self {
        Self { average, samples }
    }

    fn add(&mut self, sample: u32, window: u16) {
        let window = u64::from(window.max(1));
        let average = u64::from(self.average);
        let sample = u64::from(sample);
        if u64::from(self.samples) < window {
            let samples = u64::from(self.samples);
            self.average = ((average * samples + sample) / (samples + 1)) as u32;
            self.samples += 1;
        } else {
            self.average = ((average * (window - 1) + sample) / window) as u32;
        }
    }
}

/// Forward and reverse-circular journey time tables of one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyTimes {
    window: u16,
    forward: HashMap<StopPair, JourneyAverage>,
    reverse: HashMap<StopPair, JourneyAverage>,
}

impl JourneyTimes {
    /// Empty tables blending samples over `window`.
    pub fn new(window: u16) -> Self {
        Self {
            window: window.max(1),
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Sample window used for blending.
    pub fn window(&self) -> u16 {
        self.window
    }

    fn table(&self, direction: Direction) -> &HashMap<StopPair, JourneyAverage> {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Reverse => &self.reverse,
        }
    }

    /// Fold a measured leg duration into the matching table.
    ///
    /// Returns `true` when the leg had no data in that table before.
    pub fn record_leg(
        &mut self,
        from: StopId,
        to: StopId,
        direction: Direction,
        duration: u32,
    ) -> bool {
        let table = match direction {
            Direction::Forward => &mut self.forward,
            Direction::Reverse => &mut self.reverse,
        };
        let pair = StopPair::new(from, to);
        let is_new = !table.contains_key(&pair);
        table.entry(pair).or_default().add(duration, self.window);
        is_new
    }

    /// Averaged journey time for a leg, `None` when it was never recorded.
    pub fn average_for(&self, from: StopId, to: StopId, direction: Direction) -> Option<u32> {
        self.table(direction)
            .get(&StopPair::new(from, to))
            .map(JourneyAverage::average)
    }

    /// Full entry for a leg, including its sample count.
    pub fn entry(&self, pair: StopPair, direction: Direction) -> Option<JourneyAverage> {
        self.table(direction).get(&pair).copied()
    }

    /// Iterate over one table in stop order.
    pub fn entries(&self, direction: Direction) -> Vec<(StopPair, JourneyAverage)> {
        let mut entries: Vec<_> = self
            .table(direction)
            .iter()
            .map(|(pair, avg)| (*pair, *avg))
            .collect();
        entries.sort_by_key(|(pair, _)| *pair);
        entries
    }

    pub(crate) fn insert(&mut self, pair: StopPair, direction: Direction, value: JourneyAverage) {
        match direction {
            Direction::Forward => self.forward.insert(pair, value),
            Direction::Reverse => self.reverse.insert(pair, value),
        };
    }

    /// Decide whether `schedule` is run back and forth over the same stops
    /// rather than as a closed loop.
    ///
    /// Requires a back-and-forth stop sequence and at least one leg of the
    /// schedule with reverse-direction data.
    pub fn classify_route(&self, schedule: &Schedule) -> bool {
        let legs = schedule.legs();
        if legs.is_empty() {
            return false;
        }

        let back_and_forth = schedule.is_mirrored()
            || legs.iter().all(|leg| legs.contains(&leg.reversed()));
        if !back_and_forth {
            return false;
        }

        legs.iter()
            .any(|leg| self.reverse.contains_key(leg) || self.reverse.contains_key(&leg.reversed()))
    }
}
