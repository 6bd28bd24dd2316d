//! The line aggregate: schedule, fleet, ledger, journey times and status.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::{LineSettings, WorldContext};
use crate::convoy::{ConvoyLookup, ConvoyLookupMut};
use crate::error::LedgerError;
use crate::fleet::FleetMembership;
use crate::handle::{ConvoyHandle, LineHandle};
use crate::journey::{Direction, JourneyTimes};
use crate::ledger::{CostCategory, Ledger};
use crate::schedule::{Schedule, ScheduleKind, StopDirectory, StopId};
use crate::status::{self, LineStatus, StatusInputs};

/// Kind of transport a line provides. Fixed for the life of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    /// Road passenger service.
    Bus,
    /// Road freight service.
    Truck,
    /// Standard gauge railway.
    Train,
    /// Shipping line.
    Ship,
    /// Air service.
    Air,
    /// Monorail.
    Monorail,
    /// Tramway.
    Tram,
    /// Maglev.
    Maglev,
    /// Narrow gauge railway.
    NarrowGauge,
}

impl LineType {
    /// Every line type in tag order.
    pub const ALL: [LineType; 9] = [
        LineType::Bus,
        LineType::Truck,
        LineType::Train,
        LineType::Ship,
        LineType::Air,
        LineType::Monorail,
        LineType::Tram,
        LineType::Maglev,
        LineType::NarrowGauge,
    ];

    /// Numeric tag written to save archives.
    pub fn tag(self) -> u64 {
        self as u64
    }

    /// Line type for a persisted tag.
    pub fn from_tag(tag: u64) -> Option<Self> {
        usize::try_from(tag)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Way type the line's schedule runs on.
    pub fn schedule_kind(self) -> ScheduleKind {
        match self {
            LineType::Bus | LineType::Truck => ScheduleKind::Road,
            LineType::Train => ScheduleKind::Rail,
            LineType::Ship => ScheduleKind::Water,
            LineType::Air => ScheduleKind::Air,
            LineType::Monorail => ScheduleKind::Monorail,
            LineType::Tram => ScheduleKind::Tram,
            LineType::Maglev => ScheduleKind::Maglev,
            LineType::NarrowGauge => ScheduleKind::NarrowGauge,
        }
    }

    /// Fresh empty schedule for this line type.
    ///
    /// Track-bound lines can turn at either terminus, so their schedules
    /// start out bidirectional.
    pub fn create_schedule(self) -> Schedule {
        let mut schedule = Schedule::new(self.schedule_kind());
        match self {
            LineType::Train
            | LineType::Monorail
            | LineType::Tram
            | LineType::Maglev
            | LineType::NarrowGauge => schedule.set_bidirectional(true),
            LineType::Bus | LineType::Truck | LineType::Ship | LineType::Air => {}
        }
        schedule
    }
}

/// Identifier of the player operating a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

/// A scheduled transport service with its assigned convoys.
#[derive(Debug, Clone)]
pub struct Line {
    pub(crate) handle: LineHandle,
    pub(crate) name: String,
    pub(crate) line_type: LineType,
    pub(crate) owner: PlayerId,
    pub(crate) withdraw: bool,
    pub(crate) livery_scheme_index: u16,
    pub(crate) start_reversed: bool,
    pub(crate) founded_month: u32,
    pub(crate) schedule: Schedule,
    pub(crate) fleet: FleetMembership,
    pub(crate) ledger: Ledger,
    pub(crate) journeys: JourneyTimes,
    pub(crate) alternating_circular: bool,
    pub(crate) status: LineStatus,
    pub(crate) registered_stops: Option<BTreeSet<StopId>>,
}

impl Line {
    /// Fresh line with an empty schedule suited to `line_type`.
    pub fn new(handle: LineHandle, line_type: LineType, owner: PlayerId, ctx: &WorldContext) -> Self {
        Self::with_schedule(handle, line_type, owner, line_type.create_schedule(), ctx)
    }

    pub(crate) fn with_schedule(
        handle: LineHandle,
        line_type: LineType,
        owner: PlayerId,
        schedule: Schedule,
        ctx: &WorldContext,
    ) -> Self {
        let settings: &LineSettings = &ctx.settings;
        let schedule = conform_schedule(handle, line_type, schedule);
        Self {
            handle,
            name: String::new(),
            line_type,
            owner,
            withdraw: false,
            livery_scheme_index: 0,
            start_reversed: false,
            founded_month: ctx.current_month,
            schedule,
            fleet: FleetMembership::new(),
            ledger: Ledger::new(settings.average_policy, settings.profit_policy),
            journeys: JourneyTimes::new(settings.journey_time_window),
            alternating_circular: false,
            status: LineStatus::Empty,
            registered_stops: None,
        }
    }

    /// Handle of this line.
    pub fn handle(&self) -> LineHandle {
        self.handle
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the line.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Transport type of the line.
    pub fn line_type(&self) -> LineType {
        self.line_type
    }

    /// Operating player.
    pub fn owner(&self) -> PlayerId {
        self.owner
    }

    /// Month in which the line was founded.
    pub fn founded_month(&self) -> u32 {
        self.founded_month
    }

    /// The line's schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Clear the schedule's revalidation flag once freight routing over it
    /// has been checked again. Returns whether the flag was set.
    ///
    /// The stop sequence itself only changes through [`Line::set_schedule`].
    pub fn take_schedule_revalidation(&mut self) -> bool {
        let pending = self.schedule.needs_revalidation();
        self.schedule.clear_revalidation();
        pending
    }

    /// Convoy membership.
    pub fn fleet(&self) -> &FleetMembership {
        &self.fleet
    }

    /// Number of assigned convoys.
    pub fn count_convoys(&self) -> usize {
        self.fleet.member_count()
    }

    /// Convoy at position `index`.
    pub fn convoy_at(&self, index: usize) -> Option<ConvoyHandle> {
        self.fleet.member_at(index)
    }

    /// Goods categories the line's convoys can carry.
    pub fn goods_categories(&self) -> &BTreeSet<u8> {
        self.fleet.goods_categories()
    }

    /// Financial history.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Mutable financial history, e.g. for an explicit average reset.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Journey time tables.
    pub fn journey_times(&self) -> &JourneyTimes {
        &self.journeys
    }

    /// Status as of the last recalculation.
    pub fn status(&self) -> LineStatus {
        self.status
    }

    /// Whether the line is being phased out.
    pub fn withdraw(&self) -> bool {
        self.withdraw
    }

    /// Livery scheme used by the line's convoys.
    pub fn livery_scheme_index(&self) -> u16 {
        self.livery_scheme_index
    }

    /// Whether the schedule is run back and forth over the same stops.
    pub fn is_alternating_circular_route(&self) -> bool {
        self.alternating_circular
    }

    /// Whether the next convoy added to a bidirectional schedule starts
    /// from the far end.
    pub fn start_reversed(&self) -> bool {
        self.start_reversed
    }

    /// Whether the line is registered with its schedule's stops.
    pub fn is_registered(&self) -> bool {
        self.registered_stops.is_some()
    }

    /// Book `amount` into the open month of `category`.
    pub fn book(&mut self, category: CostCategory, amount: i64) {
        self.ledger.book(category, amount);
    }

    /// Ledger value for `category` in `month`.
    pub fn finance_history(&self, month: usize, category: CostCategory) -> Result<i64, LedgerError> {
        self.ledger.value(month, category)
    }

    /// Assign a convoy to the line.
    ///
    /// Only the line side and the convoy's back reference are updated;
    /// detaching the convoy from a previous line is the registry's job.
    /// Returns `false` if the convoy was already a member.
    pub(crate) fn add_convoy(
        &mut self,
        convoy: ConvoyHandle,
        convoys: &mut impl ConvoyLookupMut,
        from_loading: bool,
    ) -> bool {
        if !self.fleet.add(convoy) {
            return false;
        }

        let bidirectional = self.schedule.is_bidirectional();
        if let Some(member) = convoys.convoy_mut(convoy) {
            member.set_line(Some(self.handle));
            if bidirectional && !from_loading {
                member.reverse_schedule = self.start_reversed;
                self.start_reversed = !self.start_reversed;
            }
        }

        self.sync_convoy_count();
        self.recalc_goods_categories(&*convoys);
        self.recalc_status(&*convoys);
        true
    }

    /// Detach a convoy from the line without destroying it.
    ///
    /// Returns `false` if the convoy was not a member.
    pub(crate) fn remove_convoy(&mut self, convoy: ConvoyHandle, convoys: &mut impl ConvoyLookupMut) -> bool {
        if !self.fleet.remove(convoy) {
            return false;
        }
        if let Some(member) = convoys.convoy_mut(convoy) {
            if member.line() == Some(self.handle) {
                member.set_line(None);
            }
        }
        self.sync_convoy_count();
        self.recalc_goods_categories(&*convoys);
        self.recalc_status(&*convoys);
        true
    }

    /// Detach every member convoy, returning them in membership order.
    pub(crate) fn detach_all(&mut self, convoys: &mut impl ConvoyLookupMut) -> Vec<ConvoyHandle> {
        let carried_goods = !self.fleet.goods_categories().is_empty();
        let members = self.fleet.take_members();
        for handle in &members {
            if let Some(member) = convoys.convoy_mut(*handle) {
                if member.line() == Some(self.handle) {
                    member.set_line(None);
                }
            }
        }
        if carried_goods {
            self.schedule.mark_for_revalidation();
        }
        self.sync_convoy_count();
        self.recalc_status(&*convoys);
        members
    }

    /// Rebuild the goods category set and flag the schedule for freight
    /// revalidation when it changed.
    pub fn recalc_goods_categories(&mut self, convoys: &impl ConvoyLookup) -> bool {
        let changed = self.fleet.recalc_goods_categories(convoys);
        if changed {
            debug!(line = ?self.handle, categories = ?self.fleet.goods_categories(), "goods categories changed");
            self.schedule.mark_for_revalidation();
        }
        changed
    }

    /// Re-derive the status from fleet and ledger state.
    pub fn recalc_status(&mut self, convoys: &impl ConvoyLookup) -> LineStatus {
        let mut inputs = StatusInputs {
            member_count: self.fleet.member_count(),
            last_profit: self
                .ledger
                .value(1, CostCategory::Profit)
                .unwrap_or_default(),
            ..StatusInputs::default()
        };
        for member in self.fleet.members().iter().filter_map(|h| convoys.convoy(*h)) {
            inputs.any_moved |= member.moved_last_period;
            inputs.any_obsolete |= member.has_obsolete_vehicle;
        }
        self.status = status::evaluate(inputs);
        self.status
    }

    /// Close the current month and refresh the status.
    pub fn on_month_end(&mut self, convoys: &impl ConvoyLookup) -> LineStatus {
        self.ledger.close_month();
        self.sync_convoy_count();
        self.recalc_status(convoys)
    }

    /// Keep the open month's convoy count in step with the membership.
    pub(crate) fn sync_convoy_count(&mut self) {
        let count = i64::try_from(self.fleet.member_count()).unwrap_or(i64::MAX);
        self.ledger.set_current(CostCategory::ConvoyCount, count);
    }

    /// Tell every stop of the schedule that this line serves it.
    ///
    /// Registering twice is a no-op and returns `false`.
    pub fn register_with_stops(&mut self, stops: &mut impl StopDirectory) -> bool {
        if self.registered_stops.is_some() {
            warn!(line = ?self.handle, "line already registered with its stops");
            return false;
        }
        let unique = self.schedule.unique_stops();
        for stop in &unique {
            stops.register_line(*stop, self.handle);
        }
        self.registered_stops = Some(unique);
        true
    }

    /// Remove this line from every stop it registered with.
    ///
    /// Returns `false` if the line was not registered.
    pub fn unregister_from_stops(&mut self, stops: &mut impl StopDirectory) -> bool {
        let Some(registered) = self.registered_stops.take() else {
            warn!(line = ?self.handle, "line was not registered with any stops");
            return false;
        };
        for stop in registered {
            stops.unregister_line(stop, self.handle);
        }
        true
    }

    /// Re-register with the stops of the current schedule.
    pub fn renew_stops(&mut self, stops: &mut impl StopDirectory) {
        if self.registered_stops.is_some() {
            self.unregister_from_stops(stops);
        }
        self.register_with_stops(stops);
    }

    /// Install a new schedule.
    ///
    /// A schedule of another kind is converted to the line type's kind.
    /// Stop registration is moved to the new stops and the route shape is
    /// reclassified.
    pub fn set_schedule(&mut self, schedule: Schedule, stops: &mut impl StopDirectory) {
        let mut schedule = conform_schedule(self.handle, self.line_type, schedule);
        let was_registered = self.registered_stops.is_some();
        if was_registered {
            self.unregister_from_stops(stops);
        }
        schedule.mark_for_revalidation();
        self.schedule = schedule;
        if was_registered {
            self.register_with_stops(stops);
        }
        self.classify_route();
    }

    /// Fold a measured leg into the journey time tables.
    pub fn record_leg(&mut self, from: StopId, to: StopId, direction: Direction, duration: u32) {
        let is_new = self.journeys.record_leg(from, to, direction, duration);
        if is_new && direction == Direction::Reverse {
            self.classify_route();
        }
    }

    /// Averaged journey time between two stops.
    pub fn average_journey_time(&self, from: StopId, to: StopId, direction: Direction) -> Option<u32> {
        self.journeys.average_for(from, to, direction)
    }

    /// Recompute whether the schedule is an alternating circular route.
    pub fn classify_route(&mut self) -> bool {
        self.alternating_circular = self.journeys.classify_route(&self.schedule);
        self.alternating_circular
    }

    /// Set the withdraw flag on the line and all of its convoys.
    ///
    /// Withdrawn convoys stop loading new cargo.
    pub fn set_withdraw(&mut self, withdraw: bool, convoys: &mut impl ConvoyLookupMut) {
        self.withdraw = withdraw;
        for handle in self.fleet.members() {
            if let Some(member) = convoys.convoy_mut(*handle) {
                member.withdraw = withdraw;
                member.no_load = withdraw;
            }
        }
    }

    /// Choose the livery scheme for the line.
    pub fn set_livery_scheme_index(&mut self, index: u16) {
        self.livery_scheme_index = index;
    }

    /// Apply the line's livery scheme to every member convoy.
    pub fn propagate_livery_scheme(&self, convoys: &mut impl ConvoyLookupMut) {
        for handle in self.fleet.members() {
            if let Some(member) = convoys.convoy_mut(*handle) {
                member.livery_scheme_index = self.livery_scheme_index;
            }
        }
    }

    /// Number of members waiting to be replaced.
    pub fn replacing_convoys_count(&self, convoys: &impl ConvoyLookup) -> usize {
        self.fleet
            .members()
            .iter()
            .filter_map(|h| convoys.convoy(*h))
            .filter(|member| member.replacing)
            .count()
    }

    /// Whether any member is carrying more passengers than it should.
    pub fn has_overcrowded(&self, convoys: &impl ConvoyLookup) -> bool {
        self.fleet
            .members()
            .iter()
            .filter_map(|h| convoys.convoy(*h))
            .any(|member| member.overcrowded)
    }
}

/// Force `schedule` onto the way type `line_type` runs on.
fn conform_schedule(line: LineHandle, line_type: LineType, mut schedule: Schedule) -> Schedule {
    let expected = line_type.schedule_kind();
    if schedule.kind() != expected {
        warn!(?line, ?line_type, found = ?schedule.kind(), "schedule kind does not match line type");
        schedule.set_kind(expected);
    }
    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convoy::Convoy;
    use crate::schedule::StopRegistry;
    use slotmap::SlotMap;

    fn setup() -> (SlotMap<LineHandle, ()>, SlotMap<ConvoyHandle, Convoy>, WorldContext) {
        (SlotMap::with_key(), SlotMap::with_key(), WorldContext::default())
    }

    fn stops(ids: &[u32]) -> Vec<StopId> {
        ids.iter().copied().map(StopId).collect()
    }

    #[test]
    fn factory_schedules_follow_line_type() {
        assert_eq!(LineType::Truck.create_schedule().kind(), ScheduleKind::Road);
        assert!(!LineType::Bus.create_schedule().is_bidirectional());
        assert!(LineType::Train.create_schedule().is_bidirectional());
        assert_eq!(LineType::Ship.create_schedule().kind(), ScheduleKind::Water);
        for line_type in LineType::ALL {
            assert_eq!(LineType::from_tag(line_type.tag()), Some(line_type));
        }
        assert_eq!(LineType::from_tag(9), None);
    }

    #[test]
    fn new_line_is_empty() {
        let (mut handles, convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Bus, PlayerId(1), &ctx);
        assert_eq!(line.status(), LineStatus::Empty);
        assert_eq!(line.recalc_status(&convoys), LineStatus::Empty);
        assert!(line.schedule().stops().is_empty());
    }

    #[test]
    fn adding_convoys_sets_back_reference_and_goods() {
        let (mut handles, mut convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Truck, PlayerId(0), &ctx);
        let c1 = convoys.insert(Convoy::new("c1", [2, 5]));

        assert!(line.add_convoy(c1, &mut convoys, false));
        assert!(!line.add_convoy(c1, &mut convoys, false));
        assert_eq!(convoys[c1].line(), Some(line.handle()));
        assert_eq!(line.goods_categories().iter().copied().collect::<Vec<_>>(), vec![2, 5]);
        assert!(line.schedule().needs_revalidation());
        assert_eq!(line.status(), LineStatus::Healthy);
        assert_eq!(line.finance_history(0, CostCategory::ConvoyCount), Ok(1));

        assert!(line.remove_convoy(c1, &mut convoys));
        assert_eq!(convoys[c1].line(), None);
        assert_eq!(line.finance_history(0, CostCategory::ConvoyCount), Ok(0));
        assert!(line.goods_categories().is_empty());
        assert_eq!(line.status(), LineStatus::Empty);
    }

    #[test]
    fn bidirectional_schedule_alternates_start_direction() {
        let (mut handles, mut convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Train, PlayerId(0), &ctx);
        let c1 = convoys.insert(Convoy::new("c1", [0]));
        let c2 = convoys.insert(Convoy::new("c2", [0]));
        let c3 = convoys.insert(Convoy::new("c3", [0]));

        line.add_convoy(c1, &mut convoys, false);
        line.add_convoy(c2, &mut convoys, false);
        line.add_convoy(c3, &mut convoys, true);
        assert!(!convoys[c1].reverse_schedule);
        assert!(convoys[c2].reverse_schedule);
        assert!(!convoys[c3].reverse_schedule);
        assert!(!line.start_reversed());
    }

    #[test]
    fn month_end_books_convoy_count_and_reads_last_profit() {
        let (mut handles, mut convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Bus, PlayerId(0), &ctx);
        let c1 = convoys.insert(Convoy::new("c1", [0]));
        line.add_convoy(c1, &mut convoys, false);

        line.book(CostCategory::OperatingCost, -300);
        assert_eq!(line.status(), LineStatus::Healthy);
        assert_eq!(line.on_month_end(&convoys), LineStatus::Unprofitable);
        assert_eq!(line.finance_history(0, CostCategory::ConvoyCount), Ok(1));

        line.book(CostCategory::Revenue, 500);
        assert_eq!(line.on_month_end(&convoys), LineStatus::Healthy);
    }

    #[test]
    fn stalled_and_obsolete_come_from_convoy_flags() {
        let (mut handles, mut convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Bus, PlayerId(0), &ctx);
        let c1 = convoys.insert(Convoy::new("c1", [0]));
        line.add_convoy(c1, &mut convoys, false);

        convoys[c1].has_obsolete_vehicle = true;
        assert_eq!(line.recalc_status(&convoys), LineStatus::Obsolete);
        convoys[c1].moved_last_period = false;
        assert_eq!(line.recalc_status(&convoys), LineStatus::Stalled);
    }

    #[test]
    fn stop_registration_is_guarded() {
        let (mut handles, _, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Bus, PlayerId(0), &ctx);
        let mut schedule = LineType::Bus.create_schedule();
        schedule.set_stops(stops(&[1, 2, 1, 3]));
        let mut directory = StopRegistry::new();
        line.set_schedule(schedule, &mut directory);
        assert!(directory.lines_at(StopId(1)).is_empty());

        assert!(line.register_with_stops(&mut directory));
        assert!(!line.register_with_stops(&mut directory));
        assert_eq!(directory.lines_at(StopId(1)), &[line.handle()]);
        assert_eq!(directory.lines_at(StopId(3)), &[line.handle()]);

        let mut replacement = LineType::Bus.create_schedule();
        replacement.set_stops(stops(&[3, 4]));
        line.set_schedule(replacement, &mut directory);
        assert!(directory.lines_at(StopId(1)).is_empty());
        assert_eq!(directory.lines_at(StopId(4)), &[line.handle()]);

        assert!(line.unregister_from_stops(&mut directory));
        assert!(!line.unregister_from_stops(&mut directory));
        assert!(directory.lines_at(StopId(3)).is_empty());
    }

    #[test]
    fn schedule_change_reclassifies_route() {
        let (mut handles, _, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Tram, PlayerId(0), &ctx);
        let mut directory = StopRegistry::new();
        let mut shuttle = LineType::Tram.create_schedule();
        shuttle.set_stops(stops(&[1, 2, 3]));
        shuttle.set_mirrored(true);
        line.set_schedule(shuttle, &mut directory);
        assert!(!line.is_alternating_circular_route());

        line.record_leg(StopId(3), StopId(2), Direction::Reverse, 40);
        assert!(line.is_alternating_circular_route());
        assert_eq!(line.average_journey_time(StopId(3), StopId(2), Direction::Reverse), Some(40));

        let mut ring = LineType::Tram.create_schedule();
        ring.set_stops(stops(&[1, 2, 3]));
        line.set_schedule(ring, &mut directory);
        assert!(!line.is_alternating_circular_route());
    }

    #[test]
    fn withdraw_and_livery_reach_every_member() {
        let (mut handles, mut convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Ship, PlayerId(0), &ctx);
        let c1 = convoys.insert(Convoy::new("c1", [0]));
        let c2 = convoys.insert(Convoy::new("c2", [0]));
        line.add_convoy(c1, &mut convoys, false);
        line.add_convoy(c2, &mut convoys, false);

        line.set_withdraw(true, &mut convoys);
        assert!(line.withdraw());
        assert!(convoys[c1].withdraw && convoys[c1].no_load);
        assert!(convoys[c2].withdraw && convoys[c2].no_load);

        line.set_livery_scheme_index(3);
        line.propagate_livery_scheme(&mut convoys);
        assert_eq!(convoys[c2].livery_scheme_index, 3);
    }

    #[test]
    fn replacing_and_overcrowding_queries() {
        let (mut handles, mut convoys, ctx) = setup();
        let mut line = Line::new(handles.insert(()), LineType::Air, PlayerId(0), &ctx);
        let c1 = convoys.insert(Convoy::new("c1", [0]));
        let c2 = convoys.insert(Convoy::new("c2", [0]));
        line.add_convoy(c1, &mut convoys, false);
        line.add_convoy(c2, &mut convoys, false);
        assert_eq!(line.replacing_convoys_count(&convoys), 0);
        assert!(!line.has_overcrowded(&convoys));

        convoys[c1].replacing = true;
        convoys[c2].overcrowded = true;
        assert_eq!(line.replacing_convoys_count(&convoys), 1);
        assert!(line.has_overcrowded(&convoys));
    }
}
