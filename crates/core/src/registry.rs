//! Arena of live lines and convoys, and the operations that touch both.

use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::SlotMap;
use tracing::{debug, info, warn};

use crate::context::WorldContext;
use crate::convoy::{Convoy, ConvoyLookup, ConvoyLookupMut};
use crate::error::RegistryError;
use crate::handle::{ConvoyHandle, LineHandle};
use crate::journey::Direction;
use crate::ledger::CostCategory;
use crate::line::{Line, LineType, PlayerId};
use crate::schedule::{Schedule, StopId, StopRegistry};
use crate::status::LineStatus;

/// Registry shared between the simulation driver and parallel workers.
///
/// Workers take read locks during the parallel phase; only the
/// synchronisation point takes the write lock.
pub type SharedRegistry = Arc<RwLock<Registry>>;

/// Owner of every line and convoy, addressed by generation-checked handles.
#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) lines: SlotMap<LineHandle, Line>,
    pub(crate) convoys: SlotMap<ConvoyHandle, Convoy>,
    pub(crate) stops: StopRegistry,
}

impl Registry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap the registry for shared access.
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Resolve a line handle.
    pub fn line(&self, handle: LineHandle) -> Option<&Line> {
        self.lines.get(handle)
    }

    /// Resolve a line handle for mutation.
    pub fn line_mut(&mut self, handle: LineHandle) -> Option<&mut Line> {
        self.lines.get_mut(handle)
    }

    /// Resolve a line handle, reporting stale handles as errors.
    pub fn line_checked(&self, handle: LineHandle) -> Result<&Line, RegistryError> {
        self.lines.get(handle).ok_or(RegistryError::StaleLine(handle))
    }

    /// Resolve a convoy handle, reporting stale handles as errors.
    pub fn convoy_checked(&self, handle: ConvoyHandle) -> Result<&Convoy, RegistryError> {
        self.convoys
            .get(handle)
            .ok_or(RegistryError::StaleConvoy(handle))
    }

    /// Handles of all live lines in arena order.
    pub fn line_handles(&self) -> Vec<LineHandle> {
        self.lines.keys().collect()
    }

    /// Iterate over all live lines.
    pub fn lines(&self) -> impl Iterator<Item = (LineHandle, &Line)> {
        self.lines.iter()
    }

    /// Iterate over all live convoys.
    pub fn convoys(&self) -> impl Iterator<Item = (ConvoyHandle, &Convoy)> {
        self.convoys.iter()
    }

    /// Number of live lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Number of live convoys.
    pub fn convoy_count(&self) -> usize {
        self.convoys.len()
    }

    /// Stop directory the lines register with.
    pub fn stops(&self) -> &StopRegistry {
        &self.stops
    }

    /// Add a convoy to the arena.
    pub fn insert_convoy(&mut self, convoy: Convoy) -> ConvoyHandle {
        self.convoys.insert(convoy)
    }

    /// Destroy a convoy, detaching it from its line first.
    pub fn remove_convoy(&mut self, handle: ConvoyHandle) -> Option<Convoy> {
        let line = self.convoys.get(handle)?.line();
        if let Some(line) = line.and_then(|line| self.lines.get_mut(line)) {
            line.remove_convoy(handle, &mut self.convoys);
        }
        self.convoys.remove(handle)
    }

    /// Create a line with a fresh schedule for `line_type`.
    pub fn create_line(&mut self, line_type: LineType, owner: PlayerId, ctx: &WorldContext) -> LineHandle {
        self.create_line_with_schedule(line_type, owner, line_type.create_schedule(), ctx)
    }

    /// Create a line running `schedule` and register it with its stops.
    pub fn create_line_with_schedule(
        &mut self,
        line_type: LineType,
        owner: PlayerId,
        schedule: Schedule,
        ctx: &WorldContext,
    ) -> LineHandle {
        let handle = self
            .lines
            .insert_with_key(|handle| Line::with_schedule(handle, line_type, owner, schedule, ctx));
        if let Some(line) = self.lines.get_mut(handle) {
            line.register_with_stops(&mut self.stops);
            line.classify_route();
        }
        info!(line = ?handle, ?line_type, "line created");
        handle
    }

    /// Destroy a line.
    ///
    /// The line is removed from every stop it serves and its convoys are
    /// detached (not destroyed). Returns the detached convoys.
    pub fn destroy_line(&mut self, handle: LineHandle) -> Result<Vec<ConvoyHandle>, RegistryError> {
        let mut line = self
            .lines
            .remove(handle)
            .ok_or(RegistryError::StaleLine(handle))?;
        if line.is_registered() {
            line.unregister_from_stops(&mut self.stops);
        }
        let detached = line.detach_all(&mut self.convoys);
        info!(line = ?handle, detached = detached.len(), "line destroyed");
        Ok(detached)
    }

    /// Assign a convoy to a line, moving it off any previous line.
    ///
    /// Returns `false` if it already belonged to this line.
    pub fn assign_convoy(&mut self, line: LineHandle, convoy: ConvoyHandle) -> Result<bool, RegistryError> {
        if !self.lines.contains_key(line) {
            return Err(RegistryError::StaleLine(line));
        }
        let previous = self.convoy_checked(convoy)?.line();
        if let Some(previous) = previous.filter(|previous| *previous != line) {
            if let Some(old) = self.lines.get_mut(previous) {
                debug!(?convoy, from = ?previous, to = ?line, "moving convoy between lines");
                old.remove_convoy(convoy, &mut self.convoys);
            }
        }
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        Ok(target.add_convoy(convoy, &mut self.convoys, false))
    }

    /// Detach a convoy from a line. Returns `false` if it was not a member.
    pub fn release_convoy(&mut self, line: LineHandle, convoy: ConvoyHandle) -> Result<bool, RegistryError> {
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        Ok(target.remove_convoy(convoy, &mut self.convoys))
    }

    /// Replace a line's schedule, keeping stop registration in sync.
    pub fn set_schedule(&mut self, line: LineHandle, schedule: Schedule) -> Result<(), RegistryError> {
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        target.set_schedule(schedule, &mut self.stops);
        Ok(())
    }

    /// Re-register a line with the stops of its current schedule.
    pub fn renew_stops(&mut self, line: LineHandle) -> Result<(), RegistryError> {
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        target.renew_stops(&mut self.stops);
        Ok(())
    }

    /// Book an amount on a line's ledger.
    pub fn book(&mut self, line: LineHandle, category: CostCategory, amount: i64) -> Result<(), RegistryError> {
        self.lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?
            .book(category, amount);
        Ok(())
    }

    /// Record a measured leg on a line.
    pub fn record_leg(
        &mut self,
        line: LineHandle,
        from: StopId,
        to: StopId,
        direction: Direction,
        duration: u32,
    ) -> Result<(), RegistryError> {
        self.lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?
            .record_leg(from, to, direction, duration);
        Ok(())
    }

    /// Re-derive a line's status.
    pub fn recalc_status(&mut self, line: LineHandle) -> Result<LineStatus, RegistryError> {
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        Ok(target.recalc_status(&self.convoys))
    }

    /// Withdraw a line and all of its convoys, or cancel the withdrawal.
    pub fn set_withdraw(&mut self, line: LineHandle, withdraw: bool) -> Result<(), RegistryError> {
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        target.set_withdraw(withdraw, &mut self.convoys);
        Ok(())
    }

    /// Apply a line's livery scheme to its convoys.
    pub fn set_livery_scheme(&mut self, line: LineHandle, index: u16) -> Result<(), RegistryError> {
        let target = self
            .lines
            .get_mut(line)
            .ok_or(RegistryError::StaleLine(line))?;
        target.set_livery_scheme_index(index);
        target.propagate_livery_scheme(&mut self.convoys);
        Ok(())
    }

    /// Close the month on every line. Returns the resulting statuses.
    pub fn month_end(&mut self) -> Vec<(LineHandle, LineStatus)> {
        let convoys = &self.convoys;
        self.lines
            .iter_mut()
            .map(|(handle, line)| (handle, line.on_month_end(convoys)))
            .collect()
    }

    /// Re-link restored lines with their convoys and stops.
    ///
    /// Every member's back reference is pointed at its line. A convoy
    /// claimed by two lines stays with the first and is dropped from the
    /// second. Each line then registers with its stops and recomputes its
    /// goods categories, route shape and status.
    pub(crate) fn finish_loading(&mut self) -> Vec<(LineHandle, ConvoyHandle)> {
        let mut conflicts = Vec::new();
        for (handle, line) in self.lines.iter_mut() {
            let members = line.fleet.members().to_vec();
            for member in members {
                let Some(convoy) = self.convoys.get_mut(member) else {
                    continue;
                };
                match convoy.line() {
                    Some(owner) if owner != handle => {
                        warn!(line = ?handle, ?member, ?owner, "convoy already belongs to another line");
                        line.fleet.remove(member);
                        line.sync_convoy_count();
                        conflicts.push((handle, member));
                    }
                    _ => convoy.set_line(Some(handle)),
                }
            }
            line.register_with_stops(&mut self.stops);
            line.recalc_goods_categories(&self.convoys);
            line.schedule.clear_revalidation();
            line.classify_route();
            line.recalc_status(&self.convoys);
        }
        conflicts
    }
}

impl ConvoyLookup for Registry {
    fn convoy(&self, handle: ConvoyHandle) -> Option<&Convoy> {
        self.convoys.get(handle)
    }
}

impl ConvoyLookupMut for Registry {
    fn convoy_mut(&mut self, handle: ConvoyHandle) -> Option<&mut Convoy> {
        self.convoys.get_mut(handle)
    }
}
