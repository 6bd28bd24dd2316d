//! Convoy state consumed by the line engine.
//!
//! Convoys are simulated elsewhere; this record only carries what lines
//! read from them (cargo capability, movement and obsolescence flags) and
//! what lines push onto them (withdraw, livery, schedule direction, and the
//! back reference to the owning line).

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::handle::{ConvoyHandle, LineHandle};

/// A vehicle or group of vehicles that can be assigned to a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Convoy {
    /// Display name.
    pub name: String,
    /// Goods categories the convoy's vehicles can carry.
    pub goods_categories: BTreeSet<u8>,
    /// Whether the convoy moved at all during the last period.
    pub moved_last_period: bool,
    /// Whether any vehicle in the convoy is obsolete.
    pub has_obsolete_vehicle: bool,
    /// Whether the convoy is waiting to be replaced.
    pub replacing: bool,
    /// Whether the convoy carries more passengers than its capacity.
    pub overcrowded: bool,
    /// Convoy is being withdrawn from service.
    pub withdraw: bool,
    /// Convoy must not load new cargo.
    pub no_load: bool,
    /// Livery scheme applied to the convoy's vehicles.
    pub livery_scheme_index: u16,
    /// Whether the convoy runs its schedule from the far end.
    pub reverse_schedule: bool,
    #[serde(skip)]
    line: Option<LineHandle>,
}

impl Convoy {
    /// New convoy able to carry the given goods categories.
    pub fn new(name: impl Into<String>, goods_categories: impl IntoIterator<Item = u8>) -> Self {
        Self {
            name: name.into(),
            goods_categories: goods_categories.into_iter().collect(),
            moved_last_period: true,
            ..Self::default()
        }
    }

    /// Line the convoy is assigned to, if any.
    pub fn line(&self) -> Option<LineHandle> {
        self.line
    }

    pub(crate) fn set_line(&mut self, line: Option<LineHandle>) {
        self.line = line;
    }
}

/// Read access to convoys by handle.
///
/// Lines never own convoys; every query they make about a member goes
/// through this lookup, and a stale handle simply yields `None`.
pub trait ConvoyLookup {
    /// Resolve a convoy handle.
    fn convoy(&self, handle: ConvoyHandle) -> Option<&Convoy>;
}

/// Write access to convoys by handle.
pub trait ConvoyLookupMut: ConvoyLookup {
    /// Resolve a convoy handle for mutation.
    fn convoy_mut(&mut self, handle: ConvoyHandle) -> Option<&mut Convoy>;
}

impl ConvoyLookup for slotmap::SlotMap<ConvoyHandle, Convoy> {
    fn convoy(&self, handle: ConvoyHandle) -> Option<&Convoy> {
        self.get(handle)
    }
}

impl ConvoyLookupMut for slotmap::SlotMap<ConvoyHandle, Convoy> {
    fn convoy_mut(&mut self, handle: ConvoyHandle) -> Option<&mut Convoy> {
        self.get_mut(handle)
    }
}
