//! Ordered convoy membership of a line and the goods it can carry.

use std::collections::BTreeSet;

use crate::convoy::ConvoyLookup;
use crate::handle::ConvoyHandle;

/// Convoys assigned to a line, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetMembership {
    convoys: Vec<ConvoyHandle>,
    goods_categories: BTreeSet<u8>,
}

impl FleetMembership {
    /// Empty membership.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `convoy` unless it is already a member.
    ///
    /// Returns `true` when the membership changed.
    pub fn add(&mut self, convoy: ConvoyHandle) -> bool {
        if self.contains(convoy) {
            return false;
        }
        self.convoys.push(convoy);
        true
    }

    /// Remove `convoy` if it is a member, keeping the order of the rest.
    ///
    /// Returns `true` when the membership changed.
    pub fn remove(&mut self, convoy: ConvoyHandle) -> bool {
        match self.convoys.iter().position(|member| *member == convoy) {
            Some(index) => {
                self.convoys.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `convoy` is a member.
    pub fn contains(&self, convoy: ConvoyHandle) -> bool {
        self.convoys.contains(&convoy)
    }

    /// Number of member convoys.
    pub fn member_count(&self) -> usize {
        self.convoys.len()
    }

    /// Member at `index`, if any.
    pub fn member_at(&self, index: usize) -> Option<ConvoyHandle> {
        self.convoys.get(index).copied()
    }

    /// All members in order.
    pub fn members(&self) -> &[ConvoyHandle] {
        &self.convoys
    }

    pub(crate) fn take_members(&mut self) -> Vec<ConvoyHandle> {
        self.goods_categories.clear();
        std::mem::take(&mut self.convoys)
    }

    /// Goods categories carried by at least one member.
    pub fn goods_categories(&self) -> &BTreeSet<u8> {
        &self.goods_categories
    }

    /// Rebuild the goods category set from the members' current cargo
    /// capability.
    ///
    /// Returns `true` when the set changed, in which case freight routing
    /// over the line's schedule is no longer valid. Members that no longer
    /// resolve contribute nothing.
    pub fn recalc_goods_categories(&mut self, convoys: &impl ConvoyLookup) -> bool {
        let categories: BTreeSet<u8> = self
            .convoys
            .iter()
            .filter_map(|handle| convoys.convoy(*handle))
            .flat_map(|convoy| convoy.goods_categories.iter().copied())
            .collect();
        if categories == self.goods_categories {
            return false;
        }
        self.goods_categories = categories;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convoy::Convoy;
    use slotmap::SlotMap;

    #[test]
    fn add_is_idempotent_and_keeps_order() {
        let mut convoys: SlotMap<ConvoyHandle, Convoy> = SlotMap::with_key();
        let a = convoys.insert(Convoy::new("a", [0]));
        let b = convoys.insert(Convoy::new("b", [1]));
        let mut fleet = FleetMembership::new();

        assert!(fleet.add(a));
        assert!(fleet.add(b));
        assert!(!fleet.add(a));
        assert_eq!(fleet.member_count(), 2);
        assert_eq!(fleet.member_at(0), Some(a));
        assert_eq!(fleet.member_at(1), Some(b));
        assert_eq!(fleet.member_at(2), None);
    }

    #[test]
    fn remove_of_absent_convoy_is_a_no_op() {
        let mut convoys: SlotMap<ConvoyHandle, Convoy> = SlotMap::with_key();
        let a = convoys.insert(Convoy::new("a", [0]));
        let b = convoys.insert(Convoy::new("b", [0]));
        let mut fleet = FleetMembership::new();
        fleet.add(a);

        assert!(!fleet.remove(b));
        assert!(fleet.remove(a));
        assert!(!fleet.remove(a));
        assert_eq!(fleet.member_count(), 0);
    }

    #[test]
    fn member_count_tracks_mixed_operations() {
        let mut convoys: SlotMap<ConvoyHandle, Convoy> = SlotMap::with_key();
        let handles: Vec<_> = (0..5)
            .map(|i| convoys.insert(Convoy::new(format!("c{i}"), [])))
            .collect();
        let mut fleet = FleetMembership::new();
        let ops = [(0, true), (1, true), (0, true), (2, false), (1, false), (3, true), (1, false)];
        let mut expected = std::collections::HashSet::new();
        for (index, add) in ops {
            if add {
                fleet.add(handles[index]);
                expected.insert(index);
            } else {
                fleet.remove(handles[index]);
                expected.remove(&index);
            }
            assert_eq!(fleet.member_count(), expected.len());
        }
        assert_eq!(fleet.members(), &[handles[0], handles[3]]);
    }

    #[test]
    fn goods_categories_are_union_of_members() {
        let mut convoys: SlotMap<ConvoyHandle, Convoy> = SlotMap::with_key();
        let mail = convoys.insert(Convoy::new("mail", [1]));
        let mixed = convoys.insert(Convoy::new("mixed", [0, 3]));
        let mut fleet = FleetMembership::new();
        fleet.add(mail);
        fleet.add(mixed);

        assert!(fleet.recalc_goods_categories(&convoys));
        assert_eq!(fleet.goods_categories().iter().copied().collect::<Vec<_>>(), vec![0, 1, 3]);
        assert!(!fleet.recalc_goods_categories(&convoys));

        fleet.remove(mixed);
        assert!(fleet.recalc_goods_categories(&convoys));
        assert_eq!(fleet.goods_categories().iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn stale_members_contribute_no_goods() {
        let mut convoys: SlotMap<ConvoyHandle, Convoy> = SlotMap::with_key();
        let gone = convoys.insert(Convoy::new("gone", [4]));
        let mut fleet = FleetMembership::new();
        fleet.add(gone);
        convoys.remove(gone);
        assert!(!fleet.recalc_goods_categories(&convoys));
        assert!(fleet.goods_categories().is_empty());
    }
}
