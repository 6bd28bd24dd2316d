//! Generation-checked handles for lines and convoys.
//!
//! Every cross reference in the engine (line to convoy, convoy to line) is
//! one of these keys rather than an owning pointer. Resolving a key whose
//! slot was freed yields `None`, so a destroyed entity can never be reached
//! through an old handle.

use slotmap::{new_key_type, Key, KeyData};

new_key_type! {
    /// Opaque reference to a [`Line`](crate::line::Line).
    pub struct LineHandle;

    /// Opaque reference to a [`Convoy`](crate::convoy::Convoy).
    pub struct ConvoyHandle;
}

/// Conversion between handles and the raw ids written to save archives.
pub trait RawHandle: Key {
    /// Raw id for persistence. The null handle maps to a reserved value.
    fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Rebuild a handle from a persisted raw id.
    ///
    /// The result still has to be resolved against a registry before use.
    fn from_raw(raw: u64) -> Self {
        KeyData::from_ffi(raw).into()
    }
}

impl RawHandle for LineHandle {}
impl RawHandle for ConvoyHandle {}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn default_handle_is_null() {
        assert!(LineHandle::default().is_null());
        assert!(ConvoyHandle::default().is_null());
        assert_eq!(LineHandle::default(), LineHandle::null());
    }

    #[test]
    fn raw_ids_round_trip() {
        let mut map: SlotMap<ConvoyHandle, u8> = SlotMap::with_key();
        let handle = map.insert(7);
        let restored = ConvoyHandle::from_raw(handle.to_raw());
        assert_eq!(restored, handle);
        assert_eq!(map.get(restored), Some(&7));
    }

    #[test]
    fn reused_slot_does_not_resolve_old_handle() {
        let mut map: SlotMap<LineHandle, &str> = SlotMap::with_key();
        let old = map.insert("first");
        map.remove(old);
        let new = map.insert("second");
        assert_ne!(old, new);
        assert!(map.get(old).is_none());
        assert_eq!(map.get(new), Some(&"second"));
    }
}
