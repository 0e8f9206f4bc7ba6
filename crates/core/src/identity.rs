//! Static user identity table.

use std::collections::HashMap;

use {
    chatbridge_common::{NativeId, Platform},
    chatbridge_config::IdentityEntry,
    tracing::warn,
};

/// Bidirectional map between a user's account on platform A and on platform B.
///
/// Built once at startup and shared read-only.
#[derive(Debug, Default)]
pub struct IdentityMap {
    a_to_b: HashMap<NativeId, NativeId>,
    b_to_a: HashMap<NativeId, NativeId>,
    names_a: HashMap<NativeId, String>,
    names_b: HashMap<NativeId, String>,
}

impl IdentityMap {
    /// Build the table. When an id appears in more than one row the first row
    /// wins.
    pub fn new(entries: impl IntoIterator<Item = IdentityEntry>) -> Self {
        let mut map = Self::default();
        for entry in entries {
            if map.a_to_b.contains_key(&entry.a) || map.b_to_a.contains_key(&entry.b) {
                warn!(a = %entry.a, b = %entry.b, "duplicate identity row ignored");
                continue;
            }
            if let Some(name) = entry.name {
                map.names_a.insert(entry.a.clone(), name.clone());
                map.names_b.insert(entry.b.clone(), name);
            }
            map.a_to_b.insert(entry.a.clone(), entry.b.clone());
            map.b_to_a.insert(entry.b, entry.a);
        }
        map
    }

    /// The counterpart on the other platform of user `id` on `from`.
    pub fn resolve(&self, id: &NativeId, from: Platform) -> Option<&NativeId> {
        match from {
            Platform::A => self.a_to_b.get(id),
            Platform::B => self.b_to_a.get(id),
        }
    }

    /// Configured display name for user `id` on `from`.
    pub fn display_name(&self, id: &NativeId, from: Platform) -> Option<&str> {
        match from {
            Platform::A => self.names_a.get(id),
            Platform::B => self.names_b.get(id),
        }
        .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.a_to_b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.a_to_b.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(a: &str, b: u64, name: Option<&str>) -> IdentityEntry {
        IdentityEntry {
            a: NativeId::from(a),
            b: NativeId::Int(b),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn resolves_both_directions() {
        let map = IdentityMap::new([entry("A123", 456, Some("Randy"))]);
        assert_eq!(
            map.resolve(&NativeId::from("A123"), Platform::A),
            Some(&NativeId::Int(456))
        );
        assert_eq!(
            map.resolve(&NativeId::from("456"), Platform::B),
            Some(&NativeId::from("A123"))
        );
        assert_eq!(map.display_name(&NativeId::Int(456), Platform::B), Some("Randy"));
    }

    #[test]
    fn direction_matters() {
        let map = IdentityMap::new([entry("A123", 456, None)]);
        assert!(map.resolve(&NativeId::from("A123"), Platform::B).is_none());
        assert!(map.display_name(&NativeId::from("A123"), Platform::A).is_none());
    }

    #[test]
    fn first_row_wins() {
        let map = IdentityMap::new([
            entry("A1", 1, Some("first")),
            entry("A1", 2, Some("second")),
            entry("A3", 1, None),
        ]);
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve(&NativeId::from("A1"), Platform::A), Some(&NativeId::Int(1)));
        assert!(map.resolve(&NativeId::Int(2), Platform::B).is_none());
    }

    #[test]
    fn empty_table() {
        let map = IdentityMap::default();
        assert!(map.is_empty());
        assert!(map.resolve(&NativeId::Int(1), Platform::A).is_none());
    }
}
