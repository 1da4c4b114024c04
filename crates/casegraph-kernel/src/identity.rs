//! Stable identifier assignment for legacy keys.
//!
//! An [`IdTable`] is owned by one transform run. Repeated lookups of the same
//! original key return the same id; keys that already look like UUIDs are
//! kept verbatim.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;
use uuid::Uuid;

fn stable_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$")
            .expect("stable-id regex must compile")
    })
}

/// Whether `value` already has the canonical stable-id shape (UUID v1-v5).
pub fn is_stable_id(value: &str) -> bool {
    stable_id_re().is_match(value)
}

/// Run-scoped mapping from original keys to stable ids.
#[derive(Debug, Default)]
pub struct IdTable {
    ids: HashMap<String, String>,
    minted: usize,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing mapping for `original`, if any.
    pub fn get(&self, original: &str) -> Option<&str> {
        self.ids.get(original).map(String::as_str)
    }

    /// Number of mapped keys.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// How many ids this table minted (as opposed to reused).
    pub fn minted(&self) -> usize {
        self.minted
    }

    /// Map `original` to a freshly minted id, replacing any earlier mapping.
    pub fn reissue(&mut self, original: &str) -> String {
        let id = mint_id();
        self.minted += 1;
        self.ids.insert(original.to_string(), id.clone());
        id
    }
}

/// Return the stable id for `original`, creating and recording it if needed.
pub fn get_or_create_id(original: &str, table: &mut IdTable) -> String {
    if let Some(existing) = table.ids.get(original) {
        return existing.clone();
    }

    let id = if is_stable_id(original) {
        original.to_string()
    } else {
        table.minted += 1;
        mint_id()
    };
    table.ids.insert(original.to_string(), id.clone());
    id
}

/// A fresh identifier with no original key behind it.
pub fn mint_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookup_is_idempotent() {
        let mut table = IdTable::new();
        let first = get_or_create_id("7", &mut table);
        let second = get_or_create_id("7", &mut table);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.minted(), 1);
        assert!(is_stable_id(&first));
    }

    #[test]
    fn reissue_replaces_the_mapping() {
        let mut table = IdTable::new();
        let existing = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";
        assert_eq!(get_or_create_id(existing, &mut table), existing);
        let fresh = table.reissue(existing);
        assert_ne!(fresh, existing);
        assert_eq!(get_or_create_id(existing, &mut table), fresh);
        assert_eq!(table.minted(), 1);
    }

    #[test]
    fn distinct_keys_get_distinct_ids() {
        let mut table = IdTable::new();
        let a = get_or_create_id("1", &mut table);
        let b = get_or_create_id("2", &mut table);
        assert_ne!(a, b);
    }

    #[test]
    fn stable_ids_are_reused_verbatim() {
        let mut table = IdTable::new();
        let existing = "3F2504E0-4F89-41D3-9A0C-0305E82C3301";
        assert_eq!(get_or_create_id(existing, &mut table), existing);
        assert_eq!(table.minted(), 0);
        assert_eq!(table.get(existing), Some(existing));
    }

    #[test]
    fn near_miss_shapes_are_not_stable_ids() {
        assert!(!is_stable_id("3f2504e0-4f89-61d3-9a0c-0305e82c3301"));
        assert!(!is_stable_id("3f2504e0-4f89-41d3-7a0c-0305e82c3301"));
        assert!(!is_stable_id("42"));
    }

    #[test]
    fn tables_are_independent() {
        let mut left = IdTable::new();
        let mut right = IdTable::new();
        let a = get_or_create_id("1", &mut left);
        let b = get_or_create_id("1", &mut right);
        assert_ne!(a, b);
    }
}
