//! Token-to-record ownership map.

use std::collections::HashMap;

use crate::record::AbilityRecord;

/// Owning map from identity token to [`AbilityRecord`].
///
/// Records enter on start, leave on destroy completion or force-stop, and
/// are only ever touched by the manager's worker task.
#[derive(Debug, Default)]
pub struct AbilityList {
    records: HashMap<u16, AbilityRecord>,
}

impl AbilityList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its own token, replacing any previous holder.
    pub fn insert(&mut self, record: AbilityRecord) {
        self.records.insert(record.token(), record);
    }

    /// Looks up a record by token.
    #[must_use]
    pub fn get(&self, token: u16) -> Option<&AbilityRecord> {
        self.records.get(&token)
    }

    /// Looks up a record mutably by token.
    pub fn get_mut(&mut self, token: u16) -> Option<&mut AbilityRecord> {
        self.records.get_mut(&token)
    }

    /// Removes and returns the record for a token.
    pub fn remove(&mut self, token: u16) -> Option<AbilityRecord> {
        self.records.remove(&token)
    }

    /// Whether a token is live.
    #[must_use]
    pub fn contains(&self, token: u16) -> bool {
        self.records.contains_key(&token)
    }

    /// Finds the token of the record owned by `bundle_name`, if any.
    #[must_use]
    pub fn find_by_bundle(&self, bundle_name: &str) -> Option<u16> {
        self.records
            .values()
            .find(|r| r.bundle_name() == bundle_name)
            .map(AbilityRecord::token)
    }

    /// Number of live records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::want::ElementName;

    fn app(bundle: &str, token: u16) -> AbilityRecord {
        AbilityRecord::new_app(ElementName::new(bundle, ""), "/path", token)
    }

    #[test]
    fn test_insert_get_remove() {
        let mut list = AbilityList::new();
        assert!(list.is_empty());

        list.insert(app("com.example.a", 1));
        assert!(list.contains(1));
        assert_eq!(list.get(1).unwrap().bundle_name(), "com.example.a");
        assert_eq!(list.len(), 1);

        let removed = list.remove(1).unwrap();
        assert_eq!(removed.token(), 1);
        assert!(!list.contains(1));
    }

    #[test]
    fn test_find_by_bundle() {
        let mut list = AbilityList::new();
        list.insert(app("com.example.a", 1));
        list.insert(app("com.example.b", 2));

        assert_eq!(list.find_by_bundle("com.example.b"), Some(2));
        assert_eq!(list.find_by_bundle("com.example.c"), None);
    }
}
