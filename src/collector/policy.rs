//! Adaptive per-attribute fetch policy
//!
//! Tracks, per object instance, which top-level attributes must never be
//! fetched again (they failed or were denied) and which must always be
//! fetched individually (composites, which some agents mishandle in bulk
//! reads). Both sets start empty on every new connection and are populated
//! only by runtime observation.

use std::collections::{HashMap, HashSet};

/// How one attribute should be fetched this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Bulk,
    Single,
    Skip,
}

#[derive(Debug, Default)]
pub struct AttributeAccessPolicy {
    never_fetch: HashMap<String, HashSet<String>>,
    always_fetch_single: HashMap<String, HashSet<String>>,
}

impl AttributeAccessPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_never_fetch(&mut self, object_instance_name: &str, attribute_name: &str) {
        self.never_fetch
            .entry(object_instance_name.to_string())
            .or_default()
            .insert(attribute_name.to_string());
    }

    pub fn mark_always_fetch_single(&mut self, object_instance_name: &str, attribute_name: &str) {
        self.always_fetch_single
            .entry(object_instance_name.to_string())
            .or_default()
            .insert(attribute_name.to_string());
    }

    /// Always-fetch-single overrules never-fetch: a composite stays
    /// re-expanded every iteration even if one of its leaves once failed
    /// numeric conversion.
    pub fn fetch_mode(&self, object_instance_name: &str, attribute_name: &str) -> FetchMode {
        if self
            .always_fetch_single
            .get(object_instance_name)
            .is_some_and(|set| set.contains(attribute_name))
        {
            return FetchMode::Single;
        }

        if self
            .never_fetch
            .get(object_instance_name)
            .is_some_and(|set| set.contains(attribute_name))
        {
            return FetchMode::Skip;
        }

        FetchMode::Bulk
    }

    /// Splits an object's attribute names into the bulk-read batch and the
    /// individually-read list, dropping skipped attributes.
    pub fn partition_attributes(
        &self,
        object_instance_name: &str,
        attribute_names: &[String],
    ) -> (Vec<String>, Vec<String>) {
        let mut bulk = Vec::new();
        let mut single = Vec::new();

        for name in attribute_names {
            match self.fetch_mode(object_instance_name, name) {
                FetchMode::Bulk => bulk.push(name.clone()),
                FetchMode::Single => single.push(name.clone()),
                FetchMode::Skip => {}
            }
        }

        (bulk, single)
    }

    /// Discards all learned state. Called when the connection closes.
    pub fn clear(&mut self) {
        self.never_fetch.clear();
        self.always_fetch_single.clear();
    }

    #[cfg(test)]
    pub fn never_fetch_count(&self, object_instance_name: &str) -> usize {
        self.never_fetch
            .get(object_instance_name)
            .map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mode_is_bulk() {
        let policy = AttributeAccessPolicy::new();
        assert_eq!(policy.fetch_mode("obj", "Attr"), FetchMode::Bulk);
    }

    #[test]
    fn test_always_fetch_overrides_never_fetch() {
        let mut policy = AttributeAccessPolicy::new();
        policy.mark_always_fetch_single("obj", "Attr");
        policy.mark_never_fetch("obj", "Attr");
        assert_eq!(policy.fetch_mode("obj", "Attr"), FetchMode::Single);
    }

    #[test]
    fn test_policy_is_per_object_instance() {
        let mut policy = AttributeAccessPolicy::new();
        policy.mark_never_fetch("obj1", "Attr");
        assert_eq!(policy.fetch_mode("obj1", "Attr"), FetchMode::Skip);
        assert_eq!(policy.fetch_mode("obj2", "Attr"), FetchMode::Bulk);
    }

    #[test]
    fn test_partition_attributes() {
        let mut policy = AttributeAccessPolicy::new();
        policy.mark_never_fetch("obj", "Broken");
        policy.mark_always_fetch_single("obj", "HeapMemoryUsage");

        let names = vec![
            "Broken".to_string(),
            "HeapMemoryUsage".to_string(),
            "ThreadCount".to_string(),
        ];
        let (bulk, single) = policy.partition_attributes("obj", &names);

        assert_eq!(bulk, vec!["ThreadCount"]);
        assert_eq!(single, vec!["HeapMemoryUsage"]);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut policy = AttributeAccessPolicy::new();
        policy.mark_never_fetch("obj", "Attr");
        policy.clear();
        assert_eq!(policy.fetch_mode("obj", "Attr"), FetchMode::Bulk);
    }
}
