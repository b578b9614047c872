//! Object-tree discovery cache
//!
//! Caches the discoverable object instances and their attribute names for
//! one target, refreshed under one of three policies. A refresh failure
//! empties the cache and resets the last-refreshed marker, so the next
//! iteration tries again regardless of policy.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::error::SessionResult;
use crate::filter::ObjectNameFilter;
use crate::session::JolokiaSession;

const DISCOVERY_PATTERN: &str = "*:*";

/// When the tree is rediscovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPolicy {
    /// Every iteration
    Always,
    /// Once per connection
    Once,
    /// When older than the interval
    Interval(Duration),
}

impl RefreshPolicy {
    /// Config encoding: negative = always, zero = once, positive = interval
    /// in seconds.
    pub fn from_config_secs(secs: i64) -> Self {
        if secs < 0 {
            RefreshPolicy::Always
        } else if secs == 0 {
            RefreshPolicy::Once
        } else {
            RefreshPolicy::Interval(Duration::from_secs(secs as u64))
        }
    }
}

#[derive(Debug)]
pub struct ObjectTreeCache {
    policy: RefreshPolicy,
    attributes_by_object: HashMap<String, Vec<String>>,
    last_refreshed: Option<Instant>,
}

impl ObjectTreeCache {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            policy,
            attributes_by_object: HashMap::new(),
            last_refreshed: None,
        }
    }

    pub fn is_refresh_due(&self) -> bool {
        match self.policy {
            RefreshPolicy::Always => true,
            RefreshPolicy::Once => self.last_refreshed.is_none(),
            RefreshPolicy::Interval(interval) => self
                .last_refreshed
                .map_or(true, |at| at.elapsed() >= interval),
        }
    }

    /// Rediscovers the tree if the policy says it is due.
    ///
    /// Discovery failure leaves the cache empty with the marker reset; a
    /// single object whose metadata cannot be read is skipped, not fatal.
    pub async fn refresh_if_due(
        &mut self,
        session: &JolokiaSession,
        name_filter: &mut ObjectNameFilter,
    ) -> SessionResult<()> {
        if !self.is_refresh_due() {
            return Ok(());
        }

        let object_names = match session.list_objects(DISCOVERY_PATTERN).await {
            Ok(names) => names,
            Err(err) => {
                self.attributes_by_object.clear();
                self.last_refreshed = None;
                return Err(err);
            }
        };

        let mut discovered = HashMap::new();
        for object_name in object_names {
            if name_filter.is_blacklisted(&object_name) {
                continue;
            }

            match session.get_metadata(&object_name).await {
                Ok(attribute_names) => {
                    discovered.insert(object_name, attribute_names);
                }
                Err(err) => {
                    debug!(object = %object_name, error = %err, "Skipping object with unreadable metadata");
                }
            }
        }

        info!(objects = discovered.len(), "Object tree refreshed");
        self.attributes_by_object = discovered;
        self.last_refreshed = Some(Instant::now());

        Ok(())
    }

    pub fn objects(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.attributes_by_object.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes_by_object.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes_by_object.is_empty()
    }

    /// Forgets everything, as if never refreshed. Called on disconnect.
    pub fn clear(&mut self) {
        self.attributes_by_object.clear();
        self.last_refreshed = None;
    }

    #[cfg(test)]
    fn set_last_refreshed(&mut self, at: Instant) {
        self.last_refreshed = Some(at);
    }

    #[cfg(test)]
    fn insert_object(&mut self, name: &str, attributes: Vec<String>) {
        self.attributes_by_object.insert(name.to_string(), attributes);
    }
}
