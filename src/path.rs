//! Raw samples and metric-path canonicalization
//!
//! A [`RawSample`] is one fetched (object instance, attribute path, value,
//! timestamp) tuple. Its unformatted path feeds the derived-metrics engine;
//! the canonical path produced by [`canonical_path`] is what gets filtered
//! and published downstream.

use std::collections::HashMap;

/// One raw metric sample fetched from a target.
///
/// `attribute_name` is the top-level attribute that produced this sample;
/// `attribute_path` may extend it with `.`-joined member segments from
/// composite flattening. Immutable once created.
#[derive(Debug, Clone)]
pub struct RawSample {
    object_instance_name: String,
    attribute_name: String,
    attribute_path: String,
    unformatted_path: String,
    value: f64,
    retrieval_timestamp_ms: u64,
    from_string_attribute: bool,
}

impl RawSample {
    pub fn new(
        object_instance_name: &str,
        attribute_name: &str,
        attribute_path: &str,
        value: f64,
        retrieval_timestamp_ms: u64,
    ) -> Self {
        Self::build(
            object_instance_name,
            attribute_name,
            attribute_path,
            value,
            retrieval_timestamp_ms,
            false,
        )
    }

    /// A sample produced from a string attribute: the value lives in the
    /// path and the numeric value is a constant 1.
    pub fn new_string(
        object_instance_name: &str,
        attribute_name: &str,
        attribute_path: &str,
        retrieval_timestamp_ms: u64,
    ) -> Self {
        Self::build(
            object_instance_name,
            attribute_name,
            attribute_path,
            1.0,
            retrieval_timestamp_ms,
            true,
        )
    }

    fn build(
        object_instance_name: &str,
        attribute_name: &str,
        attribute_path: &str,
        value: f64,
        retrieval_timestamp_ms: u64,
        from_string_attribute: bool,
    ) -> Self {
        let reordered = move_type_field_to_front(object_instance_name);
        let unformatted_path = format!("{}.{}", reordered, attribute_path);

        Self {
            object_instance_name: object_instance_name.to_string(),
            attribute_name: attribute_name.to_string(),
            attribute_path: attribute_path.to_string(),
            unformatted_path,
            value,
            retrieval_timestamp_ms,
            from_string_attribute,
        }
    }

    pub fn is_from_string_attribute(&self) -> bool {
        self.from_string_attribute
    }

    pub fn object_instance_name(&self) -> &str {
        &self.object_instance_name
    }

    pub fn attribute_name(&self) -> &str {
        &self.attribute_name
    }

    pub fn attribute_path(&self) -> &str {
        &self.attribute_path
    }

    /// Unformatted path: reordered object name + "." + attribute path.
    pub fn unformatted_path(&self) -> &str {
        &self.unformatted_path
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn retrieval_timestamp_ms(&self) -> u64 {
        self.retrieval_timestamp_ms
    }
}

/// Moves the `type=` key property to the front of the object name's property
/// list, so `java.lang:name=G1,type=GarbageCollector` and
/// `java.lang:type=GarbageCollector,name=G1` canonicalize identically.
fn move_type_field_to_front(object_instance_name: &str) -> String {
    let Some((domain, props)) = object_instance_name.split_once(':') else {
        return object_instance_name.to_string();
    };

    if props.is_empty() {
        return object_instance_name.to_string();
    }

    let fields: Vec<&str> = props.split(',').collect();
    if fields.len() <= 1 {
        return object_instance_name.to_string();
    }

    let Some(type_index) = fields
        .iter()
        .position(|f| !f.is_empty() && f.starts_with("type="))
    else {
        return object_instance_name.to_string();
    };

    if type_index == 0 {
        return object_instance_name.to_string();
    }

    let mut reordered: Vec<&str> = Vec::with_capacity(fields.len());
    reordered.push(fields[type_index]);
    reordered.extend(
        fields
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != type_index)
            .map(|(_, f)| *f),
    );

    format!("{}:{}", domain, reordered.join(","))
}

/// Produces the canonical metric path for one sample.
///
/// The substitution sequence is fixed and order-dependent: earlier
/// substitutions can create new instances of later patterns, and the
/// doubled-dot collapse must run last.
pub fn canonical_path(object_instance_name: &str, attribute_path: &str) -> String {
    let reordered = move_type_field_to_front(object_instance_name);
    let dashed_object_name = reordered.replace('.', "-");

    let mut path = format!("{}.{}", dashed_object_name, attribute_path);

    path = path.replace('%', "Pct");
    path = path.replace(' ', "_");
    path = path.replace(',', ".");
    path = path.replace(":j2eeType=", ".");
    path = path.replace(":type=", ".");
    path = path.replace(":name=", ".");
    path = path.replace(".name=", ".");
    path = path.replace('"', "");
    path = path.replace(':', "");
    path = path.replace('[', "|");
    path = path.replace(']', "|");
    path = path.replace('{', "|");
    path = path.replace('}', "|");
    path = path.replace("=//", ".");
    path = path.replace(".//", ".");
    path = path.replace("=/", ".");
    path = path.replace('/', ".");

    while path.contains("..") {
        path = path.replace("..", ".");
    }

    path
}

/// Canonical-path memoization cache.
///
/// One unformatted path always maps to exactly one canonical path; once
/// known, the mapping is never recomputed for this connection's lifetime
/// (or until the independent flush timer clears the cache).
#[derive(Debug, Default)]
pub struct PathFormatter {
    formatted_by_unformatted: HashMap<String, String>,
}

impl PathFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats one sample's canonical path, memoized by unformatted path.
    pub fn format(&mut self, sample: &RawSample) -> String {
        if let Some(formatted) = self.formatted_by_unformatted.get(sample.unformatted_path()) {
            return formatted.clone();
        }

        let formatted =
            canonical_path(sample.object_instance_name(), sample.attribute_path());
        self.formatted_by_unformatted
            .insert(sample.unformatted_path().to_string(), formatted.clone());

        formatted
    }

    pub fn clear(&mut self) {
        self.formatted_by_unformatted.clear();
    }

    #[cfg(test)]
    pub fn cached_count(&self) -> usize {
        self.formatted_by_unformatted.len()
    }
}
