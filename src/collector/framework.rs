//! Collector runtime base
//!
//! The pieces every collector shares: identity, enabled flag, collection
//! interval, the metric prefix (updatable at runtime), and the output path
//! that prefixes records, publishes them to the shared sink, and mirrors
//! them to the optional per-collector output file.

use std::sync::RwLock;
use std::time::Duration;

use crate::metric::{MetricRecord, MetricSink, OutputFileWriter};

pub struct CollectorRuntime {
    id: String,
    enabled: bool,
    collection_interval: Duration,
    metric_prefix: RwLock<String>,
    sink: MetricSink,
    output_writer: Option<OutputFileWriter>,
}

impl CollectorRuntime {
    pub fn new(
        id: String,
        enabled: bool,
        collection_interval: Duration,
        metric_prefix: String,
        sink: MetricSink,
        output_writer: Option<OutputFileWriter>,
    ) -> Self {
        Self {
            id,
            enabled,
            collection_interval,
            metric_prefix: RwLock::new(metric_prefix),
            sink,
            output_writer,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn collection_interval(&self) -> Duration {
        self.collection_interval
    }

    pub fn metric_prefix(&self) -> String {
        self.metric_prefix.read().expect("RwLock poisoned").clone()
    }

    /// Replaces the prefix for all subsequent outputs.
    pub fn update_prefix(&self, new_prefix: String) {
        *self.metric_prefix.write().expect("RwLock poisoned") = new_prefix;
    }

    pub fn prefixed_path(&self, path: &str) -> String {
        let prefix = self.metric_prefix.read().expect("RwLock poisoned");
        if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}.{}", prefix, path)
        }
    }

    /// Publishes one iteration's records: prefixes every path, appends to
    /// the shared sink, and mirrors to the output file (prefix stripped)
    /// when one is configured.
    pub async fn output_metrics(&self, records: Vec<MetricRecord>) -> usize {
        let prefix = self.metric_prefix();

        let prefixed: Vec<MetricRecord> = records
            .into_iter()
            .map(|mut record| {
                record.path = if prefix.is_empty() {
                    record.path
                } else {
                    format!("{}.{}", prefix, record.path)
                };
                record
            })
            .collect();

        let count = prefixed.len();
        self.sink.publish_all(prefixed.clone());

        if let Some(writer) = &self.output_writer {
            let strip = if prefix.is_empty() {
                None
            } else {
                Some(prefix.as_str())
            };
            writer.write(&prefixed, strip).await;
        }

        count
    }
}
