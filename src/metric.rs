//! Shared metric sink and output-file writing
//!
//! Every collector publishes normalized records into one process-wide sink:
//! an append-only map keyed by a monotonically increasing id, so downstream
//! consumers can observe insertion order. Collectors may additionally mirror
//! each iteration's records to a per-collector output file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::warn;

const OUTPUT_FILE_WRITE_ATTEMPTS: u32 = 3;
const OUTPUT_FILE_RETRY_DELAY: Duration = Duration::from_millis(100);

/// One published metric: full path, finite numeric value, retrieval time.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub path: String,
    pub value: f64,
    pub timestamp_ms: u64,
}

impl MetricRecord {
    pub fn new(path: String, value: f64, timestamp_ms: u64) -> Self {
        Self {
            path,
            value,
            timestamp_ms,
        }
    }

    /// Output-file line: `path value epoch-seconds`.
    pub fn to_output_line(&self, strip_prefix: Option<&str>) -> String {
        let path = match strip_prefix {
            Some(prefix) => self
                .path
                .strip_prefix(prefix)
                .map(|rest| rest.trim_start_matches('.'))
                .unwrap_or(&self.path),
            None => &self.path,
        };

        format!(
            "{} {} {}",
            path,
            format_metric_value(self.value),
            self.timestamp_ms / 1000
        )
    }
}

/// Plain-decimal rendering: integral values without a fraction, everything
/// else with the shortest round-trip representation.
pub fn format_metric_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Process-wide metric sink.
///
/// Append-only: ids are handed out by an atomic counter and records are never
/// mutated after insertion. Clones share the same underlying storage.
#[derive(Debug, Clone, Default)]
pub struct MetricSink {
    next_id: Arc<AtomicU64>,
    records: Arc<RwLock<HashMap<u64, MetricRecord>>>,
}

impl MetricSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes one record, returning its id.
    pub fn publish(&self, record: MetricRecord) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut records = self.records.write().expect("RwLock poisoned");
        records.insert(id, record);
        id
    }

    pub fn publish_all(&self, new_records: Vec<MetricRecord>) {
        if new_records.is_empty() {
            return;
        }

        let mut records = self.records.write().expect("RwLock poisoned");
        for record in new_records {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            records.insert(id, record);
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().expect("RwLock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records in publication order.
    pub fn snapshot(&self) -> Vec<MetricRecord> {
        let records = self.records.read().expect("RwLock poisoned");
        let mut entries: Vec<(u64, MetricRecord)> =
            records.iter().map(|(id, r)| (*id, r.clone())).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries.into_iter().map(|(_, r)| r).collect()
    }
}

/// Per-collector output file, rewritten whole each iteration.
#[derive(Debug, Clone)]
pub struct OutputFileWriter {
    path: PathBuf,
}

impl OutputFileWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the records, retrying transient failures a fixed number of
    /// times before giving up with a warning. A failed write never fails
    /// the collection iteration.
    pub async fn write(&self, records: &[MetricRecord], strip_prefix: Option<&str>) {
        let mut contents = String::new();
        for record in records {
            contents.push_str(&record.to_output_line(strip_prefix));
            contents.push('\n');
        }

        for attempt in 1..=OUTPUT_FILE_WRITE_ATTEMPTS {
            match tokio::fs::write(&self.path, &contents).await {
                Ok(()) => return,
                Err(err) if attempt < OUTPUT_FILE_WRITE_ATTEMPTS => {
                    warn!(
                        path = %self.path.display(),
                        attempt,
                        error = %err,
                        "Output file write failed, retrying"
                    );
                    tokio::time::sleep(OUTPUT_FILE_RETRY_DELAY).await;
                }
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        error = %err,
                        "Output file write failed, giving up"
                    );
                }
            }
        }
    }
}
