//! Per-target collection loop
//!
//! One [`JmxCollector`] owns everything that belongs to a single target:
//! the connection, the object-tree cache, the adaptive fetch policy, the
//! path formatter, the access-control filter, and the derived-metrics
//! engine. The loop is strictly sequential within a target; targets run as
//! independent tokio tasks and never share mutable state beyond the sink.

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::collector::connection::{ConnectionManager, ConnectionSettings};
use crate::collector::flatten::flatten_attribute;
use crate::collector::framework::CollectorRuntime;
use crate::collector::policy::AttributeAccessPolicy;
use crate::collector::tree::{ObjectTreeCache, RefreshPolicy};
use crate::config::{Config, TargetConfig};
use crate::derived::DerivedMetricsEngine;
use crate::filter::{AccessControlFilter, AccessDecision, ObjectNameFilter, SampleKind};
use crate::metric::{MetricRecord, MetricSink, OutputFileWriter};
use crate::path::{PathFormatter, RawSample};
use crate::session::{Credentials, JolokiaSession};

const AVAILABILITY_PATH: &str = "Availability.Available";
const SLOW_ITERATION_THRESHOLD: Duration = Duration::from_secs(10);

/// What one iteration did, for the summary log and the slow-iteration warn.
#[derive(Debug, Default)]
pub struct IterationStats {
    pub available: bool,
    pub connected_this_iteration: bool,
    pub raw_count: usize,
    pub published_count: usize,
    pub connect_time: Duration,
    pub tree_time: Duration,
    pub fetch_time: Duration,
    pub derive_time: Duration,
}

pub struct JmxCollector {
    runtime: CollectorRuntime,
    connection: ConnectionManager,
    tree: ObjectTreeCache,
    policy: AttributeAccessPolicy,
    formatter: PathFormatter,
    filter: AccessControlFilter,
    object_name_filter: ObjectNameFilter,
    derived: DerivedMetricsEngine,
    collect_string_attributes: bool,
    derived_metrics_enabled: bool,
    settle_delay: Duration,
    cache_flush_interval: Option<Duration>,
    last_cache_flush: Instant,
}

impl JmxCollector {
    pub fn new(config: &Config, target: &TargetConfig, sink: MetricSink) -> Self {
        let output_writer = if config.output.write_output_files {
            Some(OutputFileWriter::new(
                config
                    .output
                    .output_directory
                    .join(format!("jmx_{}.out", target.id)),
            ))
        } else {
            None
        };

        let runtime = CollectorRuntime::new(
            target.id.clone(),
            target.enabled,
            Duration::from_secs(target.collection_interval_secs),
            config.full_metric_prefix(target),
            sink,
            output_writer,
        );

        let credentials = match (&target.username, &target.password) {
            (Some(username), Some(password)) => Credentials::new(username, password),
            _ => Credentials::none(),
        };

        let connection = ConnectionManager::new(ConnectionSettings {
            base_url: target.url.clone(),
            credentials,
            request_timeout_ms: target.request_timeout_ms,
            num_retries: target.num_connection_retries,
            settle_delay: Duration::from_secs(target.sleep_after_connect_secs),
        });

        Self {
            runtime,
            connection,
            tree: ObjectTreeCache::new(RefreshPolicy::from_config_secs(
                target.query_metric_tree_secs,
            )),
            policy: AttributeAccessPolicy::new(),
            formatter: PathFormatter::new(),
            filter: AccessControlFilter::new(
                &target.whitelist_regexs,
                &target.blacklist_regexs,
                target.derived_metrics_enabled,
            ),
            object_name_filter: ObjectNameFilter::new(&target.blacklist_object_name_regexs),
            derived: DerivedMetricsEngine::new(),
            collect_string_attributes: target.collect_string_attributes,
            derived_metrics_enabled: target.derived_metrics_enabled,
            settle_delay: Duration::from_secs(target.sleep_after_connect_secs),
            cache_flush_interval: target.cache_flush_interval_secs.map(Duration::from_secs),
            last_cache_flush: Instant::now(),
        }
    }

    pub fn runtime(&self) -> &CollectorRuntime {
        &self.runtime
    }

    /// Runs until shutdown is signalled, then closes the connection.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(target = %self.runtime.id(), "Collector started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let interval = self.runtime.collection_interval();

            if !self.runtime.is_enabled() {
                if wait_or_shutdown(&mut shutdown, interval).await {
                    break;
                }
                continue;
            }

            let iteration_start = Instant::now();
            self.maybe_flush_caches();

            let stats = self.collect_once().await;

            self.maybe_flush_caches();

            let elapsed = iteration_start.elapsed();
            // The settle delay after a fresh connect is intentional waiting,
            // not slowness.
            let settle = if stats.connected_this_iteration {
                self.settle_delay
            } else {
                Duration::ZERO
            };
            let measured = elapsed.saturating_sub(settle);

            info!(
                target = %self.runtime.id(),
                available = stats.available,
                raw_metrics = stats.raw_count,
                published_metrics = stats.published_count,
                elapsed_ms = measured.as_millis() as u64,
                "Collection iteration finished"
            );

            if measured > SLOW_ITERATION_THRESHOLD {
                warn!(
                    target = %self.runtime.id(),
                    connect_ms = stats.connect_time.as_millis() as u64,
                    tree_ms = stats.tree_time.as_millis() as u64,
                    fetch_ms = stats.fetch_time.as_millis() as u64,
                    derive_ms = stats.derive_time.as_millis() as u64,
                    "Collection iteration ran long"
                );
            }

            let sleep_for = interval.saturating_sub(elapsed);
            if wait_or_shutdown(&mut shutdown, sleep_for).await {
                break;
            }
        }

        self.close_connection();
        info!(target = %self.runtime.id(), "Collector stopped");
    }

    /// One full collection iteration.
    pub async fn collect_once(&mut self) -> IterationStats {
        let mut stats = IterationStats::default();

        // A session that was live last iteration may have died since.
        let connect_start = Instant::now();
        if self.connection.is_connected() {
            let alive = match self.connection.session() {
                Ok(session) => session.ping().await.is_ok(),
                Err(_) => false,
            };
            if !alive {
                warn!(target = %self.runtime.id(), "Existing session no longer responds, reconnecting");
                self.close_connection();
            }
        }

        match self.connection.ensure_connected().await {
            Ok(connected_now) => {
                stats.connected_this_iteration = connected_now;
            }
            Err(err) => {
                warn!(target = %self.runtime.id(), error = %err, "Target unavailable");
                stats.available = false;
                stats.published_count = self
                    .runtime
                    .output_metrics(vec![availability_record(0.0)])
                    .await;
                return stats;
            }
        }
        stats.connect_time = connect_start.elapsed();
        stats.available = true;

        let session = match self.connection.session() {
            Ok(session) => session.clone(),
            Err(_) => return stats,
        };

        let tree_start = Instant::now();
        if let Err(err) = self
            .tree
            .refresh_if_due(&session, &mut self.object_name_filter)
            .await
        {
            // The tree stays empty this iteration; the reset marker makes
            // the next iteration retry regardless of policy.
            warn!(target = %self.runtime.id(), error = %err, "Object tree refresh failed");
        }
        stats.tree_time = tree_start.elapsed();

        let fetch_start = Instant::now();
        let raw_samples = self.fetch_all(&session).await;
        stats.fetch_time = fetch_start.elapsed();
        stats.raw_count = raw_samples.len();

        let derive_start = Instant::now();
        let derived_samples = if self.derived_metrics_enabled {
            self.derived.create_derived_metrics(&raw_samples)
        } else {
            Vec::new()
        };
        stats.derive_time = derive_start.elapsed();

        let mut records = Vec::new();

        for sample in &raw_samples {
            let formatted = self.formatter.format(sample);
            let kind = if sample.is_from_string_attribute() {
                SampleKind::Text
            } else {
                SampleKind::Numeric
            };

            match self.filter.evaluate(&formatted, kind) {
                AccessDecision::AllowedAndPublished => {
                    records.push(MetricRecord::new(
                        formatted,
                        sample.value(),
                        sample.retrieval_timestamp_ms(),
                    ));
                }
                AccessDecision::Denied => {
                    self.policy.mark_never_fetch(
                        sample.object_instance_name(),
                        sample.attribute_name(),
                    );
                }
                AccessDecision::AllowedForDerivationOnly => {}
            }
        }

        // Derived metrics bypass the access filter.
        for sample in &derived_samples {
            let formatted = self.formatter.format(sample);
            records.push(MetricRecord::new(
                formatted,
                sample.value(),
                sample.retrieval_timestamp_ms(),
            ));
        }

        records.push(availability_record(1.0));
        stats.published_count = self.runtime.output_metrics(records).await;

        stats
    }

    async fn fetch_all(&mut self, session: &JolokiaSession) -> Vec<RawSample> {
        let mut samples = Vec::new();

        let objects: Vec<(String, Vec<String>)> = self
            .tree
            .objects()
            .map(|(name, attrs)| (name.clone(), attrs.clone()))
            .collect();

        for (object_name, attribute_names) in objects {
            let (bulk, singles) = self.policy.partition_attributes(&object_name, &attribute_names);

            if !bulk.is_empty() {
                match session.get_attributes(&object_name, &bulk).await {
                    Ok(values) => {
                        for (attribute_name, value) in values {
                            self.apply_flatten(&object_name, &attribute_name, &value, &mut samples);
                        }
                    }
                    Err(err) => {
                        debug!(
                            object = %object_name,
                            error = %err,
                            "Bulk read failed, falling back to single reads"
                        );
                        for attribute_name in &bulk {
                            self.fetch_single(session, &object_name, attribute_name, &mut samples)
                                .await;
                        }
                    }
                }
            }

            for attribute_name in &singles {
                self.fetch_single(session, &object_name, attribute_name, &mut samples)
                    .await;
            }
        }

        samples
    }

    async fn fetch_single(
        &mut self,
        session: &JolokiaSession,
        object_name: &str,
        attribute_name: &str,
        samples: &mut Vec<RawSample>,
    ) {
        match session.get_attribute(object_name, attribute_name).await {
            Ok(value) => self.apply_flatten(object_name, attribute_name, &value, samples),
            Err(err) => {
                debug!(
                    object = %object_name,
                    attribute = %attribute_name,
                    error = %err,
                    "Attribute read failed, marking never-fetch"
                );
                self.policy.mark_never_fetch(object_name, attribute_name);
            }
        }
    }

    fn apply_flatten(
        &mut self,
        object_name: &str,
        attribute_name: &str,
        value: &crate::session::AttrValue,
        samples: &mut Vec<RawSample>,
    ) {
        let outcome = flatten_attribute(
            object_name,
            attribute_name,
            value,
            now_ms(),
            self.collect_string_attributes,
        );

        if outcome.mark_always_fetch_single {
            self.policy
                .mark_always_fetch_single(object_name, attribute_name);
        }
        if outcome.mark_never_fetch {
            self.policy.mark_never_fetch(object_name, attribute_name);
        }

        samples.extend(outcome.samples);
    }

    /// Resets every per-connection cache together with the connection.
    fn close_connection(&mut self) {
        self.connection.close();
        self.tree.clear();
        self.policy.clear();
        self.formatter.clear();
        self.filter.clear_cache();
        self.object_name_filter.clear_cache();
        self.derived.reset();
    }

    /// The independent flush timer: clears only the memoization caches,
    /// leaving connection state and derived-sample history intact.
    fn maybe_flush_caches(&mut self) {
        let Some(interval) = self.cache_flush_interval else {
            return;
        };
        if self.last_cache_flush.elapsed() < interval {
            return;
        }

        debug!(target = %self.runtime.id(), "Flushing path and decision caches");
        self.formatter.clear();
        self.filter.clear_cache();
        self.object_name_filter.clear_cache();
        self.last_cache_flush = Instant::now();
    }
}

fn availability_record(value: f64) -> MetricRecord {
    MetricRecord::new(AVAILABILITY_PATH.to_string(), value, now_ms())
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Sleeps for `duration` unless shutdown is signalled first. Returns true
/// when the caller should stop.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    if duration.is_zero() {
        return *shutdown.borrow();
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}
