//! 파생 메트릭 엔진
//!
//! Computes heap/GC/CPU/memory percentage metrics from each iteration's raw
//! samples, carrying previous-sample state for the rate-based metrics
//! (process CPU time, per-GC collection-time counters). All outputs are
//! percentages rounded half-up to three decimals and clamped to [0, 100],
//! emitted under the synthetic object instance name `Derived`.

use std::collections::{HashMap, HashSet};

use crate::path::RawSample;

const DERIVED_OBJECT_NAME: &str = "Derived";
const NS_PER_MS: f64 = 1_000_000.0;

const PATH_AVAILABLE_PROCESSORS: &str = "java.lang:type=OperatingSystem.AvailableProcessors";
const PATH_PROCESS_CPU_TIME: &str = "java.lang:type=OperatingSystem.ProcessCpuTime";
const PATH_PROCESS_CPU_LOAD: &str = "java.lang:type=OperatingSystem.ProcessCpuLoad";
const PATH_SYSTEM_CPU_LOAD: &str = "java.lang:type=OperatingSystem.SystemCpuLoad";
const PATH_FREE_PHYSICAL_MEMORY: &str = "java.lang:type=OperatingSystem.FreePhysicalMemorySize";
const PATH_TOTAL_PHYSICAL_MEMORY: &str = "java.lang:type=OperatingSystem.TotalPhysicalMemorySize";
const PATH_FREE_SWAP: &str = "java.lang:type=OperatingSystem.FreeSwapSpaceSize";
const PATH_TOTAL_SWAP: &str = "java.lang:type=OperatingSystem.TotalSwapSpaceSize";
const PATH_HEAP_USED: &str = "java.lang:type=Memory.HeapMemoryUsage.used";
const PATH_HEAP_MAX: &str = "java.lang:type=Memory.HeapMemoryUsage.max";
const PATH_NON_HEAP_USED: &str = "java.lang:type=Memory.NonHeapMemoryUsage.used";
const PATH_NON_HEAP_MAX: &str = "java.lang:type=Memory.NonHeapMemoryUsage.max";
const MEMORY_POOL_PREFIX: &str = "java.lang:type=MemoryPool,name=";
const GC_PREFIX: &str = "java.lang:type=GarbageCollector,name=";
const GC_SUFFIX: &str = ".CollectionTime";

/// 백분율 값을 소수점 3자리로 반올림 (half-up)
pub fn round_percentage(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// 백분율 값을 [0, 100] 범위로 보정
pub fn clamp_percentage(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

fn percentage_of(numerator: f64, denominator: f64) -> f64 {
    clamp_percentage(round_percentage(numerator / denominator * 100.0))
}

/// Derived-metrics engine for one target connection.
///
/// Rate-based metrics need one prior iteration of state, so they are absent
/// on the first iteration after [`DerivedMetricsEngine::reset`].
#[derive(Debug, Default)]
pub struct DerivedMetricsEngine {
    previous_process_cpu_time_ns: Option<f64>,
    previous_process_cpu_timestamp_ms: Option<u64>,
    previous_gc_collection_time_ms: HashMap<String, f64>,
    previous_gc_timestamp_ms: HashMap<String, u64>,
}

impl DerivedMetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all previous-sample state. Called on every reconnect.
    pub fn reset(&mut self) {
        self.previous_process_cpu_time_ns = None;
        self.previous_process_cpu_timestamp_ms = None;
        self.previous_gc_collection_time_ms.clear();
        self.previous_gc_timestamp_ms.clear();
    }

    /// Produces this iteration's derived metrics from the raw samples and
    /// advances the previous-sample state.
    pub fn create_derived_metrics(&mut self, raw_samples: &[RawSample]) -> Vec<RawSample> {
        if raw_samples.is_empty() {
            return Vec::new();
        }

        // Last sample wins when two share an unformatted path.
        let mut by_path: HashMap<&str, &RawSample> = HashMap::new();
        for sample in raw_samples {
            by_path.insert(sample.unformatted_path(), sample);
        }

        let mut derived = Vec::new();

        let available_processors = positive_value(&by_path, PATH_AVAILABLE_PROCESSORS);

        let heap_pools = pool_names_of_type(&by_path, ".Type=HEAP");
        derived.extend(self.pool_used_percents(&by_path, &heap_pools, "Memory.Heap"));

        let non_heap_pools = pool_names_of_type(&by_path, ".Type=NON_HEAP");
        derived.extend(self.pool_used_percents(&by_path, &non_heap_pools, "Memory.NonHeap"));

        if let Some(metric) = used_max_percent(
            &by_path,
            PATH_HEAP_USED,
            PATH_HEAP_MAX,
            "Memory.Heap.Overall-UsedPct",
        ) {
            derived.push(metric);
        }

        if let Some(metric) = used_max_percent(
            &by_path,
            PATH_NON_HEAP_USED,
            PATH_NON_HEAP_MAX,
            "Memory.NonHeap.Overall-UsedPct",
        ) {
            derived.push(metric);
        }

        let gc_percents = self.gc_activity_percents(&by_path, available_processors);
        let gc_overall = gc_activity_overall(&gc_percents);
        derived.extend(gc_percents);
        if let Some(overall) = gc_overall {
            derived.push(overall);
        }

        if let Some(metric) = self.jvm_cpu_usage_percent(&by_path, available_processors) {
            derived.push(metric);
        }

        if let Some(metric) = load_percent(&by_path, PATH_PROCESS_CPU_LOAD, "CPU.JvmRecentCpu-UsedPct")
        {
            derived.push(metric);
        }

        if let Some(metric) = load_percent(&by_path, PATH_SYSTEM_CPU_LOAD, "CPU.SystemRecentCpu-UsedPct")
        {
            derived.push(metric);
        }

        if let Some(metric) = free_total_percent(
            &by_path,
            PATH_FREE_PHYSICAL_MEMORY,
            PATH_TOTAL_PHYSICAL_MEMORY,
            "Memory.System.PhysicalMemory-UsedPct",
        ) {
            derived.push(metric);
        }

        if let Some(metric) = free_total_percent(
            &by_path,
            PATH_FREE_SWAP,
            PATH_TOTAL_SWAP,
            "Memory.System.SystemSwapSize-UsedPct",
        ) {
            derived.push(metric);
        }

        if let Some(cpu_time) = by_path.get(PATH_PROCESS_CPU_TIME) {
            self.previous_process_cpu_time_ns = Some(cpu_time.value());
            self.previous_process_cpu_timestamp_ms = Some(cpu_time.retrieval_timestamp_ms());
        }

        derived
    }

    fn pool_used_percents(
        &self,
        by_path: &HashMap<&str, &RawSample>,
        pool_names: &HashSet<String>,
        output_prefix: &str,
    ) -> Vec<RawSample> {
        let mut percents = Vec::new();

        for pool_name in pool_names {
            let used_path = format!("{}{}.Usage.used", MEMORY_POOL_PREFIX, pool_name);
            let max_path = format!("{}{}.Usage.max", MEMORY_POOL_PREFIX, pool_name);

            let (Some(used), Some(max)) = (
                by_path.get(used_path.as_str()),
                by_path.get(max_path.as_str()),
            ) else {
                continue;
            };

            if used.value() <= 0.0 || max.value() <= 0.0 {
                continue;
            }

            let percent = percentage_of(used.value(), max.value());
            let timestamp =
                (used.retrieval_timestamp_ms() + max.retrieval_timestamp_ms()) / 2;
            percents.push(derived_sample(
                &format!("{}.{}-UsedPct", output_prefix, pool_name),
                percent,
                timestamp,
            ));
        }

        percents
    }

    /// GC activity percent per collector: collection-time delta over
    /// process-CPU-time delta for the same interval. Previous counters
    /// advance whenever a valid sample exists, so the percent appears on
    /// the second iteration even if the first produced nothing.
    fn gc_activity_percents(
        &mut self,
        by_path: &HashMap<&str, &RawSample>,
        available_processors: Option<f64>,
    ) -> Vec<RawSample> {
        let gc_names: HashSet<String> = by_path
            .keys()
            .filter_map(|path| {
                path.strip_prefix(GC_PREFIX)
                    .and_then(|rest| rest.strip_suffix(GC_SUFFIX))
                    .map(str::to_string)
            })
            .collect();

        let process_cpu_delta_ms = self.process_cpu_delta_ms(by_path);
        let cpu_state_valid = available_processors.is_some()
            && positive_value(by_path, PATH_PROCESS_CPU_TIME).is_some();

        let mut percents = Vec::new();

        for gc_name in gc_names {
            let path = format!("{}{}{}", GC_PREFIX, gc_name, GC_SUFFIX);
            let Some(counter) = by_path.get(path.as_str()) else {
                continue;
            };
            if counter.value() < 0.0 {
                continue;
            }

            let previous_counter = self.previous_gc_collection_time_ms.get(&gc_name).copied();
            let previous_timestamp = self.previous_gc_timestamp_ms.get(&gc_name).copied();

            if let (Some(prev_counter), Some(prev_ts), Some(cpu_delta_ms), true) = (
                previous_counter,
                previous_timestamp,
                process_cpu_delta_ms,
                cpu_state_valid,
            ) {
                let gc_delta_ms = counter.value() - prev_counter;
                let elapsed_ms = counter.retrieval_timestamp_ms() as i64 - prev_ts as i64;

                let percent = if elapsed_ms <= 0 || cpu_delta_ms <= 0.0 {
                    0.0
                } else {
                    percentage_of(gc_delta_ms, cpu_delta_ms)
                };

                percents.push(derived_sample(
                    &format!("GC.{}-Pct", gc_name),
                    percent,
                    counter.retrieval_timestamp_ms(),
                ));
            }

            self.previous_gc_collection_time_ms
                .insert(gc_name.clone(), counter.value());
            self.previous_gc_timestamp_ms
                .insert(gc_name, counter.retrieval_timestamp_ms());
        }

        percents
    }

    fn process_cpu_delta_ms(&self, by_path: &HashMap<&str, &RawSample>) -> Option<f64> {
        let current = by_path.get(PATH_PROCESS_CPU_TIME)?;
        let previous_ns = self.previous_process_cpu_time_ns?;
        Some(round_percentage((current.value() - previous_ns) / NS_PER_MS))
    }

    /// Average JVM CPU usage over the interval: CPU-time delta spread across
    /// the available processors.
    fn jvm_cpu_usage_percent(
        &self,
        by_path: &HashMap<&str, &RawSample>,
        available_processors: Option<f64>,
    ) -> Option<RawSample> {
        let processors = available_processors?;
        let cpu_time = by_path.get(PATH_PROCESS_CPU_TIME)?;
        if cpu_time.value() <= 0.0 {
            return None;
        }

        let previous_ns = self.previous_process_cpu_time_ns?;
        let previous_ts = self.previous_process_cpu_timestamp_ms?;

        let elapsed_ms = cpu_time.retrieval_timestamp_ms() as i64 - previous_ts as i64;
        if elapsed_ms <= 0 {
            return None;
        }

        let cpu_delta_ns = cpu_time.value() - previous_ns;
        let elapsed_ns = elapsed_ms as f64 * NS_PER_MS;
        let percent = clamp_percentage(round_percentage(
            cpu_delta_ns / elapsed_ns / processors * 100.0,
        ));

        Some(derived_sample(
            "CPU.JvmCpu-UsagePct",
            percent,
            cpu_time.retrieval_timestamp_ms(),
        ))
    }
}

fn derived_sample(attribute_path: &str, value: f64, timestamp_ms: u64) -> RawSample {
    RawSample::new(
        DERIVED_OBJECT_NAME,
        attribute_path,
        attribute_path,
        value,
        timestamp_ms,
    )
}

fn positive_value(by_path: &HashMap<&str, &RawSample>, path: &str) -> Option<f64> {
    by_path
        .get(path)
        .map(|s| s.value())
        .filter(|v| *v > 0.0)
}

/// Memory-pool names discovered from the string `Type` samples, which carry
/// the pool classification appended to the attribute path (`Type=HEAP` or
/// `Type=NON_HEAP`).
fn pool_names_of_type(by_path: &HashMap<&str, &RawSample>, type_suffix: &str) -> HashSet<String> {
    by_path
        .keys()
        .filter_map(|path| {
            path.strip_prefix(MEMORY_POOL_PREFIX)
                .and_then(|rest| rest.strip_suffix(type_suffix))
                .map(str::to_string)
        })
        .collect()
}

fn used_max_percent(
    by_path: &HashMap<&str, &RawSample>,
    used_path: &str,
    max_path: &str,
    output_path: &str,
) -> Option<RawSample> {
    let used = by_path.get(used_path)?;
    let max = by_path.get(max_path)?;
    if used.value() <= 0.0 || max.value() <= 0.0 {
        return None;
    }

    let percent = percentage_of(used.value(), max.value());
    let timestamp = (used.retrieval_timestamp_ms() + max.retrieval_timestamp_ms()) / 2;
    Some(derived_sample(output_path, percent, timestamp))
}

/// Overall GC activity: sum of the clamped per-collector percentages,
/// clamped once more. Absent when no per-collector percent was produced.
fn gc_activity_overall(gc_percents: &[RawSample]) -> Option<RawSample> {
    if gc_percents.is_empty() {
        return None;
    }

    let sum: f64 = gc_percents.iter().map(RawSample::value).sum();
    let timestamp_sum: u64 = gc_percents
        .iter()
        .map(RawSample::retrieval_timestamp_ms)
        .sum();
    let timestamp = timestamp_sum / gc_percents.len() as u64;

    Some(derived_sample(
        "GC.Overall-Pct",
        clamp_percentage(sum),
        timestamp,
    ))
}

/// Fractional load gauge (0.0–1.0) scaled to a percent. Non-positive loads
/// are dropped; some JVMs report 0 or -1 when the value is unavailable.
fn load_percent(
    by_path: &HashMap<&str, &RawSample>,
    load_path: &str,
    output_path: &str,
) -> Option<RawSample> {
    let load = by_path.get(load_path)?;
    if load.value() <= 0.0 {
        return None;
    }

    let percent = clamp_percentage(round_percentage(load.value() * 100.0));
    Some(derived_sample(
        output_path,
        percent,
        load.retrieval_timestamp_ms(),
    ))
}

fn free_total_percent(
    by_path: &HashMap<&str, &RawSample>,
    free_path: &str,
    total_path: &str,
    output_path: &str,
) -> Option<RawSample> {
    let free = by_path.get(free_path)?;
    let total = by_path.get(total_path)?;
    if free.value() <= 0.0 || total.value() <= 0.0 {
        return None;
    }

    // Kept as free/total, matching the long-standing published behavior of
    // this metric despite its -UsedPct name.
    let percent = percentage_of(free.value(), total.value());
    let timestamp = (free.retrieval_timestamp_ms() + total.retrieval_timestamp_ms()) / 2;
    Some(derived_sample(output_path, percent, timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(object_name: &str, attribute_path: &str, value: f64, ts: u64) -> RawSample {
        let attribute_name = attribute_path.split('.').next().unwrap_or(attribute_path);
        RawSample::new(object_name, attribute_name, attribute_path, value, ts)
    }

    fn paths_of(metrics: &[RawSample]) -> Vec<&str> {
        metrics.iter().map(RawSample::attribute_path).collect()
    }

    fn find<'a>(metrics: &'a [RawSample], path: &str) -> Option<&'a RawSample> {
        metrics.iter().find(|m| m.attribute_path() == path)
    }

    #[test]
    fn test_rounding_half_up_scale_three() {
        assert_eq!(round_percentage(100.0 / 3.0), 33.333);
        assert_eq!(round_percentage(33.3335), 33.334);
        assert_eq!(round_percentage(50.0), 50.0);
    }

    #[test]
    fn test_clamping() {
        assert_eq!(clamp_percentage(150.0), 100.0);
        assert_eq!(clamp_percentage(-3.0), 0.0);
        assert_eq!(clamp_percentage(42.5), 42.5);
    }

    #[test]
    fn test_heap_overall_used_percent() {
        let mut engine = DerivedMetricsEngine::new();
        let raw = vec![
            sample("java.lang:type=Memory", "HeapMemoryUsage.used", 50.0, 1_000),
            sample("java.lang:type=Memory", "HeapMemoryUsage.max", 100.0, 1_000),
        ];

        let derived = engine.create_derived_metrics(&raw);
        let overall = find(&derived, "Memory.Heap.Overall-UsedPct").unwrap();
        assert_eq!(overall.value(), 50.0);
        assert_eq!(overall.object_instance_name(), "Derived");
        assert_eq!(overall.retrieval_timestamp_ms(), 1_000);
    }

    #[test]
    fn test_heap_percent_clamped_when_used_exceeds_max() {
        let mut engine = DerivedMetricsEngine::new();
        let raw = vec![
            sample("java.lang:type=Memory", "HeapMemoryUsage.used", 150.0, 0),
            sample("java.lang:type=Memory", "HeapMemoryUsage.max", 100.0, 0),
        ];

        let derived = engine.create_derived_metrics(&raw);
        assert_eq!(find(&derived, "Memory.Heap.Overall-UsedPct").unwrap().value(), 100.0);
    }

    #[test]
    fn test_heap_percent_absent_for_nonpositive_inputs() {
        let mut engine = DerivedMetricsEngine::new();
        let raw = vec![
            sample("java.lang:type=Memory", "HeapMemoryUsage.used", 0.0, 0),
            sample("java.lang:type=Memory", "HeapMemoryUsage.max", 100.0, 0),
        ];

        let derived = engine.create_derived_metrics(&raw);
        assert!(find(&derived, "Memory.Heap.Overall-UsedPct").is_none());
    }

    #[test]
    fn test_per_pool_percents_from_type_samples() {
        let mut engine = DerivedMetricsEngine::new();
        let pool = "java.lang:type=MemoryPool,name=G1 Eden Space";
        let raw = vec![
            sample(pool, "Type=HEAP", 1.0, 0),
            sample(pool, "Usage.used", 30.0, 1_000),
            sample(pool, "Usage.max", 90.0, 3_000),
        ];

        let derived = engine.create_derived_metrics(&raw);
        let pool_pct = find(&derived, "Memory.Heap.G1 Eden Space-UsedPct").unwrap();
        assert_eq!(pool_pct.value(), 33.333);
        // Timestamp averages the two inputs
        assert_eq!(pool_pct.retrieval_timestamp_ms(), 2_000);
    }

    #[test]
    fn test_non_heap_pool_classified_separately() {
        let mut engine = DerivedMetricsEngine::new();
        let pool = "java.lang:type=MemoryPool,name=Metaspace";
        let raw = vec![
            sample(pool, "Type=NON_HEAP", 1.0, 0),
            sample(pool, "Usage.used", 10.0, 0),
            sample(pool, "Usage.max", 40.0, 0),
        ];

        let derived = engine.create_derived_metrics(&raw);
        assert!(find(&derived, "Memory.NonHeap.Metaspace-UsedPct").is_some());
        assert!(find(&derived, "Memory.Heap.Metaspace-UsedPct").is_none());
    }

    #[test]
    fn test_jvm_cpu_usage_needs_previous_sample() {
        let mut engine = DerivedMetricsEngine::new();
        let os = "java.lang:type=OperatingSystem";

        let first = vec![
            sample(os, "AvailableProcessors", 2.0, 1_000),
            sample(os, "ProcessCpuTime", 1_000_000_000.0, 1_000),
        ];
        let derived = engine.create_derived_metrics(&first);
        assert!(find(&derived, "CPU.JvmCpu-UsagePct").is_none());

        // One second later the process consumed one more CPU-second: with
        // two processors that is 50% average usage.
        let second = vec![
            sample(os, "AvailableProcessors", 2.0, 2_000),
            sample(os, "ProcessCpuTime", 2_000_000_000.0, 2_000),
        ];
        let derived = engine.create_derived_metrics(&second);
        assert_eq!(find(&derived, "CPU.JvmCpu-UsagePct").unwrap().value(), 50.0);
    }

    #[test]
    fn test_gc_activity_percent_and_overall() {
        let mut engine = DerivedMetricsEngine::new();
        let os = "java.lang:type=OperatingSystem";
        let gc = "java.lang:type=GarbageCollector,name=G1 Young Generation";

        let first = vec![
            sample(os, "AvailableProcessors", 2.0, 1_000),
            sample(os, "ProcessCpuTime", 1_000_000_000.0, 1_000),
            sample(gc, "CollectionTime", 100.0, 1_000),
        ];
        let derived = engine.create_derived_metrics(&first);
        assert!(find(&derived, "GC.G1 Young Generation-Pct").is_none());

        // CPU delta 1000ms, GC delta 500ms: GC consumed 50% of process CPU.
        let second = vec![
            sample(os, "AvailableProcessors", 2.0, 31_000),
            sample(os, "ProcessCpuTime", 2_000_000_000.0, 31_000),
            sample(gc, "CollectionTime", 600.0, 31_000),
        ];
        let derived = engine.create_derived_metrics(&second);
        assert_eq!(find(&derived, "GC.G1 Young Generation-Pct").unwrap().value(), 50.0);
        assert_eq!(find(&derived, "GC.Overall-Pct").unwrap().value(), 50.0);
    }

    #[test]
    fn test_gc_overall_sums_and_clamps() {
        let mut engine = DerivedMetricsEngine::new();
        let os = "java.lang:type=OperatingSystem";
        let gc_a = "java.lang:type=GarbageCollector,name=A";
        let gc_b = "java.lang:type=GarbageCollector,name=B";

        let first = vec![
            sample(os, "AvailableProcessors", 4.0, 1_000),
            sample(os, "ProcessCpuTime", 1_000_000_000.0, 1_000),
            sample(gc_a, "CollectionTime", 0.0, 1_000),
            sample(gc_b, "CollectionTime", 0.0, 1_000),
        ];
        engine.create_derived_metrics(&first);

        // Both collectors report more GC time than the CPU delta: each is
        // clamped to 100, and the overall sum is clamped again.
        let second = vec![
            sample(os, "AvailableProcessors", 4.0, 2_000),
            sample(os, "ProcessCpuTime", 1_100_000_000.0, 2_000),
            sample(gc_a, "CollectionTime", 400.0, 2_000),
            sample(gc_b, "CollectionTime", 400.0, 2_000),
        ];
        let derived = engine.create_derived_metrics(&second);
        assert_eq!(find(&derived, "GC.A-Pct").unwrap().value(), 100.0);
        assert_eq!(find(&derived, "GC.B-Pct").unwrap().value(), 100.0);
        assert_eq!(find(&derived, "GC.Overall-Pct").unwrap().value(), 100.0);
    }

    #[test]
    fn test_recent_cpu_load_scaled() {
        let mut engine = DerivedMetricsEngine::new();
        let os = "java.lang:type=OperatingSystem";
        let raw = vec![
            sample(os, "ProcessCpuLoad", 0.5, 0),
            sample(os, "SystemCpuLoad", 0.25, 0),
        ];

        let derived = engine.create_derived_metrics(&raw);
        assert_eq!(find(&derived, "CPU.JvmRecentCpu-UsedPct").unwrap().value(), 50.0);
        assert_eq!(find(&derived, "CPU.SystemRecentCpu-UsedPct").unwrap().value(), 25.0);
    }

    #[test]
    fn test_negative_cpu_load_dropped() {
        let mut engine = DerivedMetricsEngine::new();
        let raw = vec![sample("java.lang:type=OperatingSystem", "ProcessCpuLoad", -1.0, 0)];
        let derived = engine.create_derived_metrics(&raw);
        assert!(paths_of(&derived).is_empty());
    }

    #[test]
    fn test_physical_memory_percent_uses_free_over_total() {
        let mut engine = DerivedMetricsEngine::new();
        let os = "java.lang:type=OperatingSystem";
        let raw = vec![
            sample(os, "FreePhysicalMemorySize", 25.0, 0),
            sample(os, "TotalPhysicalMemorySize", 100.0, 0),
        ];

        let derived = engine.create_derived_metrics(&raw);
        assert_eq!(
            find(&derived, "Memory.System.PhysicalMemory-UsedPct").unwrap().value(),
            25.0
        );
    }

    #[test]
    fn test_reset_clears_previous_sample_state() {
        let mut engine = DerivedMetricsEngine::new();
        let os = "java.lang:type=OperatingSystem";

        let first = vec![
            sample(os, "AvailableProcessors", 2.0, 1_000),
            sample(os, "ProcessCpuTime", 1_000_000_000.0, 1_000),
        ];
        engine.create_derived_metrics(&first);
        engine.reset();

        // After reset the next iteration is a first iteration again.
        let second = vec![
            sample(os, "AvailableProcessors", 2.0, 2_000),
            sample(os, "ProcessCpuTime", 2_000_000_000.0, 2_000),
        ];
        let derived = engine.create_derived_metrics(&second);
        assert!(find(&derived, "CPU.JvmCpu-UsagePct").is_none());
    }

    #[test]
    fn test_empty_input_produces_nothing() {
        let mut engine = DerivedMetricsEngine::new();
        assert!(engine.create_derived_metrics(&[]).is_empty());
    }
}
