//! 메트릭 경로 접근 제어 필터
//!
//! Canonical metric paths pass through three regex tiers: a user blacklist,
//! a user whitelist, and the built-in derived-input patterns. The outcome is
//! a tri-state decision that controls both publication and whether the value
//! may feed the derived-metrics engine.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

/// Built-in patterns for numeric values the derived-metrics engine consumes.
static NUMERIC_DERIVED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile_patterns(&[
        r"java-lang\.Memory\.HeapMemoryUsage.*",
        r"java-lang\.Memory\.NonHeapMemoryUsage.*",
        r"java-lang\.MemoryPool\..+Usage.*",
        r"java-lang\.GarbageCollector\..+CollectionTime",
        r"java-lang\.OperatingSystem\.AvailableProcessors",
        r"java-lang\.OperatingSystem\.ProcessCpuTime",
        r"java-lang\.OperatingSystem\.FreePhysicalMemorySize",
        r"java-lang\.OperatingSystem\.FreeSwapSpaceSize",
        r"java-lang\.OperatingSystem\.ProcessCpuLoad",
        r"java-lang\.OperatingSystem\.SystemCpuLoad",
        r"java-lang\.OperatingSystem\.TotalPhysicalMemorySize",
        r"java-lang\.OperatingSystem\.TotalSwapSpaceSize",
    ])
});

/// Built-in patterns for string values the derived-metrics engine consumes.
static STRING_DERIVED_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| compile_patterns(&[r"java-lang\.MemoryPool\..+Type"]));

/// 샘플 값의 종류 (숫자/문자열). 파생 메트릭 입력 패턴 선택에 사용.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    Numeric,
    Text,
}

/// 접근 제어 결정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// 차단: 발행도, 파생 입력도 불가
    Denied,
    /// 파생 메트릭 입력으로만 사용 가능 (발행 불가)
    AllowedForDerivationOnly,
    /// 발행 및 파생 입력 모두 가능
    AllowedAndPublished,
}

impl AccessDecision {
    pub fn is_published(self) -> bool {
        self == AccessDecision::AllowedAndPublished
    }

    pub fn feeds_derivation(self) -> bool {
        self != AccessDecision::Denied
    }
}

/// Compiles user-supplied patterns, dropping any that fail with a warning.
/// One bad pattern never disables the rest of the tier.
fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .filter_map(|pattern| match Regex::new(pattern) {
            Ok(regex) => Some(regex),
            Err(err) => {
                warn!(pattern = %pattern, error = %err, "Dropping invalid regex pattern");
                None
            }
        })
        .collect()
}

/// Canonical-path access control with a per-path decision cache.
///
/// An empty whitelist admits everything; the blacklist always wins over the
/// whitelist. Paths that fail both but match a built-in derived-input pattern
/// are retained for derivation without being published.
#[derive(Debug)]
pub struct AccessControlFilter {
    whitelist: Vec<Regex>,
    blacklist: Vec<Regex>,
    derived_enabled: bool,
    decisions: HashMap<String, AccessDecision>,
}

impl AccessControlFilter {
    pub fn new(
        whitelist_patterns: &[String],
        blacklist_patterns: &[String],
        derived_enabled: bool,
    ) -> Self {
        let whitelist_refs: Vec<&str> = whitelist_patterns.iter().map(String::as_str).collect();
        let blacklist_refs: Vec<&str> = blacklist_patterns.iter().map(String::as_str).collect();

        Self {
            whitelist: compile_patterns(&whitelist_refs),
            blacklist: compile_patterns(&blacklist_refs),
            derived_enabled,
            decisions: HashMap::new(),
        }
    }

    /// Evaluates one canonical path, memoized per path and kind.
    pub fn evaluate(&mut self, formatted_path: &str, kind: SampleKind) -> AccessDecision {
        let cache_key = match kind {
            SampleKind::Numeric => formatted_path.to_string(),
            SampleKind::Text => format!("s\u{0}{}", formatted_path),
        };

        if let Some(decision) = self.decisions.get(&cache_key) {
            return *decision;
        }

        let decision = self.decide(formatted_path, kind);
        self.decisions.insert(cache_key, decision);
        decision
    }

    fn decide(&self, formatted_path: &str, kind: SampleKind) -> AccessDecision {
        let denied = self.blacklist.iter().any(|r| r.is_match(formatted_path));
        let whitelisted =
            self.whitelist.is_empty() || self.whitelist.iter().any(|r| r.is_match(formatted_path));

        if whitelisted && !denied {
            return AccessDecision::AllowedAndPublished;
        }

        if self.derived_enabled && matches_derived_input(formatted_path, kind) {
            return AccessDecision::AllowedForDerivationOnly;
        }

        AccessDecision::Denied
    }

    /// Flushes the decision cache. Compiled patterns are kept.
    pub fn clear_cache(&mut self) {
        self.decisions.clear();
    }

    #[cfg(test)]
    pub fn cached_count(&self) -> usize {
        self.decisions.len()
    }
}

fn matches_derived_input(formatted_path: &str, kind: SampleKind) -> bool {
    let patterns: &[Regex] = match kind {
        SampleKind::Numeric => &NUMERIC_DERIVED_PATTERNS,
        SampleKind::Text => &STRING_DERIVED_PATTERNS,
    };
    patterns.iter().any(|r| r.is_match(formatted_path))
}

/// Object-name blacklist with a per-name decision cache, consulted during
/// tree discovery so blacklisted instances never enter the tree at all.
#[derive(Debug, Default)]
pub struct ObjectNameFilter {
    blacklist: Vec<Regex>,
    decisions: HashMap<String, bool>,
}

impl ObjectNameFilter {
    pub fn new(blacklist_patterns: &[String]) -> Self {
        let refs: Vec<&str> = blacklist_patterns.iter().map(String::as_str).collect();
        Self {
            blacklist: compile_patterns(&refs),
            decisions: HashMap::new(),
        }
    }

    pub fn is_blacklisted(&mut self, object_instance_name: &str) -> bool {
        if let Some(blacklisted) = self.decisions.get(object_instance_name) {
            return *blacklisted;
        }

        let blacklisted = self
            .blacklist
            .iter()
            .any(|r| r.is_match(object_instance_name));
        self.decisions
            .insert(object_instance_name.to_string(), blacklisted);

        blacklisted
    }

    pub fn clear_cache(&mut self) {
        self.decisions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_whitelist_admits_everything() {
        let mut filter = AccessControlFilter::new(&[], &[], true);
        assert_eq!(
            filter.evaluate("anything.at.all", SampleKind::Numeric),
            AccessDecision::AllowedAndPublished
        );
    }

    #[test]
    fn test_blacklist_wins_over_whitelist() {
        let mut filter = AccessControlFilter::new(
            &["app\\..*".to_string()],
            &["app\\.secret.*".to_string()],
            true,
        );
        assert_eq!(
            filter.evaluate("app.requests.count", SampleKind::Numeric),
            AccessDecision::AllowedAndPublished
        );
        assert_eq!(
            filter.evaluate("app.secret.token", SampleKind::Numeric),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_blacklisted_derived_input_retained_for_derivation() {
        let mut filter =
            AccessControlFilter::new(&[], &["java-lang\\.Memory\\..*".to_string()], true);
        let decision = filter.evaluate("java-lang.Memory.HeapMemoryUsage.used", SampleKind::Numeric);
        assert_eq!(decision, AccessDecision::AllowedForDerivationOnly);
        assert!(!decision.is_published());
        assert!(decision.feeds_derivation());
    }

    #[test]
    fn test_non_whitelisted_derived_input_retained_for_derivation() {
        let mut filter = AccessControlFilter::new(&["myapp\\..*".to_string()], &[], true);
        assert_eq!(
            filter.evaluate("java-lang.GarbageCollector.G1_Young_Generation.CollectionTime", SampleKind::Numeric),
            AccessDecision::AllowedForDerivationOnly
        );
        assert_eq!(
            filter.evaluate("java-lang.Threading.ThreadCount", SampleKind::Numeric),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_derived_disabled_turns_derive_only_into_denied() {
        let mut filter =
            AccessControlFilter::new(&["myapp\\..*".to_string()], &[], false);
        assert_eq!(
            filter.evaluate("java-lang.Memory.HeapMemoryUsage.used", SampleKind::Numeric),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_string_derived_pattern_only_matches_text_kind() {
        let mut filter = AccessControlFilter::new(&["myapp\\..*".to_string()], &[], true);
        assert_eq!(
            filter.evaluate("java-lang.MemoryPool.G1_Eden_Space.Type", SampleKind::Text),
            AccessDecision::AllowedForDerivationOnly
        );
        assert_eq!(
            filter.evaluate("java-lang.MemoryPool.G1_Eden_Space.Type", SampleKind::Numeric),
            AccessDecision::Denied
        );
    }

    #[test]
    fn test_invalid_pattern_dropped_rest_active() {
        let mut filter = AccessControlFilter::new(
            &[],
            &["[invalid".to_string(), "app\\.secret.*".to_string()],
            true,
        );
        assert_eq!(
            filter.evaluate("app.secret.token", SampleKind::Numeric),
            AccessDecision::Denied
        );
        assert_eq!(
            filter.evaluate("app.public.count", SampleKind::Numeric),
            AccessDecision::AllowedAndPublished
        );
    }

    #[test]
    fn test_decision_cache_and_flush() {
        let mut filter = AccessControlFilter::new(&[], &[], true);
        filter.evaluate("a.b.c", SampleKind::Numeric);
        filter.evaluate("a.b.c", SampleKind::Numeric);
        assert_eq!(filter.cached_count(), 1);
        filter.clear_cache();
        assert_eq!(filter.cached_count(), 0);
    }

    #[test]
    fn test_object_name_blacklist_cached() {
        let mut filter = ObjectNameFilter::new(&["com\\.internal:.*".to_string()]);
        assert!(filter.is_blacklisted("com.internal:type=Debug"));
        assert!(!filter.is_blacklisted("java.lang:type=Memory"));
        // Second lookup hits the cache
        assert!(filter.is_blacklisted("com.internal:type=Debug"));
        filter.clear_cache();
        assert!(!filter.is_blacklisted("java.lang:type=Memory"));
    }
}
