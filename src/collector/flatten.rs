//! Attribute-value flattening
//!
//! Turns one fetched attribute value into zero or more raw samples,
//! recursing through composite members with dot-joined paths. Flattening is
//! pure over the value; the policy actions it implies (composites become
//! always-fetch-single, unusable values become never-fetch) are reported to
//! the caller instead of applied here.

use crate::path::RawSample;
use crate::session::AttrValue;

/// Samples plus the policy actions this attribute's shape implies.
#[derive(Debug, Default)]
pub struct FlattenOutcome {
    pub samples: Vec<RawSample>,
    /// 복합 값: 다음부터 개별 조회로 전환
    pub mark_always_fetch_single: bool,
    /// 사용 불가능한 값: 다시 조회하지 않음
    pub mark_never_fetch: bool,
}

/// Flattens one top-level attribute value.
///
/// When `collect_strings` is false, string values still go through numeric
/// coercion, so numeric strings yield samples and everything else marks the
/// attribute never-fetch.
pub fn flatten_attribute(
    object_instance_name: &str,
    attribute_name: &str,
    value: &AttrValue,
    retrieval_timestamp_ms: u64,
    collect_strings: bool,
) -> FlattenOutcome {
    let mut outcome = FlattenOutcome::default();
    flatten_value(
        object_instance_name,
        attribute_name,
        attribute_name,
        value,
        retrieval_timestamp_ms,
        collect_strings,
        &mut outcome,
    );
    outcome
}

#[allow(clippy::too_many_arguments)]
fn flatten_value(
    object_instance_name: &str,
    attribute_name: &str,
    attribute_path: &str,
    value: &AttrValue,
    retrieval_timestamp_ms: u64,
    collect_strings: bool,
    outcome: &mut FlattenOutcome,
) {
    match value {
        AttrValue::Number(n) => {
            outcome.samples.push(RawSample::new(
                object_instance_name,
                attribute_name,
                attribute_path,
                *n,
                retrieval_timestamp_ms,
            ));
        }
        AttrValue::Bool(b) => {
            outcome.samples.push(RawSample::new(
                object_instance_name,
                attribute_name,
                attribute_path,
                if *b { 1.0 } else { 0.0 },
                retrieval_timestamp_ms,
            ));
        }
        AttrValue::Composite(members) => {
            outcome.mark_always_fetch_single = true;
            for (key, member) in members {
                let member_path = format!("{}.{}", attribute_path, key);
                flatten_value(
                    object_instance_name,
                    attribute_name,
                    &member_path,
                    member,
                    retrieval_timestamp_ms,
                    collect_strings,
                    outcome,
                );
            }
        }
        AttrValue::Text(text) => {
            if collect_strings {
                // The string becomes part of the path, with value 1. Dots
                // would split the value into path segments.
                let string_path =
                    format!("{}={}", attribute_path, text.replace('.', "_"));
                outcome.samples.push(RawSample::new_string(
                    object_instance_name,
                    attribute_name,
                    &string_path,
                    retrieval_timestamp_ms,
                ));
            } else if let Some(numeric) = AttrValue::Text(text.clone()).as_f64() {
                outcome.samples.push(RawSample::new(
                    object_instance_name,
                    attribute_name,
                    attribute_path,
                    numeric,
                    retrieval_timestamp_ms,
                ));
            } else {
                outcome.mark_never_fetch = true;
            }
        }
        AttrValue::Null | AttrValue::Array(_) => {
            outcome.mark_never_fetch = true;
        }
    }
}
