//! The single gate between untrusted candidate-answer JSON and the typed
//! [`AnswerContract`]. Validation runs in two passes: a structural sweep that
//! collects every presence, type, range, and format defect in one walk, then
//! a cross-field pass (citation integrity, rank ordering, mode consistency)
//! that only runs once the structure is sound. Nothing is coerced or
//! repaired; a failure is a terminal classification of the input.

use std::collections::HashSet;

use chrono::DateTime;
use serde_json::{Map, Value};
use url::Url;

use crate::{
    error::{ContractValidationError, ValidationErrorDetail, ValidationErrorKind},
    model::{AnswerContract, RetrievalMode, SUPPORTED_MAJOR_VERSION, VERSION_PREFIX},
};

const PERSONAS: &[&str] = &["educator", "researcher", "creator", "builder"];
const TONES: &[&str] = &["informative", "conversational", "scholarly", "celebratory"];
const COMPLETENESS: &[&str] = &["complete", "partial", "insufficient_data"];
const RETRIEVAL_MODES: &[&str] = &["performed", "no_matches", "skipped"];
const CONFIDENCE_LEVELS: &[&str] = &["high", "medium", "low", "none"];
const FALLBACK_BEHAVIORS: &[&str] = &[
    "not_needed",
    "creative_generation",
    "refusal",
    "clarification_requested",
];

const YEAR_RANGE: std::ops::RangeInclusive<i64> = 1600..=2100;
const TOP_K_RANGE: std::ops::RangeInclusive<u64> = 1..=100;

/// Validates a candidate answer, returning the typed contract or every
/// defect found.
pub fn validate(data: &Value) -> Result<AnswerContract, ContractValidationError> {
    examine(data).map_err(|details| ContractValidationError::new(details, data.clone()))
}

/// Error-list entry point: empty means valid.
pub fn check(data: &Value) -> Vec<ValidationErrorDetail> {
    examine(data).map_or_else(|details| details, |_| Vec::new())
}

pub fn is_valid(data: &Value) -> bool {
    examine(data).is_ok()
}

/// Outcome of validating a batch of candidate answers. Items are independent;
/// a rejected item never aborts the rest.
#[derive(Debug)]
pub struct BatchValidation {
    pub valid: Vec<AnswerContract>,
    pub rejected: Vec<(usize, ContractValidationError)>,
}

pub fn validate_batch(items: &[Value]) -> BatchValidation {
    let mut outcome = BatchValidation {
        valid: Vec::new(),
        rejected: Vec::new(),
    };
    for (index, item) in items.iter().enumerate() {
        match validate(item) {
            Ok(contract) => outcome.valid.push(contract),
            Err(error) => outcome.rejected.push((index, error)),
        }
    }
    outcome
}

fn examine(data: &Value) -> Result<AnswerContract, Vec<ValidationErrorDetail>> {
    let mut errors = Vec::new();
    structural_pass(data, &mut errors);
    if !errors.is_empty() {
        return Err(errors);
    }

    // The sweep above guarantees shape, so this only fails if the sweep and
    // the model drift apart.
    let contract: AnswerContract = serde_json::from_value(data.clone()).map_err(|err| {
        vec![ValidationErrorDetail::new(
            "$",
            format!("candidate does not deserialize into the contract model: {err}"),
            ValidationErrorKind::TypeMismatch,
        )]
    })?;

    cross_field_pass(&contract, &mut errors);
    if errors.is_empty() {
        Ok(contract)
    } else {
        Err(errors)
    }
}

fn structural_pass(data: &Value, errors: &mut Vec<ValidationErrorDetail>) {
    let Some(root) = data.as_object() else {
        errors.push(ValidationErrorDetail::new(
            "$",
            format!("expected an object, found {}", json_type(data)),
            ValidationErrorKind::TypeMismatch,
        ));
        return;
    };

    if let Some(version) = require_str(root, "version", "version", errors) {
        check_version(version, errors);
    }

    if let Some(persona) = optional_str(root, "persona", "persona", errors) {
        check_enum(persona, PERSONAS, "persona", errors);
    }

    if let Some(toggles) = require_object(root, "toggles", "toggles", errors) {
        require_bool(toggles, "require_citations", "toggles.require_citations", errors);
        require_bool(
            toggles,
            "primary_sources_only",
            "toggles.primary_sources_only",
            errors,
        );
        require_bool(toggles, "creative_mode", "toggles.creative_mode", errors);
    }

    if let Some(answer) = require_object(root, "answer", "answer", errors) {
        if let Some(text) = require_str(answer, "text", "answer.text", errors) {
            if text.trim().is_empty() {
                errors.push(ValidationErrorDetail::new(
                    "answer.text",
                    "answer text must not be empty",
                    ValidationErrorKind::Format,
                ));
            }
        }
        if let Some(confidence) = optional_f64(answer, "confidence", "answer.confidence", errors) {
            check_unit_interval(confidence, "answer.confidence", errors);
        }
        if let Some(tone) = optional_str(answer, "tone", "answer.tone", errors) {
            check_enum(tone, TONES, "answer.tone", errors);
        }
        if let Some(completeness) =
            optional_str(answer, "completeness", "answer.completeness", errors)
        {
            check_enum(completeness, COMPLETENESS, "answer.completeness", errors);
        }
    }

    if let Some(sources) = require_array(root, "sources", "sources", errors) {
        for (index, entry) in sources.iter().enumerate() {
            check_source(entry, index, errors);
        }
    }

    if let Some(summary) = require_object(root, "retrieval_summary", "retrieval_summary", errors) {
        check_retrieval_summary(summary, errors);
    }

    if let Some(unknowns) = require_object(root, "unknowns", "unknowns", errors) {
        require_string_array(
            unknowns,
            "unsupported_claims",
            "unknowns.unsupported_claims",
            errors,
        );
        require_string_array(
            unknowns,
            "missing_context",
            "unknowns.missing_context",
            errors,
        );
        require_string_array(
            unknowns,
            "clarifying_questions",
            "unknowns.clarifying_questions",
            errors,
        );
        optional_str(unknowns, "out_of_scope", "unknowns.out_of_scope", errors);
    }

    if let Some(integrity) = require_object(root, "integrity", "integrity", errors) {
        require_bool(
            integrity,
            "citation_required",
            "integrity.citation_required",
            errors,
        );
        require_bool(
            integrity,
            "citations_provided",
            "integrity.citations_provided",
            errors,
        );
        if let Some(level) = require_str(
            integrity,
            "retrieval_confidence",
            "integrity.retrieval_confidence",
            errors,
        ) {
            check_enum(
                level,
                CONFIDENCE_LEVELS,
                "integrity.retrieval_confidence",
                errors,
            );
        }
        if let Some(behavior) = require_str(
            integrity,
            "fallback_behavior",
            "integrity.fallback_behavior",
            errors,
        ) {
            check_enum(
                behavior,
                FALLBACK_BEHAVIORS,
                "integrity.fallback_behavior",
                errors,
            );
        }
        require_string_array(integrity, "safety_flags", "integrity.safety_flags", errors);
    }

    if let Some(provenance) = require_object(root, "provenance", "provenance", errors) {
        if let Some(timestamp) = require_str(
            provenance,
            "generated_at",
            "provenance.generated_at",
            errors,
        ) {
            if DateTime::parse_from_rfc3339(timestamp).is_err() {
                errors.push(ValidationErrorDetail::new(
                    "provenance.generated_at",
                    format!("{timestamp:?} is not an RFC 3339 timestamp"),
                    ValidationErrorKind::Format,
                ));
            }
        }
        for key in [
            "retrieval_run_id",
            "assistant_message_id",
            "session_id",
            "model_version",
            "adapter_version",
        ] {
            optional_str(provenance, key, &format!("provenance.{key}"), errors);
        }
    }
}

fn check_source(entry: &Value, index: usize, errors: &mut Vec<ValidationErrorDetail>) {
    let prefix = format!("sources[{index}]");
    let Some(source) = entry.as_object() else {
        errors.push(ValidationErrorDetail::new(
            prefix,
            format!("expected an object, found {}", json_type(entry)),
            ValidationErrorKind::TypeMismatch,
        ));
        return;
    };

    for key in [
        "citation_label",
        "source_org",
        "content_type",
        "namespace",
        "doc_id",
        "chunk_id",
    ] {
        require_str(source, key, &format!("{prefix}.{key}"), errors);
    }

    let license_path = format!("{prefix}.license");
    if let Some(license) = require_str(source, "license", &license_path, errors) {
        if license.trim().is_empty() {
            errors.push(ValidationErrorDetail::new(
                license_path,
                "license must be stated, even if unknown",
                ValidationErrorKind::Format,
            ));
        }
    }

    let url_path = format!("{prefix}.canonical_url");
    if let Some(raw_url) = require_str(source, "canonical_url", &url_path, errors) {
        match Url::parse(raw_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationErrorDetail::new(
                url_path,
                format!("scheme {:?} is not allowed; use http or https", url.scheme()),
                ValidationErrorKind::Format,
            )),
            Err(err) => errors.push(ValidationErrorDetail::new(
                url_path,
                format!("not a valid URL: {err}"),
                ValidationErrorKind::Format,
            )),
        }
    }

    let year_path = format!("{prefix}.year");
    if let Some(year) = require_i64(source, "year", &year_path, errors) {
        if !YEAR_RANGE.contains(&year) {
            errors.push(ValidationErrorDetail::new(
                year_path,
                format!(
                    "year {year} outside [{}, {}]",
                    YEAR_RANGE.start(),
                    YEAR_RANGE.end()
                ),
                ValidationErrorKind::Range,
            ));
        }
    }
}

fn check_retrieval_summary(summary: &Map<String, Value>, errors: &mut Vec<ValidationErrorDetail>) {
    require_str(summary, "query", "retrieval_summary.query", errors);

    if let Some(top_k) = require_u64(summary, "top_k", "retrieval_summary.top_k", errors) {
        if !TOP_K_RANGE.contains(&top_k) {
            errors.push(ValidationErrorDetail::new(
                "retrieval_summary.top_k",
                format!(
                    "top_k {top_k} outside [{}, {}]",
                    TOP_K_RANGE.start(),
                    TOP_K_RANGE.end()
                ),
                ValidationErrorKind::Range,
            ));
        }
    }

    require_string_array(
        summary,
        "namespaces",
        "retrieval_summary.namespaces",
        errors,
    );

    if let Some(mode) = require_str(summary, "mode", "retrieval_summary.mode", errors) {
        check_enum(mode, RETRIEVAL_MODES, "retrieval_summary.mode", errors);
    }

    let Some(results) = require_array(summary, "results", "retrieval_summary.results", errors)
    else {
        return;
    };
    for (index, entry) in results.iter().enumerate() {
        let prefix = format!("retrieval_summary.results[{index}]");
        let Some(result) = entry.as_object() else {
            errors.push(ValidationErrorDetail::new(
                prefix,
                format!("expected an object, found {}", json_type(entry)),
                ValidationErrorKind::TypeMismatch,
            ));
            continue;
        };

        require_str(result, "chunk_id", &format!("{prefix}.chunk_id"), errors);
        require_u64(result, "rank", &format!("{prefix}.rank"), errors);

        let score_path = format!("{prefix}.score");
        if let Some(score) = require_f64(result, "score", &score_path, errors) {
            check_unit_interval(score, &score_path, errors);
        }

        for key in ["doc_id", "namespace", "snippet"] {
            optional_str(result, key, &format!("{prefix}.{key}"), errors);
        }
    }
}

fn cross_field_pass(contract: &AnswerContract, errors: &mut Vec<ValidationErrorDetail>) {
    let retrieved: HashSet<&str> = contract
        .retrieval_summary
        .results
        .iter()
        .map(|result| result.chunk_id.as_str())
        .collect();

    // A citation must trace back to a chunk that was actually retrieved.
    for (index, source) in contract.sources.iter().enumerate() {
        if !retrieved.contains(source.chunk_id.as_str()) {
            errors.push(ValidationErrorDetail::new(
                format!("sources[{index}].chunk_id"),
                format!(
                    "cites chunk {:?} that does not appear in retrieval_summary.results",
                    source.chunk_id
                ),
                ValidationErrorKind::CitationIntegrity,
            ));
        }
    }

    let integrity = &contract.integrity;
    if integrity.citation_required {
        if !contract.sources.is_empty() && !integrity.citations_provided {
            errors.push(ValidationErrorDetail::new(
                "integrity.citations_provided",
                "citations are required and sources are present, but citations_provided is false",
                ValidationErrorKind::CitationIntegrity,
            ));
        }
        if contract.sources.is_empty() && integrity.citations_provided {
            errors.push(ValidationErrorDetail::new(
                "integrity.citations_provided",
                "citations_provided is true but the sources list is empty",
                ValidationErrorKind::CitationIntegrity,
            ));
        }
    }

    for (index, result) in contract.retrieval_summary.results.iter().enumerate() {
        let expected = index as u64 + 1;
        if result.rank != expected {
            errors.push(ValidationErrorDetail::new(
                format!("retrieval_summary.results[{index}].rank"),
                format!("expected rank {expected}, found {}", result.rank),
                ValidationErrorKind::Ordering,
            ));
        }
    }

    let summary = &contract.retrieval_summary;
    match summary.mode {
        RetrievalMode::Performed => {
            if summary.namespaces.is_empty() {
                errors.push(ValidationErrorDetail::new(
                    "retrieval_summary.namespaces",
                    "retrieval was performed but no namespaces are listed",
                    ValidationErrorKind::Format,
                ));
            }
            if summary.results.is_empty() {
                errors.push(ValidationErrorDetail::new(
                    "retrieval_summary.results",
                    "mode is performed but results is empty; a zero-hit retrieval is no_matches",
                    ValidationErrorKind::Format,
                ));
            }
        }
        RetrievalMode::NoMatches => {
            if summary.namespaces.is_empty() {
                errors.push(ValidationErrorDetail::new(
                    "retrieval_summary.namespaces",
                    "retrieval was attempted but no namespaces are listed",
                    ValidationErrorKind::Format,
                ));
            }
            if !summary.results.is_empty() {
                errors.push(ValidationErrorDetail::new(
                    "retrieval_summary.results",
                    "mode is no_matches but results are present",
                    ValidationErrorKind::Format,
                ));
            }
        }
        RetrievalMode::Skipped => {
            if !summary.results.is_empty() {
                errors.push(ValidationErrorDetail::new(
                    "retrieval_summary.results",
                    "mode is skipped but results are present",
                    ValidationErrorKind::Format,
                ));
            }
        }
    }
}

fn check_version(version: &str, errors: &mut Vec<ValidationErrorDetail>) {
    let Some(digits) = version.strip_prefix(VERSION_PREFIX) else {
        errors.push(version_format_error(version));
        return;
    };
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        errors.push(version_format_error(version));
        return;
    }
    match digits.parse::<u64>() {
        Ok(major) if major == SUPPORTED_MAJOR_VERSION => {}
        Ok(major) => errors.push(ValidationErrorDetail::new(
            "version",
            format!(
                "unsupported major version {major}; this validator accepts \
                 {VERSION_PREFIX}{SUPPORTED_MAJOR_VERSION}"
            ),
            ValidationErrorKind::Format,
        )),
        Err(_) => errors.push(version_format_error(version)),
    }
}

fn version_format_error(version: &str) -> ValidationErrorDetail {
    ValidationErrorDetail::new(
        "version",
        format!("{version:?} does not match {VERSION_PREFIX}<N>"),
        ValidationErrorKind::Format,
    )
}

fn check_enum(value: &str, allowed: &[&str], path: &str, errors: &mut Vec<ValidationErrorDetail>) {
    if !allowed.contains(&value) {
        errors.push(ValidationErrorDetail::new(
            path,
            format!("expected one of [{}], found {value:?}", allowed.join(", ")),
            ValidationErrorKind::Format,
        ));
    }
}

fn check_unit_interval(value: f64, path: &str, errors: &mut Vec<ValidationErrorDetail>) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(ValidationErrorDetail::new(
            path,
            format!("{value} outside [0, 1]"),
            ValidationErrorKind::Range,
        ));
    }
}

fn require<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<&'a Value> {
    match map.get(key) {
        Some(Value::Null) | None => {
            errors.push(ValidationErrorDetail::new(
                path,
                "required field is missing",
                ValidationErrorKind::MissingField,
            ));
            None
        }
        Some(value) => Some(value),
    }
}

fn require_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<&'a str> {
    let value = require(map, key, path, errors)?;
    value.as_str().or_else(|| {
        errors.push(type_mismatch(path, "a string", value));
        None
    })
}

fn require_bool(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<bool> {
    let value = require(map, key, path, errors)?;
    value.as_bool().or_else(|| {
        errors.push(type_mismatch(path, "a boolean", value));
        None
    })
}

fn require_object<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<&'a Map<String, Value>> {
    let value = require(map, key, path, errors)?;
    value.as_object().or_else(|| {
        errors.push(type_mismatch(path, "an object", value));
        None
    })
}

fn require_array<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<&'a Vec<Value>> {
    let value = require(map, key, path, errors)?;
    value.as_array().or_else(|| {
        errors.push(type_mismatch(path, "an array", value));
        None
    })
}

fn require_u64(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<u64> {
    let value = require(map, key, path, errors)?;
    value.as_u64().or_else(|| {
        errors.push(type_mismatch(path, "a non-negative integer", value));
        None
    })
}

fn require_i64(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<i64> {
    let value = require(map, key, path, errors)?;
    value.as_i64().or_else(|| {
        errors.push(type_mismatch(path, "an integer", value));
        None
    })
}

fn require_f64(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<f64> {
    let value = require(map, key, path, errors)?;
    value.as_f64().or_else(|| {
        errors.push(type_mismatch(path, "a number", value));
        None
    })
}

fn require_string_array(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) {
    let Some(entries) = require_array(map, key, path, errors) else {
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_string() {
            errors.push(type_mismatch(&format!("{path}[{index}]"), "a string", entry));
        }
    }
}

fn optional_str<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<&'a str> {
    match map.get(key) {
        Some(Value::Null) | None => None,
        Some(value) => value.as_str().or_else(|| {
            errors.push(type_mismatch(path, "a string", value));
            None
        }),
    }
}

fn optional_f64(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    errors: &mut Vec<ValidationErrorDetail>,
) -> Option<f64> {
    match map.get(key) {
        Some(Value::Null) | None => None,
        Some(value) => value.as_f64().or_else(|| {
            errors.push(type_mismatch(path, "a number", value));
            None
        }),
    }
}

fn type_mismatch(path: &str, expected: &str, found: &Value) -> ValidationErrorDetail {
    ValidationErrorDetail::new(
        path,
        format!("expected {expected}, found {}", json_type(found)),
        ValidationErrorKind::TypeMismatch,
    )
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
