//! Validation and coercion of raw extracted records.
//!
//! The extraction collaborator hands us loosely shaped JSON. Each record is
//! either coerced into an [`AssetMention`] or rejected with a
//! [`RejectReason`]; rejections are counted, never fatal.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crowdmap_common::{AssetMention, SourceTag};

// Accepted spellings per field, in priority order.
const NAME_KEYS: &[&str] = &["drug_name", "name", "asset_name", "drug"];
const SPONSOR_KEYS: &[&str] = &["sponsor", "company", "developer"];
const MODALITY_KEYS: &[&str] = &["modality"];
const MECHANISM_KEYS: &[&str] = &["mechanism_of_action", "mechanism", "moa"];
const INDICATION_KEYS: &[&str] = &["indication", "condition", "disease"];
const PHASE_KEYS: &[&str] = &["phase"];
const STATUS_KEYS: &[&str] = &["status"];
const ACQUISITION_KEYS: &[&str] = &[
    "acquisition/licensing signals",
    "licensing_note",
    "acquisition_note",
    "acquisition",
];
const SOURCE_KEYS: &[&str] = &["source", "source_tag"];
const RECORD_ID_KEYS: &[&str] = &["source_record_id", "record_id", "nct_id", "trial_id"];
const DATE_KEYS: &[&str] = &["reported_at", "last_updated"];

/// Names the extractor emits when it could not find a drug.
const PLACEHOLDER_NAMES: &[&str] = &["unknown", "n/a", "na", "none", "null", "-"];

/// Why a raw record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("record has no drug name")]
    MissingName,
    #[error("drug name is a placeholder")]
    PlaceholderName,
    #[error("record was flagged as a processing error by the extractor")]
    ProcessingError,
}

/// Outcome of ingesting one batch of raw records.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub accepted: Vec<AssetMention>,
    pub rejected: BTreeMap<RejectReason, usize>,
}

impl IngestReport {
    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }
}

/// Ingest a batch. Mentions without a source tag get `default_source`.
pub fn ingest_records(records: &[Value], default_source: &SourceTag) -> IngestReport {
    let mut report = IngestReport::default();
    for (i, record) in records.iter().enumerate() {
        match ingest_record(record, default_source) {
            Ok(mention) => report.accepted.push(mention),
            Err(reason) => {
                warn!(record = i, %reason, "Rejected asset record");
                *report.rejected.entry(reason).or_insert(0) += 1;
            }
        }
    }
    info!(
        "Ingested {} records: {} accepted, {} rejected",
        records.len(),
        report.accepted.len(),
        report.rejected_total()
    );
    report
}

/// Validate and coerce a single record.
pub fn ingest_record(record: &Value, default_source: &SourceTag) -> Result<AssetMention, RejectReason> {
    let obj = record.as_object().ok_or(RejectReason::NotAnObject)?;

    if obj.get("_processing_error").and_then(Value::as_bool) == Some(true) {
        return Err(RejectReason::ProcessingError);
    }

    let drug_name = field(obj, NAME_KEYS).ok_or(RejectReason::MissingName)?;
    if PLACEHOLDER_NAMES.iter().any(|p| drug_name.eq_ignore_ascii_case(p)) {
        return Err(RejectReason::PlaceholderName);
    }

    let source = field(obj, SOURCE_KEYS)
        .map(|s| SourceTag::parse(&s))
        .unwrap_or_else(|| default_source.clone());

    Ok(AssetMention {
        drug_name,
        sponsor: field(obj, SPONSOR_KEYS).unwrap_or_default(),
        modality: field(obj, MODALITY_KEYS),
        mechanism: field(obj, MECHANISM_KEYS),
        indication: field(obj, INDICATION_KEYS).unwrap_or_default(),
        phase: field(obj, PHASE_KEYS),
        status: field(obj, STATUS_KEYS),
        acquisition_note: field(obj, ACQUISITION_KEYS),
        source,
        source_record_id: field(obj, RECORD_ID_KEYS),
        reported_at: field(obj, DATE_KEYS).and_then(|d| parse_date(&d)),
    })
}

/// First present, non-blank value among `keys`, coerced to a string.
fn field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(coerce))
}

fn coerce(value: &Value) -> Option<String> {
    let s = match value {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .filter(|v| !v.is_array() && !v.is_object())
            .filter_map(coerce)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}
