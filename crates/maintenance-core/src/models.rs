use std::sync::OnceLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::time_utils::{format_timestamp, OPEN_SENTINEL};

/// Failure category assigned to records with a blank or missing failure.
pub const NO_FAILURE: &str = "Sem Falha";

/// Joins the descriptions of two rows merged into one event.
pub const DESCRIPTION_SEPARATOR: &str = " | ";

// ── MeterReading ──────────────────────────────────────────────────────────────

/// Hour-meter value exactly as the data source delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MeterReading {
    /// A JSON number.
    Number(f64),
    /// Free text, e.g. `"1.234,5 h"` as typed by an operator.
    Text(String),
}

impl MeterReading {
    /// Resolve to a finite number, or `None` when the value is not numeric.
    ///
    /// Text accepts `1234.5`, the comma-decimal form `1.234,5` and the
    /// grouped form `1,234.5`, optionally followed by an hour unit (`h`,
    /// `hs`, `hrs`, `horas`). A decimal mark that repeats (`1,2,3`) makes
    /// the reading unresolved.
    pub fn resolve(&self) -> Option<f64> {
        let value = match self {
            MeterReading::Number(n) => *n,
            MeterReading::Text(s) => parse_meter_text(s)?,
        };
        value.is_finite().then_some(value)
    }
}

fn meter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(-?[0-9][0-9.,]*)\s*(h|hs|hrs|horas)?\s*$").expect("regex is valid")
    })
}

fn parse_meter_text(s: &str) -> Option<f64> {
    let caps = meter_pattern().captures(s)?;
    let digits = caps.get(1)?.as_str();
    // The last separator is the decimal mark and may appear only once; the
    // other separator is digit grouping.
    let normalised = match digits.rfind([',', '.']) {
        None => digits.to_string(),
        Some(pos) => {
            let decimal = char::from(digits.as_bytes()[pos]);
            if digits.matches(decimal).count() > 1 {
                return None;
            }
            let grouping = if decimal == ',' { '.' } else { ',' };
            digits.replace(grouping, "").replace(decimal, ".")
        }
    };
    normalised.parse::<f64>().ok()
}

// ── RawMaintenanceRecord ──────────────────────────────────────────────────────

/// One row as delivered by the data source, before any cleaning.
///
/// Field names follow the JSON export (`camelCase`); the column names of the
/// plant database are accepted as aliases. Every field except `tag` tolerates
/// nulls and type mismatches, which deserialize as "unresolved".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMaintenanceRecord {
    /// Identifier of the monitored asset.
    #[serde(alias = "TAG", alias = "Tag")]
    pub tag: String,
    /// Maintenance start, in source text form.
    #[serde(default, alias = "Inicio", deserialize_with = "lenient_text")]
    pub start: Option<String>,
    /// Maintenance end; `None` or `"-"` when still open.
    #[serde(default, alias = "Fim", deserialize_with = "lenient_text")]
    pub end: Option<String>,
    /// Maintenance type.
    #[serde(default, alias = "Tipo", deserialize_with = "lenient_string")]
    pub kind: String,
    #[serde(default, alias = "Falha", deserialize_with = "lenient_text")]
    pub failure: Option<String>,
    #[serde(default, alias = "Descricao", deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Hour-meter reading at the time of maintenance.
    #[serde(default, alias = "Horimetro", deserialize_with = "lenient_meter")]
    pub meter_reading: Option<MeterReading>,
    #[serde(default, alias = "Operador", deserialize_with = "lenient_string")]
    pub operator: String,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_text(deserializer)?.unwrap_or_default())
}

fn lenient_meter<'de, D>(deserializer: D) -> Result<Option<MeterReading>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().map(MeterReading::Number),
        Some(Value::String(s)) => Some(MeterReading::Text(s)),
        _ => None,
    })
}

// ── ReconciledRecord ──────────────────────────────────────────────────────────

/// A cleaned maintenance event, possibly built from several raw rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledRecord {
    pub tag: String,
    /// Resolved start, or `None` when the source value was missing/malformed.
    pub start: Option<NaiveDateTime>,
    /// Resolved end, or `None` while the event is open.
    pub end: Option<NaiveDateTime>,
    pub kind: String,
    /// Failure category; never blank (see [`NO_FAILURE`]).
    pub failure: String,
    /// Description; empty when the source had none.
    pub description: String,
    pub meter_reading: Option<f64>,
    pub operator: String,
    /// Length of the event in hours; `0.0` unless both endpoints resolved.
    pub duration_hours: f64,
}

impl ReconciledRecord {
    /// `true` when no end timestamp is known.
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// `true` when the record carries a real failure classification.
    pub fn has_failure(&self) -> bool {
        self.failure != NO_FAILURE
    }
}

impl From<&ReconciledRecord> for RawMaintenanceRecord {
    /// Turn a reconciled record back into source form, e.g. to feed an
    /// already-cleaned set through the reconciler again.
    fn from(r: &ReconciledRecord) -> Self {
        let text = |ts: &Option<NaiveDateTime>| {
            Some(
                ts.as_ref()
                    .map(format_timestamp)
                    .unwrap_or_else(|| OPEN_SENTINEL.to_string()),
            )
        };

        RawMaintenanceRecord {
            tag: r.tag.clone(),
            start: text(&r.start),
            end: text(&r.end),
            kind: r.kind.clone(),
            failure: Some(r.failure.clone()),
            description: Some(r.description.clone()),
            meter_reading: r.meter_reading.map(MeterReading::Number),
            operator: r.operator.clone(),
        }
    }
}

// ── KPIs and summaries ────────────────────────────────────────────────────────

/// Headline reliability figures for a reconciled record set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiBundle {
    /// Mean time to repair, in hours.
    pub mttr_hours: f64,
    /// Share of records with a real failure, in percent (2 dp).
    pub failure_percentage: f64,
    /// Sum of all durations, in hours (2 dp).
    pub total_hours: f64,
    /// Mean of the resolvable meter readings.
    pub mean_meter_reading: f64,
}

/// One point of a per-tag duration series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub start: NaiveDateTime,
    pub duration_hours: f64,
}

/// Categorical field a record set can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupField {
    Kind,
    Failure,
    Tag,
}

impl GroupField {
    /// The category value of `record` for this field.
    pub fn value_of<'a>(&self, record: &'a ReconciledRecord) -> &'a str {
        match self {
            GroupField::Kind => &record.kind,
            GroupField::Failure => &record.failure,
            GroupField::Tag => &record.tag,
        }
    }
}

// ── Normalization helpers ─────────────────────────────────────────────────────

/// Map a blank or missing failure to [`NO_FAILURE`].
///
/// # Examples
///
/// ```
/// use maintenance_core::models::{normalize_failure, NO_FAILURE};
///
/// assert_eq!(normalize_failure(None), NO_FAILURE);
/// assert_eq!(normalize_failure(Some("  ")), NO_FAILURE);
/// assert_eq!(normalize_failure(Some("Elétrica")), "Elétrica");
/// ```
pub fn normalize_failure(failure: Option<&str>) -> String {
    match failure.map(str::trim) {
        Some(f) if !f.is_empty() => f.to_string(),
        _ => NO_FAILURE.to_string(),
    }
}

/// Map a blank, missing or `"-"` description to the empty string.
pub fn normalize_description(description: Option<&str>) -> String {
    match description.map(str::trim) {
        Some(d) if !d.is_empty() && d != OPEN_SENTINEL => d.to_string(),
        _ => String::new(),
    }
}

/// Join two descriptions with [`DESCRIPTION_SEPARATOR`], skipping empty sides.
pub fn join_descriptions(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first}{DESCRIPTION_SEPARATOR}{second}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
