//! Record loading at the data-source boundary.
//!
//! Reads maintenance rows exported as JSON arrays (`.json`) or JSON Lines
//! (`.jsonl`), either from a single file or from every such file under a
//! directory. Other sources plug in through [`RecordSource`].

use std::path::{Path, PathBuf};

use maintenance_core::error::{MaintenanceError, Result};
use maintenance_core::models::RawMaintenanceRecord;
use serde_json::Value;
use tracing::{debug, warn};

// ── RecordSource ──────────────────────────────────────────────────────────────

/// Anything that can hand over the full current set of raw rows.
///
/// Every call returns the complete set; reconciliation never works on
/// partial updates.
pub trait RecordSource: Send + Sync {
    /// Fetch all rows.
    fn fetch(&self) -> Result<Vec<RawMaintenanceRecord>>;

    /// Short human-readable description used in log lines.
    fn describe(&self) -> String;
}

impl RecordSource for Vec<RawMaintenanceRecord> {
    fn fetch(&self) -> Result<Vec<RawMaintenanceRecord>> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory rows", self.len())
    }
}

/// Rows read from a JSON/JSONL file or a directory of them.
#[derive(Debug, Clone)]
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for JsonRecordSource {
    fn fetch(&self) -> Result<Vec<RawMaintenanceRecord>> {
        load_records(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.json` and `.jsonl` files recursively under `dir`, sorted by path.
pub fn find_record_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Data path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_record_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Load every row found at `path`.
///
/// `path` may be a single file or a directory; a directory without any
/// record file is an error, as is a path that does not exist.
pub fn load_records(path: &Path) -> Result<Vec<RawMaintenanceRecord>> {
    if !path.exists() {
        return Err(MaintenanceError::DataPathNotFound(path.to_path_buf()));
    }

    if path.is_file() {
        return load_file(path);
    }

    let files = find_record_files(path);
    if files.is_empty() {
        return Err(MaintenanceError::NoDataFiles(path.to_path_buf()));
    }

    let mut records = Vec::new();
    for file in &files {
        records.extend(load_file(file)?);
    }

    debug!(
        "Loaded {} rows from {} files under {}",
        records.len(),
        files.len(),
        path.display()
    );

    Ok(records)
}

/// Load one file, choosing JSON Lines or a JSON document by extension.
pub fn load_file(path: &Path) -> Result<Vec<RawMaintenanceRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| MaintenanceError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let records = if has_extension(path, "jsonl") {
        parse_json_lines(&content)?
    } else {
        parse_records(serde_json::from_str(&content)?)?
    };

    debug!("File {}: {} rows", path.display(), records.len());
    Ok(records)
}

/// Convert a JSON document into rows.
///
/// The document must be an array of objects, each carrying a `tag`.
/// Anything else is a structural defect and fails the whole load.
pub fn parse_records(document: Value) -> Result<Vec<RawMaintenanceRecord>> {
    let Value::Array(items) = document else {
        return Err(MaintenanceError::NotASequence(json_kind(&document).to_string()));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_record(index, item))
        .collect()
}

/// Parse JSON Lines text, one object per non-blank line.
///
/// Record positions in errors count non-blank lines from zero.
pub fn parse_json_lines(text: &str) -> Result<Vec<RawMaintenanceRecord>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(index, line)| {
            let value: Value =
                serde_json::from_str(line).map_err(|e| MaintenanceError::InvalidRecord {
                    index,
                    reason: e.to_string(),
                })?;
            parse_record(index, value)
        })
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_record(index: usize, item: Value) -> Result<RawMaintenanceRecord> {
    if !item.is_object() {
        return Err(MaintenanceError::InvalidRecord {
            index,
            reason: format!("expected an object, found {}", json_kind(&item)),
        });
    }
    serde_json::from_value(item).map_err(|e| MaintenanceError::InvalidRecord {
        index,
        reason: e.to_string(),
    })
}

fn is_record_file(path: &Path) -> bool {
    has_extension(path, "json") || has_extension(path, "jsonl")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    fn sample_row(tag: &str, start: &str, end: &str) -> Value {
        serde_json::json!({
            "tag": tag,
            "start": start,
            "end": end,
            "kind": "Corretiva",
            "failure": "",
            "description": "Troca de rolamento",
            "meterReading": 1500,
            "operator": "ana",
        })
    }

    // ── parse_records ─────────────────────────────────────────────────────────

    #[test]
    fn test_parse_records_array() {
        let doc = serde_json::json!([
            sample_row("T1", "01-01-2024 08:00:00", "-"),
            sample_row("T1", "-", "01-01-2024 10:00:00"),
        ]);
        let records = parse_records(doc).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, "T1");
        assert_eq!(records[1].end.as_deref(), Some("01-01-2024 10:00:00"));
    }

    #[test]
    fn test_parse_records_empty_array() {
        assert!(parse_records(serde_json::json!([])).unwrap().is_empty());
    }

    #[test]
    fn test_parse_records_rejects_non_sequence() {
        let err = parse_records(serde_json::json!({"tag": "T1"})).unwrap_err();
        assert!(matches!(err, MaintenanceError::NotASequence(ref kind) if kind == "object"));

        let err = parse_records(serde_json::json!("rows")).unwrap_err();
        assert!(matches!(err, MaintenanceError::NotASequence(_)));
    }

    #[test]
    fn test_parse_records_rejects_non_object_item() {
        let doc = serde_json::json!([sample_row("T1", "-", "-"), 42]);
        let err = parse_records(doc).unwrap_err();
        assert!(matches!(err, MaintenanceError::InvalidRecord { index: 1, .. }));
    }

    #[test]
    fn test_parse_records_rejects_missing_tag() {
        let doc = serde_json::json!([{ "start": "01-01-2024 08:00:00" }]);
        let err = parse_records(doc).unwrap_err();
        match err {
            MaintenanceError::InvalidRecord { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.contains("tag"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_records_field_defects_are_not_errors() {
        let doc = serde_json::json!([{
            "tag": "T1",
            "start": "yesterday",
            "end": null,
            "meterReading": "unknown",
        }]);
        let records = parse_records(doc).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].start.as_deref(), Some("yesterday"));
    }

    // ── parse_json_lines ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_json_lines_skips_blank_lines() {
        let text = format!(
            "{}\n\n   \n{}\n",
            sample_row("T1", "-", "-"),
            sample_row("T2", "-", "-")
        );
        let records = parse_json_lines(&text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tag, "T2");
    }

    #[test]
    fn test_parse_json_lines_malformed_line_is_structural() {
        let text = format!("{}\n{{not json\n", sample_row("T1", "-", "-"));
        let err = parse_json_lines(&text).unwrap_err();
        assert!(matches!(err, MaintenanceError::InvalidRecord { index: 1, .. }));
    }

    // ── find_record_files ─────────────────────────────────────────────────────

    #[test]
    fn test_find_record_files_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("area-2");
        std::fs::create_dir_all(&sub).unwrap();
        write_file(dir.path(), "b.json", "[]");
        write_file(dir.path(), "a.jsonl", "");
        write_file(&sub, "c.json", "[]");
        write_file(dir.path(), "notes.txt", "ignored");

        let files = find_record_files(dir.path());
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("a.jsonl"));
        assert!(files[1].ends_with("area-2/c.json"));
        assert!(files[2].ends_with("b.json"));
    }

    #[test]
    fn test_find_record_files_nonexistent_path() {
        let files = find_record_files(Path::new("/tmp/does-not-exist-maintenance-xyz"));
        assert!(files.is_empty());
    }

    // ── load_records ──────────────────────────────────────────────────────────

    #[test]
    fn test_load_records_single_json_file() {
        let dir = TempDir::new().unwrap();
        let doc = serde_json::json!([sample_row("T1", "01-01-2024 08:00:00", "-")]);
        let path = write_file(dir.path(), "records.json", &doc.to_string());

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].operator, "ana");
    }

    #[test]
    fn test_load_records_directory_concatenates_files() {
        let dir = TempDir::new().unwrap();
        let doc = serde_json::json!([sample_row("T1", "-", "-")]);
        write_file(dir.path(), "a.json", &doc.to_string());
        let lines = format!(
            "{}\n{}\n",
            sample_row("T2", "-", "-"),
            sample_row("T3", "-", "-")
        );
        write_file(dir.path(), "b.jsonl", &lines);

        let records = load_records(dir.path()).unwrap();
        let tags: Vec<&str> = records.iter().map(|r| r.tag.as_str()).collect();
        assert_eq!(tags, vec!["T1", "T2", "T3"]);
    }

    #[test]
    fn test_load_records_missing_path() {
        let err = load_records(Path::new("/tmp/does-not-exist-maintenance-xyz")).unwrap_err();
        assert!(matches!(err, MaintenanceError::DataPathNotFound(_)));
    }

    #[test]
    fn test_load_records_empty_directory() {
        let dir = TempDir::new().unwrap();
        let err = load_records(dir.path()).unwrap_err();
        assert!(matches!(err, MaintenanceError::NoDataFiles(_)));
    }

    #[test]
    fn test_load_records_invalid_json_document() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "broken.json", "{[");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, MaintenanceError::JsonParse(_)));
    }

    // ── RecordSource ──────────────────────────────────────────────────────────

    #[test]
    fn test_json_record_source_fetch() {
        let dir = TempDir::new().unwrap();
        let doc = serde_json::json!([sample_row("T1", "-", "-")]);
        let path = write_file(dir.path(), "records.json", &doc.to_string());

        let source = JsonRecordSource::new(&path);
        assert_eq!(source.path(), path.as_path());
        assert_eq!(source.fetch().unwrap().len(), 1);
        assert!(source.describe().ends_with("records.json"));
    }

    #[test]
    fn test_vec_record_source() {
        let rows = vec![RawMaintenanceRecord {
            tag: "T1".to_string(),
            ..Default::default()
        }];
        assert_eq!(rows.fetch().unwrap(), rows);
        assert_eq!(rows.describe(), "1 in-memory rows");
    }
}
