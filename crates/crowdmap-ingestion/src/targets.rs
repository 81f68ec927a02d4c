//! Reading molecular-target lists for batch runs.
//!
//! Supported formats, chosen by extension:
//! - `.txt`: one target per line, lines may also be comma separated
//! - `.csv`: column `target` or `molecular_target` (any case), else the first column
//! - `.json`: array of strings, or of objects with `target` / `molecular_target`
//!
//! Blank entries are skipped and case-insensitive duplicates dropped,
//! keeping the first occurrence.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crowdmap_common::{CrowdmapError, Result};

const TARGET_COLUMNS: &[&str] = &["target", "molecular_target"];

pub fn read_targets(path: &Path) -> Result<Vec<String>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let raw = match ext.as_str() {
        "txt" => parse_txt(&std::fs::read_to_string(path)?),
        "csv" => parse_csv(&std::fs::read_to_string(path)?)?,
        "json" => parse_json(&std::fs::read_to_string(path)?)?,
        _ => {
            return Err(CrowdmapError::UnsupportedInput(format!(
                "target list {} (expected .txt, .csv or .json)",
                path.display()
            )))
        }
    };

    let targets = dedup_targets(raw);
    info!("Read {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

fn parse_txt(content: &str) -> Vec<String> {
    content
        .lines()
        .flat_map(|line| line.split(','))
        .map(|s| s.trim().to_string())
        .collect()
}

fn parse_csv(content: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let column = reader
        .headers()?
        .iter()
        .position(|h| TARGET_COLUMNS.iter().any(|c| h.eq_ignore_ascii_case(c)))
        .unwrap_or(0);

    let mut targets = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(value) = row.get(column) {
            targets.push(value.to_string());
        }
    }
    Ok(targets)
}

fn parse_json(content: &str) -> Result<Vec<String>> {
    let doc: Value = serde_json::from_str(content)?;
    let Value::Array(items) = doc else {
        return Err(CrowdmapError::UnsupportedInput(
            "JSON target list must be an array".to_string(),
        ));
    };

    let mut targets = Vec::new();
    for item in items {
        match item {
            Value::String(s) => targets.push(s),
            Value::Object(obj) => {
                let found = TARGET_COLUMNS
                    .iter()
                    .find_map(|k| obj.get(*k).and_then(Value::as_str));
                match found {
                    Some(s) => targets.push(s.to_string()),
                    None => {
                        let entry = serde_json::Value::Object(obj);
                        warn!("Skipping target entry without a target field: {}", entry);
                    }
                }
            }
            other => warn!("Skipping unsupported target entry: {}", other),
        }
    }
    Ok(targets)
}

fn dedup_targets(raw: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.to_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_txt_lines_and_commas() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "targets.txt", "CD47\nKRAS, TIGIT\n\n  cd47 \n");
        assert_eq!(read_targets(&path).unwrap(), vec!["CD47", "KRAS", "TIGIT"]);
    }

    #[test]
    fn test_csv_named_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "targets.csv", "priority,Molecular_Target\n1,CD47\n2,LAG3\n3,\n");
        assert_eq!(read_targets(&path).unwrap(), vec!["CD47", "LAG3"]);
    }

    #[test]
    fn test_csv_first_column_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "targets.csv", "gene,note\nCD47,hot\nTIGIT,cold\n");
        assert_eq!(read_targets(&path).unwrap(), vec!["CD47", "TIGIT"]);
    }

    #[test]
    fn test_json_strings_and_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "targets.json",
            r#"["CD47", {"molecular_target": "KRAS"}, {"gene": "x"}, 7, {"target": "kras"}]"#,
        );
        assert_eq!(read_targets(&path).unwrap(), vec!["CD47", "KRAS"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "targets.xlsx", "");
        assert!(matches!(read_targets(&path), Err(CrowdmapError::UnsupportedInput(_))));
    }

    #[test]
    fn test_json_object_root_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "targets.json", r#"{"target": "CD47"}"#);
        assert!(read_targets(&path).is_err());
    }
}
