//! Mentions stored as JSON files, one per target.
//!
//! `<dir>/<target-slug>.json` holds either a plain array of records or an
//! object grouping records by phase label:
//!
//! ```json
//! { "Phase II": [ { "drug_name": "ALX148" } ], "_meta": { } }
//! ```
//!
//! Keys starting with `_` are metadata and ignored. Records under a phase key
//! that carry no `phase` field inherit the key.

use std::path::PathBuf;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crowdmap_common::target_slug;

use super::MentionSource;

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, target: &str) -> PathBuf {
        self.dir.join(format!("{}.json", target_slug(target)))
    }
}

#[async_trait]
impl MentionSource for JsonFileSource {
    async fn fetch(&self, target: &str) -> anyhow::Result<Vec<Value>> {
        let path = self.path_for(target);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("No mention file for {} at {}", target, path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        let doc: Value = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        let records = flatten(doc)?;
        debug!("Loaded {} raw records for {} from {}", records.len(), target, path.display());
        Ok(records)
    }

    fn name(&self) -> &str {
        "json_file"
    }
}

/// Array → as-is; phase-grouped object → concatenated in key order.
fn flatten(doc: Value) -> anyhow::Result<Vec<Value>> {
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(groups) => {
            let mut records = Vec::new();
            for (key, value) in groups {
                if key.starts_with('_') { continue; }
                let Value::Array(items) = value else {
                    warn!("Ignoring non-array group {:?} in mention file", key);
                    continue;
                };
                for mut item in items {
                    if let Value::Object(obj) = &mut item {
                        let has_phase = obj.get("phase").is_some_and(|p| !p.is_null());
                        if !has_phase {
                            obj.insert("phase".to_string(), Value::String(key.clone()));
                        }
                    }
                    records.push(item);
                }
            }
            Ok(records)
        }
        other => bail!("mention file must hold an array or an object, found {}", kind(&other)),
    }
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
