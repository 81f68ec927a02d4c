//! The lexicon: alias table plus modality and mechanism vocabularies.
//!
//! Built once at process start from the embedded `data/lexicon.yaml` (or an
//! operator-supplied file with the same shape) and shared read-only, usually
//! as `Arc<Lexicon>`, by every pipeline run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crowdmap_common::{CrowdmapError, Result};

use super::alias::AliasTable;
use super::vocab::{VocabRule, Vocabulary};

const BUILTIN_LEXICON: &str = include_str!("../../data/lexicon.yaml");

/// On-disk shape of a lexicon file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconFile {
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
    #[serde(default)]
    pub modalities: Vec<VocabRule>,
    #[serde(default)]
    pub mechanisms: Vec<VocabRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Lexicon {
    pub aliases: AliasTable,
    pub modality: Vocabulary,
    pub mechanism: Vocabulary,
}

impl Lexicon {
    /// The lexicon shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_LEXICON)
    }

    /// Load a lexicon file. YAML is a superset of JSON, so both work.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CrowdmapError::Lexicon(format!("cannot read {}: {e}", path.display()))
        })?;
        let lexicon = Self::from_yaml_str(&content)?;
        tracing::info!(
            "Lexicon loaded from {}: {} canonical drugs, {} modality terms, {} mechanism terms",
            path.display(),
            lexicon.aliases.n_canonical(),
            lexicon.modality.len(),
            lexicon.mechanism.len()
        );
        Ok(lexicon)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: LexiconFile = serde_yaml::from_str(content)?;
        Self::from_file(file)
    }

    pub fn from_file(file: LexiconFile) -> Result<Self> {
        let aliases = AliasTable::from_entries(
            file.aliases.into_iter().map(|e| (e.canonical, e.aliases)),
        );
        Ok(Self {
            aliases,
            modality: Vocabulary::new(file.modalities)?,
            mechanism: Vocabulary::new(file.mechanisms)?,
        })
    }
}
