/// Core asset types shared by every stage of the landscape pipeline.
/// Mentions come in from the extraction boundary; canonical assets are what
/// the resolver hands to scoring and reporting.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Development phase
// ---------------------------------------------------------------------------

/// Clinical development stage, ordered from least to most mature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    #[serde(rename = "Preclinical")]
    Preclinical,
    #[serde(rename = "Phase I")]
    PhaseI,
    #[serde(rename = "Phase II")]
    PhaseII,
    #[serde(rename = "Phase III")]
    PhaseIII,
    #[serde(rename = "Approved")]
    Approved,
}

impl Phase {
    /// Every phase in ascending order.
    pub const ALL: [Phase; 5] = [
        Phase::Preclinical,
        Phase::PhaseI,
        Phase::PhaseII,
        Phase::PhaseIII,
        Phase::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Preclinical => "Preclinical",
            Phase::PhaseI      => "Phase I",
            Phase::PhaseII     => "Phase II",
            Phase::PhaseIII    => "Phase III",
            Phase::Approved    => "Approved",
        }
    }

    /// Position in [`Phase::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Phase II, Phase III or Approved.
    pub fn is_late_stage(&self) -> bool {
        *self >= Phase::PhaseII
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Sources and regions
// ---------------------------------------------------------------------------

/// Where a mention was scraped from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SourceTag {
    ClinicalTrials,
    Euctr,
    PubMed,
    GooglePatents,
    Other(String),
}

impl SourceTag {
    /// Parse a free-form source label. Unknown labels are kept verbatim.
    pub fn parse(label: &str) -> Self {
        let key: String = label
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "clinicaltrials" | "clinicaltrialsgov" | "ctgov" => SourceTag::ClinicalTrials,
            "euctr" | "eudract" | "euclinicaltrialsregister" => SourceTag::Euctr,
            "pubmed" | "ncbipubmed" => SourceTag::PubMed,
            "googlepatents" | "patents" | "patent" => SourceTag::GooglePatents,
            _ => SourceTag::Other(label.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceTag::ClinicalTrials => "clinicaltrials",
            SourceTag::Euctr          => "euctr",
            SourceTag::PubMed         => "pubmed",
            SourceTag::GooglePatents  => "google_patents",
            SourceTag::Other(label)   => label,
        }
    }

    /// Registry region the source covers.
    pub fn region(&self) -> Region {
        match self {
            SourceTag::ClinicalTrials => Region::NorthAmerica,
            SourceTag::Euctr          => Region::Europe,
            SourceTag::PubMed | SourceTag::GooglePatents => Region::Global,
            SourceTag::Other(_)       => Region::Unknown,
        }
    }
}

impl From<SourceTag> for String {
    fn from(tag: SourceTag) -> Self {
        tag.as_str().to_string()
    }
}

impl From<String> for SourceTag {
    fn from(label: String) -> Self {
        SourceTag::parse(&label)
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    NorthAmerica,
    Europe,
    Global,
    Unknown,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe       => "Europe",
            Region::Global       => "global",
            Region::Unknown      => "unknown",
        }
    }

    /// Whether the region is a concrete geography (not global or unknown).
    pub fn is_regional(&self) -> bool {
        matches!(self, Region::NorthAmerica | Region::Europe)
    }
}

// ---------------------------------------------------------------------------
// Controlled-vocabulary values
// ---------------------------------------------------------------------------

/// How a free-text value was mapped onto a controlled vocabulary.
/// Variant order is specificity order: `Controlled` is the most specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    Unknown,
    Unnormalized,
    Controlled,
}

/// A classified modality or mechanism value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub label: String,
    pub status: TermStatus,
}

impl Term {
    pub const UNKNOWN_LABEL: &'static str = "unknown";

    pub fn controlled(label: impl Into<String>) -> Self {
        Self { label: label.into(), status: TermStatus::Controlled }
    }

    /// Unrecognised free text, kept as-is.
    pub fn passthrough(raw: impl Into<String>) -> Self {
        Self { label: raw.into(), status: TermStatus::Unnormalized }
    }

    pub fn unknown() -> Self {
        Self { label: Self::UNKNOWN_LABEL.to_string(), status: TermStatus::Unknown }
    }

    pub fn is_controlled(&self) -> bool {
        self.status == TermStatus::Controlled
    }

    pub fn is_unknown(&self) -> bool {
        self.status == TermStatus::Unknown
    }

    /// Case-folded label for grouping.
    pub fn key(&self) -> String {
        self.label.to_lowercase()
    }
}

impl Default for Term {
    fn default() -> Self {
        Self::unknown()
    }
}

// ---------------------------------------------------------------------------
// Asset mention (extraction boundary)
// ---------------------------------------------------------------------------

/// One well-formed mention of a therapeutic asset from a single source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMention {
    pub drug_name: String,
    #[serde(default)]
    pub sponsor: String,
    pub modality: Option<String>,
    pub mechanism: Option<String>,
    #[serde(default)]
    pub indication: String,
    pub phase: Option<String>,
    pub status: Option<String>,
    pub acquisition_note: Option<String>,
    pub source: SourceTag,
    pub source_record_id: Option<String>,
    pub reported_at: Option<NaiveDate>,
}

impl AssetMention {
    /// Minimal mention; every optional field absent.
    pub fn new(drug_name: impl Into<String>, source: SourceTag) -> Self {
        Self {
            drug_name: drug_name.into(),
            sponsor: String::new(),
            modality: None,
            mechanism: None,
            indication: String::new(),
            phase: None,
            status: None,
            acquisition_note: None,
            source,
            source_record_id: None,
            reported_at: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Canonical asset
// ---------------------------------------------------------------------------

/// Deduplicated, alias-resolved representation of one real-world asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalAsset {
    /// e.g. "Evorpacept (ALX148)"
    pub name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    pub sponsor: String,
    pub modality: Term,
    pub mechanism: Term,
    pub indication: String,
    pub phase: Phase,
    pub status: Option<String>,
    pub acquisition: bool,
    #[serde(default)]
    pub acquisition_notes: Vec<String>,
    pub sources: BTreeSet<SourceTag>,
    #[serde(default)]
    pub source_records: BTreeSet<String>,
    /// Date of the record the merged fields were taken from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<NaiveDate>,
}

impl CanonicalAsset {
    /// True when both describe the same asset with the same attributes,
    /// ignoring which sources reported it.
    pub fn same_content(&self, other: &CanonicalAsset) -> bool {
        self.name == other.name
            && self.aliases == other.aliases
            && self.sponsor == other.sponsor
            && self.modality == other.modality
            && self.mechanism == other.mechanism
            && self.indication == other.indication
            && self.phase == other.phase
            && self.status == other.status
            && self.acquisition_notes == other.acquisition_notes
            && self.reported_at == other.reported_at
    }

    pub fn regions(&self) -> BTreeSet<Region> {
        self.sources.iter().map(SourceTag::region).collect()
    }
}

/// File-safe stem for a target name: anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn target_slug(target: &str) -> String {
    target
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}
