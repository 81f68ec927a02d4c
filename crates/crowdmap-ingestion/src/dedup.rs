//! Alias resolution and deduplication of asset mentions.
//!
//! Every mention is first turned into a single-mention draft (alias-resolved
//! name, normalised phase, classified modality and mechanism). Drafts sharing
//! a group key of (resolved name, indication) are then merged into one
//! [`CanonicalAsset`]. Merging is deterministic: the outcome depends only on
//! the input order.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, info};

use crowdmap_common::{AssetMention, CanonicalAsset, Term, TermStatus};

use crate::normalise::{name_key, normalise_phase, Lexicon};

/// Result of folding one draft into the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// First draft for its group key.
    New,
    /// Identical to the existing asset apart from provenance.
    ExactDuplicate,
    /// Merged into an existing asset; lists the fields that disagreed.
    Merged { conflicts: Vec<&'static str> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub input: usize,
    pub output: usize,
    pub exact_duplicates: usize,
    pub conflicting_merges: usize,
}

/// Resolves mentions into canonical assets using a shared [`Lexicon`].
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    lexicon: &'a Lexicon,
}

impl<'a> Resolver<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self { lexicon }
    }

    /// Canonicalise and deduplicate a batch of mentions.
    /// Output follows the first-seen order of group keys.
    pub fn resolve(&self, mentions: &[AssetMention]) -> (Vec<CanonicalAsset>, DedupStats) {
        let mut spellings: HashMap<String, String> = HashMap::new();
        let mut set = WorkingSet::default();
        for mention in mentions {
            let draft = self.draft(mention, &mut spellings);
            set.push(draft);
        }
        let (assets, stats) = set.finish(mentions.len());
        info!(
            "Resolved {} mentions into {} assets ({} exact duplicates, {} conflicting merges)",
            stats.input, stats.output, stats.exact_duplicates, stats.conflicting_merges
        );
        (assets, stats)
    }

    /// Re-run deduplication over assets that are already canonical.
    /// Idempotent: consolidating resolver output returns it unchanged.
    pub fn consolidate(&self, assets: Vec<CanonicalAsset>) -> (Vec<CanonicalAsset>, DedupStats) {
        let input = assets.len();
        let mut set = WorkingSet::default();
        for mut asset in assets {
            if let Some(canonical) = self.lexicon.aliases.lookup(&asset.name) {
                if canonical != asset.name {
                    let old = std::mem::replace(&mut asset.name, canonical.to_string());
                    asset.aliases.insert(old);
                }
            }
            let name = asset.name.clone();
            asset.aliases.remove(&name);
            set.push(asset);
        }
        set.finish(input)
    }

    fn draft(&self, mention: &AssetMention, spellings: &mut HashMap<String, String>) -> CanonicalAsset {
        let raw_name = mention.drug_name.trim();
        let name = match self.lexicon.aliases.lookup(raw_name) {
            Some(canonical) => canonical.to_string(),
            None => spellings
                .entry(name_key(raw_name))
                .or_insert_with(|| raw_name.to_string())
                .clone(),
        };

        let mut aliases = BTreeSet::new();
        if raw_name != name {
            aliases.insert(raw_name.to_string());
        }

        let acquisition_notes: Vec<String> = mention.acquisition_note.iter().cloned().collect();

        CanonicalAsset {
            name,
            aliases,
            sponsor: mention.sponsor.trim().to_string(),
            modality: self.lexicon.modality.classify(mention.modality.as_deref()),
            mechanism: self.lexicon.mechanism.classify(mention.mechanism.as_deref()),
            indication: mention.indication.trim().to_string(),
            phase: normalise_phase(mention.phase.as_deref()),
            status: mention.status.clone(),
            acquisition: !acquisition_notes.is_empty(),
            acquisition_notes,
            sources: BTreeSet::from([mention.source.clone()]),
            source_records: mention.source_record_id.iter().cloned().collect(),
            reported_at: mention.reported_at,
        }
    }
}

// ── Working set ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct WorkingSet {
    index: HashMap<(String, String), usize>,
    assets: Vec<CanonicalAsset>,
    groups: Vec<GroupState>,
    exact_duplicates: usize,
    conflicting_merges: usize,
}

impl WorkingSet {
    fn push(&mut self, draft: CanonicalAsset) -> MergeOutcome {
        let key = group_key(&draft);
        let Some(&i) = self.index.get(&key) else {
            self.index.insert(key, self.assets.len());
            self.groups.push(GroupState::new(&draft));
            self.assets.push(draft);
            return MergeOutcome::New;
        };

        let outcome = merge_into(&mut self.assets[i], &mut self.groups[i], draft);
        match &outcome {
            MergeOutcome::ExactDuplicate => self.exact_duplicates += 1,
            MergeOutcome::Merged { conflicts } if !conflicts.is_empty() => {
                debug!(asset = %self.assets[i].name, ?conflicts, "Resolved conflicting merge");
                self.conflicting_merges += 1;
            }
            _ => {}
        }
        outcome
    }

    fn finish(self, input: usize) -> (Vec<CanonicalAsset>, DedupStats) {
        let stats = DedupStats {
            input,
            output: self.assets.len(),
            exact_duplicates: self.exact_duplicates,
            conflicting_merges: self.conflicting_merges,
        };
        (self.assets, stats)
    }
}

fn group_key(asset: &CanonicalAsset) -> (String, String) {
    (name_key(&asset.name), name_key(&asset.indication))
}

/// Fields of the current lead mention, as it reported them.
struct LeadFields {
    status: Option<String>,
    sponsor: String,
    modality: Term,
    mechanism: Term,
}

impl LeadFields {
    fn of(asset: &CanonicalAsset) -> Self {
        Self {
            status: asset.status.clone(),
            sponsor: asset.sponsor.clone(),
            modality: asset.modality.clone(),
            mechanism: asset.mechanism.clone(),
        }
    }
}

/// Per-group bookkeeping: the lead's own fields plus the first-seen
/// present value of each field that falls back when the lead lacks it.
struct GroupState {
    lead: LeadFields,
    first_status: Option<String>,
    first_sponsor: Option<String>,
    first_modality: BTreeMap<TermStatus, Term>,
    first_mechanism: BTreeMap<TermStatus, Term>,
}

impl GroupState {
    fn new(first: &CanonicalAsset) -> Self {
        let mut state = Self {
            lead: LeadFields::of(first),
            first_status: None,
            first_sponsor: None,
            first_modality: BTreeMap::new(),
            first_mechanism: BTreeMap::new(),
        };
        state.observe(first);
        state
    }

    /// Record values not seen before; earlier values are never replaced.
    fn observe(&mut self, asset: &CanonicalAsset) {
        if self.first_status.is_none() {
            self.first_status = asset.status.clone();
        }
        if self.first_sponsor.is_none() && !asset.sponsor.is_empty() {
            self.first_sponsor = Some(asset.sponsor.clone());
        }
        self.first_modality
            .entry(asset.modality.status)
            .or_insert_with(|| asset.modality.clone());
        self.first_mechanism
            .entry(asset.mechanism.status)
            .or_insert_with(|| asset.mechanism.clone());
    }

    fn status(&self) -> Option<String> {
        self.lead.status.clone().or_else(|| self.first_status.clone())
    }

    fn sponsor(&self) -> String {
        if self.lead.sponsor.is_empty() {
            self.first_sponsor.clone().unwrap_or_default()
        } else {
            self.lead.sponsor.clone()
        }
    }
}

/// Fold `incoming` into `existing`, which holds everything merged so far
/// for the same group key.
fn merge_into(existing: &mut CanonicalAsset, group: &mut GroupState, incoming: CanonicalAsset) -> MergeOutcome {
    group.observe(&incoming);
    if existing.same_content(&incoming) {
        existing.sources.extend(incoming.sources);
        existing.source_records.extend(incoming.source_records);
        return MergeOutcome::ExactDuplicate;
    }

    let mut conflicts = Vec::new();
    if existing.phase != incoming.phase { conflicts.push("phase"); }
    if !existing.sponsor.is_empty() && !incoming.sponsor.is_empty() && existing.sponsor != incoming.sponsor {
        conflicts.push("sponsor");
    }
    if existing.status.is_some() && incoming.status.is_some() && existing.status != incoming.status {
        conflicts.push("status");
    }
    if disagree(&existing.modality, &incoming.modality) { conflicts.push("modality"); }
    if disagree(&existing.mechanism, &incoming.mechanism) { conflicts.push("mechanism"); }

    // Highest phase leads, then the most recent report; ties stay with the earlier record.
    let incoming_leads = (incoming.phase, incoming.reported_at) > (existing.phase, existing.reported_at);

    let CanonicalAsset {
        name: incoming_name,
        aliases,
        sponsor,
        modality,
        mechanism,
        indication: _,
        phase,
        status,
        acquisition,
        acquisition_notes,
        sources,
        source_records,
        reported_at,
    } = incoming;

    if incoming_leads {
        existing.phase = phase;
        existing.reported_at = reported_at;
        group.lead = LeadFields { status, sponsor, modality, mechanism };
    }
    existing.status = group.status();
    existing.sponsor = group.sponsor();
    existing.modality = pick_term(&group.lead.modality, &group.first_modality);
    existing.mechanism = pick_term(&group.lead.mechanism, &group.first_mechanism);

    existing.aliases.extend(aliases);
    if incoming_name != existing.name {
        existing.aliases.insert(incoming_name);
    }
    let name = existing.name.clone();
    existing.aliases.remove(&name);

    existing.acquisition |= acquisition;
    for note in acquisition_notes {
        let seen = existing.acquisition_notes.iter().any(|n| n.eq_ignore_ascii_case(&note));
        if !seen {
            existing.acquisition_notes.push(note);
        }
    }
    existing.sources.extend(sources);
    existing.source_records.extend(source_records);

    MergeOutcome::Merged { conflicts }
}

/// Most specific status wins; on equal status the lead's value, else the
/// first-seen value of that status.
fn pick_term(lead: &Term, first_by_status: &BTreeMap<TermStatus, Term>) -> Term {
    match first_by_status.last_key_value() {
        Some((best, first)) if *best != lead.status => first.clone(),
        _ => lead.clone(),
    }
}

fn disagree(a: &Term, b: &Term) -> bool {
    !a.is_unknown() && !b.is_unknown() && a.key() != b.key()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
