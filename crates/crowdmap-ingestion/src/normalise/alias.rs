//! Drug alias normalisation.
//!
//! Builds an in-memory lookup table mapping any known code-name or alias of a
//! drug → its canonical display name. Canonical names may embed the sponsor
//! code in parentheses, e.g. "Evorpacept (ALX148)".
//!
//! Usage:
//! ```ignore
//! let table = AliasTable::from_entries([("Evorpacept (ALX148)", vec!["ALX-148"])]);
//! assert_eq!(table.lookup("alx 148"), Some("Evorpacept (ALX148)"));
//! ```

use std::collections::HashMap;

/// Lookup key for a drug name: uppercase alphanumerics only, so that
/// "ALX-148", "alx 148" and "ALX148" collide.
pub fn name_key(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// In-memory alias table.
/// Build once at startup; share read-only across runs.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    /// Map from any known name key → canonical name.
    lookup: HashMap<String, String>,
    /// Number of canonical entries loaded.
    n_canonical: usize,
}

impl AliasTable {
    // ── Constructors ──────────────────────────────────────────────────────────

    /// Build from `(canonical, aliases)` pairs.
    ///
    /// Besides the listed aliases, each canonical name is indexed under its
    /// full form, its bare name outside the parentheses and the parenthetical
    /// code. Earlier entries win when two entries claim the same key.
    pub fn from_entries<I, C, A, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, A)>,
        C: AsRef<str>,
        A: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lookup: HashMap<String, String> = HashMap::new();
        let mut n_canonical = 0usize;

        for (canonical, aliases) in entries {
            let canonical = canonical.as_ref().trim();
            if canonical.is_empty() { continue; }

            let mut keys = vec![name_key(canonical)];
            if let Some((bare, code)) = split_parenthetical(canonical) {
                keys.push(name_key(bare));
                keys.push(name_key(code));
            }
            keys.extend(aliases.into_iter().map(|a| name_key(a.as_ref())));

            for key in keys.into_iter().filter(|k| !k.is_empty()) {
                lookup.entry(key).or_insert_with(|| canonical.to_string());
            }
            n_canonical += 1;
        }

        tracing::debug!("Alias table built: {} canonical names, {} lookup entries", n_canonical, lookup.len());
        Self { lookup, n_canonical }
    }

    // ── Lookup ────────────────────────────────────────────────────────────────

    /// Resolve a drug name to its canonical name.
    /// Case-, whitespace- and punctuation-insensitive. Returns `None` if unknown.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.lookup.get(&name_key(name)).map(String::as_str)
    }

    /// Number of canonical names loaded.
    pub fn n_canonical(&self) -> usize { self.n_canonical }

    /// Number of lookup entries (includes aliases and derived forms).
    pub fn n_lookup_entries(&self) -> usize { self.lookup.len() }
}

/// "Evorpacept (ALX148)" → ("Evorpacept", "ALX148").
fn split_parenthetical(name: &str) -> Option<(&str, &str)> {
    let open = name.find('(')?;
    let close = name[open..].find(')')? + open;
    let bare = name[..open].trim();
    let code = name[open + 1..close].trim();
    if bare.is_empty() || code.is_empty() {
        return None;
    }
    Some((bare, code))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
