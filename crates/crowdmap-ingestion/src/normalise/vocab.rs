//! Controlled-vocabulary matching for modality and mechanism-of-action text.
//!
//! A vocabulary is an ordered list of rules, each naming a controlled term and
//! the keywords that select it. Rules are data (see `data/lexicon.yaml`);
//! this module only compiles and evaluates them.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crowdmap_common::{CrowdmapError, Result, Term};

/// One controlled term and its trigger keywords, as stored in the lexicon file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabRule {
    pub term: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Molecular target this term is specific to (e.g. "CD47"), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: VocabRule,
    /// (pattern, keyword length in chars); the term label itself is the first entry
    patterns: Vec<(Regex, usize)>,
}

/// Compiled, immutable vocabulary.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    rules: Vec<CompiledRule>,
}

impl Vocabulary {
    pub fn new(rules: Vec<VocabRule>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            if rule.term.trim().is_empty() {
                return Err(CrowdmapError::Lexicon("vocabulary rule with empty term".to_string()));
            }
            let mut patterns = Vec::with_capacity(rule.keywords.len() + 1);
            for keyword in std::iter::once(&rule.term).chain(rule.keywords.iter()) {
                let keyword = keyword.trim();
                if keyword.is_empty() { continue; }
                patterns.push((keyword_regex(keyword)?, keyword.chars().count()));
            }
            compiled.push(CompiledRule { rule, patterns });
        }
        Ok(Self { rules: compiled })
    }

    /// Map free text onto a controlled term.
    ///
    /// The rule with the longest matching keyword wins; on equal length the
    /// earlier rule wins. No match → the text passes through unchanged.
    pub fn classify(&self, raw: Option<&str>) -> Term {
        let text = match raw.map(str::trim) {
            Some(t) if !t.is_empty() && !t.eq_ignore_ascii_case(Term::UNKNOWN_LABEL) => t,
            _ => return Term::unknown(),
        };

        let mut best: Option<(&VocabRule, usize)> = None;
        for compiled in &self.rules {
            let longest = compiled
                .patterns
                .iter()
                .filter(|(re, _)| re.is_match(text))
                .map(|(_, len)| *len)
                .max();
            if let Some(len) = longest {
                if best.map_or(true, |(_, best_len)| len > best_len) {
                    best = Some((&compiled.rule, len));
                }
            }
        }

        match best {
            Some((rule, _)) => Term::controlled(rule.term.clone()),
            None => Term::passthrough(text),
        }
    }

    /// Controlled terms in rule order.
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|c| c.rule.term.as_str())
    }

    /// Rules scoped to the given molecular target (case-insensitive).
    pub fn scoped_to<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a VocabRule> + 'a {
        self.rules
            .iter()
            .map(|c| &c.rule)
            .filter(move |r| r.target.as_deref().is_some_and(|t| t.trim().eq_ignore_ascii_case(target.trim())))
    }

    pub fn rules(&self) -> impl Iterator<Item = &VocabRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Case-insensitive keyword match that must not start or end inside a word.
fn keyword_regex(keyword: &str) -> Result<Regex> {
    let pattern = format!(
        r"(?i)(?:^|[^\p{{L}}\p{{N}}]){}(?:$|[^\p{{L}}\p{{N}}])",
        regex::escape(keyword)
    );
    Regex::new(&pattern)
        .map_err(|e| CrowdmapError::Lexicon(format!("bad keyword {keyword:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crowdmap_common::TermStatus;

    fn rule(term: &str, keywords: &[&str]) -> VocabRule {
        VocabRule {
            term: term.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            target: None,
        }
    }

    fn modalities() -> Vocabulary {
        Vocabulary::new(vec![
            rule("Small Molecule", &["small molecule", "small-molecule"]),
            rule("mAb", &["monoclonal antibody", "antibody"]),
            rule("Bispecific mAb", &["bispecific", "bispecific antibody"]),
            rule("ADC", &["antibody-drug conjugate"]),
            rule("Fc-fusion Protein", &["fusion protein", "fc fusion"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_keyword_match() {
        let v = modalities();
        assert_eq!(v.classify(Some("Monoclonal Antibody")), Term::controlled("mAb"));
        assert_eq!(v.classify(Some("oral small-molecule inhibitor")), Term::controlled("Small Molecule"));
    }

    #[test]
    fn test_term_label_matches_itself() {
        let v = modalities();
        assert_eq!(v.classify(Some("mab")), Term::controlled("mAb"));
        assert_eq!(v.classify(Some("ADC")), Term::controlled("ADC"));
    }

    #[test]
    fn test_longer_keyword_beats_earlier_rule() {
        let v = modalities();
        assert_eq!(v.classify(Some("Bispecific antibody")), Term::controlled("Bispecific mAb"));
        assert_eq!(v.classify(Some("Bispecific mAb")), Term::controlled("Bispecific mAb"));
        assert_eq!(v.classify(Some("Antibody-drug conjugate")), Term::controlled("ADC"));
    }

    #[test]
    fn test_equal_length_tie_goes_to_first_rule() {
        let v = Vocabulary::new(vec![rule("First", &["alpha"]), rule("Second", &["alpha"])]).unwrap();
        assert_eq!(v.classify(Some("alpha")), Term::controlled("First"));
    }

    #[test]
    fn test_keywords_respect_word_boundaries() {
        let v = Vocabulary::new(vec![rule("ADC", &["adc"])]).unwrap();
        assert_eq!(v.classify(Some("cascade")).status, TermStatus::Unnormalized);
        assert_eq!(v.classify(Some("anti-CD47 ADC")).status, TermStatus::Controlled);
    }

    #[test]
    fn test_unmatched_passes_through() {
        let v = modalities();
        let term = v.classify(Some("  Exotic-Peptide-Conjugate "));
        assert_eq!(term, Term::passthrough("Exotic-Peptide-Conjugate"));
    }

    #[test]
    fn test_absent_is_unknown() {
        let v = modalities();
        assert!(v.classify(None).is_unknown());
        assert!(v.classify(Some("   ")).is_unknown());
        assert!(v.classify(Some("Unknown")).is_unknown());
    }

    #[test]
    fn test_scoped_rules() {
        let v = Vocabulary::new(vec![
            VocabRule { target: Some("CD47".into()), ..rule("CD47 Blockade", &[]) },
            rule("Kinase Inhibition", &[]),
        ])
        .unwrap();
        let scoped: Vec<_> = v.scoped_to("cd47").map(|r| r.term.as_str()).collect();
        assert_eq!(scoped, vec!["CD47 Blockade"]);
        assert_eq!(v.scoped_to("KRAS").count(), 0);
    }

    #[test]
    fn test_empty_term_rejected() {
        assert!(Vocabulary::new(vec![rule(" ", &["x"])]).is_err());
    }
}
