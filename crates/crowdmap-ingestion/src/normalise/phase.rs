//! Phase string normalisation.
//!
//! Total mapping from free-text phase labels onto [`Phase`]. Compound phases
//! ("Phase I/II") resolve to the later stage; anything unparseable falls back
//! to `Preclinical`.

use crowdmap_common::Phase;

/// Words meaning the asset is on the market, matched as whole tokens.
const APPROVED_KEYWORDS: &[&str] = &["approved", "marketed", "launched"];

/// Only counts as approval when it is the whole label ("registered trial" is not).
const REGISTERED: &str = "registered";

/// Negated forms that must not count as approval.
const NOT_APPROVED: &[&str] = &["not approved", "unapproved", "not yet approved", "not marketed"];

/// Map a phase string to a [`Phase`]. Never fails.
pub fn normalise_phase(raw: Option<&str>) -> Phase {
    let Some(raw) = raw else { return Phase::Preclinical };
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Phase::Preclinical;
    }

    let negated = NOT_APPROVED.iter().any(|k| text.contains(k));
    let approved = text == REGISTERED || tokens(&text).any(|t| APPROVED_KEYWORDS.contains(&t));
    if !negated && approved {
        return Phase::Approved;
    }

    tokens(&text)
        .filter_map(stage_from_token)
        .max()
        .unwrap_or(Phase::Preclinical)
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
}

/// "phase2", "2", "ii", "1b", "iia" → stage; anything else → None.
fn stage_from_token(token: &str) -> Option<Phase> {
    let token = token
        .strip_prefix("phase")
        .or_else(|| token.strip_prefix("ph"))
        .unwrap_or(token);
    // sub-stage suffixes: 1b, 2a, iib
    let core = token.trim_end_matches(['a', 'b']);
    match core {
        "0"               => Some(Phase::Preclinical),
        "1" | "i"         => Some(Phase::PhaseI),
        "2" | "ii"        => Some(Phase::PhaseII),
        // Phase 4 is post-marketing; it still counts as the Phase III bucket
        "3" | "iii" | "4" | "iv" => Some(Phase::PhaseIII),
        _                 => None,
    }
}
