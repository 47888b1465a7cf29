//! Tiered fuzzy matching between a requested value and a menu's options.
//!
//! The ladder runs across ALL candidates before descending a tier, so a
//! weaker match on an earlier option never shadows an exact match on a
//! later one.

use formpilot_core_types::normalize_text;
use serde::{Deserialize, Serialize};

/// How close a chosen option was to the requested value, strongest first.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    Prefix,
    Contains,
    Alias,
    TokenOverlap,
}

impl MatchTier {
    pub fn is_exact(self) -> bool {
        matches!(self, MatchTier::Exact)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Prefix => "prefix",
            MatchTier::Contains => "contains",
            MatchTier::Alias => "alias",
            MatchTier::TokenOverlap => "token_overlap",
        }
    }
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One selectable option, as value/text pair plus its position in the menu.
#[derive(Clone, Debug)]
pub struct Candidate {
    pub index: usize,
    pub value: String,
    pub text: String,
}

impl Candidate {
    pub fn new(index: usize, value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Phrases that name the same answer across job boards. Each group is
/// interchangeable in either direction.
const ALIAS_GROUPS: &[&[&str]] = &[
    &["linkedin", "professional network", "online professional network"],
    &["prefer not", "prefer not to say", "decline", "decline to self identify"],
    &["usa", "united states", "united states of america", "america"],
    &["uk", "united kingdom", "great britain", "britain"],
];

fn in_alias_group(normalized: &str, group: &[&str]) -> bool {
    group.iter().any(|phrase| {
        if phrase.len() <= 3 {
            // Short codes only match as whole tokens, so "uk" never claims
            // "ukraine".
            normalized.split_whitespace().any(|tok| {
                tok == *phrase || tok.trim_matches(|c: char| !c.is_alphanumeric()) == *phrase
            })
        } else {
            normalized.contains(phrase)
        }
    })
}

fn alias_match(a: &str, b: &str) -> bool {
    ALIAS_GROUPS
        .iter()
        .any(|group| in_alias_group(a, group) && in_alias_group(b, group))
}

fn token_overlap(a: &str, b: &str) -> f32 {
    let ta: Vec<&str> = a.split_whitespace().collect();
    let tb: Vec<&str> = b.split_whitespace().collect();
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.iter().filter(|t| tb.contains(t)).count();
    shared as f32 / ta.len().max(tb.len()) as f32
}

fn matches_at_tier(requested: &str, candidate: &str, tier: MatchTier) -> bool {
    match tier {
        MatchTier::Exact => requested == candidate,
        MatchTier::Prefix => {
            candidate.starts_with(requested) || requested.starts_with(candidate)
        }
        MatchTier::Contains => {
            // Substring matching on very short needles is noise ("no" is
            // inside "north", "unknown", ...).
            (requested.len() > 2 && candidate.contains(requested))
                || (candidate.len() > 2 && requested.contains(candidate))
        }
        MatchTier::Alias => alias_match(requested, candidate),
        MatchTier::TokenOverlap => token_overlap(requested, candidate) >= 0.5,
    }
}

const TIER_ORDER: [MatchTier; 5] = [
    MatchTier::Exact,
    MatchTier::Prefix,
    MatchTier::Contains,
    MatchTier::Alias,
    MatchTier::TokenOverlap,
];

/// Best tier at which `requested` matches `candidate`, if any.
pub fn fuzzy_match(requested: &str, candidate: &str) -> Option<MatchTier> {
    let req = normalize_text(requested);
    let cand = normalize_text(candidate);
    if req.is_empty() || cand.is_empty() {
        return None;
    }
    TIER_ORDER
        .into_iter()
        .find(|tier| matches_at_tier(&req, &cand, *tier))
}

/// Pick the option best matching the requested value. Both the option's
/// visible text and its value attribute are tried at each tier.
pub fn pick_best(requested: &str, candidates: &[Candidate]) -> Option<(usize, MatchTier)> {
    let req = normalize_text(requested);
    if req.is_empty() {
        return None;
    }
    for tier in TIER_ORDER {
        for cand in candidates {
            let text = normalize_text(&cand.text);
            let value = normalize_text(&cand.value);
            if (!text.is_empty() && matches_at_tier(&req, &text, tier))
                || (!value.is_empty() && matches_at_tier(&req, &value, tier))
            {
                return Some((cand.index, tier));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(texts: &[&str]) -> Vec<Candidate> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Candidate::new(i, t.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn exact_beats_earlier_weaker_matches() {
        let candidates = opts(&["United Arab Emirates", "United States"]);
        let (idx, tier) = pick_best("united states", &candidates).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(tier, MatchTier::Exact);
    }

    #[test]
    fn prefix_and_contains_fill_in() {
        let candidates = opts(&["Referral", "Job board", "Company website"]);
        let (idx, tier) = pick_best("refer", &candidates).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(tier, MatchTier::Prefix);
        let (idx, tier) = pick_best("board", &candidates).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(tier, MatchTier::Contains);
    }

    #[test]
    fn short_needles_do_not_contain_match() {
        assert_eq!(fuzzy_match("no", "unknown"), None);
        assert_eq!(fuzzy_match("No", "No"), Some(MatchTier::Exact));
    }

    #[test]
    fn linkedin_alias_reaches_the_long_label() {
        let candidates = opts(&["Job board", "Online professional network", "Other"]);
        let (idx, tier) = pick_best("LinkedIn", &candidates).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(tier, MatchTier::Alias);
    }

    #[test]
    fn usa_alias_and_uk_token_guard() {
        assert_eq!(fuzzy_match("USA", "United States"), Some(MatchTier::Alias));
        assert_eq!(fuzzy_match("UK", "United Kingdom"), Some(MatchTier::Alias));
        assert_eq!(fuzzy_match("UK", "Ukraine"), None);
    }

    #[test]
    fn token_overlap_is_the_last_resort() {
        assert_eq!(
            fuzzy_match("software engineer", "Senior Software Engineer"),
            Some(MatchTier::Contains)
        );
        assert_eq!(
            fuzzy_match("engineer software senior", "senior software engineer"),
            Some(MatchTier::TokenOverlap)
        );
        assert_eq!(fuzzy_match("apples", "oranges"), None);
    }

    #[test]
    fn value_attribute_counts_too() {
        let candidates = vec![Candidate::new(0, "US", "United States")];
        let (idx, tier) = pick_best("US", &candidates).unwrap();
        assert_eq!(idx, 0);
        assert_eq!(tier, MatchTier::Exact);
    }
}
