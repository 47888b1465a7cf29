//! Value-to-option matching and post-action verification.
//!
//! Matching answers "which option did the user mean" with an ordered ladder
//! of tiers; verification re-reads the control after an interaction and
//! decides whether the page really took the value.

pub mod matching;
pub mod verify;

pub use matching::{fuzzy_match, pick_best, Candidate, MatchTier};
pub use verify::{
    selection_snapshot, verify_multi_selection, verify_selection, verify_text, verify_toggle,
};
