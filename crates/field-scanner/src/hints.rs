//! Advisory semantic hints from a keyword table over label + placeholder +
//! name. Metadata for the planner only; never gates execution.

use formpilot_core_types::SemanticHint;
use once_cell::sync::Lazy;
use regex::Regex;

static HINT_TABLE: Lazy<Vec<(SemanticHint, Regex)>> = Lazy::new(|| {
    vec![
        (
            SemanticHint::Email,
            Regex::new(r"e-?mail").unwrap(),
        ),
        (
            SemanticHint::Url,
            Regex::new(r"\b(url|website|portfolio|linkedin|github|link)\b").unwrap(),
        ),
        (
            SemanticHint::Phone,
            Regex::new(r"\b(phone|mobile|tel|telephone)\b").unwrap(),
        ),
        (
            SemanticHint::Demographic,
            Regex::new(r"\b(gender|race|ethnicity|veteran|disability|pronouns|hispanic|latino)\b")
                .unwrap(),
        ),
        (
            SemanticHint::ShortNote,
            Regex::new(r"\b(why|describe|tell us|cover letter|summary|anything else|additional)\b")
                .unwrap(),
        ),
    ]
});

pub fn infer_hint(label: &str, placeholder: &str, name: &str) -> SemanticHint {
    let haystack = format!("{label} {placeholder} {name}").to_lowercase();
    for (hint, pattern) in HINT_TABLE.iter() {
        if pattern.is_match(&haystack) {
            return *hint;
        }
    }
    SemanticHint::GeneralText
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_table_in_priority_order() {
        assert_eq!(infer_hint("Email address", "", ""), SemanticHint::Email);
        assert_eq!(infer_hint("LinkedIn profile", "", ""), SemanticHint::Url);
        assert_eq!(infer_hint("", "(555) 555-5555", "phone"), SemanticHint::Phone);
        assert_eq!(infer_hint("Veteran status", "", ""), SemanticHint::Demographic);
        assert_eq!(
            infer_hint("Why do you want to work here?", "", ""),
            SemanticHint::ShortNote
        );
        assert_eq!(infer_hint("First name", "", ""), SemanticHint::GeneralText);
    }
}
