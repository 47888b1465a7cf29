//! Whitespace-normalizing text helpers.
//!
//! The leaf utilities of the engine: option dedup, fuzzy matching, tracker
//! keys and verification all compare text through these.

/// Collapse runs of whitespace to single spaces and trim the ends.
pub fn normalize_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Full normalization for comparisons: collapse whitespace, trim, lowercase.
pub fn normalize_text(text: &str) -> String {
    normalize_ws(text).to_lowercase()
}
