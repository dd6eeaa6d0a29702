/// Formatting markers the model is told not to emit: emphasis, headings and
/// list bullets. Hyphenated words survive because only `"- "` is removed.
pub const DEFAULT_DENYLIST: &[&str] = &["*", "#", "- ", "• "];

/// Remove every occurrence of each denylisted substring, in list order.
pub fn strip_forbidden(text: &str, denylist: &[&str]) -> String {
    denylist
        .iter()
        .filter(|marker| !marker.is_empty())
        .fold(text.to_string(), |acc, marker| acc.replace(marker, ""))
}

pub fn strip_default(text: &str) -> String {
    strip_forbidden(text, DEFAULT_DENYLIST)
}
