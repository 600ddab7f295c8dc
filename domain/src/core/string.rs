//! String utilities for the domain layer.

/// Clip a string to at most `max_chars` characters, appending an ellipsis
/// when anything was cut.
///
/// Counts `char`s rather than bytes so prompt excerpts never split a
/// multi-byte character.
pub fn clip(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => {
            let keep = max_chars.saturating_sub(3);
            let end = s.char_indices().nth(keep).map(|(i, _)| i).unwrap_or(end);
            format!("{}...", &s[..end])
        }
    }
}

/// Collapse a multi-line string onto one line for log and event summaries.
pub fn one_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
