//! Character-bounded text helpers.
//!
//! Lengths are counted in `char`s so multi-byte input is never split.

const ELLIPSIS: &str = "...";

/// Trim and keep at most `max_chars` characters.
pub fn bound_prompt(raw: &str, max_chars: usize) -> String {
    raw.trim().chars().take(max_chars).collect()
}

/// Clip `text` to `limit` characters, ending in `...` when anything was cut.
pub fn clip_for_display(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let keep = limit.saturating_sub(ELLIPSIS.len());
    let mut clipped: String = text.chars().take(keep).collect();
    clipped.push_str(ELLIPSIS);
    clipped
}
