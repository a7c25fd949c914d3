//! Shared utility functions.

/// Shorten `text` to at most `max_chars` characters for log previews,
/// appending an ellipsis when something was cut. Newlines are flattened.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.replace(['\n', '\r'], " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
