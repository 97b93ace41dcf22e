//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Make a free-form label safe to embed in a file name.
///
/// Spaces and path separators become underscores.
pub fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // "é" is 2 bytes; never split it
        assert_eq!(truncate("critères", 30), "critères");
        assert_eq!(truncate("éééééé", 8), "éé...");
    }

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("Phase I/context assembly"), "Phase_I_context_assembly");
        assert_eq!(sanitize_label(r"a\b"), "a_b");
    }
}
