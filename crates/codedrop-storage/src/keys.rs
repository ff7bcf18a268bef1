//! Shared key generation for the content area.
//!
//! Key format: `objects/{uuid}-{sanitized filename}`.

use uuid::Uuid;

/// Directory under the content root holding every object.
pub const OBJECTS_PREFIX: &str = "objects";

const MAX_NAME_LEN: usize = 100;
const FALLBACK_NAME: &str = "file";

/// Generate a fresh storage key for an upload named `filename`.
pub fn generate_object_key(filename: &str) -> String {
    format!(
        "{}/{}-{}",
        OBJECTS_PREFIX,
        Uuid::new_v4().simple(),
        sanitize_filename(filename)
    )
}

/// Reduce a client-supplied filename to a safe single path segment.
///
/// Anything other than ASCII letters, digits, `_`, `.`, `-`, `(`, `)` and space is
/// replaced by `_`, runs of dots are broken up so the result can never contain
/// `..`, and the result is capped at 100 characters.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = String::with_capacity(filename.len().min(MAX_NAME_LEN));
    let mut previous_dot = false;

    for c in filename.chars() {
        if sanitized.len() >= MAX_NAME_LEN {
            break;
        }
        let mapped = if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '(' | ')' | ' ') {
            c
        } else if c == '.' {
            if previous_dot {
                '_'
            } else {
                '.'
            }
        } else {
            '_'
        };
        previous_dot = mapped == '.';
        sanitized.push(mapped);
    }

    let trimmed = sanitized.trim();
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.' || c == '_') {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_filename("report (final)-v2.pdf"), "report (final)-v2.pdf");
    }

    #[test]
    fn test_sanitize_replaces_separators_and_unicode() {
        assert_eq!(sanitize_filename("../etc/passwd"), ".__etc_passwd");
        assert_eq!(sanitize_filename("a\\b.txt"), "a_b.txt");
        assert_eq!(sanitize_filename("résumé.doc"), "r_sum_.doc");
    }

    #[test]
    fn test_sanitize_never_yields_dot_dot() {
        for name in ["..", "...", "a..b", "....txt"] {
            assert!(!sanitize_filename(name).contains(".."), "{}", name);
        }
    }

    #[test]
    fn test_sanitize_fallback_and_length() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("   "), "file");
        assert_eq!(sanitize_filename("."), "file");
        assert_eq!(sanitize_filename(&"x".repeat(500)).len(), 100);
    }

    #[test]
    fn test_generated_keys_are_unique() {
        let a = generate_object_key("same.txt");
        let b = generate_object_key("same.txt");
        assert_ne!(a, b);
        assert!(a.starts_with("objects/"));
        assert!(a.ends_with("-same.txt"));
    }
}
