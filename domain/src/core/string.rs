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

/// Case-insensitive key used for server-name lookups.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Check whether `name` is `namespace` itself or lives under it
/// (`storage` matches `storage` and `storage-account-list`).
pub fn in_namespace(name: &str, namespace: &str) -> bool {
    let name = name_key(name);
    let namespace = name_key(namespace);
    name == namespace
        || name
            .strip_prefix(&namespace)
            .is_some_and(|rest| rest.starts_with('-'))
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
        // 'é' is 2 bytes (offsets 1..3); max_len=5 -> target=2 lands inside it
        assert_eq!(truncate("résumé list", 5), "r...");
        assert_eq!(truncate("résumé list", 6), "ré...");
        assert_eq!(truncate("résumé", 20), "résumé");
    }

    #[test]
    fn test_name_key_normalizes_case_and_whitespace() {
        assert_eq!(name_key(" Storage "), "storage");
        assert_eq!(name_key("KEYVAULT"), "keyvault");
    }

    #[test]
    fn test_in_namespace() {
        assert!(in_namespace("storage-account-list", "storage"));
        assert!(in_namespace("Storage", "storage"));
        assert!(!in_namespace("storagesync-list", "storage"));
        assert!(!in_namespace("keyvault-secret-get", "storage"));
    }
}
