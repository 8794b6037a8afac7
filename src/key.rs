//! Key Namespacer
//!
//! Derives the physical storage key from a logical key and an optional prefix.

/// Separator placed between the prefix and the logical key.
pub const PREFIX_SEPARATOR: char = ':';

/// Returns the key used against the backend for `logical_key`.
///
/// An empty prefix leaves the logical key unchanged.
pub fn physical_key(logical_key: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        logical_key.to_string()
    } else {
        format!("{prefix}{PREFIX_SEPARATOR}{logical_key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_physical_key_without_prefix() {
        assert_eq!(physical_key("user:1", ""), "user:1");
    }

    #[test]
    fn test_physical_key_with_prefix() {
        assert_eq!(physical_key("key", "myapp"), "myapp:key");
        assert_eq!(physical_key("user:1", "testlocal"), "testlocal:user:1");
    }

    #[test]
    fn test_physical_key_empty_logical_key() {
        assert_eq!(physical_key("", "app"), "app:");
    }
}
