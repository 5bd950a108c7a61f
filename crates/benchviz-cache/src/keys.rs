//! Cache key helpers.

use sha2::{Digest, Sha256};

/// Prefix shared by every chart-data entry in a store.
pub const CACHE_NAMESPACE: &str = "chart-data-cache-";

/// Storage key for a logical data path.
pub fn cache_key(path: &str) -> String {
    format!("{}{}", CACHE_NAMESPACE, path)
}

/// Logical data path for a storage key, if the key is in the namespace.
pub fn path_from_key(key: &str) -> Option<&str> {
    key.strip_prefix(CACHE_NAMESPACE)
}

/// Check if a key matches a prefix pattern.
pub fn matches_prefix(key: &str, prefix: &str) -> bool {
    key.starts_with(prefix)
}

/// File name used by the filesystem store for a key.
pub fn file_name_for_key(key: &str) -> String {
    let hash = Sha256::digest(key.as_bytes());
    format!("{}.json", hex::encode(&hash[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key() {
        assert_eq!(
            cache_key("/benchmarks/atlas-4096.json"),
            "chart-data-cache-/benchmarks/atlas-4096.json"
        );
    }

    #[test]
    fn test_path_from_key() {
        assert_eq!(path_from_key("chart-data-cache-/a.json"), Some("/a.json"));
        assert_eq!(path_from_key("other-key"), None);
    }

    #[test]
    fn test_matches_prefix() {
        assert!(matches_prefix("chart-data-cache-/a.json", CACHE_NAMESPACE));
        assert!(!matches_prefix("theme", CACHE_NAMESPACE));
    }

    #[test]
    fn test_file_name_is_stable_and_case_sensitive() {
        let a = file_name_for_key("chart-data-cache-/A.json");
        let b = file_name_for_key("chart-data-cache-/a.json");
        assert_eq!(a, file_name_for_key("chart-data-cache-/A.json"));
        assert_ne!(a, b);
        assert!(a.ends_with(".json"));
        assert_eq!(a.len(), 32 + ".json".len());
    }
}
