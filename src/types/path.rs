use bytes::Bytes;
use std::fmt;

/// Zero-copy asset path using bytes::Bytes for efficient cloning.
///
/// Paths appear in every pool key and are cloned on each lazy sub-pool
/// creation, so reference-counted storage keeps that cheap. Paths are
/// immutable once constructed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct AssetPath(Bytes);

impl AssetPath {
    /// Create a path from a static string (no allocation).
    #[inline]
    pub fn from_static(s: &'static str) -> Self {
        Self(Bytes::from_static(s.as_bytes()))
    }

    /// Get the underlying bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the length of the path in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the path is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "AssetPath({:?})", s),
            Err(_) => write!(f, "AssetPath({:?})", self.0),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => write!(f, "{:?}", self.0),
        }
    }
}

impl From<&str> for AssetPath {
    fn from(s: &str) -> Self {
        Self(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<String> for AssetPath {
    fn from(s: String) -> Self {
        Self(Bytes::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_from_str() {
        let path = AssetPath::from("props/crate");
        assert_eq!(path.as_bytes(), b"props/crate");
        assert_eq!(path.len(), 11);
        assert!(!path.is_empty());
    }

    #[test]
    fn test_path_equality() {
        let a = AssetPath::from("props/crate");
        let b = AssetPath::from("props/crate");
        let c = AssetPath::from("props/barrel");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_path_display() {
        let path = AssetPath::from_static("ui/heart");
        assert_eq!(path.to_string(), "ui/heart");
    }

    #[test]
    fn test_path_hash_for_hashmap() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(AssetPath::from("a"), 1);
        map.insert(AssetPath::from("b"), 2);
        assert_eq!(map.get(&AssetPath::from("a")), Some(&1));
        assert_eq!(map.get(&AssetPath::from("b")), Some(&2));
    }
}
