//! Cache key derivation.
//!
//! A call's arguments are canonicalized to RFC 8785 (JCS) JSON and hashed,
//! so semantically equal values always produce the same key regardless of
//! map insertion order. Values with no JSON representation (maps keyed by
//! non-string types, failing serializers) fail derivation instead of
//! producing an unstable key; callers bypass the cache for those calls.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::RecallError;

/// Key identifying one memoized call within a store.
///
/// Serializes as its bare hex string so it can key the on-disk JSON map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a set of call arguments.
    ///
    /// Positional arguments are passed as a tuple, named arguments as a
    /// struct or map; both canonicalize to order-stable JSON.
    pub fn for_args<A: Serialize>(args: &A) -> Result<Self, RecallError> {
        let canonical = serde_jcs::to_string(args).map_err(|e| RecallError::Key {
            message: e.to_string(),
        })?;

        let mut h = Sha256::new();
        h.update(canonical.as_bytes());
        Ok(Self(format!("{:x}", h.finalize())))
    }

    /// Hex form of the key.
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_key_stability() {
        let k1 = CacheKey::for_args(&(2i64, 3i64)).unwrap();
        let k2 = CacheKey::for_args(&(2i64, 3i64)).unwrap();
        assert_eq!(k1, k2);

        // Different arguments = different key
        let k3 = CacheKey::for_args(&(3i64, 2i64)).unwrap();
        assert_ne!(k1, k3);
    }

    #[test]
    fn test_key_ignores_map_order() {
        let mut a = HashMap::new();
        a.insert("x", 1);
        a.insert("y", 2);

        let mut b = HashMap::new();
        b.insert("y", 2);
        b.insert("x", 1);

        assert_eq!(
            CacheKey::for_args(&a).unwrap(),
            CacheKey::for_args(&b).unwrap()
        );
    }

    #[test]
    fn test_composite_map_key_is_not_keyable() {
        let mut args: HashMap<(u8, u8), i32> = HashMap::new();
        args.insert((1, 2), 3);

        let err = CacheKey::for_args(&args).unwrap_err();
        assert!(matches!(err, RecallError::Key { .. }));
    }

    #[test]
    fn test_key_is_sha256_hex() {
        let key = CacheKey::for_args(&"hello").unwrap();
        assert_eq!(key.as_hex().len(), 64);
        assert!(key.as_hex().chars().all(|c| c.is_ascii_hexdigit()));
    }
}
