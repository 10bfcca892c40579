use std::{
    ops::{Deref, DerefMut},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// A cached value stamped with its insertion time and lifetime.
///
/// Entries are never mutated in place; a write always replaces the whole
/// entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at_ms: i64,
    pub ttl_ms: i64,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, stored_at_ms: i64, ttl: Duration) -> Self {
        Self {
            value,
            stored_at_ms,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
        }
    }

    /// An entry is valid while `now - stored_at < ttl`.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms.saturating_sub(self.stored_at_ms) < self.ttl_ms
    }

    pub fn expires_at_ms(&self) -> i64 { self.stored_at_ms.saturating_add(self.ttl_ms) }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CacheEntry<U> {
        CacheEntry {
            value: f(self.value),
            stored_at_ms: self.stored_at_ms,
            ttl_ms: self.ttl_ms,
        }
    }
}

/// The unified trait for all cacheable values
pub trait CacheValue: Sized + Send + Sync {
    /// Serialize to bytes for any cache tier
    fn to_bytes(&self) -> Result<Vec<u8>, CacheError>;

    /// Deserialize from bytes
    fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError>;
}

/// JSON wrapper used as the payload encoding of both tiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn new(value: T) -> Self { Self(value) }

    pub fn inner(self) -> T { self.0 }

    pub fn as_inner(&self) -> &T { &self.0 }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl<T> DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.0 }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self { Json(value) }
}

impl<T> CacheValue for Json<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
{
    fn to_bytes(&self) -> Result<Vec<u8>, CacheError> {
        serde_json::to_vec(&self.0)
            .map_err(|e| CacheError::SerializationError(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| CacheError::DeserializationError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_is_valid_strictly_before_ttl() {
        let entry = CacheEntry::new("v", 1_000, Duration::from_secs(30));

        assert!(entry.is_valid_at(1_000));
        assert!(entry.is_valid_at(30_999));
        assert!(!entry.is_valid_at(31_000));
        assert_eq!(entry.expires_at_ms(), 31_000);
    }

    #[test]
    fn zero_ttl_entry_is_never_valid() {
        let entry = CacheEntry::new(1u8, 500, Duration::ZERO);
        assert!(!entry.is_valid_at(500));
    }

    #[test]
    fn oversized_ttl_saturates_instead_of_wrapping() {
        let entry = CacheEntry::new((), 1_700_000_000_000, Duration::MAX);

        assert_eq!(entry.ttl_ms, i64::MAX);
        assert!(entry.is_valid_at(i64::MAX));
        assert_eq!(entry.expires_at_ms(), i64::MAX);
    }

    #[test]
    fn json_rejects_mismatched_payload() {
        let bytes = Json(vec![1, 2, 3]).to_bytes().unwrap();
        let err = Json::<String>::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CacheError::DeserializationError(_)));
    }
}
