//! Keys for the read-model cache.
//!
//! Keys are namespaced fingerprints: `<namespace>:v1:<sha256 hex>` where the
//! digest covers the canonical JSON of the query parameters, so equal queries
//! share an entry regardless of how the caller spelled them.

use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

const KEY_VERSION: &str = "v1";

/// Cache key for a derived read model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Construct a key after checking it is non-empty and unpadded.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Fingerprint `params` under `namespace`.
    ///
    /// # Examples
    /// ```
    /// use retail_backend::domain::ports::CacheKey;
    /// use serde_json::json;
    ///
    /// let key = CacheKey::fingerprint("sales-trend", &json!({ "days": 7 })).expect("key");
    /// assert!(key.as_str().starts_with("sales-trend:v1:"));
    /// ```
    pub fn fingerprint<P: Serialize + ?Sized>(
        namespace: &str,
        params: &P,
    ) -> Result<Self, CacheKeyValidationError> {
        let canonical = serde_json::to_vec(params).map_err(|err| {
            CacheKeyValidationError::Unserialisable {
                message: err.to_string(),
            }
        })?;
        let digest = Sha256::digest(&canonical);
        Self::new(format!("{namespace}:{KEY_VERSION}:{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation errors returned when constructing [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    #[error("cache key must not be empty")]
    Empty,
    #[error("cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
    #[error("cache key parameters could not be serialised: {message}")]
    Unserialisable { message: String },
}
