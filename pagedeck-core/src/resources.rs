//! Object URLs for in-memory blobs
//!
//! Previews, merged output, compressed output and export archives are handed
//! out as `blob:` URLs. Every URL must be revoked exactly once; the registry
//! keeps track of what is still alive so a session can release everything on
//! reset.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

const URL_PREFIX: &str = "blob:pagedeck/";

/// Handle to a registered blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bytes plus the MIME type they were registered with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl Blob {
    pub fn new(mime_type: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    live: HashMap<ObjectUrl, Blob>,
    created: usize,
    revoked: usize,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, blob: Blob) -> ObjectUrl {
        let url = ObjectUrl(format!("{URL_PREFIX}{}", uuid::Uuid::new_v4()));
        trace!("Created object URL {} ({} bytes)", url, blob.len());
        self.live.insert(url.clone(), blob);
        self.created += 1;
        url
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<&Blob> {
        self.live.get(url)
    }

    /// Revoke a URL. Returns `false` if it was already revoked or never issued.
    pub fn revoke(&mut self, url: &ObjectUrl) -> bool {
        if self.live.remove(url).is_some() {
            trace!("Revoked object URL {}", url);
            self.revoked += 1;
            true
        } else {
            false
        }
    }

    /// Revoke every outstanding URL and return how many were released.
    pub fn revoke_all(&mut self) -> usize {
        let count = self.live.len();
        if count > 0 {
            debug!("Revoking {} outstanding object URLs", count);
        }
        self.live.clear();
        self.revoked += count;
        count
    }

    pub fn is_live(&self, url: &ObjectUrl) -> bool {
        self.live.contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Total URLs issued over the registry's lifetime.
    pub fn created_count(&self) -> usize {
        self.created
    }

    /// Total URLs revoked over the registry's lifetime.
    pub fn revoked_count(&self) -> usize {
        self.revoked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_resolve() {
        let mut registry = ObjectUrlRegistry::new();
        let url = registry.create(Blob::new("image/png", vec![1u8, 2, 3]));

        assert!(url.as_str().starts_with("blob:pagedeck/"));
        let blob = registry.resolve(&url).unwrap();
        assert_eq!(blob.mime_type, "image/png");
        assert_eq!(&*blob.data, &[1, 2, 3]);
    }

    #[test]
    fn test_revoke_exactly_once() {
        let mut registry = ObjectUrlRegistry::new();
        let url = registry.create(Blob::new("application/pdf", Vec::new()));

        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert!(registry.resolve(&url).is_none());
        assert_eq!(registry.revoked_count(), 1);
    }

    #[test]
    fn test_revoke_all() {
        let mut registry = ObjectUrlRegistry::new();
        let a = registry.create(Blob::new("image/png", Vec::new()));
        registry.create(Blob::new("image/png", Vec::new()));
        registry.revoke(&a);

        assert_eq!(registry.revoke_all(), 1);
        assert_eq!(registry.live_count(), 0);
        assert_eq!(registry.created_count(), 2);
        assert_eq!(registry.revoked_count(), 2);
    }
}
