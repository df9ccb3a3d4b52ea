//! Metadata fetcher seam over wherever profile attributes live
//!
//! Retrieval, retries and backoff belong to the implementation; the engine
//! only consumes the resulting attribute list or a fetch error.

use crate::error::{Result, VeilError};
use crate::types::Attribute;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Source of profile attributes by reference
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch the attribute list stored under `reference`
    async fn fetch(&self, reference: &str) -> Result<Vec<Attribute>>;
}

/// In-memory fetcher for development and testing
#[derive(Default)]
pub struct MemoryMetadataFetcher {
    profiles: RwLock<HashMap<String, Vec<Attribute>>>,
}

impl MemoryMetadataFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, reference: impl Into<String>, attributes: Vec<Attribute>) {
        self.profiles.write().await.insert(reference.into(), attributes);
    }
}

#[async_trait]
impl MetadataFetcher for MemoryMetadataFetcher {
    async fn fetch(&self, reference: &str) -> Result<Vec<Attribute>> {
        let profiles = self.profiles.read().await;
        profiles.get(reference).cloned().ok_or_else(|| VeilError::Fetch {
            reference: reference.to_string(),
            reason: "not found".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_inserted_profile() {
        let fetcher = MemoryMetadataFetcher::new();
        fetcher
            .insert("mint-1", vec![Attribute::new("Background", "Cyber Haze")])
            .await;

        let attrs = fetcher.fetch("mint-1").await.unwrap();
        assert_eq!(attrs, vec![Attribute::new("Background", "Cyber Haze")]);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_fetch_error() {
        let fetcher = MemoryMetadataFetcher::new();
        let err = fetcher.fetch("mint-404").await.unwrap_err();
        match err {
            VeilError::Fetch { reference, .. } => assert_eq!(reference, "mint-404"),
            other => panic!("unexpected error: {}", other),
        }
    }
}
