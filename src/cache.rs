//! In-memory holder of the newest digest.
//!
//! Readers get an `Arc` snapshot and never see a half-written digest; a new
//! run swaps the whole `Arc` in under a short write lock.

use crate::models::Digest;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DigestCache {
    latest: RwLock<Option<Arc<Digest>>>,
}

impl DigestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached digest and return the shared snapshot.
    pub fn store(&self, digest: Digest) -> Arc<Digest> {
        let digest = Arc::new(digest);
        *self.latest.write() = Some(Arc::clone(&digest));
        debug!(articles = digest.articles.len(), date = %digest.date, "Cached digest");
        digest
    }

    /// The newest digest, if any run has completed.
    pub fn latest(&self) -> Option<Arc<Digest>> {
        self.latest.read().clone()
    }
}
