//! Persistence boundary for the business/keyword registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::error::StoreError;
use crate::models::business::{Business, KeywordId};

/// The slice of the persistent store the resolver consumes.
///
/// Schema management, backups, and the rest of the store live with the
/// collaborator; the core only loads the registry once and pushes usage
/// updates. Implementations must apply each usage write atomically so
/// concurrent resolves never lose an increment.
pub trait KeywordStore: Send + Sync {
    /// Load every business with its keywords and persisted usage state.
    fn load_businesses(&self) -> Result<Vec<Business>, StoreError>;

    /// Persist a keyword's new usage count and last-used timestamp.
    fn persist_keyword_usage(
        &self,
        keyword: KeywordId,
        usage_count: u64,
        last_used: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// In-memory store for tests and interactive sessions without a database.
#[derive(Default)]
pub struct MemoryStore {
    businesses: Mutex<Vec<Arc<Business>>>,
    usage: Mutex<HashMap<KeywordId, (u64, DateTime<Utc>)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_businesses(businesses: Vec<Business>) -> Self {
        Self {
            businesses: Mutex::new(businesses.into_iter().map(Arc::new).collect()),
            usage: Mutex::new(HashMap::new()),
        }
    }

    /// Last usage state persisted for a keyword, if any.
    pub fn persisted_usage(&self, keyword: KeywordId) -> Option<(u64, DateTime<Utc>)> {
        self.usage
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&keyword)
            .copied()
    }
}

impl KeywordStore for MemoryStore {
    fn load_businesses(&self) -> Result<Vec<Business>, StoreError> {
        let guard = self.businesses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(guard
            .iter()
            .map(|b| {
                let mut business = Business::new(b.id, b.name.clone());
                business.keywords = b.keywords.clone();
                business
            })
            .collect())
    }

    fn persist_keyword_usage(
        &self,
        keyword: KeywordId,
        usage_count: u64,
        last_used: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        self.usage
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(keyword, (usage_count, last_used));
        Ok(())
    }
}
