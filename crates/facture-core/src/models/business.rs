//! Business registry models: businesses, keywords, match results.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for a registered business.
pub type BusinessId = u64;

/// Identifier for a keyword.
pub type KeywordId = u64;

/// How a keyword is allowed to match text, in decreasing specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Verbatim containment in the document text.
    Exact,
    /// Containment after normalization (case, punctuation, diacritics,
    /// whitespace).
    Variant,
    /// Similarity-scored match against token windows.
    Fuzzy,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::Exact => "exact",
            MatchKind::Variant => "variant",
            MatchKind::Fuzzy => "fuzzy",
        }
    }
}

/// A keyword owned by exactly one business.
///
/// `usage_count` and `last_used` are mutated only when the keyword produces
/// an accepted resolution; the counters are atomic so concurrent resolves
/// never lose an increment.
#[derive(Debug)]
pub struct Keyword {
    pub id: KeywordId,
    pub business_id: BusinessId,
    pub text: String,
    pub kind: MatchKind,
    pub case_sensitive: bool,
    usage_count: AtomicU64,
    last_used: Mutex<Option<DateTime<Utc>>>,
}

impl Keyword {
    pub fn new(
        id: KeywordId,
        business_id: BusinessId,
        text: impl Into<String>,
        kind: MatchKind,
        case_sensitive: bool,
    ) -> Self {
        Self {
            id,
            business_id,
            text: text.into(),
            kind,
            case_sensitive,
            usage_count: AtomicU64::new(0),
            last_used: Mutex::new(None),
        }
    }

    /// Restore a keyword with previously persisted usage state.
    pub fn with_usage(mut self, usage_count: u64, last_used: Option<DateTime<Utc>>) -> Self {
        self.usage_count = AtomicU64::new(usage_count);
        self.last_used = Mutex::new(last_used);
        self
    }

    /// Times this keyword has produced an accepted match.
    pub fn usage_count(&self) -> u64 {
        self.usage_count.load(Ordering::SeqCst)
    }

    /// When this keyword last produced an accepted match.
    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        *self.last_used.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Record an accepted match, returning the new usage count.
    pub(crate) fn record_use(&self, when: DateTime<Utc>) -> u64 {
        let count = self.usage_count.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_used.lock().unwrap_or_else(|e| e.into_inner()) = Some(when);
        count
    }
}

/// A business identity with its matching keywords.
#[derive(Debug)]
pub struct Business {
    pub id: BusinessId,
    /// Unique canonical name.
    pub name: String,
    pub keywords: Vec<std::sync::Arc<Keyword>>,
}

impl Business {
    pub fn new(id: BusinessId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            keywords: Vec::new(),
        }
    }
}

/// An accepted business resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Canonical name of the matched business.
    pub business: String,
    /// Text of the keyword that matched.
    pub keyword: String,
    /// The tier that produced the match.
    pub kind: MatchKind,
    /// Match score in [0, 1]; 1.0 for exact and variant tiers.
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_use_increments_once() {
        let kw = Keyword::new(1, 1, "hydro", MatchKind::Exact, false);
        assert_eq!(kw.usage_count(), 0);
        assert!(kw.last_used().is_none());

        let now = Utc::now();
        assert_eq!(kw.record_use(now), 1);
        assert_eq!(kw.usage_count(), 1);
        assert_eq!(kw.last_used(), Some(now));
    }

    #[test]
    fn test_match_kind_serde_names() {
        let json = serde_json::to_string(&MatchKind::Variant).unwrap();
        assert_eq!(json, "\"variant\"");
    }
}
