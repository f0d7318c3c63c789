//! Tiered business identity resolution with usage learning.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tracing::{debug, info, warn};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::error::{MatchError, StoreError};
use crate::models::business::{Business, BusinessId, Keyword, KeywordId, MatchKind, MatchResult};
use crate::models::config::MatchingConfig;

use super::fuzzy::FuzzyMatcher;
use super::store::KeywordStore;

/// Resolves free text to a canonical business identity.
///
/// Tiers run strictly in order (exact, variant, fuzzy); a tier is only
/// attempted when the previous one produced no accepted match. An accepted
/// match increments the keyword's usage counter and stamps its last-used
/// time; that is the only mutation path for those fields.
pub struct BusinessResolver {
    registry: RwLock<Vec<Business>>,
    store: Arc<dyn KeywordStore>,
    config: MatchingConfig,
    next_business_id: AtomicU64,
    next_keyword_id: AtomicU64,
}

/// Transient candidate considered during one resolution call.
struct MatchCandidate<'a> {
    business: &'a Business,
    keyword: &'a Arc<Keyword>,
    score: f32,
}

impl BusinessResolver {
    /// Load the registry from the persistence boundary.
    pub fn load(store: Arc<dyn KeywordStore>, config: MatchingConfig) -> Result<Self, StoreError> {
        let registry = store.load_businesses()?;
        let next_business_id = registry.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        let next_keyword_id = registry
            .iter()
            .flat_map(|b| b.keywords.iter().map(|k| k.id))
            .max()
            .unwrap_or(0)
            + 1;

        info!(
            "Loaded {} businesses with {} keywords",
            registry.len(),
            registry.iter().map(|b| b.keywords.len()).sum::<usize>()
        );

        Ok(Self {
            registry: RwLock::new(registry),
            store,
            config,
            next_business_id: AtomicU64::new(next_business_id),
            next_keyword_id: AtomicU64::new(next_keyword_id),
        })
    }

    /// Resolve text to a business: exact, then variant, then fuzzy.
    pub fn resolve(&self, text: &str) -> Option<MatchResult> {
        if text.trim().is_empty() {
            return None;
        }

        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());

        let (candidate, kind) = self
            .exact_tier(&registry, text)
            .map(|c| (c, MatchKind::Exact))
            .or_else(|| {
                self.variant_tier(&registry, text)
                    .map(|c| (c, MatchKind::Variant))
            })
            .or_else(|| {
                self.fuzzy_tier(&registry, text)
                    .map(|c| (c, MatchKind::Fuzzy))
            })?;

        let result = MatchResult {
            business: candidate.business.name.clone(),
            keyword: candidate.keyword.text.clone(),
            kind,
            score: candidate.score,
        };
        debug!(
            "Resolved {:?} via {} keyword {:?} at {:.2}",
            result.business, kind.as_str(), result.keyword, result.score
        );

        self.record_usage(candidate.keyword);
        Some(result)
    }

    /// Keyword text appears verbatim in the document text, honoring the
    /// keyword's own case-sensitivity flag.
    fn exact_tier<'a>(&self, registry: &'a [Business], text: &str) -> Option<MatchCandidate<'a>> {
        let folded_text = text.to_lowercase();

        let candidates = keywords(registry).filter_map(|(business, keyword)| {
            let hit = if keyword.case_sensitive {
                text.contains(&keyword.text)
            } else {
                folded_text.contains(&keyword.text.to_lowercase())
            };
            hit.then_some(MatchCandidate {
                business,
                keyword,
                score: 1.0,
            })
        });

        pick_most_specific(candidates)
    }

    /// The same containment test on normalized forms of keyword and text.
    fn variant_tier<'a>(&self, registry: &'a [Business], text: &str) -> Option<MatchCandidate<'a>> {
        let norm_text_ci = normalize_variant(text, false);
        let norm_text_cs = normalize_variant(text, true);

        let candidates = keywords(registry).filter_map(|(business, keyword)| {
            let norm_keyword = normalize_variant(&keyword.text, keyword.case_sensitive);
            if norm_keyword.is_empty() {
                return None;
            }
            let haystack = if keyword.case_sensitive {
                &norm_text_cs
            } else {
                &norm_text_ci
            };
            haystack.contains(&norm_keyword).then_some(MatchCandidate {
                business,
                keyword,
                score: 1.0,
            })
        });

        pick_most_specific(candidates)
    }

    /// Similarity between the text's token windows and every fuzzy-enabled
    /// keyword; the best candidate is accepted only at or above the
    /// configured threshold.
    fn fuzzy_tier<'a>(&self, registry: &'a [Business], text: &str) -> Option<MatchCandidate<'a>> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        if tokens.is_empty() {
            return None;
        }

        let mut best: Option<MatchCandidate<'a>> = None;

        for (business, keyword) in keywords(registry) {
            if keyword.kind != MatchKind::Fuzzy {
                continue;
            }

            let matcher = FuzzyMatcher::new(keyword.case_sensitive);
            let window = keyword.text.split_whitespace().count().max(1);
            if window > tokens.len() {
                continue;
            }

            for chunk in tokens.windows(window) {
                let candidate_text = chunk.join(" ");
                let score = matcher.similarity(&candidate_text, &keyword.text);

                let wins = match &best {
                    None => true,
                    Some(current) => {
                        if score != current.score {
                            score > current.score
                        } else if keyword.text.len() != current.keyword.text.len() {
                            keyword.text.len() < current.keyword.text.len()
                        } else {
                            keyword.text < current.keyword.text
                        }
                    }
                };
                if wins {
                    best = Some(MatchCandidate {
                        business,
                        keyword,
                        score,
                    });
                }
            }
        }

        best.filter(|c| c.score >= self.config.fuzzy_threshold)
    }

    /// Increment usage and push the new state across the persistence
    /// boundary; store failures must not fail the resolution.
    fn record_usage(&self, keyword: &Arc<Keyword>) {
        let now = Utc::now();
        let count = keyword.record_use(now);
        if let Err(e) = self.store.persist_keyword_usage(keyword.id, count, now) {
            warn!(
                "Failed to persist usage for keyword {:?}: {}",
                keyword.text, e
            );
        }
    }

    /// Register a business; its own name is added as an exact keyword.
    pub fn add_business(&self, name: &str) -> Result<BusinessId, MatchError> {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());

        if registry.iter().any(|b| b.name == name) {
            return Err(MatchError::DuplicateBusiness(name.to_string()));
        }

        let id = self.next_business_id.fetch_add(1, Ordering::SeqCst);
        let mut business = Business::new(id, name);
        business.keywords.push(Arc::new(Keyword::new(
            self.next_keyword_id.fetch_add(1, Ordering::SeqCst),
            id,
            name,
            MatchKind::Exact,
            self.config.case_sensitive_default,
        )));
        registry.push(business);

        info!("Registered business {:?}", name);
        Ok(id)
    }

    /// Add a keyword to an existing business.
    ///
    /// (business, keyword text, match kind) must be unique; `case_sensitive`
    /// falls back to the configured default.
    pub fn add_keyword(
        &self,
        business: &str,
        text: &str,
        kind: MatchKind,
        case_sensitive: Option<bool>,
    ) -> Result<KeywordId, MatchError> {
        let mut registry = self.registry.write().unwrap_or_else(|e| e.into_inner());

        let entry = registry
            .iter_mut()
            .find(|b| b.name == business)
            .ok_or_else(|| MatchError::UnknownBusiness(business.to_string()))?;

        if entry
            .keywords
            .iter()
            .any(|k| k.text == text && k.kind == kind)
        {
            return Err(MatchError::DuplicateKeyword {
                business: business.to_string(),
                keyword: text.to_string(),
                kind: kind.as_str().to_string(),
            });
        }

        let id = self.next_keyword_id.fetch_add(1, Ordering::SeqCst);
        entry.keywords.push(Arc::new(Keyword::new(
            id,
            entry.id,
            text,
            kind,
            case_sensitive.unwrap_or(self.config.case_sensitive_default),
        )));
        Ok(id)
    }

    /// Canonical names of all registered businesses.
    pub fn business_names(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|b| b.name.clone())
            .collect()
    }

    /// Usage statistics for one keyword, for diagnostics panels.
    pub fn keyword_usage(
        &self,
        business: &str,
        keyword: &str,
    ) -> Option<(u64, Option<chrono::DateTime<Utc>>)> {
        let registry = self.registry.read().unwrap_or_else(|e| e.into_inner());
        registry
            .iter()
            .find(|b| b.name == business)?
            .keywords
            .iter()
            .find(|k| k.text == keyword)
            .map(|k| (k.usage_count(), k.last_used()))
    }
}

fn keywords(registry: &[Business]) -> impl Iterator<Item = (&Business, &Arc<Keyword>)> {
    registry
        .iter()
        .flat_map(|b| b.keywords.iter().map(move |k| (b, k)))
}

/// Longest keyword text wins; ties break by highest usage count, then
/// lexical order for determinism.
fn pick_most_specific<'a>(
    candidates: impl Iterator<Item = MatchCandidate<'a>>,
) -> Option<MatchCandidate<'a>> {
    candidates.reduce(|best, candidate| {
        let best_len = best.keyword.text.chars().count();
        let len = candidate.keyword.text.chars().count();
        let wins = if len != best_len {
            len > best_len
        } else if candidate.keyword.usage_count() != best.keyword.usage_count() {
            candidate.keyword.usage_count() > best.keyword.usage_count()
        } else {
            candidate.keyword.text < best.keyword.text
        };
        if wins { candidate } else { best }
    })
}

/// Case fold, strip punctuation and diacritics, collapse whitespace.
fn normalize_variant(s: &str, case_sensitive: bool) -> String {
    let stripped: String = s
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if case_sensitive {
        collapsed
    } else {
        collapsed.to_lowercase()
    }
}
