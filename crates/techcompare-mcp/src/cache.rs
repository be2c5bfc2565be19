use std::num::NonZeroUsize;

use lru::LruCache;
use serde::Serialize;
use techcompare_engine::{ComparisonResult, UserConstraints};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Lookup {
    Ids,
    Names,
}

/// Identity of a comparison request. Identifier order is part of the key
/// because it decides radar slot assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    lookup: Lookup,
    identifiers: Vec<String>,
    constraints: String,
}

impl CacheKey {
    pub fn by_ids(ids: &[String], constraints: &UserConstraints) -> Self {
        Self {
            lookup: Lookup::Ids,
            identifiers: ids.iter().map(|id| id.trim().to_string()).collect(),
            constraints: constraints_signature(constraints),
        }
    }

    pub fn by_names(names: &[String], constraints: &UserConstraints) -> Self {
        Self {
            lookup: Lookup::Names,
            identifiers: names.iter().map(|n| n.trim().to_lowercase()).collect(),
            constraints: constraints_signature(constraints),
        }
    }
}

fn constraints_signature(constraints: &UserConstraints) -> String {
    let mut tags: Vec<String> = constraints
        .priority_tags
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    let hint = |value: &Option<String>| {
        value.as_deref().map(str::trim).unwrap_or_default().to_string()
    };
    format!(
        "{}|{}|{}|{}",
        tags.join(","),
        hint(&constraints.project_type),
        hint(&constraints.team_size),
        hint(&constraints.timeline)
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

/// Bounded LRU of finished comparisons. Any catalog write must call
/// [`ComparisonCache::invalidate_all`]. Capacity zero disables storage.
pub struct ComparisonCache {
    entries: Option<LruCache<CacheKey, ComparisonResult>>,
    stats: CacheStats,
}

impl ComparisonCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: NonZeroUsize::new(capacity).map(LruCache::new),
            stats: CacheStats {
                capacity,
                ..CacheStats::default()
            },
        }
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<ComparisonResult> {
        let hit = self.entries.as_mut().and_then(|lru| lru.get(key).cloned());
        if hit.is_some() {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
        }
        hit
    }

    pub fn insert(&mut self, key: CacheKey, result: ComparisonResult) {
        let Some(lru) = self.entries.as_mut() else {
            return;
        };
        if !lru.contains(&key) && lru.len() == lru.cap().get() {
            self.stats.evictions += 1;
        }
        lru.put(key, result);
    }

    pub fn invalidate_all(&mut self) {
        if let Some(lru) = self.entries.as_mut() {
            lru.clear();
        }
        self.stats.invalidations += 1;
    }

    /// Changes on every invalidation. A result computed across a change
    /// must not be inserted.
    pub fn generation(&self) -> u64 {
        self.stats.invalidations
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.as_ref().map_or(0, LruCache::len),
            ..self.stats
        }
    }
}
