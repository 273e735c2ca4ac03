//! Content-addressed result cache with per-classification TTL.
//!
//! The cache maps content fingerprints to validation result snapshots so a
//! resubmitted document — including one that was previously rejected — never
//! re-triggers a paid OCR call while its entry is fresh. Only rejection
//! classes are stored; `VALID` results are never cached (see
//! [`crate::types::Classification::is_cacheable`]).
//!
//! Expiry is lazy: an expired entry is treated as absent and removed the
//! next time it is touched, and [`ResultCache::purge_expired`] sweeps the
//! whole map on demand. There is no background reaper task.
//!
//! Capacity is bounded; at the limit the oldest entry by insertion order is
//! evicted (FIFO). Eviction does not consider recency of access: entries
//! are short-lived rejections, so insertion age and staleness coincide.
//!
//! Stored values are independent snapshots. `get` returns a clone, so
//! mutating a returned result can never corrupt the cached entry.
//! All operations are safe under concurrent access from in-flight
//! validations; the interior mutex is held only for map manipulation.

use crate::core::config::CacheConfig;
use crate::hash::ContentFingerprint;
use crate::types::{ValidationResult, round2};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Counter snapshot returned by [`ResultCache::stats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub deletes: u64,
    pub evictions: u64,
    pub entries: usize,
    /// Hit percentage over all lookups, rounded to 2 decimals.
    pub hit_rate: f64,
}

#[derive(Debug)]
struct CacheEntry {
    result: ValidationResult,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    insertion_order: VecDeque<String>,
}

impl CacheInner {
    fn detach(&mut self, key: &str) -> Option<CacheEntry> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.insertion_order.retain(|k| k != key);
        }
        removed
    }
}

/// Bounded, TTL-evicting store of validation results keyed by content
/// fingerprint.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<CacheInner>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    evictions: AtomicU64,
}

impl ResultCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Look up a fresh entry. Expired entries count as misses and are
    /// removed on the way out; a stale result is never returned.
    pub fn get(&self, fingerprint: &ContentFingerprint) -> Option<ValidationResult> {
        let key = fingerprint.as_hex();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.result.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.detach(key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(fingerprint = %fingerprint.short(), "cache entry expired");
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a result snapshot under its classification's TTL. Returns
    /// `false` without storing when the classification is not cacheable or
    /// its TTL resolves to zero.
    pub fn put(&self, fingerprint: &ContentFingerprint, result: &ValidationResult) -> bool {
        if !result.is_cacheable() {
            return false;
        }
        let ttl = self.config.ttl_for(result.classification);
        if ttl.is_zero() {
            return false;
        }
        self.put_with_ttl(fingerprint, result, ttl)
    }

    /// Store a result snapshot with an explicit TTL, bypassing the
    /// per-classification policy (the cacheability rule still applies).
    pub fn put_with_ttl(&self, fingerprint: &ContentFingerprint, result: &ValidationResult, ttl: Duration) -> bool {
        if !result.is_cacheable() || ttl.is_zero() {
            return false;
        }

        let key = fingerprint.as_hex().to_string();
        let mut inner = self.inner.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_entries {
            self.purge_expired_locked(&mut inner);
            while inner.entries.len() >= self.config.max_entries {
                let Some(oldest) = inner.insertion_order.pop_front() else {
                    break;
                };
                if inner.entries.remove(&oldest).is_some() {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(evicted = %&oldest[..8.min(oldest.len())], "cache full, evicted oldest entry");
                }
            }
        }

        let entry = CacheEntry {
            result: result.clone(),
            expires_at: Instant::now() + ttl,
        };
        if inner.entries.insert(key.clone(), entry).is_none() {
            inner.insertion_order.push_back(key);
        }
        self.sets.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            fingerprint = %fingerprint.short(),
            classification = %result.classification,
            ttl_secs = ttl.as_secs_f64(),
            "cached validation result"
        );
        true
    }

    /// Remove one entry; `true` if it existed.
    pub fn invalidate(&self, fingerprint: &ContentFingerprint) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.detach(fingerprint.as_hex()).is_some();
        if removed {
            self.deletes.fetch_add(1, Ordering::Relaxed);
        }
        removed
    }

    /// Drop every entry.
    pub fn flush(&self) {
        let mut inner = self.inner.lock();
        let dropped = inner.entries.len() as u64;
        inner.entries.clear();
        inner.insertion_order.clear();
        self.deletes.fetch_add(dropped, Ordering::Relaxed);
        tracing::debug!(dropped, "cache flushed");
    }

    /// Whether a fresh entry exists. Does not count as a lookup in the
    /// hit/miss statistics.
    pub fn contains(&self, fingerprint: &ContentFingerprint) -> bool {
        let inner = self.inner.lock();
        inner
            .entries
            .get(fingerprint.as_hex())
            .is_some_and(|entry| entry.expires_at > Instant::now())
    }

    /// Number of stored entries, expired-but-unswept ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sweep out every expired entry; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        self.purge_expired_locked(&mut inner)
    }

    fn purge_expired_locked(&self, inner: &mut CacheInner) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.detach(key);
        }
        self.evictions.fetch_add(expired.len() as u64, Ordering::Relaxed);
        expired.len()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let lookups = hits + misses;
        let hit_rate = if lookups > 0 {
            round2(100.0 * hits as f64 / lookups as f64)
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            sets: self.sets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.len(),
            hit_rate,
        }
    }
}
