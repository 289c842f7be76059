//! In-memory entry storage with least-recently-used eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::employee::StoreError;
use crate::query::QueryState;

use super::traits::{CachedValue, QueryKey};

/// A single cache entry.
#[derive(Debug, Default)]
pub struct CacheEntry {
  pub state: QueryState,
  /// Last-known-good data
  pub data: Option<CachedValue>,
  /// Error of the most recent failed fetch
  pub error: Option<StoreError>,
  /// Ticket of the fetch whose result this entry is waiting for
  pub in_flight: Option<u64>,
  pub fetched_at: Option<Instant>,
  /// Set by invalidation; cleared when a fetch settles
  pub invalidated: bool,
  last_used: u64,
}

impl CacheEntry {
  /// Whether the entry may be served without a new fetch
  pub fn is_fresh(&self, stale_time: Option<Duration>) -> bool {
    if self.state != QueryState::Success || self.invalidated {
      return false;
    }
    match (stale_time, self.fetched_at) {
      (Some(stale_time), Some(fetched_at)) => fetched_at.elapsed() < stale_time,
      (Some(_), None) => false,
      (None, _) => true,
    }
  }

  pub fn is_stale(&self, stale_time: Option<Duration>) -> bool {
    self.data.is_some() && !self.is_fresh(stale_time)
  }
}

/// Map of query keys to entries, bounded by `max_entries`.
#[derive(Debug)]
pub struct EntryStorage {
  entries: HashMap<QueryKey, CacheEntry>,
  max_entries: usize,
  clock: u64,
}

impl EntryStorage {
  pub fn new(max_entries: usize) -> Self {
    Self {
      entries: HashMap::new(),
      max_entries: max_entries.max(1),
      clock: 0,
    }
  }

  pub fn get(&self, key: &QueryKey) -> Option<&CacheEntry> {
    self.entries.get(key)
  }

  pub fn get_mut(&mut self, key: &QueryKey) -> Option<&mut CacheEntry> {
    self.entries.get_mut(key)
  }

  /// Get the entry for `key`, creating it if needed, and mark it as most
  /// recently used. Creating an entry may evict another one.
  pub fn touch(&mut self, key: &QueryKey) -> &mut CacheEntry {
    self.clock += 1;
    let clock = self.clock;

    if !self.entries.contains_key(key) {
      self.evict_for_insert(key);
      self.entries.insert(key.clone(), CacheEntry::default());
    }

    let entry = self.entries.entry(key.clone()).or_default();
    entry.last_used = clock;
    entry
  }

  pub fn remove(&mut self, key: &QueryKey) -> Option<CacheEntry> {
    self.entries.remove(key)
  }

  pub fn iter_mut(&mut self) -> impl Iterator<Item = (&QueryKey, &mut CacheEntry)> {
    self.entries.iter_mut()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// Make room for one more entry. Entries with a fetch in flight are kept.
  fn evict_for_insert(&mut self, incoming: &QueryKey) {
    while self.entries.len() >= self.max_entries {
      let victim = self
        .entries
        .iter()
        .filter(|(key, entry)| *key != incoming && entry.in_flight.is_none())
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(key, _)| key.clone());

      match victim {
        Some(key) => {
          tracing::debug!(key = %key, "evicting cache entry");
          self.entries.remove(&key);
        }
        None => break,
      }
    }
  }
}
