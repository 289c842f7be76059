//! Read-side view of a cache entry.
//!
//! Inspired by TanStack Query: a view asks the [`QueryCache`] for a key and
//! gets back a `Query` describing the entry's state together with its
//! last-known-good data and last error.
//!
//! # Example
//!
//! ```ignore
//! let query = cache.use_employees(&search, department);
//!
//! match query.state() {
//!     QueryState::Loading if query.data().is_none() => render_skeleton(),
//!     QueryState::Error if query.data().is_none() => render_error(query.error()),
//!     _ => render_list(query.data()),
//! }
//! ```
//!
//! [`QueryCache`]: crate::cache::QueryCache

use crate::employee::StoreError;

/// The state of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
  /// Query has not been started
  #[default]
  Idle,
  /// Query is currently fetching data
  Loading,
  /// Last fetch completed successfully
  Success,
  /// Last fetch failed
  Error,
}

/// Snapshot of one cache entry, borrowed from the cache.
#[derive(Debug)]
pub struct Query<'a, T> {
  state: QueryState,
  data: Option<&'a T>,
  error: Option<&'a StoreError>,
  stale: bool,
}

impl<T> Clone for Query<'_, T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for Query<'_, T> {}

impl<'a, T> Query<'a, T> {
  pub fn new(
    state: QueryState,
    data: Option<&'a T>,
    error: Option<&'a StoreError>,
    stale: bool,
  ) -> Self {
    Self {
      state,
      data,
      error,
      stale,
    }
  }

  /// A query that was never started (e.g. an empty id)
  pub fn idle() -> Self {
    Self::new(QueryState::Idle, None, None, false)
  }

  pub fn state(&self) -> QueryState {
    self.state
  }

  /// Last-known-good data, kept across loading and failed refetches
  pub fn data(&self) -> Option<&'a T> {
    self.data
  }

  pub fn error(&self) -> Option<&'a StoreError> {
    self.error
  }

  #[cfg(test)]
  pub fn is_idle(&self) -> bool {
    self.state == QueryState::Idle
  }

  pub fn is_loading(&self) -> bool {
    self.state == QueryState::Loading
  }

  /// Loading with nothing to show yet
  pub fn is_initial_loading(&self) -> bool {
    self.is_loading() && self.data.is_none()
  }

  pub fn is_success(&self) -> bool {
    self.state == QueryState::Success
  }

  #[cfg(test)]
  pub fn is_error(&self) -> bool {
    self.state == QueryState::Error
  }

  /// Data was invalidated or outlived its stale time and will be refetched
  pub fn is_stale(&self) -> bool {
    self.stale
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_initial_loading_requires_no_data() {
    let data = vec![1, 2, 3];
    let first: Query<'_, Vec<i32>> = Query::new(QueryState::Loading, None, None, false);
    assert!(first.is_initial_loading());

    let refetching = Query::new(QueryState::Loading, Some(&data), None, true);
    assert!(refetching.is_loading());
    assert!(!refetching.is_initial_loading());
    assert_eq!(refetching.data(), Some(&data));
  }

  #[test]
  fn test_error_keeps_last_known_good_data() {
    let data = 42;
    let err = StoreError::transport("connection refused");
    let query = Query::new(QueryState::Error, Some(&data), Some(&err), false);
    assert!(query.is_error());
    assert_eq!(query.data(), Some(&42));
    assert_eq!(query.error().map(|e| e.to_string()).as_deref(), Some("connection refused"));
    assert!(Query::<i32>::idle().is_idle());
  }
}
