//! Query cache between the views and the employee store.
//!
//! This module provides the read/mutate contract the UI relies on:
//! - One entry per [`QueryKey`], moving through idle, loading, success and error
//! - Identical in-flight fetches are de-duplicated
//! - Failed reads keep the last-known-good data
//! - Successful mutations invalidate every list and the affected record

mod layer;
mod storage;
mod traits;

pub use layer::{
  CacheOptions, CacheUpdate, Mutated, MutationKind, MutationOutcome, MutationTicket, QueryCache,
};
pub use traits::{CachedValue, Cacheable, QueryKey};
