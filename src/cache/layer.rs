//! Query cache that orchestrates fetching, de-duplication and invalidation.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::employee::{
  DepartmentFilter, Employee, EmployeeFormData, EmployeePatch, EmployeeStore, StoreError,
};
use crate::query::{Query, QueryState};

use super::storage::EntryStorage;
use super::traits::{CachedValue, Cacheable, QueryKey};

/// Tuning knobs for [`QueryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
  /// Age after which successful data is refetched on next use. `None`
  /// keeps data fresh until it is invalidated.
  pub stale_time: Option<Duration>,
  /// Upper bound on the number of entries kept
  pub max_entries: usize,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self {
      stale_time: None,
      max_entries: 64,
    }
  }
}

/// Handle identifying a submitted mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationTicket(pub(crate) u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
}

impl MutationKind {
  fn verb(&self) -> &'static str {
    match self {
      MutationKind::Create => "create",
      MutationKind::Update => "update",
      MutationKind::Delete => "delete",
    }
  }

  fn past_tense(&self) -> &'static str {
    match self {
      MutationKind::Create => "created",
      MutationKind::Update => "updated",
      MutationKind::Delete => "deleted",
    }
  }
}

/// What a successful mutation did
#[derive(Debug, Clone, PartialEq)]
pub enum Mutated {
  Created(Employee),
  Updated(Employee),
  Deleted(String),
}

impl Mutated {
  pub fn id(&self) -> &str {
    match self {
      Mutated::Created(e) | Mutated::Updated(e) => &e.id,
      Mutated::Deleted(id) => id,
    }
  }
}

/// Settled mutation, returned from [`QueryCache::poll`].
#[derive(Debug, Clone)]
pub struct MutationOutcome {
  pub ticket: MutationTicket,
  pub kind: MutationKind,
  pub result: Result<Mutated, StoreError>,
}

impl MutationOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }

  /// Message shown to the user for this outcome
  pub fn message(&self) -> String {
    match &self.result {
      Ok(_) => format!("Employee {} successfully", self.kind.past_tense()),
      Err(e) => format!("Failed to {} employee: {}", self.kind.verb(), e),
    }
  }
}

/// Everything that settled during one [`QueryCache::poll`].
#[derive(Debug, Default)]
pub struct CacheUpdate {
  pub outcomes: Vec<MutationOutcome>,
  /// The store rejected the session
  pub auth_required: bool,
}

enum Settled {
  Fetch {
    key: QueryKey,
    ticket: u64,
    result: Result<CachedValue, StoreError>,
  },
  Mutation(MutationOutcome),
}

/// Client-side cache of store reads, keyed by [`QueryKey`].
///
/// Fetches and mutations run on spawned tasks and report back over a
/// channel; their results are only applied in [`poll`](Self::poll), which
/// the event loop calls on every tick. At most one fetch per key is in
/// flight, and a result is only applied if it belongs to the entry's
/// current fetch, so superseded and late results are dropped.
pub struct QueryCache {
  store: Arc<dyn EmployeeStore>,
  options: CacheOptions,
  entries: EntryStorage,
  tx: mpsc::UnboundedSender<Settled>,
  rx: mpsc::UnboundedReceiver<Settled>,
  next_ticket: u64,
  outstanding: usize,
}

impl QueryCache {
  pub fn new(store: Arc<dyn EmployeeStore>, options: CacheOptions) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self {
      store,
      options,
      entries: EntryStorage::new(options.max_entries),
      tx,
      rx,
      next_ticket: 0,
      outstanding: 0,
    }
  }

  /// Start fetching the list for `(search, department)` unless it is
  /// fresh, already loading, or failed and not yet invalidated.
  pub fn ensure_employees(&mut self, search: &str, department: DepartmentFilter) {
    self.ensure(QueryKey::employees(search, department));
  }

  /// Like [`ensure_employees`](Self::ensure_employees) for a single record.
  /// An empty id never fetches.
  pub fn ensure_employee(&mut self, id: &str) {
    if id.is_empty() {
      return;
    }
    self.ensure(QueryKey::employee(id));
  }

  pub fn employees(&self, search: &str, department: DepartmentFilter) -> Query<'_, Vec<Employee>> {
    self.read(&QueryKey::employees(search, department))
  }

  pub fn employee(&self, id: &str) -> Query<'_, Employee> {
    if id.is_empty() {
      return Query::idle();
    }
    self.read(&QueryKey::employee(id))
  }

  pub fn use_employees(
    &mut self,
    search: &str,
    department: DepartmentFilter,
  ) -> Query<'_, Vec<Employee>> {
    self.ensure_employees(search, department);
    self.employees(search, department)
  }

  pub fn use_employee(&mut self, id: &str) -> Query<'_, Employee> {
    self.ensure_employee(id);
    self.employee(id)
  }

  /// Force a new fetch for `key`, superseding any fetch in flight
  pub fn refetch(&mut self, key: &QueryKey) {
    if matches!(key, QueryKey::Employee { id } if id.is_empty()) {
      return;
    }
    self.start_fetch(key.clone());
  }

  pub fn create(&mut self, data: EmployeeFormData) -> MutationTicket {
    self.mutate(MutationKind::Create, move |store| async move {
      store.create(&data).await.map(Mutated::Created)
    })
  }

  pub fn update(&mut self, id: &str, patch: EmployeePatch) -> MutationTicket {
    let id = id.to_string();
    self.mutate(MutationKind::Update, move |store| async move {
      store.update(&id, &patch).await.map(Mutated::Updated)
    })
  }

  pub fn delete(&mut self, id: &str) -> MutationTicket {
    let id = id.to_string();
    self.mutate(MutationKind::Delete, move |store| async move {
      store.delete(&id).await.map(|()| Mutated::Deleted(id))
    })
  }

  /// Apply everything that has settled since the last poll. Never blocks.
  pub fn poll(&mut self) -> CacheUpdate {
    let mut update = CacheUpdate::default();
    while let Ok(settled) = self.rx.try_recv() {
      self.apply(settled, &mut update);
    }
    update
  }

  /// Wait until every outstanding fetch and mutation has settled
  #[cfg(test)]
  pub async fn settle(&mut self) -> CacheUpdate {
    let mut update = CacheUpdate::default();
    while self.outstanding > 0 {
      match self.rx.recv().await {
        Some(settled) => self.apply(settled, &mut update),
        None => break,
      }
    }
    update
  }

  /// Number of fetches and mutations still running
  pub fn outstanding(&self) -> usize {
    self.outstanding
  }

  /// Mark every entry stale so the next use refetches it
  pub fn invalidate_all(&mut self) {
    debug!("invalidating all cache entries");
    for (_, entry) in self.entries.iter_mut() {
      entry.invalidated = true;
      entry.in_flight = None;
    }
  }

  /// Drop every entry and ignore anything still in flight
  pub fn reset(&mut self) {
    debug!(entries = self.entries.len(), "resetting query cache");
    self.entries.clear();
    let (tx, rx) = mpsc::unbounded_channel();
    self.tx = tx;
    self.rx = rx;
    self.outstanding = 0;
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  fn read<T: Cacheable>(&self, key: &QueryKey) -> Query<'_, T> {
    match self.entries.get(key) {
      None => Query::idle(),
      Some(entry) => Query::new(
        entry.state,
        entry.data.as_ref().and_then(T::from_cached),
        entry.error.as_ref(),
        entry.is_stale(self.options.stale_time),
      ),
    }
  }

  fn ensure(&mut self, key: QueryKey) {
    let stale_time = self.options.stale_time;
    let entry = self.entries.touch(&key);
    if entry.in_flight.is_some() {
      return;
    }
    if entry.state == QueryState::Error && !entry.invalidated {
      return;
    }
    if entry.is_fresh(stale_time) {
      return;
    }
    self.start_fetch(key);
  }

  fn start_fetch(&mut self, key: QueryKey) {
    let ticket = self.ticket();
    let entry = self.entries.touch(&key);
    entry.in_flight = Some(ticket);
    entry.state = QueryState::Loading;

    debug!(key = %key, ticket, "fetching");
    let store = Arc::clone(&self.store);
    let tx = self.tx.clone();
    self.outstanding += 1;

    tokio::spawn(async move {
      let result = match &key {
        QueryKey::Employees { search, department } => store
          .list(search, *department)
          .await
          .map(Cacheable::into_cached),
        QueryKey::Employee { id } => store.get(id).await.map(Cacheable::into_cached),
      };
      // Receiver is gone after a reset
      let _ = tx.send(Settled::Fetch {
        key,
        ticket,
        result,
      });
    });
  }

  fn mutate<F, Fut>(&mut self, kind: MutationKind, op: F) -> MutationTicket
  where
    F: FnOnce(Arc<dyn EmployeeStore>) -> Fut,
    Fut: Future<Output = Result<Mutated, StoreError>> + Send + 'static,
  {
    let ticket = MutationTicket(self.ticket());
    debug!(?kind, ticket = ticket.0, "submitting mutation");

    let future = op(Arc::clone(&self.store));
    let tx = self.tx.clone();
    self.outstanding += 1;

    tokio::spawn(async move {
      let result = future.await;
      let _ = tx.send(Settled::Mutation(MutationOutcome {
        ticket,
        kind,
        result,
      }));
    });
    ticket
  }

  fn ticket(&mut self) -> u64 {
    self.next_ticket += 1;
    self.next_ticket
  }

  fn apply(&mut self, settled: Settled, update: &mut CacheUpdate) {
    self.outstanding = self.outstanding.saturating_sub(1);

    match settled {
      Settled::Fetch {
        key,
        ticket,
        result,
      } => {
        if matches!(&result, Err(e) if e.is_auth_required()) {
          update.auth_required = true;
        }
        let Some(entry) = self.entries.get_mut(&key) else {
          debug!(key = %key, ticket, "discarding result for evicted entry");
          return;
        };
        if entry.in_flight != Some(ticket) {
          debug!(key = %key, ticket, "discarding superseded result");
          return;
        }

        entry.in_flight = None;
        entry.invalidated = false;
        match result {
          Ok(value) => {
            entry.state = QueryState::Success;
            entry.data = Some(value);
            entry.error = None;
            entry.fetched_at = Some(Instant::now());
          }
          Err(e) => {
            warn!(key = %key, error = %e, "fetch failed");
            entry.state = QueryState::Error;
            entry.error = Some(e);
          }
        }
      }
      Settled::Mutation(outcome) => {
        match &outcome.result {
          Ok(mutated) => self.invalidate_after(mutated),
          Err(e) => {
            warn!(kind = ?outcome.kind, error = %e, "mutation failed");
            if e.is_auth_required() {
              update.auth_required = true;
            }
          }
        }
        update.outcomes.push(outcome);
      }
    }
  }

  /// Every list is treated as affected since a mutation cannot tell which
  /// filters would include the record.
  fn invalidate_after(&mut self, mutated: &Mutated) {
    for (_, entry) in self.entries.iter_mut().filter(|(key, _)| key.is_list()) {
      entry.invalidated = true;
      entry.in_flight = None;
    }

    let detail = QueryKey::employee(mutated.id());
    match mutated {
      Mutated::Created(_) => {}
      Mutated::Updated(_) => {
        if let Some(entry) = self.entries.get_mut(&detail) {
          entry.invalidated = true;
          entry.in_flight = None;
        }
      }
      Mutated::Deleted(_) => {
        self.entries.remove(&detail);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::employee::fixtures::{employee, form_data};
  use crate::employee::{Department, InMemoryStore};
  use async_trait::async_trait;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;

  /// Store wrapper that counts reads and can be told to fail
  #[derive(Default)]
  struct ScriptedStore {
    inner: InMemoryStore,
    lists: AtomicUsize,
    gets: AtomicUsize,
    failure: Mutex<Option<StoreError>>,
  }

  impl ScriptedStore {
    fn with_rows(rows: Vec<Employee>) -> Arc<Self> {
      Arc::new(Self {
        inner: InMemoryStore::new(rows),
        ..Default::default()
      })
    }

    fn fail_with(&self, err: Option<StoreError>) {
      *self.failure.lock().unwrap() = err;
    }

    fn check(&self) -> Result<(), StoreError> {
      match self.failure.lock().unwrap().clone() {
        Some(err) => Err(err),
        None => Ok(()),
      }
    }

    fn lists(&self) -> usize {
      self.lists.load(Ordering::SeqCst)
    }

    fn gets(&self) -> usize {
      self.gets.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl EmployeeStore for ScriptedStore {
    async fn list(
      &self,
      search: &str,
      department: DepartmentFilter,
    ) -> Result<Vec<Employee>, StoreError> {
      self.lists.fetch_add(1, Ordering::SeqCst);
      self.check()?;
      self.inner.list(search, department).await
    }

    async fn get(&self, id: &str) -> Result<Employee, StoreError> {
      self.gets.fetch_add(1, Ordering::SeqCst);
      self.check()?;
      self.inner.get(id).await
    }

    async fn create(&self, data: &EmployeeFormData) -> Result<Employee, StoreError> {
      self.check()?;
      self.inner.create(data).await
    }

    async fn update(&self, id: &str, patch: &EmployeePatch) -> Result<Employee, StoreError> {
      self.check()?;
      self.inner.update(id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
      self.check()?;
      self.inner.delete(id).await
    }
  }

  fn rows() -> Vec<Employee> {
    vec![
      employee("1", "Ann", "Young", Department::Engineering),
      employee("2", "Bob", "Adams", Department::Sales),
      employee("3", "Cleo", "Baker", Department::Engineering),
    ]
  }

  fn cache_over(store: &Arc<ScriptedStore>) -> QueryCache {
    QueryCache::new(store.clone(), CacheOptions::default())
  }

  #[tokio::test]
  async fn test_identical_queries_are_deduplicated() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);

    assert!(cache.use_employees("", DepartmentFilter::All).is_initial_loading());
    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;
    assert_eq!(store.lists(), 1);

    let query = cache.use_employees("", DepartmentFilter::All);
    assert!(query.is_success());
    assert_eq!(query.data().map(Vec::len), Some(3));
    assert_eq!(store.lists(), 1);
  }

  #[tokio::test]
  async fn test_different_filters_get_different_entries() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);

    cache.ensure_employees("", DepartmentFilter::All);
    cache.ensure_employees("", DepartmentFilter::Only(Department::Engineering));
    cache.settle().await;

    assert_eq!(store.lists(), 2);
    let engineering = cache.employees("", DepartmentFilter::Only(Department::Engineering));
    let names: Vec<&str> = engineering
      .data()
      .unwrap()
      .iter()
      .map(|e| e.last_name.as_str())
      .collect();
    assert_eq!(names, vec!["Baker", "Young"]);
  }

  #[tokio::test]
  async fn test_create_invalidates_lists() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);
    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;

    cache.create(form_data("Dana", "Cruz", Department::Design));
    let update = cache.settle().await;
    assert_eq!(update.outcomes.len(), 1);
    assert!(update.outcomes[0].is_success());
    assert_eq!(update.outcomes[0].message(), "Employee created successfully");
    assert!(cache.employees("", DepartmentFilter::All).is_stale());

    cache.ensure_employees("", DepartmentFilter::All);
    assert_eq!(store.lists(), 2);
    cache.settle().await;

    let query = cache.employees("", DepartmentFilter::All);
    assert!(!query.is_stale());
    let names: Vec<&str> = query
      .data()
      .unwrap()
      .iter()
      .map(|e| e.last_name.as_str())
      .collect();
    assert_eq!(names, vec!["Adams", "Baker", "Cruz", "Young"]);
  }

  #[tokio::test]
  async fn test_failed_refetch_keeps_last_known_good_data() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);
    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;

    store.fail_with(Some(StoreError::transport("connection reset")));
    cache.refetch(&QueryKey::employees("", DepartmentFilter::All));
    cache.settle().await;

    let query = cache.employees("", DepartmentFilter::All);
    assert!(query.is_error());
    assert_eq!(query.data().map(Vec::len), Some(3));
    assert_eq!(
      query.error(),
      Some(&StoreError::Transport("connection reset".to_string()))
    );

    // No automatic retry
    cache.ensure_employees("", DepartmentFilter::All);
    assert_eq!(store.lists(), 2);
    assert_eq!(cache.outstanding(), 0);
  }

  #[tokio::test]
  async fn test_empty_id_never_fetches() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);

    assert!(cache.use_employee("").is_idle());
    cache.refetch(&QueryKey::employee(""));
    cache.settle().await;

    assert_eq!(store.gets(), 0);
    assert!(cache.is_empty());
  }

  #[tokio::test]
  async fn test_get_through_cache_is_idempotent_and_not_found_is_error() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);

    cache.ensure_employee("2");
    cache.ensure_employee("nonexistent-id");
    cache.settle().await;

    let first = cache.employee("2").data().cloned();
    cache.refetch(&QueryKey::employee("2"));
    cache.settle().await;
    assert_eq!(cache.employee("2").data().cloned(), first);

    let missing = cache.employee("nonexistent-id");
    assert!(missing.is_error());
    assert!(missing.error().is_some_and(StoreError::is_not_found));
  }

  #[tokio::test]
  async fn test_failed_mutation_changes_nothing() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);
    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;

    store.fail_with(Some(StoreError::Validation {
      code: "23505".to_string(),
      message: "duplicate key".to_string(),
    }));
    cache.create(form_data("Ann", "Young", Department::Engineering));
    let update = cache.settle().await;

    let outcome = &update.outcomes[0];
    assert!(!outcome.is_success());
    assert_eq!(outcome.message(), "Failed to create employee: duplicate key");
    assert!(!cache.employees("", DepartmentFilter::All).is_stale());

    cache.ensure_employees("", DepartmentFilter::All);
    assert_eq!(store.lists(), 1);
  }

  #[tokio::test]
  async fn test_delete_excludes_record_and_drops_detail() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);
    cache.ensure_employees("", DepartmentFilter::All);
    cache.ensure_employee("2");
    cache.settle().await;

    cache.delete("2");
    let update = cache.settle().await;
    assert_eq!(update.outcomes[0].message(), "Employee deleted successfully");
    assert!(cache.employee("2").is_idle());

    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;
    let query = cache.employees("", DepartmentFilter::All);
    assert!(query.data().unwrap().iter().all(|e| e.id != "2"));
  }

  #[tokio::test]
  async fn test_update_invalidates_detail_entry() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);
    cache.ensure_employee("3");
    cache.settle().await;

    let patch = EmployeePatch {
      job_title: Some("Staff Engineer".to_string()),
      ..Default::default()
    };
    cache.update("3", patch);
    let update = cache.settle().await;
    assert_eq!(update.outcomes[0].message(), "Employee updated successfully");
    assert!(cache.employee("3").is_stale());

    cache.ensure_employee("3");
    cache.settle().await;
    assert_eq!(store.gets(), 2);
    assert_eq!(
      cache.employee("3").data().map(|e| e.job_title.as_str()),
      Some("Staff Engineer")
    );
  }

  #[tokio::test]
  async fn test_invalidated_in_flight_fetch_is_superseded() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = cache_over(&store);

    cache.ensure_employees("", DepartmentFilter::All);
    cache.invalidate_all();
    cache.ensure_employees("", DepartmentFilter::All);
    let update = cache.settle().await;

    assert_eq!(store.lists(), 2);
    assert!(cache.employees("", DepartmentFilter::All).is_success());
  }

  #[tokio::test]
  async fn test_auth_failure_is_reported() {
    let store = ScriptedStore::with_rows(rows());
    store.fail_with(Some(StoreError::AuthRequired));
    let mut cache = cache_over(&store);

    cache.ensure_employees("", DepartmentFilter::All);
    let update = cache.settle().await;
    assert!(update.auth_required);
  }

  #[tokio::test]
  async fn test_stale_time_triggers_refetch() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = QueryCache::new(
      store.clone(),
      CacheOptions {
        stale_time: Some(Duration::ZERO),
        ..Default::default()
      },
    );

    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;
    assert!(cache.employees("", DepartmentFilter::All).is_stale());

    cache.ensure_employees("", DepartmentFilter::All);
    cache.settle().await;
    assert_eq!(store.lists(), 2);
  }

  #[tokio::test]
  async fn test_capacity_evicts_and_reset_clears() {
    let store = ScriptedStore::with_rows(rows());
    let mut cache = QueryCache::new(
      store.clone(),
      CacheOptions {
        max_entries: 2,
        ..Default::default()
      },
    );

    for search in ["a", "b", "c"] {
      cache.ensure_employees(search, DepartmentFilter::All);
      cache.settle().await;
    }
    assert_eq!(cache.len(), 2);
    assert!(cache.employees("a", DepartmentFilter::All).is_idle());

    cache.ensure_employees("d", DepartmentFilter::All);
    cache.reset();
    assert!(cache.is_empty());
    assert_eq!(cache.outstanding(), 0);
    assert!(cache.poll().outcomes.is_empty());
  }
}
