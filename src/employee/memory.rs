use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::error::StoreError;
use super::store::EmployeeStore;
use super::types::{Department, DepartmentFilter, Employee, EmployeeFormData, EmployeePatch};

/// Postgres unique-violation code, reported for duplicate emails
const UNIQUE_VIOLATION: &str = "23505";

/// Employee table held in process memory.
///
/// Behaves like the remote table for every [`EmployeeStore`] operation,
/// including the unique constraint on `email`.
#[derive(Default)]
pub struct InMemoryStore {
  rows: RwLock<Vec<Employee>>,
}

impl InMemoryStore {
  pub fn new(rows: Vec<Employee>) -> Self {
    Self {
      rows: RwLock::new(rows),
    }
  }

  /// A store pre-populated with a small demo roster
  pub fn seeded() -> Self {
    Self::new(demo_roster())
  }

  #[cfg(test)]
  pub async fn len(&self) -> usize {
    self.rows.read().await.len()
  }

  fn duplicate_email(email: &str) -> StoreError {
    StoreError::Validation {
      code: UNIQUE_VIOLATION.to_string(),
      message: format!(
        "duplicate key value violates unique constraint \"employees_email_key\" (email {})",
        email
      ),
    }
  }
}

#[async_trait]
impl EmployeeStore for InMemoryStore {
  async fn list(
    &self,
    search: &str,
    department: DepartmentFilter,
  ) -> Result<Vec<Employee>, StoreError> {
    let rows = self.rows.read().await;
    let mut result: Vec<Employee> = rows
      .iter()
      .filter(|e| department.matches(e.department) && e.matches_search(search))
      .cloned()
      .collect();
    result.sort_by(|a, b| a.last_name.cmp(&b.last_name));
    debug!(search, department = %department, count = result.len(), "listed employees in memory");
    Ok(result)
  }

  async fn get(&self, id: &str) -> Result<Employee, StoreError> {
    let rows = self.rows.read().await;
    rows
      .iter()
      .find(|e| e.id == id)
      .cloned()
      .ok_or_else(|| StoreError::not_found(id))
  }

  async fn create(&self, data: &EmployeeFormData) -> Result<Employee, StoreError> {
    let mut rows = self.rows.write().await;
    if rows.iter().any(|e| e.email == data.email) {
      return Err(Self::duplicate_email(&data.email));
    }

    let now = Utc::now();
    let employee = Employee {
      id: Uuid::new_v4().to_string(),
      first_name: data.first_name.clone(),
      last_name: data.last_name.clone(),
      email: data.email.clone(),
      phone: data.phone.clone(),
      department: data.department,
      job_title: data.job_title.clone(),
      hire_date: data.hire_date,
      avatar_url: data.avatar_url.clone(),
      location: data.location.clone(),
      bio: data.bio.clone(),
      is_active: data.is_active,
      created_by: None,
      created_at: now,
      updated_at: now,
    };
    rows.push(employee.clone());
    Ok(employee)
  }

  async fn update(&self, id: &str, patch: &EmployeePatch) -> Result<Employee, StoreError> {
    let mut rows = self.rows.write().await;
    if let Some(email) = &patch.email {
      if rows.iter().any(|e| e.id != id && &e.email == email) {
        return Err(Self::duplicate_email(email));
      }
    }

    let row = rows
      .iter_mut()
      .find(|e| e.id == id)
      .ok_or_else(|| StoreError::not_found(id))?;
    patch.apply_to(row);
    row.updated_at = Utc::now();
    Ok(row.clone())
  }

  async fn delete(&self, id: &str) -> Result<(), StoreError> {
    let mut rows = self.rows.write().await;
    rows.retain(|e| e.id != id);
    Ok(())
  }
}

fn demo_roster() -> Vec<Employee> {
  #[rustfmt::skip]
  let people: [(&str, &str, Department, &str, (i32, u32, u32), Option<&str>, bool); 12] = [
    ("Ada", "Lovelace", Department::Engineering, "Staff Engineer", (2019, 3, 4), Some("London"), true),
    ("Grace", "Hopper", Department::Engineering, "Principal Engineer", (2017, 9, 18), Some("Arlington"), true),
    ("Linus", "Baker", Department::Engineering, "Backend Engineer", (2022, 1, 10), Some("Helsinki"), true),
    ("Dieter", "Rams", Department::Design, "Design Lead", (2018, 5, 21), Some("Frankfurt"), true),
    ("Paula", "Scher", Department::Design, "Brand Designer", (2021, 11, 1), None, true),
    ("Don", "Draper", Department::Marketing, "Creative Director", (2016, 2, 29), Some("New York"), false),
    ("Zig", "Ziglar", Department::Sales, "Account Executive", (2020, 7, 6), Some("Dallas"), true),
    ("Frances", "Perkins", Department::Hr, "People Partner", (2021, 4, 12), None, true),
    ("Luca", "Pacioli", Department::Finance, "Controller", (2015, 10, 5), Some("Milan"), true),
    ("Taiichi", "Ohno", Department::Operations, "Operations Manager", (2019, 8, 19), Some("Toyota City"), true),
    ("Ruth", "Ginsburg", Department::Legal, "General Counsel", (2018, 1, 15), Some("Washington"), true),
    ("Marty", "Cagan", Department::Product, "Product Manager", (2023, 3, 27), None, true),
  ];

  let now = Utc::now();
  people
    .iter()
    .filter_map(|(first, last, department, title, (y, m, d), location, active)| {
      let hire_date = NaiveDate::from_ymd_opt(*y, *m, *d)?;
      Some(Employee {
        id: Uuid::new_v4().to_string(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: format!("{}.{}@teamhub.dev", first.to_lowercase(), last.to_lowercase()),
        phone: None,
        department: *department,
        job_title: title.to_string(),
        hire_date,
        avatar_url: None,
        location: location.map(str::to_string),
        bio: None,
        is_active: *active,
        created_by: None,
        created_at: now,
        updated_at: now,
      })
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::employee::types::fixtures::{employee, form_data};

  fn roster() -> InMemoryStore {
    InMemoryStore::new(vec![
      employee("1", "Ann", "Young", Department::Engineering),
      employee("2", "Bob", "Adams", Department::Sales),
      employee("3", "Cleo", "Baker", Department::Engineering),
      employee("4", "Alina", "Moss", Department::Design),
      employee("5", "Dev", "Cole", Department::Engineering),
    ])
  }

  #[tokio::test]
  async fn test_engineering_filter_ordered_by_last_name() {
    let store = roster();
    let result = store
      .list("", DepartmentFilter::Only(Department::Engineering))
      .await
      .unwrap();
    let last_names: Vec<&str> = result.iter().map(|e| e.last_name.as_str()).collect();
    assert_eq!(last_names, vec!["Baker", "Cole", "Young"]);
    assert!(result.iter().all(|e| e.department == Department::Engineering));
  }

  #[tokio::test]
  async fn test_list_honours_search_and_department() {
    let store = roster();
    for (search, filter) in [
      ("", DepartmentFilter::All),
      ("AL", DepartmentFilter::All),
      ("a", DepartmentFilter::Only(Department::Engineering)),
      ("example.com", DepartmentFilter::Only(Department::Design)),
      ("zzz", DepartmentFilter::All),
    ] {
      let result = store.list(search, filter).await.unwrap();
      assert!(result
        .iter()
        .all(|e| filter.matches(e.department) && e.matches_search(search)));
      assert!(result
        .windows(2)
        .all(|pair| pair[0].last_name <= pair[1].last_name));
    }
    let result = store.list("AL", DepartmentFilter::All).await.unwrap();
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].first_name, "Alina");
  }

  #[tokio::test]
  async fn test_get_is_idempotent() {
    let store = roster();
    let first = store.get("3").await.unwrap();
    let second = store.get("3").await.unwrap();
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn test_get_nonexistent_is_not_found() {
    let store = roster();
    let err = store.get("nonexistent-id").await.unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_create_assigns_id_and_rejects_duplicate_email() {
    let store = InMemoryStore::default();
    let data = form_data("Grace", "Hopper", Department::Product);

    let created = store.create(&data).await.unwrap();
    assert!(!created.id.is_empty());
    assert_eq!(store.get(&created.id).await.unwrap(), created);

    let err = store.create(&data).await.unwrap_err();
    assert_eq!(err.code(), Some(UNIQUE_VIOLATION));
    assert_eq!(store.len().await, 1);
  }

  #[tokio::test]
  async fn test_update_patches_fields() {
    let store = roster();
    let patch = EmployeePatch {
      job_title: Some("Engineering Manager".to_string()),
      location: Some(Some("Oslo".to_string())),
      ..Default::default()
    };
    let updated = store.update("5", &patch).await.unwrap();
    assert_eq!(updated.job_title, "Engineering Manager");
    assert_eq!(updated.location.as_deref(), Some("Oslo"));
    assert_eq!(updated.first_name, "Dev");

    let err = store.update("missing", &patch).await.unwrap_err();
    assert!(err.is_not_found());
  }

  #[tokio::test]
  async fn test_update_to_taken_email_is_rejected() {
    let store = roster();
    let patch = EmployeePatch {
      email: Some("bob.adams@example.com".to_string()),
      ..Default::default()
    };
    let err = store.update("1", &patch).await.unwrap_err();
    assert_eq!(err.code(), Some(UNIQUE_VIOLATION));
  }

  #[tokio::test]
  async fn test_delete_removes_row_and_missing_id_succeeds() {
    let store = roster();
    store.delete("2").await.unwrap();
    let remaining = store.list("", DepartmentFilter::All).await.unwrap();
    assert!(remaining.iter().all(|e| e.id != "2"));
    assert_eq!(remaining.len(), 4);

    store.delete("nonexistent-id").await.unwrap();
    assert_eq!(store.len().await, 4);
  }

  #[tokio::test]
  async fn test_seeded_roster_covers_every_department() {
    let store = InMemoryStore::seeded();
    for department in Department::ALL {
      let result = store
        .list("", DepartmentFilter::Only(department))
        .await
        .unwrap();
      assert!(!result.is_empty(), "no demo employee in {}", department);
    }
  }
}
