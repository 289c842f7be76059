use async_trait::async_trait;

use super::error::StoreError;
use super::types::{DepartmentFilter, Employee, EmployeeFormData, EmployeePatch};

/// Stateless request/response conduit to the table of employee rows.
///
/// Implementations perform no client-side validation; whatever the remote
/// side rejects is surfaced as a [`StoreError`].
#[async_trait]
pub trait EmployeeStore: Send + Sync {
  /// Employees matching `search` (case-insensitive, over first name, last
  /// name, email and job title) and `department`, ordered by last name.
  async fn list(
    &self,
    search: &str,
    department: DepartmentFilter,
  ) -> Result<Vec<Employee>, StoreError>;

  /// Exactly one employee by id. Zero or several matches is `NotFound`.
  async fn get(&self, id: &str) -> Result<Employee, StoreError>;

  async fn create(&self, data: &EmployeeFormData) -> Result<Employee, StoreError>;

  /// Patch the supplied fields and return the full updated row
  async fn update(&self, id: &str, patch: &EmployeePatch) -> Result<Employee, StoreError>;

  /// Remove a row. Deleting an id that does not exist succeeds.
  async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
