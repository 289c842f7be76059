//! Employee records and the stores that persist them.

mod api_types;
mod cache;
mod client;
mod error;
mod memory;
mod store;
mod types;

pub(crate) use api_types::{parse_error_body, ApiAuthError, ApiTokenResponse};
pub use client::RestStore;
pub use error::StoreError;
pub use memory::InMemoryStore;
pub use store::EmployeeStore;
pub use types::{Department, DepartmentFilter, Employee, EmployeeFormData, EmployeePatch};

#[cfg(test)]
pub(crate) use types::fixtures;
