//! Keys and value types for the query cache.

use std::fmt;

use crate::employee::{DepartmentFilter, Employee};

/// Identifies one cached result set.
///
/// Changing any parameter produces a different key, so every search/filter
/// combination gets its own entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  Employees {
    search: String,
    department: DepartmentFilter,
  },
  Employee {
    id: String,
  },
}

impl QueryKey {
  pub fn employees(search: impl Into<String>, department: DepartmentFilter) -> Self {
    QueryKey::Employees {
      search: search.into(),
      department,
    }
  }

  pub fn employee(id: impl Into<String>) -> Self {
    QueryKey::Employee { id: id.into() }
  }

  pub fn is_list(&self) -> bool {
    matches!(self, QueryKey::Employees { .. })
  }

  /// Human-readable description for logs
  pub fn description(&self) -> String {
    match self {
      QueryKey::Employees { search, department } if search.is_empty() => {
        format!("employees [{}]", department)
      }
      QueryKey::Employees { search, department } => {
        format!("employees [{}] matching '{}'", department, search)
      }
      QueryKey::Employee { id } => format!("employee {}", id),
    }
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.description())
  }
}

/// Data stored in a cache entry
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
  Employees(Vec<Employee>),
  Employee(Employee),
}

/// Types that can be read back out of a [`CachedValue`].
pub trait Cacheable: Sized {
  fn from_cached(value: &CachedValue) -> Option<&Self>;

  fn into_cached(self) -> CachedValue;
}
