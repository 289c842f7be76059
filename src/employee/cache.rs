//! Cacheable implementations for employee types.

use crate::cache::{CachedValue, Cacheable};

use super::types::Employee;

impl Cacheable for Vec<Employee> {
  fn from_cached(value: &CachedValue) -> Option<&Self> {
    match value {
      CachedValue::Employees(list) => Some(list),
      _ => None,
    }
  }

  fn into_cached(self) -> CachedValue {
    CachedValue::Employees(self)
  }
}

impl Cacheable for Employee {
  fn from_cached(value: &CachedValue) -> Option<&Self> {
    match value {
      CachedValue::Employee(employee) => Some(employee),
      _ => None,
    }
  }

  fn into_cached(self) -> CachedValue {
    CachedValue::Employee(self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::employee::types::fixtures::employee;
  use crate::employee::Department;

  #[test]
  fn test_values_only_read_back_as_their_own_type() {
    let one = employee("1", "Ann", "Young", Department::Legal);
    let cached = one.clone().into_cached();
    assert_eq!(Employee::from_cached(&cached), Some(&one));
    assert!(Vec::<Employee>::from_cached(&cached).is_none());
  }
}
