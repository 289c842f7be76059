use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Departments an employee can belong to.
///
/// This enum is the only list of departments in the application; filter
/// tabs, badge colours and wire names are all derived from it.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Department {
  #[default]
  Engineering,
  Design,
  Marketing,
  Sales,
  #[serde(rename = "HR")]
  Hr,
  Finance,
  Operations,
  Legal,
  Product,
}

impl Department {
  pub const ALL: [Department; 9] = [
    Department::Engineering,
    Department::Design,
    Department::Marketing,
    Department::Sales,
    Department::Hr,
    Department::Finance,
    Department::Operations,
    Department::Legal,
    Department::Product,
  ];

  /// Name as stored in the remote table and shown to users
  pub fn as_str(&self) -> &'static str {
    match self {
      Department::Engineering => "Engineering",
      Department::Design => "Design",
      Department::Marketing => "Marketing",
      Department::Sales => "Sales",
      Department::Hr => "HR",
      Department::Finance => "Finance",
      Department::Operations => "Operations",
      Department::Legal => "Legal",
      Department::Product => "Product",
    }
  }

  /// Next department in declaration order, wrapping around
  pub fn next(self) -> Self {
    let idx = self.index();
    Self::ALL[(idx + 1) % Self::ALL.len()]
  }

  /// Previous department in declaration order, wrapping around
  pub fn previous(self) -> Self {
    let idx = self.index();
    Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
  }

  fn index(self) -> usize {
    Self::ALL.iter().position(|d| *d == self).unwrap_or(0)
  }
}

impl fmt::Display for Department {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Department {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .iter()
      .copied()
      .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| format!("unknown department: {}", s))
  }
}

/// Department filter applied to list queries. `All` is the "no filter" sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DepartmentFilter {
  #[default]
  All,
  Only(Department),
}

impl DepartmentFilter {
  /// Filter options in display order: "All" followed by every department
  pub fn options() -> Vec<DepartmentFilter> {
    std::iter::once(DepartmentFilter::All)
      .chain(Department::ALL.iter().copied().map(DepartmentFilter::Only))
      .collect()
  }

  pub fn department(&self) -> Option<Department> {
    match self {
      DepartmentFilter::All => None,
      DepartmentFilter::Only(d) => Some(*d),
    }
  }

  pub fn matches(&self, department: Department) -> bool {
    match self {
      DepartmentFilter::All => true,
      DepartmentFilter::Only(d) => *d == department,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      DepartmentFilter::All => "All Departments",
      DepartmentFilter::Only(d) => d.as_str(),
    }
  }
}

impl fmt::Display for DepartmentFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DepartmentFilter::All => f.write_str("all"),
      DepartmentFilter::Only(d) => f.write_str(d.as_str()),
    }
  }
}

/// A persisted employee row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub id: String,
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  pub phone: Option<String>,
  pub department: Department,
  pub job_title: String,
  pub hire_date: NaiveDate,
  pub avatar_url: Option<String>,
  pub location: Option<String>,
  pub bio: Option<String>,
  pub is_active: bool,
  pub created_by: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Employee {
  pub fn full_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }

  /// Uppercased first letters of first and last name
  pub fn initials(&self) -> String {
    self
      .first_name
      .chars()
      .take(1)
      .chain(self.last_name.chars().take(1))
      .flat_map(char::to_uppercase)
      .collect()
  }

  /// Case-insensitive substring match over the searchable fields
  pub fn matches_search(&self, search: &str) -> bool {
    if search.is_empty() {
      return true;
    }
    let needle = search.to_lowercase();
    [
      &self.first_name,
      &self.last_name,
      &self.email,
      &self.job_title,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
  }
}

/// Writable fields of an employee, used to create a record.
///
/// Optional fields are left out of the request body entirely when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeFormData {
  pub first_name: String,
  pub last_name: String,
  pub email: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone: Option<String>,
  pub department: Department,
  pub job_title: String,
  pub hire_date: NaiveDate,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bio: Option<String>,
  pub is_active: bool,
}

/// Partial update of an employee.
///
/// `None` means "leave unchanged". For nullable columns `Some(None)` clears
/// the stored value and is sent as JSON `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmployeePatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub first_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub last_name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phone: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub department: Option<Department>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub job_title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub hire_date: Option<NaiveDate>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub avatar_url: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bio: Option<Option<String>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_active: Option<bool>,
}

impl EmployeePatch {
  /// Build a patch containing only the fields of `data` that differ from `current`
  pub fn diff(current: &Employee, data: &EmployeeFormData) -> Self {
    fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
      (old != new).then(|| new.clone())
    }

    Self {
      first_name: changed(&current.first_name, &data.first_name),
      last_name: changed(&current.last_name, &data.last_name),
      email: changed(&current.email, &data.email),
      phone: changed(&current.phone, &data.phone),
      department: changed(&current.department, &data.department),
      job_title: changed(&current.job_title, &data.job_title),
      hire_date: changed(&current.hire_date, &data.hire_date),
      avatar_url: changed(&current.avatar_url, &data.avatar_url),
      location: changed(&current.location, &data.location),
      bio: changed(&current.bio, &data.bio),
      is_active: changed(&current.is_active, &data.is_active),
    }
  }

  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }

  /// Apply the supplied fields to an employee in place
  pub fn apply_to(&self, employee: &mut Employee) {
    if let Some(v) = &self.first_name {
      employee.first_name = v.clone();
    }
    if let Some(v) = &self.last_name {
      employee.last_name = v.clone();
    }
    if let Some(v) = &self.email {
      employee.email = v.clone();
    }
    if let Some(v) = &self.phone {
      employee.phone = v.clone();
    }
    if let Some(v) = self.department {
      employee.department = v;
    }
    if let Some(v) = &self.job_title {
      employee.job_title = v.clone();
    }
    if let Some(v) = self.hire_date {
      employee.hire_date = v;
    }
    if let Some(v) = &self.avatar_url {
      employee.avatar_url = v.clone();
    }
    if let Some(v) = &self.location {
      employee.location = v.clone();
    }
    if let Some(v) = &self.bio {
      employee.bio = v.clone();
    }
    if let Some(v) = self.is_active {
      employee.is_active = v;
    }
  }
}

impl From<EmployeeFormData> for EmployeePatch {
  fn from(data: EmployeeFormData) -> Self {
    Self {
      first_name: Some(data.first_name),
      last_name: Some(data.last_name),
      email: Some(data.email),
      phone: Some(data.phone),
      department: Some(data.department),
      job_title: Some(data.job_title),
      hire_date: Some(data.hire_date),
      avatar_url: Some(data.avatar_url),
      location: Some(data.location),
      bio: Some(data.bio),
      is_active: Some(data.is_active),
    }
  }
}
