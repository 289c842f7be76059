mod directory;
mod employee_detail;
mod login;

pub use directory::DirectoryView;
pub use employee_detail::EmployeeDetailView;
pub use login::LoginView;
