mod command_input;
mod confirm_dialog;
mod department_bar;
mod employee_form;
mod employee_grid;
mod input;
mod key_result;
mod search_input;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm_dialog::{ConfirmDialog, ConfirmEvent};
pub use department_bar::{DepartmentBar, DepartmentBarEvent};
pub use employee_form::{EmployeeForm, FormEvent};
pub use employee_grid::{EmployeeGrid, GridEvent};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
