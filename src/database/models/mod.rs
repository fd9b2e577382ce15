pub mod category;
pub mod expense;
pub mod file_record;
pub mod person_budget;
pub mod profile;
pub mod settings;

pub use category::Category;
pub use expense::{checked_money, Expense, ExpenseFilter, NewExpense, MAX_AMOUNT};
pub use file_record::{FileRecord, NewFile, NewTrip, RecordKind, TripRecord};
pub use person_budget::PersonBudget;
pub use profile::Profile;
pub use settings::Settings;
