pub mod date_key;
pub mod sheet;

pub use date_key::{AssembleCount, DateKey, DatePlan, FolderYearKey};
pub use sheet::SheetRow;
