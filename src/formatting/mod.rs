pub mod summary;
pub mod utils;

pub use summary::{print_report, summary_line};
pub use utils::truncate;
