// File I/O operations

pub mod ops;
pub mod xlsx;
pub mod xlsx_styles;

pub use ops::{default_destination, mutate_file, read_file, search_file, MutateOutcome, MutateRequest};
