//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: automation hosts branch on them.
//!
//! | Code | Meaning                                              |
//! |------|------------------------------------------------------|
//! | 0    | Success                                              |
//! | 1    | General error (unspecified)                          |
//! | 2    | Usage error or invalid input (range, batch, mode)    |
//! | 3    | Source workbook missing or unreadable                |
//! | 4    | Named sheet not found                                |
//! | 5    | Destination could not be written                     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into `grid_exit_code` or the relevant command

use gridbook_core::GridError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed JSON, invalid range/batch/mode.
pub const EXIT_USAGE: u8 = 2;

/// Source workbook missing or unreadable.
pub const EXIT_FILE_ACCESS: u8 = 3;

/// Named sheet absent from the workbook.
pub const EXIT_SHEET_NOT_FOUND: u8 = 4;

/// Destination workbook could not be persisted.
pub const EXIT_WRITE: u8 = 5;

/// Map a grid error to its exit code.
pub fn grid_exit_code(err: &GridError) -> u8 {
    match err {
        GridError::FileAccess { .. } => EXIT_FILE_ACCESS,
        GridError::SheetNotFound(_) => EXIT_SHEET_NOT_FOUND,
        GridError::InvalidRange(_)
        | GridError::InvalidBatch(_)
        | GridError::InvalidMode(_)
        | GridError::InvalidSearchOptions(_) => EXIT_USAGE,
        GridError::Write { .. } => EXIT_WRITE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_FILE_ACCESS, EXIT_SHEET_NOT_FOUND, EXIT_WRITE];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_grid_exit_code() {
        assert_eq!(grid_exit_code(&GridError::file_access("a.xlsx", "gone")), EXIT_FILE_ACCESS);
        assert_eq!(grid_exit_code(&GridError::SheetNotFound("S".into())), EXIT_SHEET_NOT_FOUND);
        assert_eq!(grid_exit_code(&GridError::InvalidMode("r".into())), EXIT_USAGE);
        assert_eq!(grid_exit_code(&GridError::write("b.xlsx", "denied")), EXIT_WRITE);
    }
}
