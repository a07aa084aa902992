use thiserror::Error;

/// Failure taxonomy shared by every grid operation.
///
/// Messages are written for the automation host, which reports them verbatim
/// as the operation's failure reason.
#[derive(Debug, Error)]
pub enum GridError {
    /// Source workbook missing or unreadable.
    #[error("Error accessing excel file [{path}]: {reason}")]
    FileAccess { path: String, reason: String },

    /// A named sheet is absent from the workbook.
    #[error("sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("invalid update batch: {0}")]
    InvalidBatch(String),

    #[error("invalid access mode '{0}': valid modes are 'w', 'a', and 'i'")]
    InvalidMode(String),

    /// Reserved. Unknown option characters are ignored rather than rejected.
    #[error("invalid search options: {0}")]
    InvalidSearchOptions(String),

    /// Destination could not be persisted.
    #[error("Error updating excel file [{path}]: {reason}")]
    Write { path: String, reason: String },
}

impl GridError {
    pub fn file_access(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::FileAccess { path: path.into(), reason: reason.to_string() }
    }

    pub fn write(path: impl Into<String>, reason: impl ToString) -> Self {
        Self::Write { path: path.into(), reason: reason.to_string() }
    }

    /// Stable snake_case tag for machine-readable output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FileAccess { .. } => "file_access",
            Self::SheetNotFound(_) => "sheet_not_found",
            Self::InvalidRange(_) => "invalid_range",
            Self::InvalidBatch(_) => "invalid_batch",
            Self::InvalidMode(_) => "invalid_mode",
            Self::InvalidSearchOptions(_) => "invalid_search_options",
            Self::Write { .. } => "write",
        }
    }
}
