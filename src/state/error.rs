/// Error types for the catalog core
use thiserror::Error;

use super::data::BookId;

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Failures from the record store
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("invalid book: {0}")]
    Validation(#[from] ValidationError),

    #[error("book {0} not found")]
    NotFound(BookId),

    #[error("unknown field: {0}")]
    InvalidField(String),

    #[error("could not prepare database location: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Insert rules a new book must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title is required")]
    EmptyTitle,

    #[error("pages must be between 1 and 5000 (got {0})")]
    PagesOutOfRange(u32),

    #[error("published year must be between 1800 and {max} (got {year})")]
    YearOutOfRange { year: i32, max: i32 },

    #[error("rating must be between 1 and 5 (got {0})")]
    RatingOutOfRange(u8),

    #[error("unknown genre: {0:?}")]
    UnknownGenre(String),
}

/// An edited snapshot that cannot be matched against its original
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("edited row {0} has no original row; new books must go through insert")]
    UnmatchedRow(BookId),

    #[error("edited snapshot contains book {0} more than once")]
    DuplicateRow(BookId),

    #[error("book {0} is marked for deletion but is not in the original snapshot")]
    UnknownSelection(BookId),
}

#[derive(Debug, Error)]
#[error("unknown status: {0:?}")]
pub struct UnknownStatus(pub String);
