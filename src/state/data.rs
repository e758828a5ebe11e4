/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the database layer and the UI layer.
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;
use std::str::FromStr;

use super::error::{LibraryError, UnknownStatus, ValidationError};

/// Database identifier of a book, assigned by the library on insert
pub type BookId = i64;

/// Page count bounds accepted on insert
pub const MIN_PAGES: u32 = 1;
pub const MAX_PAGES: u32 = 5000;

/// Earliest accepted publication year (latest is the current year)
pub const MIN_YEAR: i32 = 1800;

/// Rating bounds (stars)
pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Recognized genres. The empty string means "unspecified".
pub const GENRES: [&str; 12] = [
    "",
    "Fiction",
    "Non-Fiction",
    "Science Fiction",
    "Fantasy",
    "Mystery",
    "Biography",
    "History",
    "Self-Help",
    "Poetry",
    "Cookbook",
    "Other",
];

pub fn is_known_genre(genre: &str) -> bool {
    GENRES.contains(&genre)
}

/// Turn user text into an optional column value: blank input is stored as NULL
pub fn blank_to_none(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Lending/reading status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Status {
    #[default]
    Available,
    Reading,
    Finished,
    Lent,
    Lost,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Available,
        Status::Reading,
        Status::Finished,
        Status::Lent,
        Status::Lost,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Available => "Available",
            Status::Reading => "Reading",
            Status::Finished => "Finished",
            Status::Lent => "Lent",
            Status::Lost => "Lost",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// Stored as its display string so the table stays readable in any SQLite shell
impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Represents a single book in the library
#[derive(Debug, Clone, PartialEq)]
pub struct BookRecord {
    /// Unique database ID, never changes
    pub id: BookId,
    /// Never empty
    pub title: String,
    pub author: Option<String>,
    /// Free-form, not validated
    pub isbn: Option<String>,
    /// One of [`GENRES`] when entered through the form ("" = unspecified)
    pub genre: String,
    pub pages: u32,
    pub published_year: i32,
    /// Set once on insert
    pub date_added: NaiveDateTime,
    pub status: Status,
    /// 1-5 stars, if rated
    pub rating: Option<u8>,
    pub notes: Option<String>,
}

impl BookRecord {
    /// Current value of one editable field, as a typed update
    pub fn field(&self, name: FieldName) -> BookField {
        match name {
            FieldName::Title => BookField::Title(self.title.clone()),
            FieldName::Author => BookField::Author(self.author.clone()),
            FieldName::Isbn => BookField::Isbn(self.isbn.clone()),
            FieldName::Genre => BookField::Genre(self.genre.clone()),
            FieldName::Pages => BookField::Pages(self.pages),
            FieldName::PublishedYear => BookField::PublishedYear(self.published_year),
            FieldName::Status => BookField::Status(self.status),
            FieldName::Rating => BookField::Rating(self.rating),
            FieldName::Notes => BookField::Notes(self.notes.clone()),
        }
    }

    /// Overwrite one editable field in this in-memory copy
    pub fn set(&mut self, field: BookField) {
        match field {
            BookField::Title(v) => self.title = v,
            BookField::Author(v) => self.author = v,
            BookField::Isbn(v) => self.isbn = v,
            BookField::Genre(v) => self.genre = v,
            BookField::Pages(v) => self.pages = v,
            BookField::PublishedYear(v) => self.published_year = v,
            BookField::Status(v) => self.status = v,
            BookField::Rating(v) => self.rating = v,
            BookField::Notes(v) => self.notes = v,
        }
    }
}

/// Input for a new book. `id`, `date_added` and `status` are assigned by the library.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub genre: String,
    pub pages: u32,
    pub published_year: i32,
    pub rating: Option<u8>,
    pub notes: Option<String>,
}

// Test helpers
#[cfg(test)]
impl NewBook {
    /// A book with the given title and the add-form defaults for everything else
    pub fn titled(title: impl Into<String>, current_year: i32) -> Self {
        Self {
            title: title.into(),
            author: None,
            isbn: None,
            genre: String::new(),
            pages: 300,
            published_year: current_year,
            rating: None,
            notes: None,
        }
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = genre.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }
}

impl NewBook {
    /// Check every insert rule. `current_year` bounds the publication year.
    pub fn validate(&self, current_year: i32) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if !(MIN_PAGES..=MAX_PAGES).contains(&self.pages) {
            return Err(ValidationError::PagesOutOfRange(self.pages));
        }
        if !(MIN_YEAR..=current_year).contains(&self.published_year) {
            return Err(ValidationError::YearOutOfRange {
                year: self.published_year,
                max: current_year,
            });
        }
        if let Some(rating) = self.rating {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(ValidationError::RatingOutOfRange(rating));
            }
        }
        if !is_known_genre(&self.genre) {
            return Err(ValidationError::UnknownGenre(self.genre.clone()));
        }
        Ok(())
    }

    /// The record as it exists right after insertion
    pub fn into_record(self, id: BookId, date_added: NaiveDateTime) -> BookRecord {
        BookRecord {
            id,
            title: self.title.trim().to_string(),
            author: self.author.as_deref().and_then(blank_to_none),
            isbn: self.isbn.as_deref().and_then(blank_to_none),
            genre: self.genre,
            pages: self.pages,
            published_year: self.published_year,
            date_added,
            status: Status::default(),
            rating: self.rating,
            notes: self.notes.as_deref().and_then(blank_to_none),
        }
    }
}

/// Names of the editable columns, in declaration order.
/// `id` and `date_added` are not editable and have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldName {
    Title,
    Author,
    Isbn,
    Genre,
    Pages,
    PublishedYear,
    Status,
    Rating,
    Notes,
}

impl FieldName {
    pub const ALL: [FieldName; 9] = [
        FieldName::Title,
        FieldName::Author,
        FieldName::Isbn,
        FieldName::Genre,
        FieldName::Pages,
        FieldName::PublishedYear,
        FieldName::Status,
        FieldName::Rating,
        FieldName::Notes,
    ];

    /// SQL column name
    pub fn column(&self) -> &'static str {
        match self {
            FieldName::Title => "title",
            FieldName::Author => "author",
            FieldName::Isbn => "isbn",
            FieldName::Genre => "genre",
            FieldName::Pages => "pages",
            FieldName::PublishedYear => "published_year",
            FieldName::Status => "status",
            FieldName::Rating => "rating",
            FieldName::Notes => "notes",
        }
    }

    /// Column header shown in the grid
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::Title => "Title",
            FieldName::Author => "Author",
            FieldName::Isbn => "ISBN",
            FieldName::Genre => "Genre",
            FieldName::Pages => "Pages",
            FieldName::PublishedYear => "Year",
            FieldName::Status => "Status",
            FieldName::Rating => "Rating (1-5)",
            FieldName::Notes => "Notes",
        }
    }
}

impl FromStr for FieldName {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldName::ALL
            .into_iter()
            .find(|name| name.column() == s)
            .ok_or_else(|| LibraryError::InvalidField(s.to_string()))
    }
}

/// A single-field update with its new value.
///
/// One variant per editable column, so an update can never name
/// a field that does not exist.
#[derive(Debug, Clone, PartialEq)]
pub enum BookField {
    Title(String),
    Author(Option<String>),
    Isbn(Option<String>),
    Genre(String),
    Pages(u32),
    PublishedYear(i32),
    Status(Status),
    Rating(Option<u8>),
    Notes(Option<String>),
}

impl BookField {
    pub fn name(&self) -> FieldName {
        match self {
            BookField::Title(_) => FieldName::Title,
            BookField::Author(_) => FieldName::Author,
            BookField::Isbn(_) => FieldName::Isbn,
            BookField::Genre(_) => FieldName::Genre,
            BookField::Pages(_) => FieldName::Pages,
            BookField::PublishedYear(_) => FieldName::PublishedYear,
            BookField::Status(_) => FieldName::Status,
            BookField::Rating(_) => FieldName::Rating,
            BookField::Notes(_) => FieldName::Notes,
        }
    }

    /// The new value, ready to bind as a statement parameter
    pub fn sql_value(&self) -> &dyn ToSql {
        match self {
            BookField::Title(v) | BookField::Genre(v) => v as &dyn ToSql,
            BookField::Author(v) | BookField::Isbn(v) | BookField::Notes(v) => v as &dyn ToSql,
            BookField::Pages(v) => v as &dyn ToSql,
            BookField::PublishedYear(v) => v as &dyn ToSql,
            BookField::Status(v) => v as &dyn ToSql,
            BookField::Rating(v) => v as &dyn ToSql,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("Borrowed".parse::<Status>().is_err());
        assert_eq!(Status::default(), Status::Available);
    }

    #[test]
    fn test_field_name_lookup() {
        assert_eq!("published_year".parse::<FieldName>().unwrap(), FieldName::PublishedYear);
        assert!(matches!(
            "_selected".parse::<FieldName>(),
            Err(LibraryError::InvalidField(name)) if name == "_selected"
        ));
        // id and date_added are never editable
        assert!("id".parse::<FieldName>().is_err());
        assert!("date_added".parse::<FieldName>().is_err());
    }

    #[test]
    fn test_validate_rules() {
        let ok = NewBook::titled("Dune", 2024);
        assert_eq!(ok.validate(2024), Ok(()));

        let blank = NewBook::titled("   ", 2024);
        assert_eq!(blank.validate(2024), Err(ValidationError::EmptyTitle));

        let mut pages = ok.clone();
        pages.pages = 0;
        assert_eq!(pages.validate(2024), Err(ValidationError::PagesOutOfRange(0)));
        pages.pages = 5001;
        assert_eq!(pages.validate(2024), Err(ValidationError::PagesOutOfRange(5001)));

        let mut year = ok.clone();
        year.published_year = 2025;
        assert_eq!(
            year.validate(2024),
            Err(ValidationError::YearOutOfRange { year: 2025, max: 2024 })
        );
        year.published_year = 1799;
        assert!(year.validate(2024).is_err());

        let mut rating = ok.clone();
        rating.rating = Some(6);
        assert_eq!(rating.validate(2024), Err(ValidationError::RatingOutOfRange(6)));

        let genre = ok.with_genre("Cyberpunk");
        assert_eq!(
            genre.validate(2024),
            Err(ValidationError::UnknownGenre("Cyberpunk".into()))
        );
    }

    #[test]
    fn test_field_get_set() {
        let date =
            NaiveDateTime::parse_from_str("2024-03-01 10:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let mut record = NewBook::titled("Dune", 2024).into_record(7, date);
        assert_eq!(record.status, Status::Available);

        record.set(BookField::Status(Status::Lent));
        assert_eq!(record.field(FieldName::Status), BookField::Status(Status::Lent));
        for name in FieldName::ALL {
            assert_eq!(record.field(name).name(), name);
        }
    }

    #[test]
    fn test_blank_to_none() {
        assert_eq!(blank_to_none("  "), None);
        assert_eq!(blank_to_none(" Le Guin "), Some("Le Guin".to_string()));
    }
}
