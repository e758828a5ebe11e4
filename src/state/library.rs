use chrono::{Datelike, Local, NaiveDateTime, SubsecRound};
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

use super::data::{BookField, BookId, BookRecord, NewBook};
use super::error::{LibraryError, LibraryResult, ValidationError};
use super::notify;
use super::reconcile::{ApplyReport, Changeset, FieldUpdate, OnFailure, PendingWrite};

const SELECT_BOOKS: &str = "SELECT id, title, author, isbn, genre, pages, published_year, \
     date_added, status, rating, notes FROM books";

/// Result of a successful insert
#[derive(Debug, Clone, PartialEq)]
pub struct Inserted {
    pub id: BookId,
    /// Message from the notification rules for the new book, if any
    pub notification: Option<String>,
}

/// The Library manages the SQLite catalog database.
/// It owns every book record; everything else works on snapshots from `list_all`.
///
/// Each call commits before returning. There is a single connection and no
/// locking across processes: two sessions editing the same book overwrite
/// each other field by field (last write wins).
pub struct Library {
    conn: Connection,
    db_path: Option<PathBuf>,
}

impl Library {
    /// Open (or create) the catalog file at `path`.
    ///
    /// This does not create tables; call [`Library::init_schema`] once
    /// before first use.
    pub fn open(path: &Path) -> LibraryResult<Self> {
        // Ensure the parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "catalog opened");

        Ok(Library {
            conn,
            db_path: Some(path.to_path_buf()),
        })
    }

    /// Open a private in-memory catalog
    #[cfg(test)]
    pub fn open_in_memory() -> LibraryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Library { conn, db_path: None })
    }

    /// Initialize the database schema.
    /// Safe to call on an already initialized catalog.
    pub fn init_schema(&self) -> LibraryResult<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS books (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                author          TEXT,
                isbn            TEXT,
                genre           TEXT NOT NULL DEFAULT '',
                pages           INTEGER NOT NULL,
                published_year  INTEGER NOT NULL,
                date_added      TEXT NOT NULL,
                status          TEXT NOT NULL DEFAULT 'Available',
                rating          INTEGER,
                notes           TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_books_title ON books(title);",
        )?;

        tracing::info!("catalog schema initialized");
        Ok(())
    }

    /// Path of the database file (None for in-memory catalogs)
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Number of books in the catalog
    pub fn count(&self) -> LibraryResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Add a new book.
    /// Assigns the id and `date_added`; the status starts as Available.
    pub fn insert(&self, book: &NewBook) -> LibraryResult<Inserted> {
        book.validate(Local::now().year())?;

        let date_added = Local::now().naive_local().trunc_subsecs(0);
        let record = book.clone().into_record(0, date_added);

        self.conn.execute(
            "INSERT INTO books
                (title, author, isbn, genre, pages, published_year,
                 date_added, status, rating, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.title,
                record.author,
                record.isbn,
                record.genre,
                record.pages,
                record.published_year,
                record.date_added,
                record.status,
                record.rating,
                record.notes,
            ],
        )?;

        let record = BookRecord {
            id: self.conn.last_insert_rowid(),
            ..record
        };
        tracing::debug!(id = record.id, title = %record.title, "book inserted");

        Ok(Inserted {
            id: record.id,
            notification: notify::evaluate(&record),
        })
    }

    /// Get every book, sorted by title (byte order), ties by id
    pub fn list_all(&self) -> LibraryResult<Vec<BookRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_BOOKS} ORDER BY title ASC, id ASC"))?;

        let books = stmt
            .query_map([], row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    /// Overwrite a single field of one book.
    ///
    /// Only the title is checked (it may never be empty); other values are
    /// written as given.
    pub fn update_field(&self, id: BookId, field: &BookField) -> LibraryResult<()> {
        if let BookField::Title(title) = field {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyTitle.into());
            }
        }

        let column = field.name().column();
        let changed = self.conn.execute(
            &format!("UPDATE books SET {column} = ?1 WHERE id = ?2"),
            params![field.sql_value(), id],
        )?;

        if changed == 0 {
            return Err(LibraryError::NotFound(id));
        }

        tracing::debug!(id, column, "book field updated");
        Ok(())
    }

    /// Remove a book permanently.
    /// Unknown ids are a no-op; returns whether a row was removed.
    pub fn delete(&self, id: BookId) -> LibraryResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1", params![id])?;

        tracing::debug!(id, removed, "book deleted");
        Ok(removed > 0)
    }

    /// Apply a reconciled changeset: deletions first, then field updates.
    ///
    /// Every write commits on its own. This is best effort: when a write
    /// fails, the ones before it stay applied.
    pub fn apply_changeset(&self, changeset: &Changeset, on_failure: OnFailure) -> ApplyReport {
        let mut report = ApplyReport::default();

        for &id in &changeset.deletions {
            match self.delete(id) {
                Ok(removed) => report.deleted += usize::from(removed),
                Err(e) => {
                    tracing::warn!(id, error = %e, "delete failed");
                    report.failures.push((PendingWrite::Delete(id), e));
                    if on_failure == OnFailure::Abort {
                        return report;
                    }
                }
            }
        }

        for FieldUpdate { id, field } in &changeset.updates {
            match self.update_field(*id, field) {
                Ok(()) => report.updated += 1,
                Err(e) => {
                    let column = field.name().column();
                    tracing::warn!(id, column, error = %e, "update failed");
                    let write = PendingWrite::Update(FieldUpdate {
                        id: *id,
                        field: field.clone(),
                    });
                    report.failures.push((write, e));
                    if on_failure == OnFailure::Abort {
                        return report;
                    }
                }
            }
        }

        report.completed = true;
        report
    }
}

fn row_to_book(row: &Row<'_>) -> rusqlite::Result<BookRecord> {
    Ok(BookRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        isbn: row.get(3)?,
        genre: row.get(4)?,
        pages: row.get(5)?,
        published_year: row.get(6)?,
        date_added: row.get::<_, NaiveDateTime>(7)?,
        status: row.get(8)?,
        rating: row.get(9)?,
        notes: row.get(10)?,
    })
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
