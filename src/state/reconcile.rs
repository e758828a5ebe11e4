/// Snapshot reconciliation
///
/// The grid edits a copy of the rows last read from the library.
/// On save, `reconcile` compares that copy against the original snapshot
/// and produces the per-field writes and deletions needed to persist it.
/// Rows are always matched by id, never by position.
use std::collections::{BTreeSet, HashMap, HashSet};

use super::data::{BookField, BookId, BookRecord, FieldName};
use super::error::{LibraryError, ReconcileError};

/// One field of one book to overwrite
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub id: BookId,
    pub field: BookField,
}

/// Writes needed to turn the original snapshot into the edited one
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    /// Edited-row order, then field declaration order
    pub updates: Vec<FieldUpdate>,
    /// Never overlaps with the ids in `updates`
    pub deletions: BTreeSet<BookId>,
}

impl Changeset {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.deletions.is_empty()
    }
}

/// Diff `edited` against `original`.
///
/// A book is deleted if it is missing from `edited` or its id is in
/// `marked_for_deletion`. Marked rows are not diffed.
pub fn reconcile(
    original: &[BookRecord],
    edited: &[BookRecord],
    marked_for_deletion: &BTreeSet<BookId>,
) -> Result<Changeset, ReconcileError> {
    let originals: HashMap<BookId, &BookRecord> =
        original.iter().map(|record| (record.id, record)).collect();

    if let Some(&id) = marked_for_deletion
        .iter()
        .find(|id| !originals.contains_key(id))
    {
        return Err(ReconcileError::UnknownSelection(id));
    }

    let mut seen = HashSet::with_capacity(edited.len());
    let mut updates = Vec::new();

    for row in edited {
        if !seen.insert(row.id) {
            return Err(ReconcileError::DuplicateRow(row.id));
        }
        let base = originals
            .get(&row.id)
            .ok_or(ReconcileError::UnmatchedRow(row.id))?;

        if marked_for_deletion.contains(&row.id) {
            continue;
        }

        for name in FieldName::ALL {
            let value = row.field(name);
            if value != base.field(name) {
                updates.push(FieldUpdate { id: row.id, field: value });
            }
        }
    }

    let mut deletions = marked_for_deletion.clone();
    deletions.extend(
        original
            .iter()
            .map(|record| record.id)
            .filter(|id| !seen.contains(id)),
    );

    Ok(Changeset { updates, deletions })
}

/// What to do when one write of a changeset fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnFailure {
    /// Stop at the first failed write
    Abort,
    /// Record the failure and keep applying the rest
    Continue,
}

/// A single write from a changeset
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Update(FieldUpdate),
    Delete(BookId),
}

/// Outcome of applying a changeset.
///
/// Writes are independent: earlier writes stay applied when a later one fails.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<(PendingWrite, LibraryError)>,
    /// False if `OnFailure::Abort` stopped early
    pub completed: bool,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.completed && self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{NewBook, Status};
    use chrono::NaiveDateTime;

    fn book(id: BookId, title: &str) -> BookRecord {
        let date =
            NaiveDateTime::parse_from_str("2024-01-01 12:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        NewBook::titled(title, 2024).into_record(id, date)
    }

    fn none() -> BTreeSet<BookId> {
        BTreeSet::new()
    }

    #[test]
    fn test_single_status_change() {
        let original = vec![book(1, "A"), book(2, "B")];
        let mut edited = original.clone();
        edited[0].status = Status::Reading;

        let changes = reconcile(&original, &edited, &none()).unwrap();
        assert_eq!(
            changes.updates,
            vec![FieldUpdate { id: 1, field: BookField::Status(Status::Reading) }]
        );
        assert!(changes.deletions.is_empty());
    }

    #[test]
    fn test_removed_row_is_deleted() {
        let original = vec![book(1, "A"), book(2, "B")];
        let edited = vec![original[0].clone()];

        let changes = reconcile(&original, &edited, &none()).unwrap();
        assert!(changes.updates.is_empty());
        assert_eq!(changes.deletions, BTreeSet::from([2]));
    }

    #[test]
    fn test_unchanged_snapshot_is_empty() {
        let original = vec![book(1, "A"), book(2, "B")];
        let changes = reconcile(&original, &original, &none()).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn test_matches_by_id_not_position() {
        let original = vec![book(1, "A"), book(2, "B")];
        let mut edited = vec![original[1].clone(), original[0].clone()];
        edited[0].notes = Some("signed copy".into());

        let changes = reconcile(&original, &edited, &none()).unwrap();
        assert_eq!(
            changes.updates,
            vec![FieldUpdate { id: 2, field: BookField::Notes(Some("signed copy".into())) }]
        );
        assert!(changes.deletions.is_empty());
    }

    #[test]
    fn test_updates_follow_row_then_field_order() {
        let original = vec![book(1, "A"), book(2, "B")];
        let mut edited = vec![original[1].clone(), original[0].clone()];
        edited[0].rating = Some(4);
        edited[0].title = "B2".into();
        edited[1].pages = 120;

        let changes = reconcile(&original, &edited, &none()).unwrap();
        assert_eq!(
            changes.updates,
            vec![
                FieldUpdate { id: 2, field: BookField::Title("B2".into()) },
                FieldUpdate { id: 2, field: BookField::Rating(Some(4)) },
                FieldUpdate { id: 1, field: BookField::Pages(120) },
            ]
        );
    }

    #[test]
    fn test_date_added_is_never_diffed() {
        let original = vec![book(1, "A")];
        let mut edited = original.clone();
        edited[0].date_added =
            NaiveDateTime::parse_from_str("1999-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        assert!(reconcile(&original, &edited, &none()).unwrap().is_empty());
    }

    #[test]
    fn test_marked_rows_are_deleted_not_diffed() {
        let original = vec![book(1, "A"), book(2, "B")];
        let mut edited = original.clone();
        edited[0].status = Status::Lost;
        edited[1].status = Status::Lent;

        let changes = reconcile(&original, &edited, &BTreeSet::from([1])).unwrap();
        assert_eq!(
            changes.updates,
            vec![FieldUpdate { id: 2, field: BookField::Status(Status::Lent) }]
        );
        assert_eq!(changes.deletions, BTreeSet::from([1]));
    }

    #[test]
    fn test_new_row_is_rejected() {
        let original = vec![book(1, "A")];
        let edited = vec![book(1, "A"), book(3, "Sneaky")];

        assert_eq!(
            reconcile(&original, &edited, &none()),
            Err(ReconcileError::UnmatchedRow(3))
        );
    }

    #[test]
    fn test_duplicate_row_is_rejected() {
        let original = vec![book(1, "A")];
        let edited = vec![book(1, "A"), book(1, "A again")];

        assert_eq!(
            reconcile(&original, &edited, &none()),
            Err(ReconcileError::DuplicateRow(1))
        );
    }

    #[test]
    fn test_unknown_selection_is_rejected() {
        let original = vec![book(1, "A")];
        assert_eq!(
            reconcile(&original, &original, &BTreeSet::from([9])),
            Err(ReconcileError::UnknownSelection(9))
        );
    }

    #[test]
    fn test_applying_updates_reproduces_edit() {
        let original = vec![book(1, "A"), book(2, "B")];
        let mut edited = original.clone();
        edited[0].author = Some("Ursula K. Le Guin".into());
        edited[1].genre = "Fantasy".into();
        edited[1].status = Status::Finished;

        let changes = reconcile(&original, &edited, &none()).unwrap();
        let mut replayed = original.clone();
        for update in changes.updates {
            let row = replayed.iter_mut().find(|r| r.id == update.id).unwrap();
            row.set(update.field);
        }
        assert_eq!(replayed, edited);
    }
}
