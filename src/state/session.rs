/// Per-session context
///
/// Bundles the catalog with the session's notification slot so the UI
/// passes one explicit value around instead of sharing global state.
use super::data::{BookId, NewBook};
use super::error::LibraryResult;
use super::library::Library;
use super::notify::NotificationSlot;

#[derive(Debug)]
pub struct Session {
    library: Library,
    notifications: NotificationSlot,
}

impl Session {
    pub fn new(library: Library) -> Self {
        Self {
            library,
            notifications: NotificationSlot::new(),
        }
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    /// Insert a book and queue its notification, if the rules produce one
    pub fn add_book(&mut self, book: &NewBook) -> LibraryResult<BookId> {
        let inserted = self.library.insert(book)?;
        if let Some(message) = inserted.notification {
            self.notifications.set(message);
        }
        Ok(inserted.id)
    }

    /// Pending notification, cleared on read. Call once per render.
    pub fn take_notification(&mut self) -> Option<String> {
        self.notifications.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::error::LibraryError;

    fn session() -> Session {
        let library = Library::open_in_memory().unwrap();
        library.init_schema().unwrap();
        Session::new(library)
    }

    #[test]
    fn test_notification_surfaces_once() {
        let mut session = session();
        session
            .add_book(&NewBook::titled("Dune", 2000).with_genre("Science Fiction"))
            .unwrap();

        let message = session.take_notification().unwrap();
        assert!(message.contains("Dune"));
        assert_eq!(session.take_notification(), None);
    }

    #[test]
    fn test_quiet_insert_keeps_slot_empty() {
        let mut session = session();
        session
            .add_book(&NewBook::titled("Dragons", 2000).with_genre("Fantasy"))
            .unwrap();
        assert_eq!(session.take_notification(), None);
        assert_eq!(session.library().count().unwrap(), 1);
    }

    #[test]
    fn test_latest_notification_wins() {
        let mut session = session();
        session.add_book(&NewBook::titled("Leaves", 2000).with_genre("Poetry")).unwrap();
        session.add_book(&NewBook::titled("Cook Book", 2000)).unwrap();

        let message = session.take_notification().unwrap();
        assert!(message.contains("Cook Book"));
        assert_eq!(session.take_notification(), None);
    }

    #[test]
    fn test_failed_insert_leaves_slot_alone() {
        let mut session = session();
        let err = session
            .add_book(&NewBook::titled("", 2000).with_genre("Poetry"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(_)));
        assert_eq!(session.take_notification(), None);
    }
}
