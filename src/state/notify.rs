/// Notifications for newly added books
///
/// - `evaluate` maps a freshly inserted record to at most one message
/// - `NotificationSlot` holds that message until the UI shows it
use super::data::BookRecord;

/// Derive a message for a book that was just inserted.
/// Rules are checked in order and the first match wins.
pub fn evaluate(record: &BookRecord) -> Option<String> {
    let title = &record.title;

    match record.genre.as_str() {
        "Poetry" => Some(format!("📜 \"{title}\" joins your poetry shelf.")),
        "Science Fiction" => Some(format!("🚀 New sci-fi arrival: \"{title}\"!")),
        _ if record.genre == "Cookbook" || title.to_lowercase().contains("cook") => {
            Some(format!("🍳 \"{title}\" added to your cooking resources."))
        }
        _ => None,
    }
}

/// Holds at most one pending message for a single session.
///
/// `take` clears the slot, so each message is surfaced exactly once.
#[derive(Debug, Default)]
pub struct NotificationSlot {
    pending: Option<String>,
}

impl NotificationSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever is pending
    pub fn set(&mut self, message: impl Into<String>) {
        self.pending = Some(message.into());
    }

    /// Read and clear
    pub fn take(&mut self) -> Option<String> {
        self.pending.take()
    }
}
