use chrono::{Datelike, Local};
use iced::widget::{
    button, canvas, checkbox, column, container, pick_list, row, scrollable, text, text_input,
    Column, Row,
};
use iced::{Alignment, Color, Element, Length, Task, Theme};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

// Declare the modules
mod config;
mod state;
mod ui;

use state::data::{blank_to_none, BookField, BookId, BookRecord, FieldName, NewBook, Status, GENRES};
use state::error::LibraryError;
use state::library::Library;
use state::reconcile::{reconcile, ApplyReport, OnFailure};
use state::search::{self, GenreFilter, SearchFilter};
use state::session::Session;
use state::stats::LibraryStats;
use ui::chart::BarChart;

/// Errors that stop the application before the window opens
#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Library(#[from] LibraryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Tab {
    #[default]
    AllBooks,
    Search,
    Statistics,
}

/// Genre entry in pick lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct GenreChoice(&'static str);

impl fmt::Display for GenreChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(self.0)
        }
    }
}

fn genre_choices() -> Vec<GenreChoice> {
    GENRES.into_iter().map(GenreChoice).collect()
}

/// Rating entry in pick lists; `None` clears the rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RatingChoice(Option<u8>);

const RATING_CHOICES: [RatingChoice; 6] = [
    RatingChoice(None),
    RatingChoice(Some(1)),
    RatingChoice(Some(2)),
    RatingChoice(Some(3)),
    RatingChoice(Some(4)),
    RatingChoice(Some(5)),
];

impl fmt::Display for RatingChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(stars) => f.write_str(&"★".repeat(usize::from(stars))),
            None => f.write_str("-"),
        }
    }
}

/// Sidebar form, kept as raw text until submitted
#[derive(Debug, Clone)]
struct AddForm {
    title: String,
    author: String,
    isbn: String,
    genre: GenreChoice,
    pages: String,
    year: String,
    rating: RatingChoice,
    notes: String,
}

impl AddForm {
    fn new() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            genre: GenreChoice(""),
            pages: "300".to_string(),
            year: Local::now().year().to_string(),
            rating: RatingChoice(None),
            notes: String::new(),
        }
    }

    fn to_new_book(&self) -> Result<NewBook, String> {
        let pages = self
            .pages
            .trim()
            .parse()
            .map_err(|_| "Pages must be a whole number".to_string())?;
        let published_year = self
            .year
            .trim()
            .parse()
            .map_err(|_| "Published year must be a whole number".to_string())?;

        Ok(NewBook {
            title: self.title.clone(),
            author: blank_to_none(&self.author),
            isbn: blank_to_none(&self.isbn),
            genre: self.genre.0.to_string(),
            pages,
            published_year,
            rating: self.rating.0,
            notes: blank_to_none(&self.notes),
        })
    }
}

/// Main application state
struct Bookshelf {
    /// The catalog and this session's notification slot
    session: Session,
    /// Grid columns from the settings file
    columns: Vec<FieldName>,
    tab: Tab,
    form: AddForm,
    /// Rows as last read from the catalog
    snapshot: Vec<BookRecord>,
    /// Working copy shown in the grid
    edited: Vec<BookRecord>,
    /// Rows ticked for "Delete Selected"
    selected: BTreeSet<BookId>,
    search: SearchFilter,
    /// Status message to display to the user
    status: String,
    /// Notification taken from the session after the last update
    banner: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    SelectTab(Tab),

    FormTitle(String),
    FormAuthor(String),
    FormIsbn(String),
    FormGenre(GenreChoice),
    FormPages(String),
    FormYear(String),
    FormRating(RatingChoice),
    FormNotes(String),
    AddBook,

    /// A cell of the grid was edited (not saved yet)
    EditCell(BookId, BookField),
    /// Text typed into a numeric cell that is not a number
    NotANumber(FieldName),
    ToggleSelected(BookId, bool),
    RemoveRow(BookId),
    SaveChanges,
    DeleteSelected,
    DiscardEdits,

    SearchTerm(String),
    SearchGenre(GenreFilter),
}

impl Bookshelf {
    /// Create a new instance of the application
    fn new(session: Session, columns: Vec<FieldName>) -> (Self, Task<Message>) {
        let mut app = Bookshelf {
            session,
            columns,
            tab: Tab::default(),
            form: AddForm::new(),
            snapshot: Vec::new(),
            edited: Vec::new(),
            selected: BTreeSet::new(),
            search: SearchFilter::default(),
            status: String::new(),
            banner: None,
        };
        app.refresh();

        tracing::info!(books = app.snapshot.len(), "library manager initialized");
        app.status = format!("Ready. {} books in your library.", app.snapshot.len());

        (app, Task::none())
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SelectTab(tab) => self.tab = tab,

            Message::FormTitle(value) => self.form.title = value,
            Message::FormAuthor(value) => self.form.author = value,
            Message::FormIsbn(value) => self.form.isbn = value,
            Message::FormGenre(value) => self.form.genre = value,
            Message::FormPages(value) => self.form.pages = value,
            Message::FormYear(value) => self.form.year = value,
            Message::FormRating(value) => self.form.rating = value,
            Message::FormNotes(value) => self.form.notes = value,
            Message::AddBook => self.add_book(),

            Message::EditCell(id, field) => {
                if let Some(row) = self.edited.iter_mut().find(|row| row.id == id) {
                    row.set(field);
                }
            }
            Message::NotANumber(name) => {
                self.status = format!("❌ {} must be a whole number", name.label());
            }
            Message::ToggleSelected(id, checked) => {
                if checked {
                    self.selected.insert(id);
                } else {
                    self.selected.remove(&id);
                }
            }
            Message::RemoveRow(id) => {
                self.edited.retain(|row| row.id != id);
                self.selected.remove(&id);
            }
            Message::SaveChanges => self.save_changes(),
            Message::DeleteSelected => self.delete_selected(),
            Message::DiscardEdits => {
                self.edited = self.snapshot.clone();
                self.status = "Edits discarded.".to_string();
            }

            Message::SearchTerm(term) => self.search.term = term,
            Message::SearchGenre(genre) => self.search.genre = genre,
        }

        // Each processed message is one render cycle: surface the pending
        // notification exactly once.
        self.banner = self.session.take_notification();

        Task::none()
    }

    fn add_book(&mut self) {
        let book = match self.form.to_new_book() {
            Ok(book) => book,
            Err(message) => {
                self.status = format!("❌ {message}");
                return;
            }
        };

        match self.session.add_book(&book) {
            Ok(id) => {
                tracing::info!(id, title = %book.title, "book added");
                self.status = "✅ Book added successfully!".to_string();
                self.form = AddForm::new();
                self.refresh();
            }
            Err(e) => self.status = format!("❌ {e}"),
        }
    }

    fn save_changes(&mut self) {
        let changes = match reconcile(&self.snapshot, &self.edited, &BTreeSet::new()) {
            Ok(changes) => changes,
            Err(e) => {
                tracing::warn!(error = %e, "edited rows do not match the catalog");
                self.status = format!("❌ {e}");
                return;
            }
        };

        if changes.is_empty() {
            self.status = "Nothing to save.".to_string();
            return;
        }

        let report = self
            .session
            .library()
            .apply_changeset(&changes, OnFailure::Continue);
        self.status = describe(&report, "Changes saved!");
        self.refresh();
    }

    fn delete_selected(&mut self) {
        if self.selected.is_empty() {
            self.status = "No books selected.".to_string();
            return;
        }

        // Diff the snapshot against itself so only the selection is written
        let changes = match reconcile(&self.snapshot, &self.snapshot, &self.selected) {
            Ok(changes) => changes,
            Err(e) => {
                self.status = format!("❌ {e}");
                return;
            }
        };

        let report = self
            .session
            .library()
            .apply_changeset(&changes, OnFailure::Continue);
        self.status = describe(&report, &format!("Deleted {} books!", report.deleted));
        self.selected.clear();
        self.refresh();
    }

    /// Reload the snapshot, carrying unsaved grid edits over to the new rows
    fn refresh(&mut self) {
        let books = match self.session.library().list_all() {
            Ok(books) => books,
            Err(e) => {
                tracing::warn!(error = %e, "could not load books");
                self.status = format!("❌ Could not load books: {e}");
                return;
            }
        };

        let pending: HashMap<BookId, BookRecord> =
            self.edited.drain(..).map(|row| (row.id, row)).collect();
        let removed: HashSet<BookId> = self
            .snapshot
            .iter()
            .map(|row| row.id)
            .filter(|id| !pending.contains_key(id))
            .collect();

        self.edited = books
            .iter()
            .filter(|book| !removed.contains(&book.id))
            .map(|book| pending.get(&book.id).unwrap_or(book).clone())
            .collect();
        self.selected
            .retain(|id| books.iter().any(|book| book.id == *id));
        self.snapshot = books;
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let tabs = row![
            tab_button("All Books", Tab::AllBooks, self.tab),
            tab_button("Search", Tab::Search, self.tab),
            tab_button("Statistics", Tab::Statistics, self.tab),
        ]
        .spacing(10);

        let body = match self.tab {
            Tab::AllBooks => self.view_books(),
            Tab::Search => self.view_search(),
            Tab::Statistics => self.view_statistics(),
        };

        let mut main = column![text("📚 Personal Library Manager").size(36), tabs]
            .spacing(16)
            .width(Length::Fill);
        if let Some(banner) = &self.banner {
            main = main.push(text(banner).size(18).color(Color::from_rgb(0.45, 0.8, 1.0)));
        }
        main = main.push(text(&self.status).size(16)).push(body);

        let content = row![self.view_add_form(), main].spacing(30).padding(20);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn view_add_form(&self) -> Element<'_, Message> {
        column![
            text("Add New Book").size(24),
            text_input("Title*", &self.form.title).on_input(Message::FormTitle),
            text_input("Author", &self.form.author).on_input(Message::FormAuthor),
            text_input("ISBN", &self.form.isbn).on_input(Message::FormIsbn),
            pick_list(genre_choices(), Some(self.form.genre), Message::FormGenre)
                .placeholder("Genre"),
            text("Pages"),
            text_input("Pages", &self.form.pages).on_input(Message::FormPages),
            text("Published Year"),
            text_input("Published Year", &self.form.year).on_input(Message::FormYear),
            text("Rating"),
            pick_list(RATING_CHOICES, Some(self.form.rating), Message::FormRating),
            text_input("Notes", &self.form.notes).on_input(Message::FormNotes),
            button("Add Book").on_press(Message::AddBook).padding(10),
        ]
        .spacing(10)
        .width(Length::Fixed(280.0))
        .into()
    }

    fn view_books(&self) -> Element<'_, Message> {
        if self.snapshot.is_empty() {
            return text("Your library is empty. Add some books using the sidebar!").into();
        }

        let mut header: Vec<Element<Message>> = vec![text("").width(Length::Fixed(30.0)).into()];
        header.extend(
            self.columns
                .iter()
                .map(|name| text(name.label()).width(Length::Fill).into()),
        );
        header.push(text("").width(Length::Fixed(40.0)).into());

        let mut rows = Column::new()
            .spacing(6)
            .push(Row::with_children(header).spacing(8));

        for book in &self.edited {
            let id = book.id;
            let mut cells: Vec<Element<Message>> = vec![checkbox("", self.selected.contains(&id))
                .on_toggle(move |checked| Message::ToggleSelected(id, checked))
                .width(Length::Fixed(30.0))
                .into()];
            cells.extend(self.columns.iter().map(|&name| cell(book, name)));
            cells.push(
                button("✕")
                    .on_press(Message::RemoveRow(id))
                    .style(button::danger)
                    .width(Length::Fixed(40.0))
                    .into(),
            );
            rows = rows.push(Row::with_children(cells).spacing(8).align_y(Alignment::Center));
        }

        let actions = row![
            button("Save Changes").on_press(Message::SaveChanges),
            button("Delete Selected Books")
                .on_press(Message::DeleteSelected)
                .style(button::danger),
            button("Discard Edits")
                .on_press(Message::DiscardEdits)
                .style(button::secondary),
        ]
        .spacing(10);

        column![
            text("Your Book Collection").size(24),
            scrollable(rows).height(Length::Fill),
            actions,
        ]
        .spacing(12)
        .into()
    }

    fn view_search(&self) -> Element<'_, Message> {
        let controls = row![
            text_input("Search by title or author", &self.search.term)
                .on_input(Message::SearchTerm),
            pick_list(
                search::genre_options(&self.snapshot),
                Some(self.search.genre.clone()),
                Message::SearchGenre,
            ),
        ]
        .spacing(10);

        let results: Element<Message> = if self.search.is_inactive() {
            text("Enter search terms or select a genre to filter").into()
        } else {
            let found = search::filter(&self.snapshot, &self.search);
            let mut list = Column::new().spacing(6).push(
                row![
                    text("Title").width(Length::Fill),
                    text("Author").width(Length::Fill),
                    text("Genre").width(Length::Fill),
                    text("Status").width(Length::Fill),
                    text("Rating").width(Length::Fill),
                ]
                .spacing(8),
            );
            for book in &found {
                list = list.push(
                    row![
                        text(&book.title).width(Length::Fill),
                        text(book.author.as_deref().unwrap_or("")).width(Length::Fill),
                        text(&book.genre).width(Length::Fill),
                        text(book.status.as_str()).width(Length::Fill),
                        text(RatingChoice(book.rating).to_string()).width(Length::Fill),
                    ]
                    .spacing(8),
                );
            }
            column![
                text(format!("{} matching books", found.len())),
                scrollable(list).height(Length::Fill),
            ]
            .spacing(10)
            .into()
        };

        column![text("Search Your Library").size(24), controls, results]
            .spacing(12)
            .into()
    }

    fn view_statistics(&self) -> Element<'_, Message> {
        let Some(stats) = LibraryStats::from_books(&self.snapshot) else {
            return text("No statistics available - your library is empty").into();
        };

        let average_rating = match stats.average_rating {
            Some(rating) => format!("{rating:.1}/5"),
            None => "-".to_string(),
        };

        let metrics = row![
            column![
                metric("Total Books", stats.total_books.to_string()),
                metric("Total Pages", stats.total_pages.to_string()),
            ]
            .spacing(12)
            .width(Length::Fill),
            column![
                metric("Average Pages per Book", stats.average_pages.to_string()),
                metric("Oldest Book Year", stats.oldest_year.to_string()),
            ]
            .spacing(12)
            .width(Length::Fill),
            column![
                metric("Available Books", stats.available.to_string()),
                metric("Average Rating", average_rating),
            ]
            .spacing(12)
            .width(Length::Fill),
        ];

        let genres = BarChart::new(stats.genres, Color::from_rgb(0.3, 0.6, 0.9));
        let statuses = BarChart::new(stats.statuses, Color::from_rgb(0.9, 0.6, 0.3));
        let genre_height = genres.height();
        let status_height = statuses.height();

        scrollable(
            column![
                text("Library Statistics").size(24),
                metrics,
                text("Genre Distribution").size(20),
                canvas(genres)
                    .width(Length::Fill)
                    .height(Length::Fixed(genre_height)),
                text("Status Distribution").size(20),
                canvas(statuses)
                    .width(Length::Fill)
                    .height(Length::Fixed(status_height)),
            ]
            .spacing(14),
        )
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn tab_button(label: &str, tab: Tab, active: Tab) -> Element<'_, Message> {
    let style: fn(&Theme, button::Status) -> button::Style = if tab == active {
        button::primary
    } else {
        button::secondary
    };
    button(label)
        .on_press(Message::SelectTab(tab))
        .style(style)
        .into()
}

fn metric<'a>(label: &'a str, value: String) -> Element<'a, Message> {
    column![text(label).size(14), text(value).size(28)].into()
}

/// Empty text clears an optional column
fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Editable widget for one grid cell
fn cell(book: &BookRecord, name: FieldName) -> Element<'_, Message> {
    let id = book.id;

    match name {
        FieldName::Title => text_input("Title", &book.title)
            .on_input(move |value| Message::EditCell(id, BookField::Title(value)))
            .into(),
        FieldName::Author => text_input("", book.author.as_deref().unwrap_or(""))
            .on_input(move |value| Message::EditCell(id, BookField::Author(optional(value))))
            .into(),
        FieldName::Isbn => text_input("", book.isbn.as_deref().unwrap_or(""))
            .on_input(move |value| Message::EditCell(id, BookField::Isbn(optional(value))))
            .into(),
        FieldName::Genre => {
            let current = GENRES
                .into_iter()
                .find(|genre| *genre == book.genre)
                .map(GenreChoice);
            pick_list(genre_choices(), current, move |choice: GenreChoice| {
                Message::EditCell(id, BookField::Genre(choice.0.to_string()))
            })
            .placeholder(book.genre.clone())
            .width(Length::Fill)
            .into()
        }
        FieldName::Pages => text_input("", &book.pages.to_string())
            .on_input(move |value| match value.trim().parse() {
                Ok(pages) => Message::EditCell(id, BookField::Pages(pages)),
                Err(_) => Message::NotANumber(FieldName::Pages),
            })
            .into(),
        FieldName::PublishedYear => text_input("", &book.published_year.to_string())
            .on_input(move |value| match value.trim().parse() {
                Ok(year) => Message::EditCell(id, BookField::PublishedYear(year)),
                Err(_) => Message::NotANumber(FieldName::PublishedYear),
            })
            .into(),
        FieldName::Status => pick_list(Status::ALL, Some(book.status), move |status| {
            Message::EditCell(id, BookField::Status(status))
        })
        .width(Length::Fill)
        .into(),
        FieldName::Rating => pick_list(
            RATING_CHOICES,
            Some(RatingChoice(book.rating)),
            move |choice: RatingChoice| Message::EditCell(id, BookField::Rating(choice.0)),
        )
        .width(Length::Fill)
        .into(),
        FieldName::Notes => text_input("", book.notes.as_deref().unwrap_or(""))
            .on_input(move |value| Message::EditCell(id, BookField::Notes(optional(value))))
            .into(),
    }
}

/// Status line for a saved changeset
fn describe(report: &ApplyReport, success: &str) -> String {
    if report.is_success() {
        return format!("✅ {success}");
    }
    match report.failures.first() {
        None => format!(
            "⚠️  Saving stopped early after {} writes",
            report.updated + report.deleted
        ),
        Some((_, error)) => format!(
            "⚠️  Updated {} fields and deleted {} books, but {} writes failed \
             (first: {error}). Saving is best effort; the failed edits are still pending.",
            report.updated,
            report.deleted,
            report.failures.len(),
        ),
    }
}

/// Open the catalog named in the settings and prepare its schema
fn open_session(settings: &config::Settings) -> Result<(Session, Vec<FieldName>), StartupError> {
    let columns = settings.grid_columns()?;
    let library = Library::open(&settings.database_path()?)?;
    library.init_schema()?;
    tracing::info!(
        books = library.count()?,
        path = ?library.path(),
        "library ready"
    );
    Ok((Session::new(library), columns))
}

fn main() -> iced::Result {
    let (settings, settings_error) = match config::Settings::load() {
        Ok(settings) => (settings, None),
        Err(e) => (config::Settings::default(), Some(e)),
    };
    config::init_logging(&settings);
    if let Some(e) = settings_error {
        tracing::warn!(error = %e, "using default settings");
    }

    let (session, columns) = match open_session(&settings) {
        Ok(opened) => opened,
        Err(e) => {
            tracing::error!(error = %e, "could not open the library");
            std::process::exit(1);
        }
    };

    iced::application(
        "Personal Library Manager",
        Bookshelf::update,
        Bookshelf::view,
    )
    .theme(Bookshelf::theme)
    .centered()
    .run_with(move || Bookshelf::new(session, columns))
}
