/// Search and genre filtering over a snapshot
use std::fmt;

use super::data::BookRecord;

/// Genre choice in the search view
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Only(String),
}

impl fmt::Display for GenreFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenreFilter::All => f.write_str("All"),
            GenreFilter::Only(genre) if genre.is_empty() => f.write_str("(unspecified)"),
            GenreFilter::Only(genre) => f.write_str(genre),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchFilter {
    /// Matched against title and author, ignoring case
    pub term: String,
    pub genre: GenreFilter,
}

impl SearchFilter {
    /// Nothing to search for yet
    pub fn is_inactive(&self) -> bool {
        self.term.trim().is_empty() && self.genre == GenreFilter::All
    }

    fn matches(&self, book: &BookRecord) -> bool {
        let term = self.term.trim().to_lowercase();
        let term_ok = term.is_empty()
            || book.title.to_lowercase().contains(&term)
            || book
                .author
                .as_deref()
                .is_some_and(|author| author.to_lowercase().contains(&term));

        let genre_ok = match &self.genre {
            GenreFilter::All => true,
            GenreFilter::Only(genre) => &book.genre == genre,
        };

        term_ok && genre_ok
    }
}

/// Books matching `filter`, in snapshot order.
/// An inactive filter matches nothing.
pub fn filter<'a>(books: &'a [BookRecord], filter: &SearchFilter) -> Vec<&'a BookRecord> {
    if filter.is_inactive() {
        return Vec::new();
    }
    books.iter().filter(|book| filter.matches(book)).collect()
}

/// `All` followed by each distinct genre in the snapshot, first seen first
pub fn genre_options(books: &[BookRecord]) -> Vec<GenreFilter> {
    let mut options = vec![GenreFilter::All];
    for book in books {
        let option = GenreFilter::Only(book.genre.clone());
        if !options.contains(&option) {
            options.push(option);
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::NewBook;
    use chrono::NaiveDateTime;

    fn shelf() -> Vec<BookRecord> {
        let date =
            NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        [
            NewBook::titled("A Wizard of Earthsea", 2024)
                .with_author("Ursula K. Le Guin")
                .with_genre("Fantasy"),
            NewBook::titled("The Dispossessed", 2024)
                .with_author("Ursula K. Le Guin")
                .with_genre("Science Fiction"),
            NewBook::titled("Dune", 2024)
                .with_author("Frank Herbert")
                .with_genre("Science Fiction"),
            NewBook::titled("Notebook", 2024),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, book)| book.into_record(i as i64 + 1, date))
        .collect()
    }

    fn ids(found: Vec<&BookRecord>) -> Vec<i64> {
        found.into_iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_inactive_filter_finds_nothing() {
        let books = shelf();
        assert!(filter(&books, &SearchFilter::default()).is_empty());
        let blank = SearchFilter { term: "  ".into(), genre: GenreFilter::All };
        assert!(filter(&books, &blank).is_empty());
    }

    #[test]
    fn test_term_matches_title_or_author_ignoring_case() {
        let books = shelf();
        let by_author = SearchFilter { term: "le guin".into(), ..Default::default() };
        assert_eq!(ids(filter(&books, &by_author)), vec![1, 2]);

        let by_title = SearchFilter { term: "DUNE".into(), ..Default::default() };
        assert_eq!(ids(filter(&books, &by_title)), vec![3]);

        // "Notebook" has no author; it still matches by title only
        let note = SearchFilter { term: "note".into(), ..Default::default() };
        assert_eq!(ids(filter(&books, &note)), vec![4]);
    }

    #[test]
    fn test_genre_filter() {
        let books = shelf();
        let scifi = SearchFilter {
            term: String::new(),
            genre: GenreFilter::Only("Science Fiction".into()),
        };
        assert_eq!(ids(filter(&books, &scifi)), vec![2, 3]);

        let both = SearchFilter { term: "herbert".into(), ..scifi };
        assert_eq!(ids(filter(&books, &both)), vec![3]);
    }

    #[test]
    fn test_genre_options() {
        let options = genre_options(&shelf());
        assert_eq!(
            options,
            vec![
                GenreFilter::All,
                GenreFilter::Only("Fantasy".into()),
                GenreFilter::Only("Science Fiction".into()),
                GenreFilter::Only(String::new()),
            ]
        );
        assert_eq!(options[3].to_string(), "(unspecified)");
    }
}
