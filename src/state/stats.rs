/// Summary numbers for the statistics view
use std::collections::HashMap;

use super::data::{BookRecord, Status};

#[derive(Debug, Clone, PartialEq)]
pub struct LibraryStats {
    pub total_books: usize,
    pub total_pages: u64,
    /// Truncated to a whole page
    pub average_pages: u64,
    pub oldest_year: i32,
    pub available: usize,
    /// Over rated books only
    pub average_rating: Option<f64>,
    /// Most common first
    pub genres: Vec<(String, usize)>,
    pub statuses: Vec<(String, usize)>,
}

impl LibraryStats {
    /// None for an empty catalog
    pub fn from_books(books: &[BookRecord]) -> Option<Self> {
        let oldest_year = books.iter().map(|b| b.published_year).min()?;

        let total_books = books.len();
        let total_pages: u64 = books.iter().map(|b| u64::from(b.pages)).sum();

        let ratings: Vec<u8> = books.iter().filter_map(|b| b.rating).collect();
        let average_rating = if ratings.is_empty() {
            None
        } else {
            let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
            Some(f64::from(sum) / ratings.len() as f64)
        };

        Some(LibraryStats {
            total_books,
            total_pages,
            average_pages: total_pages / total_books as u64,
            oldest_year,
            available: books.iter().filter(|b| b.status == Status::Available).count(),
            average_rating,
            genres: counts(books.iter().map(|b| b.genre.as_str())),
            statuses: counts(books.iter().map(|b| b.status.as_str())),
        })
    }
}

/// Occurrences per label, sorted by count descending then label
fn counts<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut tally: HashMap<&str, usize> = HashMap::new();
    for label in labels {
        *tally.entry(label).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = tally
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::NewBook;
    use chrono::NaiveDateTime;

    fn book(
        id: i64,
        genre: &str,
        pages: u32,
        year: i32,
        status: Status,
        rating: Option<u8>,
    ) -> BookRecord {
        let date =
            NaiveDateTime::parse_from_str("2024-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let mut record = NewBook::titled(format!("Book {id}"), 2024)
            .with_genre(genre)
            .into_record(id, date);
        record.pages = pages;
        record.published_year = year;
        record.status = status;
        record.rating = rating;
        record
    }

    #[test]
    fn test_empty_catalog() {
        assert_eq!(LibraryStats::from_books(&[]), None);
    }

    #[test]
    fn test_summary() {
        let books = vec![
            book(1, "Fantasy", 100, 1990, Status::Available, Some(5)),
            book(2, "Fantasy", 201, 1965, Status::Lent, None),
            book(3, "History", 300, 2001, Status::Available, Some(2)),
        ];
        let stats = LibraryStats::from_books(&books).unwrap();

        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.total_pages, 601);
        assert_eq!(stats.average_pages, 200);
        assert_eq!(stats.oldest_year, 1965);
        assert_eq!(stats.available, 2);
        assert_eq!(stats.average_rating, Some(3.5));
        assert_eq!(
            stats.genres,
            vec![("Fantasy".to_string(), 2), ("History".to_string(), 1)]
        );
        assert_eq!(
            stats.statuses,
            vec![("Available".to_string(), 2), ("Lent".to_string(), 1)]
        );
    }

    #[test]
    fn test_no_ratings() {
        let books = vec![book(1, "", 10, 2000, Status::Reading, None)];
        let stats = LibraryStats::from_books(&books).unwrap();
        assert_eq!(stats.average_rating, None);
        assert_eq!(stats.available, 0);
        assert_eq!(stats.genres, vec![(String::new(), 1)]);
    }

    #[test]
    fn test_ties_sorted_by_label() {
        let books = vec![
            book(1, "Mystery", 10, 2000, Status::Available, None),
            book(2, "Biography", 10, 2000, Status::Available, None),
        ];
        let stats = LibraryStats::from_books(&books).unwrap();
        assert_eq!(stats.genres[0].0, "Biography");
        assert_eq!(stats.genres[1].0, "Mystery");
    }
}
