use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{BookId, UserId};
use crate::model::image::ImageRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BookError {
    #[error("book title cannot be empty")]
    EmptyTitle,

    #[error("book author cannot be empty")]
    EmptyAuthor,

    #[error("total pages must be > 0")]
    InvalidTotalPages,

    #[error("ISBN must be 10 or 13 digits")]
    InvalidIsbn,

    #[error("unknown genre code: {0}")]
    UnknownGenre(String),

    #[error("unknown reading status code: {0}")]
    UnknownStatus(String),
}

//
// ─── READING STATUS ────────────────────────────────────────────────────────────
//

/// Lifecycle state of a book on a user's shelf.
///
/// Status is derived from aggregated session pages (see the progress
/// module), with one exception: `Abandoned` is set explicitly by the user
/// and is never overwritten by recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadingStatus {
    ToBeRead,
    CurrentlyReading,
    Completed,
    Abandoned,
}

impl ReadingStatus {
    /// Two-letter storage code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            ReadingStatus::ToBeRead => "TB",
            ReadingStatus::CurrentlyReading => "CR",
            ReadingStatus::Completed => "CO",
            ReadingStatus::Abandoned => "AB",
        }
    }

    /// Parses a storage code back into a status.
    ///
    /// # Errors
    ///
    /// Returns `BookError::UnknownStatus` for anything but the four codes.
    pub fn from_code(code: &str) -> Result<Self, BookError> {
        match code {
            "TB" => Ok(ReadingStatus::ToBeRead),
            "CR" => Ok(ReadingStatus::CurrentlyReading),
            "CO" => Ok(ReadingStatus::Completed),
            "AB" => Ok(ReadingStatus::Abandoned),
            other => Err(BookError::UnknownStatus(other.to_string())),
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ReadingStatus::ToBeRead => "To Be Read",
            ReadingStatus::CurrentlyReading => "Currently Reading",
            ReadingStatus::Completed => "Completed",
            ReadingStatus::Abandoned => "Abandoned",
        }
    }
}

//
// ─── GENRE ─────────────────────────────────────────────────────────────────────
//

/// Top-level genre grouping used by the catalog views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenreCategory {
    Fiction,
    NonFiction,
    Other,
}

/// Fixed genre code set for catalogued books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Genre {
    LiteraryFiction,
    Mystery,
    Thriller,
    SciFiFantasy,
    Romance,
    HistoricalFiction,
    BiographyMemoir,
    History,
    Science,
    Technology,
    SelfHelp,
    Business,
    Philosophy,
    Poetry,
    Drama,
    Comics,
    Childrens,
    YoungAdult,
    Other,
}

impl Genre {
    /// Storage code, stable across schema versions.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Genre::LiteraryFiction => "FIC_LIT",
            Genre::Mystery => "FIC_MYS",
            Genre::Thriller => "FIC_THR",
            Genre::SciFiFantasy => "FIC_SFF",
            Genre::Romance => "FIC_ROM",
            Genre::HistoricalFiction => "FIC_HIS",
            Genre::BiographyMemoir => "NON_BIO",
            Genre::History => "NON_HIS",
            Genre::Science => "NON_SCI",
            Genre::Technology => "NON_TECH",
            Genre::SelfHelp => "NON_SELF",
            Genre::Business => "NON_BUS",
            Genre::Philosophy => "NON_PHIL",
            Genre::Poetry => "OTH_POET",
            Genre::Drama => "OTH_DRAMA",
            Genre::Comics => "OTH_COMIC",
            Genre::Childrens => "OTH_CHILD",
            Genre::YoungAdult => "OTH_YA",
            Genre::Other => "OTH_OTHER",
        }
    }

    /// Parses a storage code back into a genre.
    ///
    /// # Errors
    ///
    /// Returns `BookError::UnknownGenre` for codes outside the fixed set.
    pub fn from_code(code: &str) -> Result<Self, BookError> {
        match code {
            "FIC_LIT" => Ok(Genre::LiteraryFiction),
            "FIC_MYS" => Ok(Genre::Mystery),
            "FIC_THR" => Ok(Genre::Thriller),
            "FIC_SFF" => Ok(Genre::SciFiFantasy),
            "FIC_ROM" => Ok(Genre::Romance),
            "FIC_HIS" => Ok(Genre::HistoricalFiction),
            "NON_BIO" => Ok(Genre::BiographyMemoir),
            "NON_HIS" => Ok(Genre::History),
            "NON_SCI" => Ok(Genre::Science),
            "NON_TECH" => Ok(Genre::Technology),
            "NON_SELF" => Ok(Genre::SelfHelp),
            "NON_BUS" => Ok(Genre::Business),
            "NON_PHIL" => Ok(Genre::Philosophy),
            "OTH_POET" => Ok(Genre::Poetry),
            "OTH_DRAMA" => Ok(Genre::Drama),
            "OTH_COMIC" => Ok(Genre::Comics),
            "OTH_CHILD" => Ok(Genre::Childrens),
            "OTH_YA" => Ok(Genre::YoungAdult),
            "OTH_OTHER" => Ok(Genre::Other),
            other => Err(BookError::UnknownGenre(other.to_string())),
        }
    }

    /// Human-readable name for catalog and chart labels.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Genre::LiteraryFiction => "Literary Fiction",
            Genre::Mystery => "Mystery",
            Genre::Thriller => "Thriller",
            Genre::SciFiFantasy => "Science Fiction/Fantasy",
            Genre::Romance => "Romance",
            Genre::HistoricalFiction => "Historical Fiction",
            Genre::BiographyMemoir => "Biography/Memoir",
            Genre::History => "History",
            Genre::Science => "Science",
            Genre::Technology => "Technology",
            Genre::SelfHelp => "Self-Help",
            Genre::Business => "Business",
            Genre::Philosophy => "Philosophy",
            Genre::Poetry => "Poetry",
            Genre::Drama => "Drama",
            Genre::Comics => "Comics/Graphic Novels",
            Genre::Childrens => "Children's",
            Genre::YoungAdult => "Young Adult",
            Genre::Other => "Other",
        }
    }

    #[must_use]
    pub fn category(self) -> GenreCategory {
        match self {
            Genre::LiteraryFiction
            | Genre::Mystery
            | Genre::Thriller
            | Genre::SciFiFantasy
            | Genre::Romance
            | Genre::HistoricalFiction => GenreCategory::Fiction,
            Genre::BiographyMemoir
            | Genre::History
            | Genre::Science
            | Genre::Technology
            | Genre::SelfHelp
            | Genre::Business
            | Genre::Philosophy => GenreCategory::NonFiction,
            Genre::Poetry
            | Genre::Drama
            | Genre::Comics
            | Genre::Childrens
            | Genre::YoungAdult
            | Genre::Other => GenreCategory::Other,
        }
    }
}

//
// ─── ISBN ──────────────────────────────────────────────────────────────────────
//

/// Normalized ISBN: hyphens and spaces stripped, 10 or 13 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Isbn(String);

impl Isbn {
    /// Normalizes and validates a raw ISBN string.
    ///
    /// # Errors
    ///
    /// Returns `BookError::InvalidIsbn` if, after stripping hyphens and
    /// spaces, the value is not exactly 10 or 13 digits.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BookError> {
        let normalized: String = raw
            .as_ref()
            .chars()
            .filter(|c| *c != '-' && *c != ' ')
            .collect();
        if normalized.is_empty()
            || !normalized.chars().all(|c| c.is_ascii_digit())
            || !(normalized.len() == 10 || normalized.len() == 13)
        {
            return Err(BookError::InvalidIsbn);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//
// ─── BOOK ──────────────────────────────────────────────────────────────────────
//

/// Unvalidated input for creating or editing a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDraft {
    pub user_id: UserId,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub total_pages: u32,
    pub genre: Genre,
    pub status: ReadingStatus,
    pub cover: Option<ImageRef>,
}

impl BookDraft {
    /// Draft with the status defaulted to `ToBeRead`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        title: impl Into<String>,
        author: impl Into<String>,
        total_pages: u32,
        genre: Genre,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            author: author.into(),
            isbn: None,
            total_pages,
            genre,
            status: ReadingStatus::ToBeRead,
            cover: None,
        }
    }

    /// Checks field invariants and produces a book awaiting an id.
    ///
    /// # Errors
    ///
    /// Returns a `BookError` variant naming the first offending field.
    pub fn validate(self, now: DateTime<Utc>) -> Result<ValidatedBook, BookError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(BookError::EmptyTitle);
        }
        let author = self.author.trim().to_owned();
        if author.is_empty() {
            return Err(BookError::EmptyAuthor);
        }
        if self.total_pages == 0 {
            return Err(BookError::InvalidTotalPages);
        }
        let isbn = match self.isbn {
            Some(raw) if !raw.trim().is_empty() => Some(Isbn::new(raw)?),
            _ => None,
        };

        Ok(ValidatedBook {
            user_id: self.user_id,
            title,
            author,
            isbn,
            total_pages: self.total_pages,
            genre: self.genre,
            status: self.status,
            cover: self.cover,
            created_at: now,
        })
    }
}

/// A book that passed validation but has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedBook {
    pub user_id: UserId,
    pub title: String,
    pub author: String,
    pub isbn: Option<Isbn>,
    pub total_pages: u32,
    pub genre: Genre,
    pub status: ReadingStatus,
    pub cover: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
}

impl ValidatedBook {
    #[must_use]
    pub fn assign_id(self, id: BookId) -> Book {
        Book {
            id,
            user_id: self.user_id,
            title: self.title,
            author: self.author,
            isbn: self.isbn,
            total_pages: self.total_pages,
            genre: self.genre,
            status: self.status,
            cover: self.cover,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// A catalogued book owned by a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    id: BookId,
    user_id: UserId,
    title: String,
    author: String,
    isbn: Option<Isbn>,
    total_pages: u32,
    genre: Genre,
    status: ReadingStatus,
    cover: Option<ImageRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Book {
    /// Rehydrates a book from persisted storage, re-checking invariants.
    ///
    /// # Errors
    ///
    /// Returns a `BookError` if stored fields violate the domain invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: BookId,
        user_id: UserId,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: Option<Isbn>,
        total_pages: u32,
        genre: Genre,
        status: ReadingStatus,
        cover: Option<ImageRef>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, BookError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(BookError::EmptyTitle);
        }
        let author = author.into();
        if author.trim().is_empty() {
            return Err(BookError::EmptyAuthor);
        }
        if total_pages == 0 {
            return Err(BookError::InvalidTotalPages);
        }

        Ok(Self {
            id,
            user_id,
            title,
            author,
            isbn,
            total_pages,
            genre,
            status,
            cover,
            created_at,
            updated_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> BookId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[must_use]
    pub fn isbn(&self) -> Option<&Isbn> {
        self.isbn.as_ref()
    }

    #[must_use]
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    #[must_use]
    pub fn genre(&self) -> Genre {
        self.genre
    }

    #[must_use]
    pub fn status(&self) -> ReadingStatus {
        self.status
    }

    #[must_use]
    pub fn cover(&self) -> Option<&ImageRef> {
        self.cover.as_ref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the stored status, stamping the update time.
    ///
    /// Callers that derive status from session totals should go through
    /// `progress::recompute`, which enforces the Abandoned override.
    pub fn set_status(&mut self, status: ReadingStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use uuid::Uuid;

    fn owner() -> UserId {
        UserId::new(Uuid::from_u128(1))
    }

    #[test]
    fn draft_rejects_empty_title() {
        let draft = BookDraft::new(owner(), "   ", "Frank Herbert", 412, Genre::SciFiFantasy);
        assert_eq!(draft.validate(fixed_now()).unwrap_err(), BookError::EmptyTitle);
    }

    #[test]
    fn draft_rejects_empty_author() {
        let draft = BookDraft::new(owner(), "Dune", "  ", 412, Genre::SciFiFantasy);
        assert_eq!(draft.validate(fixed_now()).unwrap_err(), BookError::EmptyAuthor);
    }

    #[test]
    fn draft_rejects_zero_pages() {
        let draft = BookDraft::new(owner(), "Dune", "Frank Herbert", 0, Genre::SciFiFantasy);
        assert_eq!(
            draft.validate(fixed_now()).unwrap_err(),
            BookError::InvalidTotalPages
        );
    }

    #[test]
    fn draft_trims_and_assigns_id() {
        let mut draft =
            BookDraft::new(owner(), "  Dune  ", " Frank Herbert ", 412, Genre::SciFiFantasy);
        draft.isbn = Some("978-0-441-17271-9".into());

        let book = draft.validate(fixed_now()).unwrap().assign_id(BookId::new(7));
        assert_eq!(book.id(), BookId::new(7));
        assert_eq!(book.title(), "Dune");
        assert_eq!(book.author(), "Frank Herbert");
        assert_eq!(book.isbn().unwrap().as_str(), "9780441172719");
        assert_eq!(book.status(), ReadingStatus::ToBeRead);
        assert_eq!(book.created_at(), book.updated_at());
    }

    #[test]
    fn blank_isbn_is_treated_as_absent() {
        let mut draft = BookDraft::new(owner(), "Dune", "Frank Herbert", 412, Genre::SciFiFantasy);
        draft.isbn = Some("   ".into());
        let validated = draft.validate(fixed_now()).unwrap();
        assert!(validated.isbn.is_none());
    }

    #[test]
    fn isbn_normalizes_ten_and_thirteen_digits() {
        assert_eq!(Isbn::new("0-441-17271-7").unwrap().as_str(), "0441172717");
        assert_eq!(
            Isbn::new("978 0 441 17271 9").unwrap().as_str(),
            "9780441172719"
        );
    }

    #[test]
    fn isbn_rejects_wrong_length_and_letters() {
        assert_eq!(Isbn::new("12345").unwrap_err(), BookError::InvalidIsbn);
        assert_eq!(Isbn::new("044117271X").unwrap_err(), BookError::InvalidIsbn);
        assert_eq!(Isbn::new("").unwrap_err(), BookError::InvalidIsbn);
    }

    #[test]
    fn status_codes_round_trip() {
        for status in [
            ReadingStatus::ToBeRead,
            ReadingStatus::CurrentlyReading,
            ReadingStatus::Completed,
            ReadingStatus::Abandoned,
        ] {
            assert_eq!(ReadingStatus::from_code(status.code()).unwrap(), status);
        }
        assert!(matches!(
            ReadingStatus::from_code("XX").unwrap_err(),
            BookError::UnknownStatus(_)
        ));
    }

    #[test]
    fn genre_codes_round_trip() {
        for genre in [
            Genre::LiteraryFiction,
            Genre::Mystery,
            Genre::Thriller,
            Genre::SciFiFantasy,
            Genre::Romance,
            Genre::HistoricalFiction,
            Genre::BiographyMemoir,
            Genre::History,
            Genre::Science,
            Genre::Technology,
            Genre::SelfHelp,
            Genre::Business,
            Genre::Philosophy,
            Genre::Poetry,
            Genre::Drama,
            Genre::Comics,
            Genre::Childrens,
            Genre::YoungAdult,
            Genre::Other,
        ] {
            assert_eq!(Genre::from_code(genre.code()).unwrap(), genre);
        }
    }

    #[test]
    fn genre_categories_cover_the_code_prefixes() {
        assert_eq!(Genre::Mystery.category(), GenreCategory::Fiction);
        assert_eq!(Genre::Philosophy.category(), GenreCategory::NonFiction);
        assert_eq!(Genre::Poetry.category(), GenreCategory::Other);
    }

    #[test]
    fn set_status_stamps_update_time() {
        let draft = BookDraft::new(owner(), "Dune", "Frank Herbert", 412, Genre::SciFiFantasy);
        let mut book = draft.validate(fixed_now()).unwrap().assign_id(BookId::new(1));

        let later = fixed_now() + chrono::Duration::hours(2);
        book.set_status(ReadingStatus::Abandoned, later);
        assert_eq!(book.status(), ReadingStatus::Abandoned);
        assert_eq!(book.updated_at(), later);
    }
}
