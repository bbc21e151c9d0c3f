use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::validation::FieldErrors;

/// A literary genre (e.g. Science Fiction, French Poetry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    /// "Last, First", the way authors are listed.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// Compact author reference embedded in book payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: i64,
    pub name: String,
}

/// A title in the catalog, independent of its physical copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<AuthorRef>,
    pub summary: String,
    pub isbn: String,
    pub genres: Vec<Genre>,
}

impl Book {
    /// Names of the first three genres, comma separated.
    pub fn display_genre(&self) -> String {
        self.genres
            .iter()
            .take(3)
            .map(|genre| genre.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Compact book reference embedded in copy payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRef {
    pub id: i64,
    pub title: String,
}

/// Availability of a physical copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    /// Single-letter code stored in the database.
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl FromStr for LoanStatus {
    type Err = anyhow::Error;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(anyhow::anyhow!("unknown loan status code '{other}'")),
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A specific physical copy of a book that can be borrowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookInstance {
    pub id: Uuid,
    pub book: Option<BookRef>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower: Option<Borrower>,
    pub status: LoanStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Borrower {
    pub id: i64,
    pub username: String,
}

impl BookInstance {
    /// A copy is overdue when it has a due date strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_back.is_some_and(|due_back| due_back < today)
    }
}

impl fmt::Display for BookInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.book.as_ref().map_or("None", |book| book.title.as_str());
        let due_back = self
            .due_back
            .map_or_else(|| "None".to_string(), |date| date.to_string());
        write!(f, "{}, {}, {}, {}", title, self.status.code(), due_back, self.id)
    }
}

/// Copy as served over HTTP, with the overdue flag evaluated for today.
#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceView {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub status_label: &'static str,
    pub is_overdue: bool,
    pub display: String,
}

impl BookInstanceView {
    pub fn new(instance: BookInstance, today: NaiveDate) -> Self {
        Self {
            status_label: instance.status.label(),
            is_overdue: instance.is_overdue(today),
            display: instance.to_string(),
            instance,
        }
    }
}

/// Book as served over HTTP, with its genre summary.
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    #[serde(flatten)]
    pub book: Book,
    pub display_genre: String,
}

impl From<Book> for BookView {
    fn from(book: Book) -> Self {
        Self {
            display_genre: book.display_genre(),
            book,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: BookView,
    pub copies: Vec<BookInstanceView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    #[serde(flatten)]
    pub author: Author,
    pub display_name: String,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            display_name: author.display_name(),
            author,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetail {
    #[serde(flatten)]
    pub author: AuthorView,
    pub books: Vec<BookView>,
}

/// Record counts shown on the home page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    pub num_visits: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreInput {
    pub name: String,
}

impl GenreInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required("name", &self.name);
        errors.max_chars("name", &self.name, 200);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorInput {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_death: Option<NaiveDate>,
}

impl AuthorInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required("first_name", &self.first_name);
        errors.max_chars("first_name", &self.first_name, 100);
        errors.required("last_name", &self.last_name);
        errors.max_chars("last_name", &self.last_name, 100);
        if let (Some(born), Some(died)) = (self.date_of_birth, self.date_of_death) {
            if died < born {
                errors.add("date_of_death", "Date of death cannot be before date of birth.");
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookInput {
    pub title: String,
    #[serde(default)]
    pub author_id: Option<i64>,
    pub summary: String,
    pub isbn: String,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

impl BookInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required("title", &self.title);
        errors.max_chars("title", &self.title, 200);
        errors.required("summary", &self.summary);
        errors.max_chars("summary", &self.summary, 1000);
        errors.required("isbn", &self.isbn);
        errors.max_chars("isbn", &self.isbn, 13);
        errors
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookInstanceInput {
    #[serde(default)]
    pub book_id: Option<i64>,
    pub imprint: String,
    #[serde(default)]
    pub due_back: Option<NaiveDate>,
    #[serde(default)]
    pub borrower_id: Option<i64>,
    #[serde(default)]
    pub status: LoanStatus,
}

impl BookInstanceInput {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.required("imprint", &self.imprint);
        errors.max_chars("imprint", &self.imprint, 200);
        errors
    }
}
