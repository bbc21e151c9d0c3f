//! SQLite access for the catalog tables.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::models::{
    Author, AuthorInput, AuthorRef, Book, BookInput, BookInstance, BookInstanceInput, BookRef,
    Borrower, CatalogCounts, Genre, GenreInput, LoanStatus,
};

const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.imprint, bi.due_back, bi.status,
           bi.book_id, b.title AS book_title,
           bi.borrower_id, u.username AS borrower_username
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

const BOOK_SELECT: &str = r#"
    SELECT b.id, b.title, b.summary, b.isbn, b.author_id, a.first_name, a.last_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn counts(&self) -> sqlx::Result<CatalogCounts> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM books) AS num_books,
                (SELECT COUNT(*) FROM book_instances) AS num_instances,
                (SELECT COUNT(*) FROM book_instances WHERE status = 'a') AS num_instances_available,
                (SELECT COUNT(*) FROM authors) AS num_authors,
                (SELECT COUNT(*) FROM genres) AS num_genres
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(CatalogCounts {
            num_books: row.try_get("num_books")?,
            num_instances: row.try_get("num_instances")?,
            num_instances_available: row.try_get("num_instances_available")?,
            num_authors: row.try_get("num_authors")?,
            num_genres: row.try_get("num_genres")?,
        })
    }

    // Genres

    pub async fn list_genres(&self) -> sqlx::Result<Vec<Genre>> {
        sqlx::query("SELECT id, name FROM genres ORDER BY name, id")
            .try_map(|row: SqliteRow| genre_from_row(&row))
            .fetch_all(&self.pool)
            .await
    }

    pub async fn create_genre(&self, input: &GenreInput) -> sqlx::Result<Genre> {
        let name = input.name.trim();
        let id = sqlx::query("INSERT INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?
            .last_insert_rowid();
        Ok(Genre {
            id,
            name: name.to_string(),
        })
    }

    /// Ids among `ids` that do not name an existing genre.
    pub async fn missing_genres(&self, ids: &[i64]) -> sqlx::Result<Vec<i64>> {
        let mut missing = Vec::new();
        for &id in ids {
            if !self.exists("genres", id).await? {
                missing.push(id);
            }
        }
        Ok(missing)
    }

    // Authors

    pub async fn list_authors(&self) -> sqlx::Result<Vec<Author>> {
        sqlx::query(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death
             FROM authors ORDER BY last_name, first_name, id",
        )
        .try_map(|row: SqliteRow| author_from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn get_author(&self, id: i64) -> sqlx::Result<Option<Author>> {
        sqlx::query(
            "SELECT id, first_name, last_name, date_of_birth, date_of_death
             FROM authors WHERE id = ?",
        )
        .bind(id)
        .try_map(|row: SqliteRow| author_from_row(&row))
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn create_author(&self, input: &AuthorInput) -> sqlx::Result<Author> {
        let id = sqlx::query(
            "INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death)
             VALUES (?, ?, ?, ?)",
        )
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.date_of_birth)
        .bind(input.date_of_death)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_author(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Returns `None` when no author has this id.
    pub async fn update_author(&self, id: i64, input: &AuthorInput) -> sqlx::Result<Option<Author>> {
        let updated = sqlx::query(
            "UPDATE authors
             SET first_name = ?, last_name = ?, date_of_birth = ?, date_of_death = ?
             WHERE id = ?",
        )
        .bind(input.first_name.trim())
        .bind(input.last_name.trim())
        .bind(input.date_of_birth)
        .bind(input.date_of_death)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.get_author(id).await
    }

    /// Books written by the author lose their author reference.
    pub async fn delete_author(&self, id: i64) -> sqlx::Result<bool> {
        let deleted = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    // Books

    pub async fn count_books(&self) -> sqlx::Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn list_books(&self, limit: i64, offset: i64) -> sqlx::Result<Vec<Book>> {
        let rows = sqlx::query(&format!("{BOOK_SELECT} ORDER BY b.id LIMIT ? OFFSET ?"))
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        self.books_from_rows(rows).await
    }

    pub async fn books_by_author(&self, author_id: i64) -> sqlx::Result<Vec<Book>> {
        let rows = sqlx::query(&format!("{BOOK_SELECT} WHERE b.author_id = ? ORDER BY b.title, b.id"))
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        self.books_from_rows(rows).await
    }

    pub async fn get_book(&self, id: i64) -> sqlx::Result<Option<Book>> {
        let row = sqlx::query(&format!("{BOOK_SELECT} WHERE b.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => Ok(self.books_from_rows(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Insert the book and its genre links atomically.
    pub async fn create_book(&self, input: &BookInput) -> sqlx::Result<Book> {
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query("INSERT INTO books (title, author_id, summary, isbn) VALUES (?, ?, ?, ?)")
            .bind(input.title.trim())
            .bind(input.author_id)
            .bind(input.summary.trim())
            .bind(input.isbn.trim())
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for &genre_id in &input.genre_ids {
            sqlx::query("INSERT OR IGNORE INTO book_genres (book_id, genre_id) VALUES (?, ?)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.get_book(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Copies of the book lose their book reference.
    pub async fn delete_book(&self, id: i64) -> sqlx::Result<bool> {
        let deleted = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn genres_for_book(&self, book_id: i64) -> sqlx::Result<Vec<Genre>> {
        sqlx::query(
            "SELECT g.id, g.name FROM genres g
             JOIN book_genres bg ON bg.genre_id = g.id
             WHERE bg.book_id = ?
             ORDER BY g.id",
        )
        .bind(book_id)
        .try_map(|row: SqliteRow| genre_from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    async fn books_from_rows(&self, rows: Vec<SqliteRow>) -> sqlx::Result<Vec<Book>> {
        let mut books = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.try_get("id")?;
            let author = match row.try_get::<Option<i64>, _>("author_id")? {
                Some(author_id) => {
                    let first: Option<String> = row.try_get("first_name")?;
                    let last: Option<String> = row.try_get("last_name")?;
                    Some(AuthorRef {
                        id: author_id,
                        name: format!("{}, {}", last.unwrap_or_default(), first.unwrap_or_default()),
                    })
                }
                None => None,
            };
            books.push(Book {
                id,
                title: row.try_get("title")?,
                author,
                summary: row.try_get("summary")?,
                isbn: row.try_get("isbn")?,
                genres: self.genres_for_book(id).await?,
            });
        }
        Ok(books)
    }

    // Book instances

    pub async fn get_instance(&self, id: Uuid) -> sqlx::Result<Option<BookInstance>> {
        sqlx::query(&format!("{INSTANCE_SELECT} WHERE bi.id = ?"))
            .bind(id.to_string())
            .try_map(|row: SqliteRow| instance_from_row(&row))
            .fetch_optional(&self.pool)
            .await
    }

    pub async fn instances_of_book(&self, book_id: i64) -> sqlx::Result<Vec<BookInstance>> {
        sqlx::query(&format!(
            "{INSTANCE_SELECT} WHERE bi.book_id = ? ORDER BY bi.due_back, bi.id"
        ))
        .bind(book_id)
        .try_map(|row: SqliteRow| instance_from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    pub async fn create_instance(&self, input: &BookInstanceInput) -> sqlx::Result<BookInstance> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(input.book_id)
        .bind(input.imprint.trim())
        .bind(input.due_back)
        .bind(input.borrower_id)
        .bind(input.status.code())
        .execute(&self.pool)
        .await?;

        self.get_instance(id).await?.ok_or(sqlx::Error::RowNotFound)
    }

    /// Returns `None` when no copy has this id.
    pub async fn update_instance(
        &self,
        id: Uuid,
        input: &BookInstanceInput,
    ) -> sqlx::Result<Option<BookInstance>> {
        let updated = sqlx::query(
            "UPDATE book_instances
             SET book_id = ?, imprint = ?, due_back = ?, borrower_id = ?, status = ?
             WHERE id = ?",
        )
        .bind(input.book_id)
        .bind(input.imprint.trim())
        .bind(input.due_back)
        .bind(input.borrower_id)
        .bind(input.status.code())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.get_instance(id).await
    }

    /// Set only the due-back date. Returns `false` when the copy does not exist.
    pub async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> sqlx::Result<bool> {
        let updated = sqlx::query("UPDATE book_instances SET due_back = ? WHERE id = ?")
            .bind(due_back)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(updated > 0)
    }

    /// Number of copies on loan, optionally only those lent to `borrower_id`.
    pub async fn count_on_loan(&self, borrower_id: Option<i64>) -> sqlx::Result<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances
             WHERE status = ? AND (? IS NULL OR borrower_id = ?)",
        )
        .bind(LoanStatus::OnLoan.code())
        .bind(borrower_id)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    /// Copies on loan ordered by due date, optionally only those lent to `borrower_id`.
    pub async fn list_on_loan(
        &self,
        borrower_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> sqlx::Result<Vec<BookInstance>> {
        sqlx::query(&format!(
            "{INSTANCE_SELECT}
             WHERE bi.status = ? AND (? IS NULL OR bi.borrower_id = ?)
             ORDER BY bi.due_back, bi.id
             LIMIT ? OFFSET ?"
        ))
        .bind(LoanStatus::OnLoan.code())
        .bind(borrower_id)
        .bind(borrower_id)
        .bind(limit)
        .bind(offset)
        .try_map(|row: SqliteRow| instance_from_row(&row))
        .fetch_all(&self.pool)
        .await
    }

    // Referential checks used by input validation

    pub async fn author_exists(&self, id: i64) -> sqlx::Result<bool> {
        self.exists("authors", id).await
    }

    pub async fn book_exists(&self, id: i64) -> sqlx::Result<bool> {
        self.exists("books", id).await
    }

    pub async fn user_exists(&self, id: i64) -> sqlx::Result<bool> {
        self.exists("users", id).await
    }

    async fn exists(&self, table: &'static str, id: i64) -> sqlx::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(&format!("SELECT 1 FROM {table} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

fn genre_from_row(row: &SqliteRow) -> sqlx::Result<Genre> {
    Ok(Genre {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

fn author_from_row(row: &SqliteRow) -> sqlx::Result<Author> {
    Ok(Author {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        date_of_birth: row.try_get("date_of_birth")?,
        date_of_death: row.try_get("date_of_death")?,
    })
}

fn instance_from_row(row: &SqliteRow) -> sqlx::Result<BookInstance> {
    let raw_id: String = row.try_get("id")?;
    let id = Uuid::parse_str(&raw_id).map_err(|e| sqlx::Error::ColumnDecode {
        index: "id".to_string(),
        source: Box::new(e),
    })?;

    let raw_status: String = row.try_get("status")?;
    let status = raw_status
        .parse::<LoanStatus>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: "status".to_string(),
            source: e.into(),
        })?;

    let book = match row.try_get::<Option<i64>, _>("book_id")? {
        Some(book_id) => Some(BookRef {
            id: book_id,
            title: row.try_get::<Option<String>, _>("book_title")?.unwrap_or_default(),
        }),
        None => None,
    };

    let borrower = match row.try_get::<Option<i64>, _>("borrower_id")? {
        Some(borrower_id) => Some(Borrower {
            id: borrower_id,
            username: row
                .try_get::<Option<String>, _>("borrower_username")?
                .unwrap_or_default(),
        }),
        None => None,
    };

    Ok(BookInstance {
        id,
        book,
        imprint: row.try_get("imprint")?,
        due_back: row.try_get("due_back")?,
        borrower,
        status,
    })
}
