use axum::{extract::State, http::StatusCode, Json};
use catalog_http::extract::{self, CurrentUser, Path, Query};
use catalog_http::pagination::{Page, PageQuery};
use catalog_http::AppError;

use super::CatalogState;
use crate::modules::catalog::models::{BookDetail, BookInput, BookInstanceView, BookView};
use crate::utils::validation::INVALID_CHOICE;

pub(super) async fn list(
    State(state): State<CatalogState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookView>>, AppError> {
    let total = state.repo.count_books().await?;
    let window = query.window(total, state.settings.book_page_size)?;

    let books = state
        .repo
        .list_books(window.limit(), window.offset())
        .await?
        .into_iter()
        .map(BookView::from)
        .collect();

    Ok(Json(window.into_page(books)))
}

pub(super) async fn detail(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<BookDetail>, AppError> {
    let book = state
        .repo
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::not_found("No book found matching the query"))?;

    let today = state.today();
    let copies = state
        .repo
        .instances_of_book(book.id)
        .await?
        .into_iter()
        .map(|copy| BookInstanceView::new(copy, today))
        .collect();

    Ok(Json(BookDetail {
        book: book.into(),
        copies,
    }))
}

pub(super) async fn create(
    State(state): State<CatalogState>,
    user: CurrentUser,
    extract::Json(input): extract::Json<BookInput>,
) -> Result<(StatusCode, Json<BookView>), AppError> {
    user.require_staff()?;

    let mut errors = input.validate();
    if let Some(author_id) = input.author_id {
        if !state.repo.author_exists(author_id).await? {
            errors.add("author_id", INVALID_CHOICE);
        }
    }
    if let Some(missing) = state.repo.missing_genres(&input.genre_ids).await?.first() {
        errors.add(
            "genre_ids",
            format!("Select a valid choice. {missing} is not one of the available choices."),
        );
    }
    errors.into_result("invalid book")?;

    let book = state.repo.create_book(&input).await?;
    tracing::info!(book_id = book.id, title = %book.title, "book created");
    Ok((StatusCode::CREATED, Json(book.into())))
}

pub(super) async fn delete(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require_staff()?;

    if !state.repo.delete_book(id).await? {
        return Err(AppError::not_found("No book found matching the query"));
    }
    tracing::info!(book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}
