use axum::{extract::State, http::StatusCode, Json};
use catalog_http::extract::{self, CurrentUser, Path};
use catalog_http::AppError;

use super::CatalogState;
use crate::modules::catalog::models::{AuthorDetail, AuthorInput, AuthorView, BookView};

const NOT_FOUND: &str = "No author found matching the query";

pub(super) async fn list(
    State(state): State<CatalogState>,
) -> Result<Json<Vec<AuthorView>>, AppError> {
    let authors = state.repo.list_authors().await?;
    Ok(Json(authors.into_iter().map(AuthorView::from).collect()))
}

pub(super) async fn detail(
    State(state): State<CatalogState>,
    Path(id): Path<i64>,
) -> Result<Json<AuthorDetail>, AppError> {
    let author = state
        .repo
        .get_author(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;

    let books = state
        .repo
        .books_by_author(author.id)
        .await?
        .into_iter()
        .map(BookView::from)
        .collect();

    Ok(Json(AuthorDetail {
        author: author.into(),
        books,
    }))
}

pub(super) async fn create(
    State(state): State<CatalogState>,
    user: CurrentUser,
    extract::Json(input): extract::Json<AuthorInput>,
) -> Result<(StatusCode, Json<AuthorView>), AppError> {
    user.require_staff()?;
    input.validate().into_result("invalid author")?;

    let author = state.repo.create_author(&input).await?;
    tracing::info!(author_id = author.id, "author created");
    Ok((StatusCode::CREATED, Json(author.into())))
}

pub(super) async fn update(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    extract::Json(input): extract::Json<AuthorInput>,
) -> Result<Json<AuthorView>, AppError> {
    user.require_staff()?;
    input.validate().into_result("invalid author")?;

    let author = state
        .repo
        .update_author(id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    tracing::info!(author_id = author.id, "author updated");
    Ok(Json(author.into()))
}

/// Books by a deleted author are kept with no author.
pub(super) async fn delete(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    user.require_staff()?;

    if !state.repo.delete_author(id).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    tracing::info!(author_id = id, "author deleted");
    Ok(StatusCode::NO_CONTENT)
}
