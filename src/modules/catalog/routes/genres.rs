use axum::{extract::State, http::StatusCode, Json};
use catalog_http::extract::{self, CurrentUser};
use catalog_http::AppError;

use super::CatalogState;
use crate::modules::catalog::models::{Genre, GenreInput};

pub(super) async fn list(State(state): State<CatalogState>) -> Result<Json<Vec<Genre>>, AppError> {
    Ok(Json(state.repo.list_genres().await?))
}

pub(super) async fn create(
    State(state): State<CatalogState>,
    user: CurrentUser,
    extract::Json(input): extract::Json<GenreInput>,
) -> Result<(StatusCode, Json<Genre>), AppError> {
    user.require_staff()?;
    input.validate().into_result("invalid genre")?;

    let genre = state.repo.create_genre(&input).await?;
    tracing::info!(genre_id = genre.id, name = %genre.name, "genre created");
    Ok((StatusCode::CREATED, Json(genre)))
}
