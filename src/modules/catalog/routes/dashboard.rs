use axum::{extract::State, Json};
use catalog_http::extract::CurrentSession;
use catalog_http::AppError;

use super::CatalogState;
use crate::modules::catalog::models::Dashboard;

const NUM_VISITS: &str = "num_visits";

/// Home page counters. `num_visits` is the count before this visit.
pub(super) async fn index(
    State(state): State<CatalogState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Dashboard>, AppError> {
    let counts = state.repo.counts().await?;

    let num_visits: u64 = session.get(NUM_VISITS).await?.unwrap_or(0);
    session.insert(NUM_VISITS, num_visits + 1).await?;

    Ok(Json(Dashboard { counts, num_visits }))
}
