use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use catalog_authz::Principal;
use catalog_http::extract::{self, CurrentSession, CurrentUser};
use catalog_http::AppError;

use super::models::{LoginRequest, NewUser, User};
use super::password;
use super::repository::AccountsRepository;

const BAD_CREDENTIALS: &str = "Please enter a correct username and password.";

#[derive(Clone)]
pub(super) struct AccountsState {
    pub repo: AccountsRepository,
}

pub(super) fn router(state: AccountsState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
        .route("/users", get(list_users).post(create_user))
        .with_state(state)
}

async fn login(
    State(state): State<AccountsState>,
    CurrentSession(session): CurrentSession,
    extract::Json(request): extract::Json<LoginRequest>,
) -> Result<Json<Principal>, AppError> {
    let Some(credentials) = state.repo.find_credentials(&request.username).await? else {
        tracing::info!(username = %request.username, "login rejected: unknown user");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    };

    let hash = credentials.password_hash;
    let verified = tokio::task::spawn_blocking(move || {
        password::verify_password(&request.password, &hash)
    })
    .await
    .context("password verification task failed")??;

    if !verified {
        tracing::info!(user_id = credentials.user_id, "login rejected: wrong password");
        return Err(AppError::unauthorized(BAD_CREDENTIALS));
    }

    let principal = state
        .repo
        .load_principal(credentials.user_id)
        .await?
        .ok_or_else(|| AppError::unauthorized(BAD_CREDENTIALS))?;

    session.login(principal.clone()).await;
    tracing::info!(user_id = principal.user_id, username = %principal.username, "user logged in");
    Ok(Json(principal))
}

async fn logout(CurrentSession(session): CurrentSession) -> StatusCode {
    if let Some(principal) = session.principal().await {
        tracing::info!(user_id = principal.user_id, "user logged out");
    }
    session.flush().await;
    StatusCode::NO_CONTENT
}

async fn me(CurrentUser(principal): CurrentUser) -> Json<Principal> {
    Json(principal)
}

async fn list_users(
    State(state): State<AccountsState>,
    user: CurrentUser,
) -> Result<Json<Vec<User>>, AppError> {
    user.require_staff()?;
    Ok(Json(state.repo.list_users().await?))
}

async fn create_user(
    State(state): State<AccountsState>,
    user: CurrentUser,
    extract::Json(new_user): extract::Json<NewUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    user.require_staff()?;
    let permissions = new_user
        .validate()
        .map_err(|errors| errors.into_error("invalid user"))?;

    let NewUser {
        username,
        password,
        is_staff,
        ..
    } = new_user;
    let hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .context("password hashing task failed")??;

    let created = state
        .repo
        .create_user(username.trim(), &hash, is_staff, &permissions)
        .await?;
    tracing::info!(user_id = created.id, username = %created.username, "user created");
    Ok((StatusCode::CREATED, Json(created)))
}
