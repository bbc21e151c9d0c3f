//! Extractors whose rejections speak the [`AppError`] envelope.

use anyhow::anyhow;
use axum::{
    extract::{FromRequest, FromRequestParts},
    http::request::Parts,
};
use catalog_authz::{Permission, Principal, Session};

use crate::error::AppError;

/// JSON body extractor.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct Json<T>(pub T);

/// Path parameter extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct Path<T>(pub T);

/// Query string extractor.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct Query<T>(pub T);

/// The request's session, installed by the session middleware.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(CurrentSession)
            .ok_or_else(|| AppError::Internal(anyhow!("session middleware is not installed")))
    }
}

/// The logged-in user; anonymous callers are rejected with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

impl CurrentUser {
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.0.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::forbidden(format!(
                "permission '{}' required",
                permission.code()
            )))
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.0.is_staff {
            Ok(())
        } else {
            Err(AppError::forbidden("staff access required"))
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        session
            .principal()
            .await
            .map(CurrentUser)
            .ok_or_else(|| AppError::unauthorized("authentication required"))
    }
}
