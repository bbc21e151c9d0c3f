use axum::{extract::State, http::StatusCode, Json};
use catalog_authz::Permission;
use catalog_http::extract::{self, CurrentUser, Path, Query};
use catalog_http::pagination::{Page, PageQuery};
use catalog_http::AppError;
use serde::Serialize;
use uuid::Uuid;

use super::CatalogState;
use crate::modules::catalog::models::{BookInstance, BookInstanceInput, BookInstanceView};
use crate::modules::catalog::renewal::RenewBookForm;
use crate::modules::catalog::repository::CatalogRepository;
use crate::utils::validation::{FieldErrors, INVALID_CHOICE};

const NOT_FOUND: &str = "No book instance found matching the query";

/// The renewal form as shown to a librarian.
#[derive(Debug, Serialize)]
pub(super) struct RenewalPage {
    book_instance: BookInstanceView,
    form: RenewBookForm,
}

/// Copy ids that are not UUIDs cannot name any copy.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::not_found(NOT_FOUND))
}

async fn find(repo: &CatalogRepository, id: Uuid) -> Result<BookInstance, AppError> {
    repo.get_instance(id)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))
}

async fn check_references(
    repo: &CatalogRepository,
    input: &BookInstanceInput,
) -> Result<FieldErrors, AppError> {
    let mut errors = input.validate();
    if let Some(book_id) = input.book_id {
        if !repo.book_exists(book_id).await? {
            errors.add("book_id", INVALID_CHOICE);
        }
    }
    if let Some(borrower_id) = input.borrower_id {
        if !repo.user_exists(borrower_id).await? {
            errors.add("borrower_id", INVALID_CHOICE);
        }
    }
    Ok(errors)
}

pub(super) async fn detail(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> Result<Json<BookInstanceView>, AppError> {
    let copy = find(&state.repo, parse_id(&id)?).await?;
    Ok(Json(BookInstanceView::new(copy, state.today())))
}

pub(super) async fn create(
    State(state): State<CatalogState>,
    user: CurrentUser,
    extract::Json(input): extract::Json<BookInstanceInput>,
) -> Result<(StatusCode, Json<BookInstanceView>), AppError> {
    user.require_staff()?;
    check_references(&state.repo, &input)
        .await?
        .into_result("invalid book instance")?;

    let copy = state.repo.create_instance(&input).await?;
    tracing::info!(instance_id = %copy.id, status = %copy.status, "book instance created");
    Ok((
        StatusCode::CREATED,
        Json(BookInstanceView::new(copy, state.today())),
    ))
}

pub(super) async fn update(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Path(id): Path<String>,
    extract::Json(input): extract::Json<BookInstanceInput>,
) -> Result<Json<BookInstanceView>, AppError> {
    user.require_staff()?;
    let id = parse_id(&id)?;
    check_references(&state.repo, &input)
        .await?
        .into_result("invalid book instance")?;

    let copy = state
        .repo
        .update_instance(id, &input)
        .await?
        .ok_or_else(|| AppError::not_found(NOT_FOUND))?;
    tracing::info!(instance_id = %copy.id, status = %copy.status, "book instance updated");
    Ok(Json(BookInstanceView::new(copy, state.today())))
}

/// Show the renewal form with a date three weeks out.
pub(super) async fn renew_form(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<RenewalPage>, AppError> {
    user.require(Permission::CanMarkReturned)?;
    let copy = find(&state.repo, parse_id(&id)?).await?;

    let today = state.today();
    Ok(Json(RenewalPage {
        book_instance: BookInstanceView::new(copy, today),
        form: RenewBookForm::initial(today),
    }))
}

/// Move a copy's due date. Nothing but `due_back` changes.
///
/// The body is only looked at once the copy is known to exist.
pub(super) async fn renew(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Path(id): Path<String>,
    body: Result<extract::Json<RenewBookForm>, AppError>,
) -> Result<Json<BookInstanceView>, AppError> {
    user.require(Permission::CanMarkReturned)?;
    let id = parse_id(&id)?;
    let copy = find(&state.repo, id).await?;
    let extract::Json(form) = body?;

    let today = state.today();
    let renewal_date = form
        .clean(today)
        .map_err(|errors| errors.into_error("invalid renewal date"))?;

    if !state.repo.set_due_back(copy.id, renewal_date).await? {
        return Err(AppError::not_found(NOT_FOUND));
    }
    tracing::info!(
        instance_id = %copy.id,
        librarian = %user.0.username,
        previous = ?copy.due_back,
        due_back = %renewal_date,
        "loan renewed"
    );

    let renewed = find(&state.repo, id).await?;
    Ok(Json(BookInstanceView::new(renewed, today)))
}

/// Copies on loan to the caller, soonest due first.
pub(super) async fn my_books(
    State(state): State<CatalogState>,
    CurrentUser(principal): CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookInstanceView>>, AppError> {
    on_loan(&state, Some(principal.user_id), query).await
}

/// Every copy on loan, for librarians.
pub(super) async fn all_borrowed(
    State(state): State<CatalogState>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<BookInstanceView>>, AppError> {
    user.require(Permission::CanMarkReturned)?;
    on_loan(&state, None, query).await
}

async fn on_loan(
    state: &CatalogState,
    borrower_id: Option<i64>,
    query: PageQuery,
) -> Result<Json<Page<BookInstanceView>>, AppError> {
    let total = state.repo.count_on_loan(borrower_id).await?;
    let window = query.window(total, state.settings.borrowed_page_size)?;

    let today = state.today();
    let copies = state
        .repo
        .list_on_loan(borrower_id, window.limit(), window.offset())
        .await?
        .into_iter()
        .map(|copy| BookInstanceView::new(copy, today))
        .collect();

    Ok(Json(window.into_page(copies)))
}
