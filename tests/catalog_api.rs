use std::collections::BTreeSet;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use catalog_app::modules::accounts::password;
use catalog_app::modules::accounts::repository::AccountsRepository;
use catalog_app::modules::catalog::models::{
    AuthorInput, BookInput, BookInstance, BookInstanceInput, GenreInput, LoanStatus,
};
use catalog_app::modules::catalog::repository::CatalogRepository;
use catalog_app::Application;
use catalog_authz::Permission;
use catalog_kernel::settings::Settings;
use catalog_kernel::{AppContext, FixedClock};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn today() -> NaiveDate {
    date(2024, 3, 15)
}

struct TestApp {
    router: Router,
    catalog: CatalogRepository,
    accounts: AccountsRepository,
}

impl TestApp {
    async fn new() -> Self {
        let mut settings = Settings::default();
        settings.database.url = "sqlite::memory:".to_string();

        let db = catalog_db::connect(&settings.database).await.unwrap();
        let ctx = AppContext::new(db.clone(), settings, Arc::new(FixedClock(today())));
        let app = Application::new(ctx).unwrap();
        app.migrate().await.unwrap();

        Self {
            router: app.router(),
            catalog: CatalogRepository::new(db.clone()),
            accounts: AccountsRepository::new(db),
        }
    }

    async fn user(&self, username: &str, is_staff: bool, permissions: &[Permission]) -> i64 {
        let hash = password::hash_password("secret").unwrap();
        let permissions: BTreeSet<Permission> = permissions.iter().copied().collect();
        self.accounts
            .create_user(username, &hash, is_staff, &permissions)
            .await
            .unwrap()
            .id
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Option<String>, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(';').next())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, set_cookie, body)
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> (StatusCode, Value) {
        let (status, _, body) = self.send(Method::GET, uri, cookie, None).await;
        (status, body)
    }

    async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send(Method::POST, uri, cookie, Some(body)).await;
        (status, body)
    }

    /// Log in and return the session cookie pair.
    async fn login(&self, username: &str) -> String {
        let (status, cookie, _) = self
            .send(
                Method::POST,
                "/api/accounts/login",
                None,
                Some(json!({ "username": username, "password": "secret" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        cookie.expect("login issues a session cookie")
    }

    async fn author(&self, first: &str, last: &str) -> i64 {
        self.catalog
            .create_author(&AuthorInput {
                first_name: first.to_string(),
                last_name: last.to_string(),
                date_of_birth: None,
                date_of_death: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn book(&self, title: &str, author_id: Option<i64>) -> i64 {
        self.catalog
            .create_book(&BookInput {
                title: title.to_string(),
                author_id,
                summary: "A summary".to_string(),
                isbn: "9780000000000".to_string(),
                genre_ids: vec![],
            })
            .await
            .unwrap()
            .id
    }

    async fn copy(
        &self,
        book_id: i64,
        status: LoanStatus,
        borrower_id: Option<i64>,
        due_back: Option<NaiveDate>,
    ) -> BookInstance {
        self.catalog
            .create_instance(&BookInstanceInput {
                book_id: Some(book_id),
                imprint: "First edition".to_string(),
                due_back,
                borrower_id,
                status,
            })
            .await
            .unwrap()
    }
}

fn first_error(body: &Value) -> &str {
    body["error"]["details"][0]["error"].as_str().unwrap_or_default()
}

#[tokio::test]
async fn dashboard_counts_and_remembers_visits() {
    let app = TestApp::new().await;
    app.catalog
        .create_genre(&GenreInput {
            name: "Fantasy".to_string(),
        })
        .await
        .unwrap();
    let author = app.author("Ursula", "Le Guin").await;
    let book = app.book("A Wizard of Earthsea", Some(author)).await;
    app.copy(book, LoanStatus::Available, None, None).await;
    app.copy(book, LoanStatus::Maintenance, None, None).await;

    let (status, cookie, body) = app.send(Method::GET, "/api/catalog", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["num_visits"], 0);
    assert_eq!(body["num_books"], 1);
    assert_eq!(body["num_instances"], 2);
    assert_eq!(body["num_instances_available"], 1);
    assert_eq!(body["num_authors"], 1);
    assert_eq!(body["num_genres"], 1);

    let cookie = cookie.expect("first visit issues a cookie");
    let (_, body) = app.get("/api/catalog", Some(&cookie)).await;
    assert_eq!(body["num_visits"], 1);
    let (_, body) = app.get("/api/catalog", Some(&cookie)).await;
    assert_eq!(body["num_visits"], 2);

    // Another client starts from zero.
    let (_, body) = app.get("/api/catalog", None).await;
    assert_eq!(body["num_visits"], 0);
}

#[tokio::test]
async fn renewal_form_proposes_three_weeks() {
    let app = TestApp::new().await;
    app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", None).await;
    let copy = app
        .copy(book, LoanStatus::OnLoan, None, Some(date(2024, 3, 20)))
        .await;
    let cookie = app.login("librarian").await;

    let (status, body) = app
        .get(&format!("/api/catalog/bookinstances/{}/renew", copy.id), Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["form"]["renewal_date"], "2024-04-05");
    assert_eq!(body["book_instance"]["id"], copy.id.to_string());
}

#[tokio::test]
async fn renewal_moves_only_the_due_date() {
    let app = TestApp::new().await;
    let librarian = app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", None).await;
    let copy = app
        .copy(book, LoanStatus::OnLoan, Some(librarian), Some(date(2024, 3, 20)))
        .await;
    let cookie = app.login("librarian").await;
    let uri = format!("/api/catalog/bookinstances/{}/renew", copy.id);

    let (status, body) = app
        .post(&uri, Some(&cookie), json!({ "renewal_date": "2024-04-12" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["due_back"], "2024-04-12");

    let stored = app.catalog.get_instance(copy.id).await.unwrap().unwrap();
    assert_eq!(stored.due_back, Some(date(2024, 4, 12)));
    assert_eq!(stored.status, copy.status);
    assert_eq!(stored.imprint, copy.imprint);
    assert_eq!(stored.borrower, copy.borrower);
    assert_eq!(stored.book, copy.book);

    // Today itself is acceptable.
    let (status, _) = app
        .post(&uri, Some(&cookie), json!({ "renewal_date": "2024-03-15" }))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn renewal_rejects_dates_outside_the_window() {
    let app = TestApp::new().await;
    app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", None).await;
    let original = Some(date(2024, 3, 20));
    let copy = app.copy(book, LoanStatus::OnLoan, None, original).await;
    let cookie = app.login("librarian").await;
    let uri = format!("/api/catalog/bookinstances/{}/renew", copy.id);

    let cases = [
        (json!({ "renewal_date": "2024-03-14" }), "Invalid date - renewal in past"),
        (
            json!({ "renewal_date": "2024-04-13" }),
            "Invalid date - renewal more than 4 weeks ahead",
        ),
        (json!({ "renewal_date": "next week" }), "Enter a valid date."),
        (json!({}), "This field is required."),
    ];
    for (form, message) in cases {
        let (status, body) = app.post(&uri, Some(&cookie), form).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["details"][0]["field"], "renewal_date");
        assert_eq!(first_error(&body), message);
    }

    let stored = app.catalog.get_instance(copy.id).await.unwrap().unwrap();
    assert_eq!(stored.due_back, original);
}

#[tokio::test]
async fn renewal_of_unknown_copy_is_not_found() {
    let app = TestApp::new().await;
    app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let cookie = app.login("librarian").await;

    let (status, _) = app
        .post(
            &format!("/api/catalog/bookinstances/{}/renew", Uuid::new_v4()),
            Some(&cookie),
            json!({ "renewal_date": "2024-03-20" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .get("/api/catalog/bookinstances/not-a-uuid/renew", Some(&cookie))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renewal_requires_the_permission() {
    let app = TestApp::new().await;
    app.user("reader", false, &[]).await;
    let book = app.book("Dune", None).await;
    let copy = app.copy(book, LoanStatus::OnLoan, None, None).await;
    let uri = format!("/api/catalog/bookinstances/{}/renew", copy.id);
    let form = json!({ "renewal_date": "2024-03-20" });

    let (status, _) = app.post(&uri, None, form.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = app.login("reader").await;
    let (status, _) = app.post(&uri, Some(&cookie), form).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&uri, Some(&cookie)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let stored = app.catalog.get_instance(copy.id).await.unwrap().unwrap();
    assert_eq!(stored.due_back, None);
}

#[tokio::test]
async fn book_list_is_paginated() {
    let app = TestApp::new().await;
    for title in ["Alpha", "Beta", "Gamma"] {
        app.book(title, None).await;
    }

    let (status, body) = app.get("/api/catalog/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["has_next"], true);

    let (status, body) = app.get("/api/catalog/books?page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["has_previous"], true);

    let (status, _) = app.get("/api/catalog/books?page=3", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_detail_lists_copies_with_overdue_flag() {
    let app = TestApp::new().await;
    let book = app.book("Dune", None).await;
    app.copy(book, LoanStatus::OnLoan, None, Some(date(2024, 3, 1)))
        .await;

    let (status, body) = app.get(&format!("/api/catalog/books/{book}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["copies"][0]["is_overdue"], true);

    let (status, _) = app.get("/api/catalog/books/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_manage_authors() {
    let app = TestApp::new().await;
    app.user("admin", true, &[]).await;
    app.user("reader", false, &[]).await;
    let admin = app.login("admin").await;
    let reader = app.login("reader").await;

    let author = json!({ "first_name": "Frank", "last_name": "Herbert", "date_of_birth": "1920-10-08" });
    let (status, _) = app.post("/api/catalog/authors", Some(&reader), author.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/catalog/authors", Some(&admin), author).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["display_name"], "Herbert, Frank");
    let id = created["id"].as_i64().unwrap();

    let (status, body) = app
        .post(
            "/api/catalog/authors",
            Some(&admin),
            json!({ "first_name": "", "last_name": "X", "date_of_birth": "2000-01-01", "date_of_death": "1999-01-01" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"].as_array().unwrap().len(), 2);

    let (status, _, updated) = app
        .send(
            Method::PUT,
            &format!("/api/catalog/authors/{id}"),
            Some(&admin),
            Some(json!({ "first_name": "Frank", "last_name": "Herbert", "date_of_birth": "1920-10-08", "date_of_death": "1986-02-11" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["date_of_death"], "1986-02-11");

    let book = app.book("Dune", Some(id)).await;
    let (_, detail) = app.get(&format!("/api/catalog/authors/{id}"), None).await;
    assert_eq!(detail["books"][0]["title"], "Dune");

    let (status, _, _) = app
        .send(Method::DELETE, &format!("/api/catalog/authors/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/catalog/authors/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let book = app.catalog.get_book(book).await.unwrap().unwrap();
    assert_eq!(book.author, None);
}

#[tokio::test]
async fn borrowed_lists_are_scoped_and_ordered() {
    let app = TestApp::new().await;
    let reader = app.user("reader", false, &[]).await;
    let other = app.user("other", false, &[]).await;
    app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", None).await;

    let later = app
        .copy(book, LoanStatus::OnLoan, Some(reader), Some(date(2024, 4, 1)))
        .await;
    let sooner = app
        .copy(book, LoanStatus::OnLoan, Some(reader), Some(date(2024, 3, 1)))
        .await;
    app.copy(book, LoanStatus::OnLoan, Some(other), Some(date(2024, 3, 10)))
        .await;
    app.copy(book, LoanStatus::Reserved, Some(reader), Some(date(2024, 3, 5)))
        .await;

    let (status, _) = app.get("/api/catalog/mybooks", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = app.login("reader").await;
    let (status, body) = app.get("/api/catalog/mybooks", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, [sooner.id.to_string(), later.id.to_string()]);
    assert_eq!(body["items"][0]["is_overdue"], true);
    assert_eq!(body["items"][1]["is_overdue"], false);

    let (status, _) = app.get("/api/catalog/borrowed", Some(&cookie)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let librarian = app.login("librarian").await;
    let (status, body) = app.get("/api/catalog/borrowed", Some(&librarian)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_items"], 3);
}

#[tokio::test]
async fn login_logout_round_trip() {
    let app = TestApp::new().await;
    app.user("reader", false, &[]).await;

    let (status, _) = app
        .post(
            "/api/accounts/login",
            None,
            json!({ "username": "reader", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let cookie = app.login("reader").await;
    let (status, me) = app.get("/api/accounts/me", Some(&cookie)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["username"], "reader");

    let (status, cleared, _) = app
        .send(Method::POST, "/api/accounts/logout", Some(&cookie), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(cleared.as_deref(), Some("catalog_session="));

    let (status, _) = app.get("/api/accounts/me", Some(&cookie)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn openapi_document_covers_every_module() {
    let app = TestApp::new().await;
    let (status, doc) = app.get("/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/catalog"]["get"].is_object());
    assert!(doc["paths"]["/api/catalog/bookinstances/{id}/renew"]["post"].is_object());
    assert!(doc["paths"]["/api/accounts/login"]["post"].is_object());
}

#[tokio::test]
async fn renewal_looks_up_the_copy_before_reading_the_body() {
    let app = TestApp::new().await;
    app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let cookie = app.login("librarian").await;
    let uri = format!("/api/catalog/bookinstances/{}/renew", Uuid::new_v4());

    let (status, _) = app
        .post(&uri, Some(&cookie), json!({ "renewal_date": 20240320 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = app.send(Method::POST, &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn renewal_with_a_non_string_date_is_a_field_error() {
    let app = TestApp::new().await;
    app.user("librarian", false, &[Permission::CanMarkReturned]).await;
    let book = app.book("Dune", None).await;
    let original = Some(date(2024, 3, 20));
    let copy = app.copy(book, LoanStatus::OnLoan, None, original).await;
    let cookie = app.login("librarian").await;
    let uri = format!("/api/catalog/bookinstances/{}/renew", copy.id);

    for value in [json!(20240320), json!(true), json!({ "year": 2024 })] {
        let (status, body) = app
            .post(&uri, Some(&cookie), json!({ "renewal_date": value }))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");
        assert_eq!(body["error"]["details"][0]["field"], "renewal_date");
        assert_eq!(first_error(&body), "Enter a valid date.");
    }

    let stored = app.catalog.get_instance(copy.id).await.unwrap().unwrap();
    assert_eq!(stored.due_back, original);
}

#[tokio::test]
async fn staff_create_genres() {
    let app = TestApp::new().await;
    app.user("admin", true, &[]).await;
    app.user("reader", false, &[]).await;
    let admin = app.login("admin").await;
    let reader = app.login("reader").await;
    let genre = json!({ "name": "Science Fiction" });

    let (status, _) = app.post("/api/catalog/genres", None, genre.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.post("/api/catalog/genres", Some(&reader), genre.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = app.post("/api/catalog/genres", Some(&admin), genre).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Science Fiction");

    let (status, body) = app
        .post("/api/catalog/genres", Some(&admin), json!({ "name": "   " }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(first_error(&body), "This field is required.");

    let (status, body) = app
        .post("/api/catalog/genres", Some(&admin), json!({ "name": "x".repeat(201) }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        first_error(&body),
        "Ensure this value has at most 200 characters (it has 201)."
    );

    let (_, genres) = app.get("/api/catalog/genres", None).await;
    assert_eq!(genres.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn book_creation_checks_author_and_genres() {
    let app = TestApp::new().await;
    app.user("admin", true, &[]).await;
    let admin = app.login("admin").await;
    let author = app.author("Frank", "Herbert").await;
    let genre = app
        .catalog
        .create_genre(&GenreInput {
            name: "Science Fiction".to_string(),
        })
        .await
        .unwrap();

    let book = |author_id: i64, genre_ids: Vec<i64>| {
        json!({
            "title": "Dune",
            "author_id": author_id,
            "summary": "Spice",
            "isbn": "9780441013593",
            "genre_ids": genre_ids,
        })
    };

    let (status, body) = app
        .post("/api/catalog/books", Some(&admin), book(999, vec![genre.id]))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "author_id");

    let (status, body) = app
        .post("/api/catalog/books", Some(&admin), book(author, vec![genre.id, 999]))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"][0]["field"], "genre_ids");
    assert_eq!(
        first_error(&body),
        "Select a valid choice. 999 is not one of the available choices."
    );
    assert_eq!(app.catalog.count_books().await.unwrap(), 0);

    let (status, created) = app
        .post("/api/catalog/books", Some(&admin), book(author, vec![genre.id]))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["author"]["name"], "Herbert, Frank");
    assert_eq!(created["display_genre"], "Science Fiction");
}

#[tokio::test]
async fn deleting_a_book_keeps_its_copies() {
    let app = TestApp::new().await;
    app.user("admin", true, &[]).await;
    let admin = app.login("admin").await;
    let book = app.book("Dune", None).await;
    let copy = app.copy(book, LoanStatus::Available, None, None).await;

    let (status, _, _) = app
        .send(Method::DELETE, &format!("/api/catalog/books/{book}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/catalog/books/{book}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .get(&format!("/api/catalog/bookinstances/{}", copy.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["book"].is_null());
    assert_eq!(app.catalog.get_instance(copy.id).await.unwrap().unwrap().book, None);

    let (status, _, _) = app
        .send(Method::DELETE, &format!("/api/catalog/books/{book}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn staff_lend_and_return_copies() {
    let app = TestApp::new().await;
    app.user("admin", true, &[]).await;
    let reader_id = app.user("reader", false, &[]).await;
    let admin = app.login("admin").await;
    let reader = app.login("reader").await;
    let book = app.book("Dune", None).await;

    let (status, _) = app
        .post(
            "/api/catalog/bookinstances",
            Some(&reader),
            json!({ "book_id": book, "imprint": "Ace, 1990" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post(
            "/api/catalog/bookinstances",
            Some(&admin),
            json!({ "book_id": 999, "imprint": "Ace, 1990", "borrower_id": 999 }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["book_id", "borrower_id"]);

    let (status, created) = app
        .post(
            "/api/catalog/bookinstances",
            Some(&admin),
            json!({ "book_id": book, "imprint": "Ace, 1990" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "maintenance");
    let id = created["id"].as_str().unwrap().to_string();
    let uri = format!("/api/catalog/bookinstances/{id}");

    let lend = json!({
        "book_id": book,
        "imprint": "Ace, 1990",
        "status": "on_loan",
        "borrower_id": reader_id,
        "due_back": "2024-03-29",
    });
    let (status, _, lent) = app.send(Method::PUT, &uri, Some(&admin), Some(lend)).await;
    assert_eq!(status, StatusCode::OK, "{lent}");
    assert_eq!(lent["borrower"]["username"], "reader");
    assert_eq!(lent["status_label"], "On loan");

    let (_, mine) = app.get("/api/catalog/mybooks", Some(&reader)).await;
    assert_eq!(mine["items"][0]["id"], id.as_str());

    let give_back = json!({ "book_id": book, "imprint": "Ace, 1990", "status": "available" });
    let (status, _, returned) = app
        .send(Method::PUT, &uri, Some(&admin), Some(give_back.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(returned["borrower"].is_null());
    assert!(returned["due_back"].is_null());

    let (_, mine) = app.get("/api/catalog/mybooks", Some(&reader)).await;
    assert_eq!(mine["total_items"], 0);

    let (status, _, _) = app
        .send(
            Method::PUT,
            &format!("/api/catalog/bookinstances/{}", Uuid::new_v4()),
            Some(&admin),
            Some(give_back),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn book_detail_lists_undated_copies_first() {
    let app = TestApp::new().await;
    let book = app.book("Dune", None).await;
    let late = app
        .copy(book, LoanStatus::OnLoan, None, Some(date(2024, 4, 1)))
        .await;
    let undated = app.copy(book, LoanStatus::Available, None, None).await;
    let early = app
        .copy(book, LoanStatus::OnLoan, None, Some(date(2024, 3, 20)))
        .await;

    let (_, body) = app.get(&format!("/api/catalog/books/{book}"), None).await;
    let ids: Vec<&str> = body["copies"]
        .as_array()
        .unwrap()
        .iter()
        .map(|copy| copy["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        [undated.id.to_string(), early.id.to_string(), late.id.to_string()]
    );
}

#[tokio::test]
async fn page_parameter_is_parsed_leniently() {
    let app = TestApp::new().await;
    for title in ["Alpha", "Beta", "Gamma"] {
        app.book(title, None).await;
    }

    let (status, body) = app.get("/api/catalog/books?page=abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, body) = app.get("/api/catalog/books?page=last", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"][0]["title"], "Gamma");
}
