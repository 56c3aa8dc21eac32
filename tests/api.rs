use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use bookshelf_app::{
    admin,
    modules::books::{models::Book, store::BookStore},
    modules::users::{
        models::{NewUser, User, UserFlags},
        store::UserStore,
    },
    App,
};
use bookshelf_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: App,
    router: Router,
}

impl Harness {
    async fn new() -> Self {
        let pool = bookshelf_db::connect("sqlite::memory:", 1).await.unwrap();
        let app = App::with_pool(Settings::default(), pool).await.unwrap();
        let router = app.router();
        Self { app, router }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, value)
    }

    async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    async fn put(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), None).await
    }

    /// Account with an unusable password plus a token for it
    async fn reader(&self, email: &str) -> (User, String) {
        let user = self
            .app
            .state
            .users
            .create(NewUser {
                email: email.to_string(),
                password_hash: "!fixture".to_string(),
                flags: UserFlags::default(),
            })
            .await
            .unwrap();
        let token = self.app.jwt.issue(user.id).unwrap();
        (user, token)
    }

    async fn book(&self, title: &str) -> Book {
        admin::add_book(&self.app.state, title, "Anon").await.unwrap()
    }

    async fn stored(&self, id: i64) -> Book {
        self.app.state.books.get(id).await.unwrap().unwrap()
    }

    async fn assert_invariant(&self) {
        for book in self.app.state.books.list().await.unwrap() {
            assert_eq!(book.status, book.borrower.is_none(), "{:?}", book);
        }
    }
}

fn book_json(book: &Book) -> Value {
    serde_json::to_value(book).unwrap()
}

#[tokio::test]
async fn create_user_matches_documented_example() {
    let h = Harness::new().await;
    let body = json!({"email": "a@x.com", "password": "p"});

    let (status, created) = h.send(Method::POST, "/user/create/", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        created,
        json!({"id": 1, "email": "a@x.com", "is_active": true, "is_staff": false, "is_superuser": false})
    );

    let (status, duplicate) = h.send(Method::POST, "/user/create/", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate, json!({"error": "User with email a@x.com already exists"}));

    let stored = h.app.state.users.find_by_email("a@x.com").await.unwrap().unwrap();
    assert_eq!(stored.id, 1);
    assert!(h.app.state.users.get(2).await.unwrap().is_none());
    assert_ne!(stored.password, "p");
}

#[tokio::test]
async fn create_user_requires_an_email() {
    let h = Harness::new().await;

    for body in [json!({"password": "p"}), json!({"email": "", "password": "p"})] {
        let (status, error) = h.send(Method::POST, "/user/create/", None, Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error, json!({"error": "The Email must be set"}));
    }
}

#[tokio::test]
async fn create_user_rejects_malformed_bodies() {
    let h = Harness::new().await;

    let (status, error) = h
        .send(
            Method::POST,
            "/user/create/",
            None,
            Some(json!({"email": "a@x.com", "nickname": "al"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("nickname"));
}

#[tokio::test]
async fn create_user_accepts_flags_and_normalizes_domain() {
    let h = Harness::new().await;

    let (status, created) = h
        .send(
            Method::POST,
            "/user/create/",
            None,
            Some(json!({"email": "Staff@X.COM", "password": "p", "is_staff": true})),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["email"], "Staff@x.com");
    assert_eq!(created["is_staff"], true);
    assert_eq!(created["is_superuser"], false);

    let (status, _) = h
        .send(
            Method::POST,
            "/user/create/",
            None,
            Some(json!({"email": "Staff@x.com", "password": "q"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let h = Harness::new().await;
    let (user, token) = h.reader("inactive@x.com").await;
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(user.id)
        .execute(&h.app.pool)
        .await
        .unwrap();

    let routes = [
        (Method::GET, "/book/get-all/"),
        (Method::GET, "/user/get-all-books/"),
        (Method::GET, "/book/1/detail/"),
        (Method::PUT, "/book/1/take/"),
        (Method::PUT, "/book/1/return/"),
        (Method::PUT, "/book/return-all/"),
    ];

    for (method, uri) in routes {
        let (status, body) = h.send(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(body["error"].is_string());

        let (status, _) = h.send(method.clone(), uri, Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);

        let (status, _) = h.send(method.clone(), uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn token_for_deleted_user_is_rejected() {
    let h = Harness::new().await;
    let (user, token) = h.reader("gone@x.com").await;
    h.app.state.users.delete(user.id).await.unwrap();

    let (status, body) = h.get("/book/get-all/", &token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"error": "User not found"}));
}

#[tokio::test]
async fn list_all_books_in_id_order() {
    let h = Harness::new().await;
    let (_, token) = h.reader("a@x.com").await;
    let first = h.book("Zebra").await;
    let second = h.book("Aardvark").await;

    let (status, books) = h.get("/book/get-all/", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(books, json!([book_json(&first), book_json(&second)]));
}

#[tokio::test]
async fn book_detail_and_missing_book() {
    let h = Harness::new().await;
    let (_, token) = h.reader("a@x.com").await;
    let book = h.book("Emma").await;

    let (status, body) = h.get(&format!("/book/{}/detail/", book.id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, book_json(&book));

    let (status, body) = h.get("/book/999/detail/", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Book with id 999 does not exist"}));
}

#[tokio::test]
async fn non_integer_book_id_is_a_bad_request() {
    let h = Harness::new().await;
    let (_, token) = h.reader("a@x.com").await;

    let (status, body) = h.get("/book/abc/detail/", &token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn take_available_book() {
    let h = Harness::new().await;
    let (user, token) = h.reader("a@x.com").await;
    let book = h.book("Emma").await;

    let (status, body) = h.put(&format!("/book/{}/take/", book.id), &token).await;
    assert_eq!(status, StatusCode::OK);

    let stored = h.stored(book.id).await;
    assert!(!stored.status);
    assert_eq!(stored.borrower, Some(user.id));
    assert_eq!(body, book_json(&stored));
    h.assert_invariant().await;
}

#[tokio::test]
async fn take_book_already_in_your_use() {
    let h = Harness::new().await;
    let (_, token) = h.reader("a@x.com").await;
    let book = h.book("Emma").await;
    h.put(&format!("/book/{}/take/", book.id), &token).await;
    let before = h.stored(book.id).await;

    let (status, body) = h.put(&format!("/book/{}/take/", book.id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "This book is in your use"}));
    assert_eq!(h.stored(book.id).await, before);
}

#[tokio::test]
async fn take_book_held_by_someone_else() {
    let h = Harness::new().await;
    let (alice, alice_token) = h.reader("alice@x.com").await;
    let (_, bob_token) = h.reader("bob@x.com").await;
    let book = h.book("Emma").await;
    h.put(&format!("/book/{}/take/", book.id), &alice_token).await;

    let (status, body) = h.put(&format!("/book/{}/take/", book.id), &bob_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "This book is not available"}));
    assert_eq!(h.stored(book.id).await.borrower, Some(alice.id));
}

#[tokio::test]
async fn take_missing_book() {
    let h = Harness::new().await;
    let (_, token) = h.reader("a@x.com").await;

    let (status, body) = h.put("/book/42/take/", &token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Book with id 42 does not exist"}));
}

#[tokio::test]
async fn concurrent_checkouts_have_one_winner() {
    let h = Harness::new().await;
    let (_, alice_token) = h.reader("alice@x.com").await;
    let (_, bob_token) = h.reader("bob@x.com").await;
    let book = h.book("Emma").await;
    let uri = format!("/book/{}/take/", book.id);

    let ((_, a), (_, b)) = tokio::join!(h.put(&uri, &alice_token), h.put(&uri, &bob_token));

    let refusals = [&a, &b]
        .iter()
        .filter(|body| body["error"] == "This book is not available")
        .count();
    assert_eq!(refusals, 1, "{} / {}", a, b);
    h.assert_invariant().await;
}

#[tokio::test]
async fn return_book_flow() {
    let h = Harness::new().await;
    let (_, alice_token) = h.reader("alice@x.com").await;
    let (_, bob_token) = h.reader("bob@x.com").await;
    let book = h.book("Emma").await;
    let uri = format!("/book/{}/return/", book.id);

    let (status, body) = h.put(&uri, &alice_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "This book isn't in your use"}));
    assert!(h.stored(book.id).await.status);

    h.put(&format!("/book/{}/take/", book.id), &alice_token).await;
    let held = h.stored(book.id).await;

    let (status, body) = h.put(&uri, &bob_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"error": "This book isn't in your use"}));
    assert_eq!(h.stored(book.id).await, held);

    let (status, body) = h.put(&uri, &alice_token).await;
    assert_eq!(status, StatusCode::OK);
    let stored = h.stored(book.id).await;
    assert!(stored.status);
    assert_eq!(stored.borrower, None);
    assert_eq!(body, book_json(&stored));
    h.assert_invariant().await;

    let (status, _) = h.put("/book/77/return/", &alice_token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn my_books_and_return_all() {
    let h = Harness::new().await;
    let (alice, alice_token) = h.reader("alice@x.com").await;
    let (bob, bob_token) = h.reader("bob@x.com").await;

    let mut alice_books = Vec::new();
    for title in ["One", "Two", "Three"] {
        let book = h.book(title).await;
        h.put(&format!("/book/{}/take/", book.id), &alice_token).await;
        alice_books.push(h.stored(book.id).await);
    }
    let bobs = h.book("Four").await;
    h.put(&format!("/book/{}/take/", bobs.id), &bob_token).await;

    let (status, mine) = h.get("/user/get-all-books/", &alice_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(mine, serde_json::to_value(&alice_books).unwrap());

    let (status, message) = h.put("/book/return-all/", &alice_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(message, json!("3 books were returned."));

    assert!(h.app.state.books.list_borrowed_by(alice.id).await.unwrap().is_empty());
    assert_eq!(h.stored(bobs.id).await.borrower, Some(bob.id));
    for book in &alice_books {
        assert!(h.stored(book.id).await.status);
    }
    h.assert_invariant().await;

    let (_, message) = h.put("/book/return-all/", &alice_token).await;
    assert_eq!(message, json!("0 books were returned."));

    let (_, mine) = h.get("/user/get-all-books/", &alice_token).await;
    assert_eq!(mine, json!([]));
}

#[tokio::test]
async fn health_and_openapi_are_served() {
    let h = Harness::new().await;

    let request = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
    let response = h.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let (status, spec) = h.send(Method::GET, "/docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    for path in [
        "/book/get-all/",
        "/book/{book_id}/detail/",
        "/book/{book_id}/take/",
        "/book/{book_id}/return/",
        "/book/return-all/",
        "/user/create/",
        "/user/get-all-books/",
    ] {
        assert!(spec["paths"][path].is_object(), "missing {}", path);
    }
    assert!(spec["components"]["schemas"]["Book"].is_object());
}
