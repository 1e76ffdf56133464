//! End-to-end tests against the router with in-memory stores.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use magicstream_api::config::ApiConfig;
use magicstream_api::{AppState, router};
use magicstream_core::auth::secrets::SigningSecrets;
use magicstream_core::models::auth::TokenRecord;
use magicstream_core::store::memory::{MemoryMovieStore, MemoryUserStore};
use magicstream_core::store::{MovieStore, UserStore};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    app: Router,
    users: Arc<MemoryUserStore>,
    movies: Arc<MemoryMovieStore>,
}

fn test_app() -> TestApp {
    let users = Arc::new(MemoryUserStore::new());
    let movies = Arc::new(MemoryMovieStore::new());
    let secrets = SigningSecrets::new("test-access-secret", "test-refresh-secret")
        .expect("fixture secrets");
    let state = AppState {
        users: users.clone(),
        movies: movies.clone(),
        config: ApiConfig::with_secrets(secrets),
    };
    TestApp {
        app: router(state),
        users,
        movies,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_auth(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn registration(email: &str, password: &str) -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": email,
        "password": password,
        "favouriteGenres": ["Drama", "Sci-Fi"],
    })
}

fn movie(imdb_id: &str) -> Value {
    json!({
        "imdbId": imdb_id,
        "title": "The Matrix",
        "posterPath": "/matrix.jpg",
        "youtubeId": "vKQi3bBA1y8",
        "genres": [{"genreId": 3, "genreName": "Sci-Fi"}],
        "adminReview": "A classic.",
        "ranking": {"rankingValue": 1, "rankingName": "Excellent"},
    })
}

async fn register_and_login(app: &Router, email: &str, password: &str) -> Value {
    let (status, _) = send(app, post_json("/register", registration(email, password))).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(
        app,
        post_json("/login", json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn hello_is_public() {
    let t = test_app();
    let (status, body) = send(&t.app, get_with_auth("/hello", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().starts_with("Hello from magicstream_api v"));
}

#[tokio::test]
async fn register_login_scenario() {
    let t = test_app();

    let (status, body) = send(&t.app, post_json("/register", registration("a@b.com", "p1"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["insertedId"].as_str().expect("insertedId").to_string();

    let (status, body) = send(&t.app, post_json("/register", registration("a@b.com", "p1"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
    assert_eq!(t.users.len(), 1);

    // Fresh registrations start with an empty token record and no plaintext.
    let stored = t.users.find_by_id(&user_id).await.unwrap().unwrap();
    assert!(stored.token.is_empty());
    assert!(stored.refresh_token.is_empty());
    assert_ne!(stored.password_hash, "p1");

    let (status, body) = send(
        &t.app,
        post_json("/login", json!({"email": "a@b.com", "password": "p1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id.as_str());
    assert_eq!(body["email"], "a@b.com");
    assert_eq!(body["firstName"], "Ada");
    assert_eq!(body["role"], "USER");
    assert_eq!(body["favouriteGenres"], json!(["Drama", "Sci-Fi"]));
    let token = body["token"].as_str().unwrap();
    let refresh = body["refreshToken"].as_str().unwrap();
    assert!(!token.is_empty());
    assert!(!refresh.is_empty());
    assert_ne!(token, refresh);

    // The response carries the pair that was persisted.
    let stored = t.users.find_by_id(&user_id).await.unwrap().unwrap();
    assert_eq!(stored.token, token);
    assert_eq!(stored.refresh_token, refresh);

    let (wrong_status, wrong_body) = send(
        &t.app,
        post_json("/login", json!({"email": "a@b.com", "password": "wrong"})),
    )
    .await;
    let (unknown_status, unknown_body) = send(
        &t.app,
        post_json("/login", json!({"email": "nobody@b.com", "password": "p1"})),
    )
    .await;
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["message"], "Invalid email or password");
}

#[tokio::test]
async fn registration_rejects_bad_payloads() {
    let t = test_app();
    let (status, body) = send(
        &t.app,
        post_json("/register", registration("not-an-email", "p1")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = send(&t.app, post_json("/register", json!({"email": "a@b.com"}))).await;
    assert!(status.is_client_error());
    assert!(t.users.is_empty());
}

#[tokio::test]
async fn protected_routes_require_a_valid_access_token() {
    let t = test_app();
    let login = register_and_login(&t.app, "a@b.com", "p1").await;
    let token = login["token"].as_str().unwrap();
    let refresh = login["refreshToken"].as_str().unwrap();

    let rejected = [
        None,
        Some(String::new()),
        Some("Bearer ".to_string()),
        Some(format!("bearer {token}")),
        Some(format!("Bearer  {token}")),
        Some(format!("Bearer {refresh}")),
        Some(format!("Bearer {token}x")),
    ];
    let mut bodies = Vec::new();
    for auth in &rejected {
        let (status, body) = send(&t.app, get_with_auth("/movie/tt0133093", auth.as_deref())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "auth header {auth:?}");
        bodies.push(body);
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));

    // Authenticated: the handler runs and reports the missing movie.
    let bearer = format!("Bearer {token}");
    let (status, body) = send(&t.app, get_with_auth("/movie/tt0133093", Some(&bearer))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Movie not found");
}

#[tokio::test]
async fn rejected_requests_never_reach_the_handler() {
    let t = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/addmovie")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::from(movie("tt0133093").to_string()))
        .unwrap();
    let (status, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&t.app, get_with_auth("/movies", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn authenticated_user_can_add_and_read_movies() {
    let t = test_app();
    let login = register_and_login(&t.app, "a@b.com", "p1").await;
    let bearer = format!("Bearer {}", login["token"].as_str().unwrap());

    let add = |body: Value| {
        Request::builder()
            .method("POST")
            .uri("/addmovie")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, bearer.as_str())
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let (status, body) = send(&t.app, add(movie("tt0133093"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["insertedId"], "tt0133093");

    let (status, _) = send(&t.app, add(movie("tt0133093"))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let mut invalid = movie("tt0000001");
    invalid["title"] = json!("");
    let (status, _) = send(&t.app, add(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&t.app, get_with_auth("/movie/tt0133093", Some(&bearer))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "The Matrix");
    assert_eq!(body["ranking"]["rankingName"], "Excellent");

    let (status, body) = send(&t.app, get_with_auth("/movies", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert!(t.movies.find_movie("tt0000001").await.unwrap().is_none());
}

#[tokio::test]
async fn refresh_issues_a_new_pair_for_the_latest_refresh_token() {
    let t = test_app();
    let login = register_and_login(&t.app, "a@b.com", "p1").await;
    let user_id = login["userId"].as_str().unwrap();
    let access = login["token"].as_str().unwrap();
    let refresh = login["refreshToken"].as_str().unwrap();

    // An access token is not a refresh token.
    let (status, _) = send(&t.app, post_json("/refresh", json!({"refreshToken": access}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&t.app, post_json("/refresh", json!({"refreshToken": refresh}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], user_id);
    let stored = t.users.find_by_id(user_id).await.unwrap().unwrap();
    assert_eq!(stored.refresh_token, body["refreshToken"].as_str().unwrap());

    // A newer pair supersedes the one presented.
    t.users
        .update_tokens(
            user_id,
            &TokenRecord {
                token: "newer-access".into(),
                refresh_token: "newer-refresh".into(),
                updated_at: Utc::now(),
            },
        )
        .await
        .unwrap();
    let (status, body) = send(&t.app, post_json("/refresh", json!({"refreshToken": refresh}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}
