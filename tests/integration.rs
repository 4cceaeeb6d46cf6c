//! Integration tests: health, register/login flow, duplicate handling, /auth/me.
//!
//! Run with `cargo test`. Tests that need a database are skipped unless
//! `TEST_DATABASE_URL` is set (Postgres, run migrations first).

use authgate::auth::{AuthService, JwtSecret};
use authgate::{create_app, db, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::util::ServiceExt;

const TEST_JWT_SECRET: &str = "test-jwt-secret-min-32-chars!!!!";

async fn test_state(database_url: &str) -> Result<AppState, Box<dyn std::error::Error>> {
    let db_pool = db::create_pool(database_url, 5).await?;
    AuthService::bootstrap_roles(&db_pool).await?;
    let jwt_secret = JwtSecret::new(TEST_JWT_SECRET.to_string(), Duration::from_secs(3600));
    Ok(AppState {
        db: db_pool,
        jwt_secret,
    })
}

fn unique_email() -> String {
    format!(
        "test-{}@example.com",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    )
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => {
            eprintln!("Skip integration test: set TEST_DATABASE_URL");
            return;
        }
    };
    let state = match test_state(&database_url).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Skip integration test: {}", e);
            return;
        }
    };

    let app = create_app(state);
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.get("status").and_then(|v| v.as_str()), Some("ok"));
}

#[tokio::test]
async fn register_then_login() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let state = match test_state(&database_url).await {
        Ok(s) => s,
        Err(_) => return,
    };
    let app = create_app(state);

    let email = unique_email();
    let register_body = serde_json::json!({
        "firstName": "Test",
        "lastName": "User",
        "email": email,
        "password": "Secret123"
    });
    let res = app
        .clone()
        .oneshot(post_json("/auth/register", &register_body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED, "register should succeed");
    let json = body_json(res).await;
    assert_eq!(
        json.get("tokenType").and_then(|v| v.as_str()),
        Some("Bearer")
    );
    assert_eq!(
        json.get("roles").and_then(|v| v.as_array()).map(Vec::len),
        Some(1),
        "new user should have exactly one role"
    );
    assert_eq!(json["roles"][0].as_str(), Some("ROLE_USER"));
    let token = json.get("token").and_then(|v| v.as_str()).unwrap();
    assert!(!token.is_empty());
    let registered_id = json.get("id").and_then(serde_json::Value::as_i64).unwrap();

    let login_body = serde_json::json!({ "email": email, "password": "Secret123" });
    let res = app
        .oneshot(post_json("/auth/login", &login_body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK, "login should succeed");
    let json = body_json(res).await;
    let token = json.get("token").and_then(|v| v.as_str()).unwrap();

    // Token subject must match the registered user, and the embedded
    // authorities must equal the role-name set.
    let jwt = JwtSecret::new(TEST_JWT_SECRET.to_string(), Duration::from_secs(3600));
    let identity = jwt.validate(token).unwrap();
    assert_eq!(identity.user_id, registered_id);
    assert_eq!(identity.authorities, vec!["ROLE_USER"]);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let state = match test_state(&database_url).await {
        Ok(s) => s,
        Err(_) => return,
    };
    let app = create_app(state);

    let email = unique_email();
    let body = serde_json::json!({
        "firstName": "First",
        "lastName": "Writer",
        "email": email,
        "password": "Secret123"
    });
    let res = app
        .clone()
        .oneshot(post_json("/auth/register", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app.oneshot(post_json("/auth/register", &body)).await.unwrap();
    assert_eq!(
        res.status(),
        StatusCode::CONFLICT,
        "second registration with the same email should fail"
    );
}

#[tokio::test]
async fn duplicate_phone_is_rejected() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let state = match test_state(&database_url).await {
        Ok(s) => s,
        Err(_) => return,
    };
    let app = create_app(state);

    let phone = format!(
        "+1555{:010}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
            % 10_000_000_000
    );
    let first = serde_json::json!({
        "firstName": "Phone",
        "lastName": "Owner",
        "email": unique_email(),
        "phoneNumber": phone,
        "password": "Secret123"
    });
    let res = app
        .clone()
        .oneshot(post_json("/auth/register", &first))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let second = serde_json::json!({
        "firstName": "Phone",
        "lastName": "Claimant",
        "email": unique_email(),
        "phoneNumber": phone,
        "password": "Secret123"
    });
    let res = app.oneshot(post_json("/auth/register", &second)).await.unwrap();
    assert_eq!(
        res.status(),
        StatusCode::CONFLICT,
        "second registration with the same phone number should fail"
    );
}

#[tokio::test]
async fn aborted_registration_leaves_no_user_row() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let pool = match db::create_pool(&database_url, 5).await {
        Ok(p) => p,
        Err(_) => return,
    };

    // The registration write path runs on a transaction; an error between
    // the user insert and the role attach must roll the row back so the
    // email stays available for retries.
    let email = unique_email();
    let mut tx = pool.begin().await.unwrap();
    db::user_insert(&mut tx, "Tx", "Abort", &email, None, "$argon2id$irrelevant")
        .await
        .unwrap();
    drop(tx); // rollback

    let row = db::user_find_by_email(&pool, &email).await.unwrap();
    assert!(row.is_none(), "rolled-back registration must not persist a user");
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let state = match test_state(&database_url).await {
        Ok(s) => s,
        Err(_) => return,
    };
    let app = create_app(state);

    let email = unique_email();
    let body = serde_json::json!({
        "firstName": "Enum",
        "lastName": "Probe",
        "email": email,
        "password": "Secret123"
    });
    let res = app
        .clone()
        .oneshot(post_json("/auth/register", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let wrong_password = serde_json::json!({ "email": email, "password": "WrongPass1" });
    let res_wrong = app
        .clone()
        .oneshot(post_json("/auth/login", &wrong_password))
        .await
        .unwrap();

    let unknown_user =
        serde_json::json!({ "email": unique_email(), "password": "Secret123" });
    let res_unknown = app
        .oneshot(post_json("/auth/login", &unknown_user))
        .await
        .unwrap();

    assert_eq!(res_wrong.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res_unknown.status(), StatusCode::UNAUTHORIZED);
    let body_wrong = body_json(res_wrong).await;
    let body_unknown = body_json(res_unknown).await;
    assert_eq!(
        body_wrong.get("error"),
        body_unknown.get("error"),
        "wrong password and unknown email must look identical"
    );
}

#[tokio::test]
async fn bootstrap_roles_is_idempotent() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let pool = match db::create_pool(&database_url, 5).await {
        Ok(p) => p,
        Err(_) => return,
    };

    AuthService::bootstrap_roles(&pool).await.unwrap();
    AuthService::bootstrap_roles(&pool).await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM roles")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 3, "bootstrap must not duplicate role rows");
}

#[tokio::test]
async fn me_requires_valid_bearer_token() {
    let database_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(u) => u,
        Err(_) => return,
    };
    let state = match test_state(&database_url).await {
        Ok(s) => s,
        Err(_) => return,
    };
    let app = create_app(state);

    let res = app
        .clone()
        .oneshot(Request::builder().uri("/auth/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let email = unique_email();
    let body = serde_json::json!({
        "firstName": "Me",
        "lastName": "Endpoint",
        "email": email,
        "phoneNumber": "+15550100123",
        "password": "Secret123"
    });
    let res = app
        .clone()
        .oneshot(post_json("/auth/register", &body))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let json = body_json(res).await;
    let token = json["token"].as_str().unwrap().to_string();

    let res = app
        .oneshot(
            Request::builder()
                .uri("/auth/me")
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json.get("email").and_then(|v| v.as_str()), Some(email.as_str()));
    assert_eq!(
        json.get("phoneNumber").and_then(|v| v.as_str()),
        Some("+15550100123")
    );
}
