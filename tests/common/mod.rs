use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use formify::auth::jwt::{Claims, encode_token};
use formify::config::{Config, SheetsConfig};

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";
pub const ADMIN_EMAIL: &str = "admin@test.com";

/// How the fake spreadsheet endpoint behaves.
#[derive(Clone, Copy, PartialEq)]
pub enum SheetMode {
    Accept,
    /// Answers 200 with `{"success": false}`.
    Reject,
    /// Never answers within the sink timeout.
    Hang,
    /// Answers 500.
    ServerError,
    /// Answers 200 with a body that is not JSON.
    Garbled,
    /// Nothing listens on the configured address.
    Closed,
    /// No spreadsheet endpoint configured.
    Off,
}

#[derive(Clone)]
struct FakeSheet {
    mode: SheetMode,
    rows: Arc<Mutex<Vec<Value>>>,
}

async fn fake_append(State(sheet): State<FakeSheet>, Json(body): Json<Value>) -> Response {
    match sheet.mode {
        SheetMode::Hang => {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Json(json!({ "success": true })).into_response()
        }
        SheetMode::Reject => {
            Json(json!({ "success": false, "error": "Permission denied" })).into_response()
        }
        SheetMode::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Backend error" })),
        )
            .into_response(),
        SheetMode::Garbled => "<html>Moved</html>".into_response(),
        _ => {
            sheet.rows.lock().unwrap().push(body);
            Json(json!({ "success": true })).into_response()
        }
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
    pub sheet_rows: Arc<Mutex<Vec<Value>>>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A bearer token for the configured admin.
    pub fn admin_token(&self) -> String {
        token_for(ADMIN_EMAIL)
    }

    /// Submit a JSON payload, return (body, status).
    pub async fn submit(&self, data: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/submit-form"))
            .json(data)
            .send()
            .await
            .expect("submit request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get(&self, path: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn post_auth(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn submission_count(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM form_submissions")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

pub fn token_for(email: &str) -> String {
    let claims = Claims::new(Uuid::new_v4().to_string(), email, chrono::Duration::minutes(5));
    encode_token(&claims, JWT_SECRET).unwrap()
}

async fn spawn_fake_sheet(mode: SheetMode, rows: Arc<Mutex<Vec<Value>>>) -> SocketAddr {
    let router = Router::new()
        .route("/append", post(fake_append))
        .with_state(FakeSheet { mode, rows });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fake sheet");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Fake sheet failed");
    });
    addr
}

/// An address that refuses connections.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    listener.local_addr().unwrap()
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(SheetMode::Accept).await
}

/// Spawn a test app with a fresh temporary database and a fake spreadsheet.
pub async fn spawn_app_with(mode: SheetMode) -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let db_name = format!("formify_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let sheet_rows = Arc::new(Mutex::new(Vec::new()));
    let sheet_addr = match mode {
        SheetMode::Off => None,
        SheetMode::Closed => Some(closed_addr().await),
        _ => Some(spawn_fake_sheet(mode, sheet_rows.clone()).await),
    };
    let sheets = sheet_addr.map(|addr| SheetsConfig {
        url: format!("http://{addr}/append"),
        token: None,
        timeout: Duration::from_millis(500),
    });

    let config = Config {
        database_url: test_url,
        jwt_secret: JWT_SECRET.to_string(),
        admin_emails: vec![ADMIN_EMAIL.to_string()],
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        sheets,
        stats_ttl: Duration::from_secs(300),
        max_body_size: 65_536,
        cors_origins: vec![],
        log_level: "warn".to_string(),
    };

    let app = formify::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
        sheet_rows,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
