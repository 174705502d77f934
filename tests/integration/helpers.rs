//! Shared test helpers for integration tests.

use axum::body::Body;
use axum::Router;
use http::{Request, StatusCode};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

use lessonhub_api::auth::Claims;
use lessonhub_api::state::AppState;
use lessonhub_core::config::access::AccessConfig;
use lessonhub_core::config::auth::AuthConfig;
use lessonhub_core::config::database::DatabaseConfig;
use lessonhub_core::config::logging::LoggingConfig;
use lessonhub_core::config::server::ServerConfig;
use lessonhub_core::config::worker::WorkerConfig;
use lessonhub_core::config::AppConfig;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Wired application state, for driving services directly
    pub state: AppState,
    /// Database pool for direct queries
    pub db_pool: PgPool,
    /// Application config
    pub config: AppConfig,
}

impl TestApp {
    /// Create a new test application, or `None` when no test database
    /// is configured.
    pub async fn spawn() -> Option<Self> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping integration test");
                return None;
            }
        };

        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url,
                max_connections: 5,
                min_connections: 1,
                connect_timeout_seconds: 5,
                idle_timeout_seconds: 60,
            },
            auth: AuthConfig::default(),
            access: AccessConfig::default(),
            worker: WorkerConfig {
                enabled: false,
                ..WorkerConfig::default()
            },
            logging: LoggingConfig::default(),
        };

        let db = lessonhub_database::DatabasePool::connect(&config.database)
            .await
            .expect("Failed to connect to test database");
        let db_pool = db.into_pool();

        lessonhub_database::migration::run_migrations(&db_pool)
            .await
            .expect("Failed to run migrations");

        let state = lessonhub_api::app::build_state(config.clone(), db_pool.clone());
        let router = lessonhub_api::build_app(state.clone());

        Some(Self {
            router,
            state,
            db_pool,
            config,
        })
    }

    /// Insert a student and return their ID.
    pub async fn create_student(&self, name: &str) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO students (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(&self.db_pool)
            .await
            .expect("Failed to create test student");
        id
    }

    /// Insert a lesson and return its ID.
    pub async fn create_lesson(&self, title: &str, pass_threshold: f64) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO lessons (id, title, pass_threshold) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(title)
            .bind(pass_threshold)
            .execute(&self.db_pool)
            .await
            .expect("Failed to create test lesson");
        id
    }

    /// Look up the progress record ID for a (student, lesson) pair.
    pub async fn progress_id(&self, student_id: Uuid, lesson_id: Uuid) -> Uuid {
        sqlx::query_scalar(
            "SELECT id FROM lesson_progress WHERE student_id = $1 AND lesson_id = $2",
        )
        .bind(student_id)
        .bind(lesson_id)
        .fetch_one(&self.db_pool)
        .await
        .expect("No progress record for pair")
    }

    /// Push a grant's expiry into the past so the pair reads as expired.
    pub async fn force_expire_grant(&self, student_id: Uuid, lesson_id: Uuid) {
        sqlx::query(
            "UPDATE access_grants SET expires_at = NOW() - INTERVAL '1 hour', \
             expiry_processed_at = NULL, updated_at = NOW() \
             WHERE student_id = $1 AND lesson_id = $2",
        )
        .bind(student_id)
        .bind(lesson_id)
        .execute(&self.db_pool)
        .await
        .expect("Failed to expire test grant");
    }

    /// Issue a bearer token with the admin role.
    pub fn admin_token(&self) -> String {
        self.token("admin")
    }

    /// Issue a bearer token with the instructor role.
    pub fn instructor_token(&self) -> String {
        self.token("instructor")
    }

    /// Issue a bearer token with an arbitrary role string.
    pub fn token(&self, role: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: role.to_string(),
            iss: self.config.auth.jwt_issuer.clone(),
            exp: now + 3600,
            iat: now,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.auth.jwt_secret.as_bytes()),
        )
        .expect("Failed to issue test token")
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
