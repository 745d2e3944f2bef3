//! Shared harness for router tests
//!
//! Builds the full router over an in-memory database and a temporary media
//! directory, and seeds accounts straight through the repositories.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use kanban_server::auth::{hash_password, TokenMode};
use kanban_server::db::{
    create_pool_with_options, migrations, Department, DepartmentRepo, Employee, EmployeeRepo,
    NewEmployee, User, UserRepo,
};
use kanban_server::models::{Email, Password, PersonName, Phone, Title, UserPermission};
use kanban_server::{build_router, AppState, KanbanConfig};

pub const PASSWORD: &str = "correct horse";

pub const BOUNDARY: &str = "kanban-test-boundary";

pub struct TestApp {
    pub app: Router,
    pub state: Arc<AppState>,
    pub media: TempDir,
}

/// Account seeded for a test, with a ready access token
pub struct Account {
    pub user: User,
    pub token: String,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Build the app after adjusting the test configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut KanbanConfig)) -> Self {
        let media = TempDir::new().unwrap();
        let mut config = KanbanConfig::for_tests(media.path().to_path_buf());
        adjust(&mut config);
        let pool = create_pool_with_options(&config.database_url, config.max_connections)
            .await
            .unwrap();
        migrations::run(&pool).await.unwrap();

        let state = Arc::new(AppState::new(pool, config));
        let app = build_router(state.clone());
        Self { app, state, media }
    }

    pub async fn account(&self, email: &str, permission: UserPermission) -> Account {
        let hash = hash_password(Password::new(PASSWORD).unwrap()).await.unwrap();
        let user = UserRepo::new(&self.state.pool)
            .create(&Email::new(email).unwrap(), &hash, permission)
            .await
            .unwrap();
        let token = self
            .state
            .tokens
            .issue(&user.email, TokenMode::AccessToken)
            .unwrap();
        Account { user, token }
    }

    pub async fn department(&self, title: &str) -> Department {
        DepartmentRepo::new(&self.state.pool)
            .create(&Title::new(title).unwrap())
            .await
            .unwrap()
    }

    pub async fn employee(&self, user_id: Uuid, department_id: Uuid, phone: &str) -> Employee {
        EmployeeRepo::new(&self.state.pool)
            .create(NewEmployee {
                family: PersonName::new("Ivanov").unwrap(),
                name: PersonName::new("Ivan").unwrap(),
                surname: PersonName::new("Ivanovich").unwrap(),
                phone: Phone::new(phone).unwrap(),
                department_id,
                user_id,
            })
            .await
            .unwrap()
    }

    /// Send a request and decode the JSON reply (`Null` for an empty body).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// PUT a multipart form carrying one file under `field`.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"upload\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.dispatch(request).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
