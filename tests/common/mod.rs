#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use axum_extra::extract::cookie::Key;
use campus_desk::db::StudentStorage;
use campus_desk::router::{DeskState, desk_router};
use campus_desk::service::credential_checker::CredentialChecker;
use serde_json::Value;
use sqlx::postgres::PgConnectOptions;
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

pub const ADMIN_LOGIN: &str = "root";
pub const ADMIN_PASSWORD: &str = "hunter2";

pub struct TestApp {
    pub app: Router,
    // Kept alive for the duration of the test.
    _users: NamedTempFile,
}

/// Router wired to a database nobody listens on, a temp users file and a
/// fresh vault.
pub async fn spawn_app() -> TestApp {
    let opts = PgConnectOptions::new()
        .host("127.0.0.1")
        .port(1)
        .username("nobody")
        .database("nowhere");
    spawn_app_with(StudentStorage::connect_lazy(opts, Duration::from_millis(300))).await
}

/// Same as [`spawn_app`], against the scratch database in `TEST_DATABASE_URL`.
pub async fn spawn_app_with_database() -> TestApp {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL not set");
    let opts = PgConnectOptions::from_str(&url).expect("TEST_DATABASE_URL is not a postgres URL");
    spawn_app_with(StudentStorage::connect_lazy(opts, Duration::from_secs(5))).await
}

async fn spawn_app_with(students: StudentStorage) -> TestApp {
    let mut users = NamedTempFile::new().expect("failed to create users file");
    users
        .write_all(br#"{"alice": "wonderland", "root": "hunter2"}"#)
        .expect("failed to write users file");

    let checker = CredentialChecker::new(ADMIN_LOGIN, ADMIN_PASSWORD, users.path());
    let vault = campus_desk::service::vault_actor::spawn()
        .await
        .expect("failed to spawn vault");

    let state = DeskState::new(students, checker, vault, Key::generate());
    TestApp {
        app: desk_router(state),
        _users: users,
    }
}

pub struct Reply {
    pub status: StatusCode,
    pub cookie: Option<String>,
    pub body: Value,
}

impl Reply {
    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }

    pub fn screen(&self) -> &str {
        self.body["view"]["screen"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        form: Option<&str>,
    ) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match form {
            Some(form) => {
                builder = builder.header(
                    header::CONTENT_TYPE,
                    "application/x-www-form-urlencoded",
                );
                Body::from(form.to_string())
            }
            None => Body::empty(),
        };

        let resp = self
            .app
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("request failed");

        let status = resp.status();
        let cookie = resp
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string);
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body was not JSON")
        };
        Reply {
            status,
            cookie,
            body,
        }
    }
}
