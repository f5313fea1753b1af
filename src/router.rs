use std::sync::Arc;

use axum::{
    Router,
    extract::FromRef,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;

use crate::config::Config;
use crate::db::StudentStorage;
use crate::handlers::{roster, vault};
use crate::service::credential_checker::CredentialChecker;
use crate::service::vault_actor::VaultHandle;

#[derive(Clone)]
pub struct DeskState {
    pub students: StudentStorage,
    pub checker: Arc<CredentialChecker>,
    pub vault: VaultHandle,
    cookie_key: Key,
}

impl DeskState {
    pub fn new(
        students: StudentStorage,
        checker: CredentialChecker,
        vault: VaultHandle,
        cookie_key: Key,
    ) -> Self {
        Self {
            students,
            checker: Arc::new(checker),
            vault,
            cookie_key,
        }
    }
}

impl FromRef<DeskState> for Key {
    fn from_ref(state: &DeskState) -> Self {
        state.cookie_key.clone()
    }
}

/// Cookie key from `COOKIE_SECRET`, or a per-process random key when unset or
/// too short (sessions then end with the process).
pub fn cookie_key(cfg: &Config) -> Key {
    let Some(secret) = cfg.cookie_secret.as_deref() else {
        return Key::generate();
    };
    Key::try_from(secret.as_bytes()).unwrap_or_else(|_| {
        tracing::warn!("COOKIE_SECRET shorter than 64 bytes; using a random key");
        Key::generate()
    })
}

pub fn desk_router(state: DeskState) -> Router {
    let roster: Router<DeskState> = Router::new()
        .route("/", get(roster::show))
        .route("/guest", post(roster::continue_as_guest))
        .route("/login/{role}", post(roster::begin_login))
        .route("/signup", post(roster::open_signup))
        .route("/signup/submit", post(roster::submit_signup))
        .route("/back", post(roster::back))
        .route("/authenticate", post(roster::authenticate))
        .route("/logout", post(roster::logout))
        .route("/students/count", get(roster::count_students))
        .route(
            "/students",
            get(roster::list_students).post(roster::add_student),
        )
        .route(
            "/schema",
            post(roster::create_schema).delete(roster::drop_schema),
        );

    let vault: Router<DeskState> = Router::new()
        .route("/", get(vault::report_usage))
        .route("/usage", get(vault::report_usage))
        .route("/records", post(vault::upload))
        .route(
            "/records/{key}",
            get(vault::read).put(vault::update).delete(vault::delete),
        );

    Router::new()
        .nest("/roster", roster)
        .nest("/vault", vault)
        .with_state(state)
}
