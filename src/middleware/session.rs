use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use std::convert::Infallible;
use time::Duration;
use tracing::debug;

use crate::service::controller::SessionContext;

pub const SESSION_COOKIE: &str = "desk_session";
pub const VAULT_COOKIE: &str = "desk_vault";

/// The caller's UI state, decoded from the encrypted session cookie.
/// A missing or unreadable cookie yields a fresh pre-auth session.
pub struct Session {
    pub ctx: SessionContext,
    jar: PrivateCookieJar,
}

impl Session {
    /// Write `ctx` back into the jar; return the jar from the handler.
    pub fn save(self) -> PrivateCookieJar {
        let value = serde_json::to_string(&self.ctx).unwrap_or_default();
        self.jar.add(build_cookie(SESSION_COOKIE, value))
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;
        let ctx = jar
            .get(SESSION_COOKIE)
            .and_then(|c| {
                serde_json::from_str::<SessionContext>(c.value())
                    .inspect_err(|e| debug!(error = %e, "discarding unreadable session cookie"))
                    .ok()
            })
            .unwrap_or_default();
        Ok(Self { ctx, jar })
    }
}

/// Which session vault the caller owns. A caller without a readable vault
/// cookie is given a new random id, and so an empty vault.
pub struct VaultSession {
    pub id: String,
    jar: PrivateCookieJar,
}

impl VaultSession {
    /// Jar carrying the vault cookie; return it from the handler.
    pub fn save(self) -> PrivateCookieJar {
        self.jar.add(build_cookie(VAULT_COOKIE, self.id))
    }
}

impl<S> FromRequestParts<S> for VaultSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state).await?;
        let id = match jar.get(VAULT_COOKIE) {
            Some(c) if !c.value().is_empty() => c.value().to_string(),
            _ => new_vault_id(),
        };
        Ok(Self { id, jar })
    }
}

fn new_vault_id() -> String {
    let bytes: [u8; 16] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

fn build_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build(Cookie::new(name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(12))
        .build()
}
