use crate::error::DeskError;
use crate::service::controller::Role;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

/// Result of a sign-in attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthOutcome {
    Success,
    UserNotFound,
    WrongPassword,
    AdminRejected,
    Other,
}

impl AuthOutcome {
    pub fn into_result(self) -> Result<(), DeskError> {
        match self {
            AuthOutcome::Success => Ok(()),
            failure => Err(DeskError::InvalidCredentials(failure)),
        }
    }
}

/// Checks admin credentials against configured secrets and user credentials
/// against a flat `login -> password` JSON file.
#[derive(Debug, Clone)]
pub struct CredentialChecker {
    admin_login: String,
    admin_password: String,
    users_file: PathBuf,
}

impl CredentialChecker {
    pub fn new(
        admin_login: impl Into<String>,
        admin_password: impl Into<String>,
        users_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            admin_login: admin_login.into(),
            admin_password: admin_password.into(),
            users_file: users_file.into(),
        }
    }

    pub async fn authenticate(&self, role: Role, login: &str, password: &str) -> AuthOutcome {
        match role {
            Role::Admin => self.authenticate_admin(login, password),
            Role::User => self.authenticate_user(login, password).await,
            Role::Guest => AuthOutcome::Other,
        }
    }

    fn authenticate_admin(&self, login: &str, password: &str) -> AuthOutcome {
        // An unset admin pair never matches, not even an empty submission.
        if self.admin_login.is_empty() || self.admin_password.is_empty() {
            return AuthOutcome::AdminRejected;
        }
        let login_ok = login.as_bytes().ct_eq(self.admin_login.as_bytes());
        let password_ok = password.as_bytes().ct_eq(self.admin_password.as_bytes());
        if bool::from(login_ok & password_ok) {
            AuthOutcome::Success
        } else {
            AuthOutcome::AdminRejected
        }
    }

    async fn authenticate_user(&self, login: &str, password: &str) -> AuthOutcome {
        if !self.admin_login.is_empty() && login == self.admin_login {
            debug!("admin login submitted through the user path");
            return AuthOutcome::AdminRejected;
        }

        let users = match load_users(&self.users_file).await {
            Ok(users) => users,
            Err(e) => {
                warn!(path = %self.users_file.display(), error = %e, "failed to load users file");
                return AuthOutcome::Other;
            }
        };

        match users.get(login) {
            None => AuthOutcome::UserNotFound,
            Some(stored) if stored != password => AuthOutcome::WrongPassword,
            Some(_) => AuthOutcome::Success,
        }
    }
}

/// Read the whole credential file. Called on every attempt; nothing is cached.
async fn load_users(path: &Path) -> Result<HashMap<String, String>, DeskError> {
    let contents = tokio::fs::read_to_string(path).await?;
    let users = serde_json::from_str(&contents)?;
    Ok(users)
}
