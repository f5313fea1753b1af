use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnectOptions;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Numeric settings, parsed by figment.
const TYPED_KEYS: &[&str] = &["DB_PORT", "DB_ACQUIRE_TIMEOUT_SECS"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub db_owner_name: String,
    pub db_password: String,
    pub db_host_name: String,
    pub db_port: u16,
    pub db_name: String,
    pub db_acquire_timeout_secs: u64,

    pub admin_login: String,
    pub admin_password: String,
    pub users_file: PathBuf,

    pub listen_addr: String,
    pub loglevel: String,
    #[serde(default)]
    pub cookie_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_owner_name: "postgres".to_string(),
            db_password: String::new(),
            db_host_name: "localhost".to_string(),
            db_port: 5432,
            db_name: "postgres".to_string(),
            db_acquire_timeout_secs: 5,
            admin_login: String::new(),
            admin_password: String::new(),
            users_file: PathBuf::from("users.json"),
            listen_addr: "0.0.0.0:8000".to_string(),
            loglevel: "info".to_string(),
            cookie_secret: None,
        }
    }
}

impl Config {
    /// Defaults overlaid with the process environment.
    ///
    /// figment's `Env` parses values (`007` becomes `7`), so only the numeric
    /// keys go through it; text settings are copied verbatim.
    pub fn from_env() -> Result<Self, figment::Error> {
        let mut cfg: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(TYPED_KEYS))
            .extract()?;
        cfg.overlay_text(|key| env::var(key).ok());
        Ok(cfg)
    }

    fn overlay_text(&mut self, var: impl Fn(&str) -> Option<String>) {
        let text: [(&str, &mut String); 8] = [
            ("DB_OWNER_NAME", &mut self.db_owner_name),
            ("DB_PASSWORD", &mut self.db_password),
            ("DB_HOST_NAME", &mut self.db_host_name),
            ("DB_NAME", &mut self.db_name),
            ("ADMIN_LOGIN", &mut self.admin_login),
            ("ADMIN_PASSWORD", &mut self.admin_password),
            ("LISTEN_ADDR", &mut self.listen_addr),
            ("LOGLEVEL", &mut self.loglevel),
        ];
        for (key, slot) in text {
            if let Some(value) = var(key) {
                *slot = value;
            }
        }
        if let Some(path) = var("USERS_FILE") {
            self.users_file = PathBuf::from(path);
        }
        if let Some(secret) = var("COOKIE_SECRET").filter(|s| !s.is_empty()) {
            self.cookie_secret = Some(secret);
        }
    }

    /// Connection options assembled from the `DB_*` parts.
    pub fn pg_connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host_name)
            .port(self.db_port)
            .username(&self.db_owner_name)
            .password(&self.db_password)
            .database(&self.db_name)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.db_acquire_timeout_secs.max(1))
    }
}
