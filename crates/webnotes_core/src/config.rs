//! Process configuration.
//!
//! # Responsibility
//! - Read `WEBNOTES_*` keys from the environment, after loading a dotenv
//!   file, into one typed `AppConfig`.
//!
//! # Invariants
//! - Unset keys fall back to defaults; set-but-invalid keys are errors.
//! - `from_lookup` never touches the process environment.

use crate::auth::gate::DEFAULT_COOKIE_TTL_MINUTES;
use crate::auth::hasher::{Argon2Hasher, CredentialHasher, Sha256Hasher};
use crate::logging::{default_log_level, normalize_level};
use crate::repo::note_repo::{NOTES_DEFAULT_LIMIT, NOTES_LIMIT_MAX};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

pub const CONFIG_ENV_KEY: &str = "CONFIG_ENV";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_DB_PATH: &str = "webnotes.db";

pub const DB_PATH_KEY: &str = "WEBNOTES_DB_PATH";
pub const LOG_LEVEL_KEY: &str = "WEBNOTES_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "WEBNOTES_LOG_DIR";
pub const PAGE_LIMIT_KEY: &str = "WEBNOTES_PAGE_LIMIT";
pub const COOKIE_TTL_KEY: &str = "WEBNOTES_COOKIE_TTL_MINUTES";
pub const PASSWORD_HASHER_KEY: &str = "WEBNOTES_PASSWORD_HASHER";

/// One year.
pub const MAX_COOKIE_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read env file `{path}`: {reason}")]
    EnvFile { path: String, reason: String },
    #[error("invalid value `{value}` for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which credential hasher new digests are produced with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HasherKind {
    #[default]
    Sha256,
    Argon2,
}

impl HasherKind {
    pub fn build(self) -> Arc<dyn CredentialHasher> {
        match self {
            Self::Sha256 => Arc::new(Sha256Hasher),
            Self::Argon2 => Arc::new(Argon2Hasher),
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sha256" => Some(Self::Sha256),
            "argon2" | "argon2id" => Some(Self::Argon2),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// Logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub page_limit: u32,
    pub cookie_ttl_minutes: i64,
    pub password_hasher: HasherKind,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            page_limit: NOTES_DEFAULT_LIMIT,
            cookie_ttl_minutes: DEFAULT_COOKIE_TTL_MINUTES,
            password_hasher: HasherKind::default(),
        }
    }
}

impl AppConfig {
    /// Loads the dotenv file named by `CONFIG_ENV` (or `.env`), then reads
    /// the process environment. A missing dotenv file is not an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let env_file = std::env::var(CONFIG_ENV_KEY).unwrap_or_else(|_| DEFAULT_ENV_FILE.into());
        match dotenvy::from_path(&env_file) {
            Ok(()) => {}
            Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(ConfigError::EnvFile {
                    path: env_file,
                    reason: err.to_string(),
                });
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|raw| !raw.trim().is_empty());

        if let Some(raw) = value(DB_PATH_KEY) {
            config.db_path = PathBuf::from(raw.trim());
        }

        if let Some(raw) = value(LOG_LEVEL_KEY) {
            let level = normalize_level(&raw).map_err(|err| invalid(LOG_LEVEL_KEY, &raw, err))?;
            config.log_level = level.to_string();
        }

        if let Some(raw) = value(LOG_DIR_KEY) {
            let dir = PathBuf::from(raw.trim());
            if !dir.is_absolute() {
                return Err(invalid(LOG_DIR_KEY, &raw, "must be an absolute path"));
            }
            config.log_dir = Some(dir);
        }

        if let Some(raw) = value(PAGE_LIMIT_KEY) {
            config.page_limit = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|limit| (1..=NOTES_LIMIT_MAX).contains(limit))
                .ok_or_else(|| {
                    invalid(
                        PAGE_LIMIT_KEY,
                        &raw,
                        format!("expected an integer in 1..={NOTES_LIMIT_MAX}"),
                    )
                })?;
        }

        if let Some(raw) = value(COOKIE_TTL_KEY) {
            config.cookie_ttl_minutes = raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| (1..=MAX_COOKIE_TTL_MINUTES).contains(minutes))
                .ok_or_else(|| {
                    invalid(
                        COOKIE_TTL_KEY,
                        &raw,
                        format!("expected an integer in 1..={MAX_COOKIE_TTL_MINUTES}"),
                    )
                })?;
        }

        if let Some(raw) = value(PASSWORD_HASHER_KEY) {
            config.password_hasher = HasherKind::parse(&raw)
                .ok_or_else(|| invalid(PASSWORD_HASHER_KEY, &raw, "expected sha256|argon2"))?;
        }

        Ok(config)
    }

    pub fn cookie_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cookie_ttl_minutes)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
