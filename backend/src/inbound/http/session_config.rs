//! Session cookie configuration.
//!
//! The key file and the `Secure` flag may be supplied by the application
//! settings; anything they leave unset is read from `RETAIL_*` variables
//! through [`mockable::Env`] so tests can stub the environment. Debug builds
//! fall back to permissive defaults with a warning, release builds refuse to
//! start on a missing or invalid value.

pub mod fingerprint;

use std::path::{Path, PathBuf};

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/retail_session_key";
const SESSION_KEY_MIN_LEN: usize = 64;
pub const COOKIE_SECURE_ENV: &str = "RETAIL_SESSION_COOKIE_SECURE";
pub const SAMESITE_ENV: &str = "RETAIL_SESSION_SAMESITE";
pub const ALLOW_EPHEMERAL_ENV: &str = "RETAIL_SESSION_ALLOW_EPHEMERAL";
pub const KEY_FILE_ENV: &str = "RETAIL_SESSION_KEY_FILE";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Tolerates defaults and warns about missing toggles.
    Debug,
    /// Requires explicit, valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use retail_backend::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Values taken from the application settings, which win over the
/// environment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionOverrides {
    pub key_file: Option<PathBuf>,
    pub cookie_secure: Option<bool>,
}

/// Resolved session cookie settings.
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("{SAMESITE_ENV}=None requires {COOKIE_SECURE_ENV}=1")]
    InsecureSameSiteNone,
    #[error("{ALLOW_EPHEMERAL_ENV} must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Resolve session settings from `overrides`, then the environment.
///
/// # Examples
///
/// ```rust
/// use retail_backend::inbound::http::session_config::{
///     session_settings, BuildMode, SessionOverrides,
/// };
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key_path = std::env::temp_dir().join("retail_session_key_example");
/// std::fs::write(&key_path, vec![b'k'; 64])?;
///
/// let overrides = SessionOverrides {
///     key_file: Some(key_path.clone()),
///     cookie_secure: Some(true),
/// };
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "RETAIL_SESSION_SAMESITE" => Some("Strict".to_owned()),
///     "RETAIL_SESSION_ALLOW_EPHEMERAL" => Some("0".to_owned()),
///     _ => None,
/// });
///
/// let settings = session_settings(&overrides, &env, BuildMode::Release)?;
/// assert!(settings.cookie_secure);
///
/// std::fs::remove_file(&key_path)?;
/// # Ok(())
/// # }
/// ```
pub fn session_settings<E: Env>(
    overrides: &SessionOverrides,
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = match overrides.cookie_secure {
        Some(flag) => flag,
        None => bool_from_env(env, mode, COOKIE_SECURE_ENV, true)?,
    };
    let same_site = same_site_from_env(env, mode, cookie_secure)?;
    let allow_ephemeral = bool_from_env(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key_path = overrides
        .key_file
        .clone()
        .or_else(|| env.string(KEY_FILE_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(SESSION_KEY_DEFAULT_PATH));
    let key = load_key(&key_path, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// Read a boolean toggle. Debug builds substitute `default` for a missing or
/// unparsable value.
fn bool_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    default: bool,
) -> Result<bool, SessionConfigError> {
    match env.string(name) {
        Some(value) => match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None if mode.is_debug() => {
                warn!(variable = name, value = %value, default, "invalid flag; using default");
                Ok(default)
            }
            None => Err(SessionConfigError::InvalidEnv {
                name,
                value,
                expected: BOOL_EXPECTED,
            }),
        },
        None if mode.is_debug() => {
            warn!(variable = name, default, "flag not set; using default");
            Ok(default)
        }
        None => Err(SessionConfigError::MissingEnv { name }),
    }
}

fn same_site_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let fallback = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let Some(value) = env.string(SAMESITE_ENV) else {
        if mode.is_debug() {
            warn!(variable = SAMESITE_ENV, "not set; using default");
            return Ok(fallback);
        }
        return Err(SessionConfigError::MissingEnv { name: SAMESITE_ENV });
    };
    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" if mode.is_debug() => {
            warn!("SameSite=None without a secure cookie; browsers may reject it");
            Ok(SameSite::None)
        }
        "none" => Err(SessionConfigError::InsecureSameSiteNone),
        _ if mode.is_debug() => {
            warn!(variable = SAMESITE_ENV, value = %value, "invalid value; using default");
            Ok(fallback)
        }
        _ => Err(SessionConfigError::InvalidEnv {
            name: SAMESITE_ENV,
            value,
            expected: SAMESITE_EXPECTED,
        }),
    }
}

fn load_key(path: &Path, mode: BuildMode, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
    match std::fs::read(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if mode == BuildMode::Release && length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(error) => Err(SessionConfigError::KeyRead {
            path: path.to_path_buf(),
            source: error,
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests;
