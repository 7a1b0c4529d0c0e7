//! Shared configuration for the mwdns CLI.
//!
//! TOML profiles, identity resolution (env + keyring + plaintext), and
//! translation to `mwdns_core::SessionConfig`. The CLI adds flag-aware
//! wrappers on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mwdns_core::{DEFAULT_SUFFIX, SessionConfig, TlsVerification};

/// Public backend used when a profile names no server.
pub const DEFAULT_SERVER: &str = "https://messwithdns.net";

/// Environment variable consulted for the identity token.
pub const IDENTITY_ENV: &str = "MWDNS_IDENTITY";

const KEYRING_SERVICE: &str = "mwdns";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no domain configured for profile '{profile}' (set `domain` or an identity)")]
    NoDomain { profile: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: None,
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL. Defaults to the public instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Domain label under the suffix. Defaults to the identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Identity token (plaintext -- prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    /// Environment variable name containing the identity token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_env: Option<String>,

    /// Zone suffix override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Request stream reconnect delay in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconnect_delay_ms: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "messwithdns", "mwdns").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("mwdns");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys use a double underscore for nesting, e.g.
/// `MWDNS_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MWDNS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Identity resolution (without CLI flags) ─────────────────────────

/// Resolve the identity token from the credential chain (no CLI flag
/// step). `None` means the session runs without an identity.
pub fn resolve_identity(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's identity_env -> env var lookup
    if let Some(val) = profile
        .identity_env
        .as_ref()
        .and_then(|name| std::env::var(name).ok())
    {
        return Some(SecretString::from(val));
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(IDENTITY_ENV) {
        return Some(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .ok()
        .and_then(|entry| entry.get_password().ok())
    {
        return Some(SecretString::from(secret));
    }

    // 4. Plaintext in config
    profile.identity.clone().map(SecretString::from)
}

/// Keyring account for a profile's identity.
pub fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/identity")
}

/// Build a `SessionConfig` from a profile and an already-resolved
/// identity.
pub fn build_session_config(
    profile: &Profile,
    profile_name: &str,
    identity: Option<SecretString>,
) -> Result<SessionConfig, ConfigError> {
    let server_str = profile.server.as_deref().unwrap_or(DEFAULT_SERVER);
    let server: url::Url = server_str.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server_str}"),
    })?;

    // The backend names a user's domain after their identity.
    let domain = profile
        .domain
        .clone()
        .or_else(|| identity.as_ref().map(|id| id.expose_secret().to_owned()))
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ConfigError::NoDomain {
            profile: profile_name.into(),
        })?;

    let tls = if profile.insecure.unwrap_or(false) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    let mut config = SessionConfig::new(server, domain.trim());
    config.identity = identity;
    config.tls = tls;
    config.timeout = profile.timeout.map(Duration::from_secs);
    config.suffix = profile
        .suffix
        .clone()
        .unwrap_or_else(|| DEFAULT_SUFFIX.into());
    if let Some(ms) = profile.reconnect_delay_ms {
        config.reconnect_delay = Duration::from_millis(ms);
    }
    Ok(config)
}
