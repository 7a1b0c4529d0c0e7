//! Profile selection and CLI flag overrides on top of `mwdns-config`.

use secrecy::SecretString;

use mwdns_config::{Config, Profile};
use mwdns_core::{SessionConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the session config for this invocation: flag > env > profile.
///
/// A missing profile is not an error; flags alone can describe a session.
pub fn resolve_session_config(
    global: &GlobalOpts,
    stream_enabled: bool,
) -> Result<SessionConfig, CliError> {
    let cfg = mwdns_config::load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = cfg.profiles.get(&profile_name).cloned().unwrap_or_default();
    if let Some(ref server) = global.server {
        profile.server = Some(server.clone());
    }
    if let Some(ref domain) = global.domain {
        profile.domain = Some(domain.clone());
    }
    if profile.timeout.is_none() {
        profile.timeout = cfg.defaults.timeout;
    }

    let identity = global
        .identity
        .clone()
        .map(SecretString::from)
        .or_else(|| mwdns_config::resolve_identity(&profile, &profile_name));

    let mut session = mwdns_config::build_session_config(&profile, &profile_name, identity)?;
    if global.insecure || cfg.defaults.insecure {
        session.tls = TlsVerification::DangerAcceptInvalid;
    }
    session.stream_enabled = stream_enabled;
    Ok(session)
}

/// A profile's settings with secrets masked, for `config show`.
pub fn redacted(profile: &Profile) -> Profile {
    let mut shown = profile.clone();
    if shown.identity.is_some() {
        shown.identity = Some("********".into());
    }
    shown
}
