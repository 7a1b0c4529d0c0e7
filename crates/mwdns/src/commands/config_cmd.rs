//! Config subcommand handlers.

use std::collections::BTreeMap;

use mwdns_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(&mwdns_config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = mwdns_config::load_config().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "config unreadable, showing defaults");
                Config::default()
            });
            let active = config::active_profile_name(global, &cfg);
            let shown = Config {
                profiles: cfg
                    .profiles
                    .iter()
                    .map(|(name, p)| (name.clone(), config::redacted(p)))
                    .collect::<BTreeMap<_, _>>(),
                ..cfg
            };

            let out = match global.output {
                OutputFormat::Json => output::render_json(&shown, false),
                OutputFormat::JsonCompact => output::render_json(&shown, true),
                OutputFormat::Plain => shown.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
                OutputFormat::Table => {
                    let body = toml::to_string_pretty(&shown)
                        .map_err(|e| CliError::Config(e.to_string()))?;
                    format!("# active profile: {active}\n{body}")
                }
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
