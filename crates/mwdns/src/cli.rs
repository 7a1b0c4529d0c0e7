//! Clap derive structures for the `mwdns` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mwdns -- manage a Mess With DNS playground from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "mwdns",
    version,
    about = "Manage Mess With DNS records and watch live queries",
    long_about = "Create, edit and delete the DNS records of your playground domain,\n\
        and follow the DNS queries the server answers for it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "MWDNS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 's', env = "MWDNS_SERVER", global = true)]
    pub server: Option<String>,

    /// Domain label under the zone suffix (overrides profile)
    #[arg(long, short = 'd', env = "MWDNS_DOMAIN", global = true)]
    pub domain: Option<String>,

    /// Identity token sent as the session cookie
    #[arg(long, env = "MWDNS_IDENTITY", global = true, hide_env_values = true)]
    pub identity: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MWDNS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "MWDNS_INSECURE", global = true)]
    pub insecure: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the records of your domain
    #[command(alias = "rec", alias = "r")]
    Records(RecordsArgs),

    /// Inspect the DNS queries answered for your domain
    #[command(alias = "req")]
    Requests(RequestsArgs),

    /// Show the fields each record type takes
    Schema(SchemaArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Records ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RecordsArgs {
    #[command(subcommand)]
    pub command: RecordsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// List records
    #[command(alias = "ls")]
    List {
        /// Only records of this type
        #[arg(long, short = 't')]
        r#type: Option<String>,

        /// Only records with this subdomain ("@" for the apex)
        #[arg(long)]
        subdomain: Option<String>,
    },

    /// Create a record
    Create {
        /// Subdomain ("@" for the apex)
        subdomain: String,

        /// Record type (A, AAAA, CAA, CNAME, MX, NS, PTR, SRV, TXT)
        #[arg(value_parser = parse_record_type)]
        r#type: String,

        /// Type-specific field, repeatable (e.g. --field A=1.2.3.4)
        #[arg(long = "field", short = 'f', value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Time to live in seconds
        #[arg(long, default_value = "60")]
        ttl: String,
    },

    /// Update fields of an existing record
    #[command(alias = "edit")]
    Update {
        /// Record id
        id: String,

        /// New subdomain
        #[arg(long)]
        subdomain: Option<String>,

        /// New record type; clears fields not given with --field
        #[arg(long, short = 't', value_parser = parse_record_type)]
        r#type: Option<String>,

        /// New TTL
        #[arg(long)]
        ttl: Option<String>,

        /// Field to set, repeatable
        #[arg(long = "field", short = 'f', value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record id
        id: String,
    },
}

// ── Requests ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RequestsArgs {
    #[command(subcommand)]
    pub command: RequestsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RequestsCommand {
    /// List logged requests, newest first
    #[command(alias = "ls")]
    List {
        /// Only queries of this type
        #[arg(long, short = 't')]
        r#type: Option<String>,

        /// Only query names containing this text
        #[arg(long)]
        name: Option<String>,

        /// Show at most this many requests
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Clear the request log
    Clear,

    /// Follow new requests as they arrive (Ctrl-C to stop)
    #[command(alias = "tail")]
    Watch {
        /// Only queries of this type
        #[arg(long, short = 't')]
        r#type: Option<String>,
    },
}

// ── Schema / Config / Completions ────────────────────────────────────

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Record type to describe; lists all types when omitted
    #[arg(value_parser = parse_record_type)]
    pub r#type: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the resolved configuration
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

// ── Value parsers ────────────────────────────────────────────────────

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{s}'"));
    }
    Ok((name.to_owned(), value.to_owned()))
}

fn parse_record_type(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("record type cannot be empty".into());
    }
    Ok(s.trim().to_ascii_uppercase())
}
