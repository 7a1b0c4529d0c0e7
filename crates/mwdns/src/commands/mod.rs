//! Command dispatch: bridges CLI args -> Session calls -> output formatting.

pub mod config_cmd;
pub mod records;
pub mod requests;
pub mod schema;
pub mod util;

use mwdns_core::Session;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a session-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Records(args) => records::handle(session, args, global).await,
        Command::Requests(args) => requests::handle(session, args, global).await,
        // Offline commands are handled before dispatch
        Command::Schema(_) | Command::Config(_) | Command::Completions(_) => Err(
            CliError::Internal("offline command reached session dispatch".into()),
        ),
    }
}
