//! Request log command handlers.

use std::sync::Arc;

use tabled::Tabled;
use tracing::{debug, info};

use mwdns_core::{RequestEvent, RequestFilter, Session, StreamState};

use crate::cli::{GlobalOpts, OutputFormat, RequestsArgs, RequestsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RequestRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    query_type: String,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "Response")]
    code: String,
    #[tabled(rename = "Answers")]
    answers: String,
}

impl From<&Arc<RequestEvent>> for RequestRow {
    fn from(e: &Arc<RequestEvent>) -> Self {
        Self {
            time: e.local_time(),
            name: e.query.name.clone(),
            query_type: e.query.query_type.clone(),
            from: source(e),
            code: e.response.code.clone(),
            answers: answers(e, "\n"),
        }
    }
}

fn source(e: &RequestEvent) -> String {
    if e.client_host.is_empty() || e.client_host == e.client_ip {
        e.client_ip.clone()
    } else {
        format!("{} ({})", e.client_host, e.client_ip)
    }
}

fn answers(e: &RequestEvent, sep: &str) -> String {
    e.response
        .answers
        .iter()
        .map(|a| format!("{} {} {} {}", a.name, a.ttl, a.rrtype, a.content))
        .collect::<Vec<_>>()
        .join(sep)
}

fn plain_line(e: &Arc<RequestEvent>) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}",
        e.timestamp.to_rfc3339(),
        e.query.name,
        e.query.query_type,
        e.client_ip,
        e.response.code,
        answers(e, "; ")
    )
}

/// One line per event for `watch`.
fn watch_line(e: &Arc<RequestEvent>, format: &OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Table => {
            let mut line = format!(
                "{}  {} {}  {}  {}",
                output::paint_dim(&e.local_time(), color),
                e.query.query_type,
                e.query.name,
                output::paint_rcode(&e.response.code, color),
                output::paint_dim(&source(e), color),
            );
            let answered = answers(e, "\n    ");
            if !answered.is_empty() {
                line.push_str("\n    ");
                line.push_str(&answered);
            }
            line
        }
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json(&**e, true),
        OutputFormat::Plain => plain_line(e),
    }
}

fn request_filter(query_type: Option<String>, name: Option<String>) -> RequestFilter {
    match (query_type, name) {
        (Some(t), _) => RequestFilter::ByQueryType(t),
        (None, Some(n)) => RequestFilter::NameContains(n),
        (None, None) => RequestFilter::All,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: RequestsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RequestsCommand::List {
            r#type,
            name,
            limit,
        } => {
            session.refresh_requests().await?;
            let type_filter = request_filter(r#type, None);
            let name_filter = request_filter(None, name);
            let snap: Vec<Arc<RequestEvent>> = session
                .requests_snapshot()
                .iter()
                .filter(|e| type_filter.matches(e) && name_filter.matches(e))
                .take(limit.unwrap_or(usize::MAX))
                .cloned()
                .collect();
            let out = output::render_list(&global.output, &snap, |e| RequestRow::from(e), plain_line);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::Clear => {
            if !util::confirm("Clear the request log?", global.yes)? {
                return Ok(());
            }
            let body = session.delete_requests().await?;
            debug!(%body, "request log cleared");
            util::status("Request log cleared", global.quiet);
            Ok(())
        }

        RequestsCommand::Watch { r#type } => watch(session, r#type, global).await,
    }
}

/// Print requests as the stream delivers them until Ctrl-C.
async fn watch(
    session: &Session,
    query_type: Option<String>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let filter = request_filter(query_type, None);
    let color = output::should_color(&global.color);

    let mut requests = session.subscribe_requests();
    let mut state = session.subscribe_stream_state();
    // Everything the bulk fetch installed counts as seen. Streamed events
    // that raced ahead of this are still ahead of it in the log.
    let mut seen = session.init().await?.len();
    util::status(
        &format!("Watching requests for {} (Ctrl-C to stop)", session.domain()),
        global.quiet,
    );

    loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
            changed = requests.changed() => {
                let Some(snap) = changed else { break };
                // New events are prepended; anything shorter means the
                // log was replaced or cleared.
                let fresh = snap.len().saturating_sub(seen);
                for event in snap.iter().take(fresh).rev() {
                    if filter.matches(event) {
                        output::print_output(&watch_line(event, &global.output, color), global.quiet);
                    }
                }
                seen = snap.len();
            }
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *state.borrow_and_update();
                match current {
                    StreamState::Open => util::status("Stream connected", global.quiet),
                    StreamState::Closed => util::status("Stream lost, reconnecting", global.quiet),
                    StreamState::Idle | StreamState::Connecting | StreamState::UserClosed => {}
                }
            }
        }
    }

    session.logout().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_filter_wins_over_name() {
        assert!(matches!(
            request_filter(Some("A".into()), Some("www".into())),
            RequestFilter::ByQueryType(_)
        ));
        assert!(matches!(request_filter(None, None), RequestFilter::All));
    }
}
