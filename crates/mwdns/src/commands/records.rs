//! Record command handlers.

use std::sync::Arc;

use tabled::Tabled;
use tracing::debug;

use mwdns_core::{DomainRecord, RecordFilter, RecordPatch, Session};

use crate::cli::{GlobalOpts, RecordsArgs, RecordsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    record_type: String,
    #[tabled(rename = "TTL")]
    ttl: String,
    #[tabled(rename = "Content")]
    content: String,
}

impl From<&Arc<DomainRecord>> for RecordRow {
    fn from(r: &Arc<DomainRecord>) -> Self {
        Self {
            id: r.id.clone(),
            name: r.subdomain.clone(),
            record_type: r.record_type.clone(),
            ttl: r.ttl.clone(),
            content: r.content(),
        }
    }
}

fn plain_line(r: &Arc<DomainRecord>) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        r.id,
        r.subdomain,
        r.record_type,
        r.ttl,
        r.content()
    )
}

fn record_filter(record_type: Option<String>, subdomain: Option<String>) -> RecordFilter {
    match (record_type, subdomain) {
        (None, None) => RecordFilter::All,
        (Some(t), None) => RecordFilter::ByType(t),
        (None, Some(s)) => RecordFilter::BySubdomain(s),
        (Some(t), Some(s)) => RecordFilter::Custom(Box::new(move |r| {
            r.record_type.eq_ignore_ascii_case(&t) && r.subdomain == s
        })),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: RecordsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RecordsCommand::List { r#type, subdomain } => {
            session.refresh_records().await?;
            let filter = record_filter(r#type, subdomain);
            let snap: Vec<Arc<DomainRecord>> = session
                .records_snapshot()
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            let out = output::render_list(&global.output, &snap, |r| RecordRow::from(r), plain_line);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RecordsCommand::Create {
            subdomain,
            r#type,
            fields,
            ttl,
        } => {
            let mut record = DomainRecord::new(&subdomain, &r#type, &ttl);
            for (name, value) in &fields {
                record.set_field(name, value);
            }
            let body = session.create_record(&record).await?;
            debug!(%body, "create accepted");
            util::status(&format!("Record created: {}", record.subdomain.trim()), global.quiet);
            Ok(())
        }

        RecordsCommand::Update {
            id,
            subdomain,
            r#type,
            ttl,
            fields,
        } => {
            let mut patch = RecordPatch {
                subdomain,
                record_type: r#type,
                ttl,
                ..RecordPatch::default()
            };
            for (name, value) in &fields {
                patch = patch.with_field(name, value);
            }
            if patch.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "nothing to change; pass --field, --ttl, --type or --subdomain".into(),
                });
            }

            // The merge base comes from the current record list.
            session.refresh_records().await?;
            let body = session.update_record(&id, &patch).await?;
            debug!(%body, "update accepted");
            util::status(&format!("Record {id} updated"), global.quiet);
            Ok(())
        }

        RecordsCommand::Delete { id } => {
            if !util::confirm(&format!("Delete record '{id}'?"), global.yes)? {
                return Ok(());
            }
            let body = session.delete_record(&id).await?;
            debug!(%body, "delete accepted");
            util::status(&format!("Record {id} deleted"), global.quiet);
            Ok(())
        }
    }
}
