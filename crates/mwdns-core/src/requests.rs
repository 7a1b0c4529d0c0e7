// ── Request log events ──
//
// Second decode pass over `RawRequestEvent`: the `request` and `response`
// members are DNS messages serialized to JSON strings by the backend.

use chrono::{DateTime, Local, Utc};
use indexmap::IndexMap;
use mwdns_api::{RawRequestEvent, WireRecord, WireValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;
use crate::rrtype::type_name;

/// One DNS query the backend answered for this session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestEvent {
    pub id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub client_host: String,
    pub client_ip: String,
    pub query: Query,
    pub response: Response,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub name: String,
    #[serde(rename = "type")]
    pub query_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Response {
    /// Rcode mnemonic, e.g. `NOERROR` or `NXDOMAIN`.
    pub code: String,
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub name: String,
    pub rrtype: String,
    pub ttl: u32,
    /// Field values in wire order, space-separated. TXT strings are quoted.
    pub content: String,
    pub fields: IndexMap<String, String>,
}

impl RequestEvent {
    /// Wall-clock time of the query in the local zone, `HH:MM:SS`.
    pub fn local_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

// ── Backend message shapes ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct DnsMessage {
    #[serde(rename = "Question", default)]
    question: Option<Vec<DnsQuestion>>,
    #[serde(rename = "Rcode", default)]
    rcode: u16,
    #[serde(rename = "Answer", default)]
    answer: Option<Vec<WireRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DnsQuestion {
    name: String,
    qtype: u16,
}

// ── Decoding ─────────────────────────────────────────────────────────

/// Decode the nested request and response documents of one event.
pub fn decode_request_event(raw: &RawRequestEvent) -> Result<RequestEvent, CoreError> {
    let request = parse_message("request", &raw.request)?;
    let response = parse_message("response", &raw.response)?;

    let query = request
        .question
        .as_deref()
        .and_then(<[DnsQuestion]>::first)
        .map_or_else(
            || Query {
                name: String::new(),
                query_type: String::new(),
            },
            |q| Query {
                name: q.name.clone(),
                query_type: type_name(q.qtype).into_owned(),
            },
        );

    let answers = response
        .answer
        .unwrap_or_default()
        .iter()
        .map(decode_answer)
        .collect();

    Ok(RequestEvent {
        id: raw.id.clone(),
        timestamp: DateTime::from_timestamp(raw.created_at, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        client_host: raw.src_host.clone(),
        client_ip: raw.src_ip.clone(),
        query,
        response: Response {
            code: rcode_name(response.rcode),
            answers,
        },
    })
}

/// Decode a bulk listing. Events that fail to decode are logged and
/// skipped; order is preserved.
pub fn decode_request_events(raw: &[RawRequestEvent]) -> Vec<RequestEvent> {
    raw.iter()
        .filter_map(|event| match decode_request_event(event) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(error = %e, id = ?event.id, "skipping undecodable request event");
                None
            }
        })
        .collect()
}

fn parse_message(part: &str, json: &str) -> Result<DnsMessage, CoreError> {
    serde_json::from_str(json)
        .map_err(|e| CoreError::Internal(format!("malformed {part} message: {e}")))
}

fn decode_answer(rr: &WireRecord) -> Answer {
    let content = rr
        .fields
        .values()
        .map(render_value)
        .collect::<Vec<_>>()
        .join(" ");

    Answer {
        name: rr.header.name.clone(),
        rrtype: type_name(rr.header.rrtype).into_owned(),
        ttl: rr.header.ttl,
        content,
        fields: rr
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_field_string()))
            .collect(),
    }
}

fn render_value(value: &WireValue) -> String {
    match value {
        WireValue::Chunks(chunks) => chunks
            .iter()
            .map(|c| format!("{c:?}"))
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_field_string(),
    }
}

/// Mnemonic for a DNS response code.
pub fn rcode_name(rcode: u16) -> String {
    let name = match rcode {
        0 => "NOERROR",
        1 => "FORMERR",
        2 => "SERVFAIL",
        3 => "NXDOMAIN",
        4 => "NOTIMP",
        5 => "REFUSED",
        6 => "YXDOMAIN",
        7 => "YXRRSET",
        8 => "NXRRSET",
        9 => "NOTAUTH",
        10 => "NOTZONE",
        16 => "BADSIG",
        17 => "BADKEY",
        18 => "BADTIME",
        19 => "BADMODE",
        20 => "BADNAME",
        21 => "BADALG",
        22 => "BADTRUNC",
        23 => "BADCOOKIE",
        other => return format!("RCODE{other}"),
    };
    name.to_owned()
}
