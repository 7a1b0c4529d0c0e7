// ── Record transcoder ──
//
// DomainRecord <-> WireRecord, driven by the schema registry and the
// name codec. Encoding fails before any network call when a numeric value
// does not parse; decoding never fails.

use std::sync::Arc;

use mwdns_api::{StoredRecord, WireHeader, WireRecord, WireValue};
use tracing::debug;

use crate::error::CoreError;
use crate::name::NameCodec;
use crate::record::{DomainRecord, RESERVED_KEYS};
use crate::rrtype::{type_name, type_to_code};
use crate::schema::{FieldKind, SchemaRegistry, TTL_FIELD};

/// Maximum length of a single TXT character-string, in bytes.
pub const TXT_CHUNK_LEN: usize = 255;

#[derive(Debug, Clone)]
pub struct RecordCodec {
    schemas: Arc<SchemaRegistry>,
    names: NameCodec,
}

impl RecordCodec {
    pub fn new(schemas: Arc<SchemaRegistry>, names: NameCodec) -> Self {
        Self { schemas, names }
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn names(&self) -> &NameCodec {
        &self.names
    }

    /// Build the wire form of `record`.
    ///
    /// Domain-kind values get a trailing dot, text values are trimmed,
    /// chunked values are split into <=255-byte pieces untrimmed, and
    /// Number-kind values are parsed. A field the schema does not know is
    /// passed through as trimmed text. Types without a schema are
    /// rejected, even when they have an rrtype code.
    pub fn encode(&self, record: &DomainRecord) -> Result<WireRecord, CoreError> {
        let schema = self.schemas.schema(&record.record_type)?;
        let rrtype = type_to_code(&record.record_type).ok_or_else(|| CoreError::UnknownType {
            type_name: record.record_type.clone(),
        })?;
        let ttl = record
            .ttl
            .trim()
            .parse::<u32>()
            .map_err(|e| CoreError::encoding(TTL_FIELD, &record.ttl, e.to_string()))?;
        let name = self.names.to_wire_name(&record.subdomain, &record.domain)?;

        let mut wire = WireRecord::new(WireHeader::new(name, rrtype, ttl));

        for (field, value) in &record.fields {
            if RESERVED_KEYS.contains(&field.as_str()) {
                continue;
            }
            let encoded = match schema.field(field) {
                Some(spec) if spec.chunked => WireValue::Chunks(chunk_txt(value)),
                Some(spec) => match spec.kind {
                    FieldKind::Number => WireValue::Number(parse_number(field, value)?),
                    FieldKind::Domain => WireValue::Text(fqdn(value.trim())),
                    FieldKind::Text | FieldKind::TextBlob => WireValue::Text(value.trim().to_owned()),
                },
                None => {
                    debug!(
                        record_type = %record.record_type,
                        field = %field,
                        "field not in schema, passing through"
                    );
                    WireValue::Text(value.trim().to_owned())
                }
            };
            wire.fields.insert(field.clone(), encoded);
        }

        Ok(wire)
    }

    /// Flatten a wire record back into the user-facing form.
    pub fn decode(&self, id: &str, wire: &WireRecord) -> DomainRecord {
        let (subdomain, domain) = self.names.from_wire_name(&wire.header.name);

        DomainRecord {
            id: id.to_owned(),
            domain,
            subdomain,
            record_type: type_name(wire.header.rrtype).into_owned(),
            ttl: wire.header.ttl.to_string(),
            fields: wire
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_field_string()))
                .collect(),
        }
    }

    /// Decode a `GET /domains/{domain}` listing, preserving server order.
    pub fn decode_all(&self, stored: &[StoredRecord]) -> Vec<DomainRecord> {
        stored
            .iter()
            .map(|s| self.decode(&s.id, &s.record))
            .collect()
    }
}

/// Split `value` into ordered pieces of at most [`TXT_CHUNK_LEN`] bytes,
/// never cutting through a UTF-8 sequence. Empty input yields no chunks.
pub fn chunk_txt(value: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = value;

    while !rest.is_empty() {
        let mut end = rest.len().min(TXT_CHUNK_LEN);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head.to_owned());
        rest = tail;
    }

    chunks
}

fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_owned()
    } else {
        format!("{name}.")
    }
}

fn parse_number(field: &str, value: &str) -> Result<i64, CoreError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|e| CoreError::encoding(field, value, e.to_string()))
}
