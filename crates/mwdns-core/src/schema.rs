// ── Record schemas ──
//
// Per-type field definitions. Loaded once per session and read-only after
// that. Field order drives presentation only; the codec looks fields up
// by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;

/// Name of the implicit field terminating every schema.
pub const TTL_FIELD: &str = "ttl";

/// How a field's value is carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    /// Free text, trimmed.
    Text,
    /// Integer.
    Number,
    /// A domain name; gets a trailing dot on the wire.
    Domain,
    /// Long text; split into chunks when `chunked` is set.
    #[serde(rename = "textblob")]
    #[strum(serialize = "textblob")]
    TextBlob,
}

/// One field of a record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Form validation rule. Informational only; enforced by the form.
    #[serde(default)]
    pub validation: String,
    #[serde(default)]
    pub example: String,
    /// TXT semantics: split into <=255-byte chunks on the wire.
    #[serde(default)]
    pub chunked: bool,
}

impl FieldSpec {
    fn new(name: &str, label: &str, kind: FieldKind, example: &str) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            validation: "required".into(),
            example: example.into(),
            chunked: false,
        }
    }

    fn ttl() -> Self {
        Self::new(TTL_FIELD, "TTL", FieldKind::Number, "60")
    }
}

/// Ordered fields of one record type, `ttl` last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    pub type_name: String,
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    fn new(type_name: &str, mut fields: Vec<FieldSpec>) -> Self {
        fields.retain(|f| f.name != TTL_FIELD);
        fields.push(FieldSpec::ttl());
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// All known record schemas.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, RecordSchema>,
}

impl SchemaRegistry {
    /// The record types the backend accepts.
    pub fn builtin() -> Self {
        use FieldKind::{Domain, Number, Text, TextBlob};

        let mut txt = FieldSpec::new("Txt", "Content", TextBlob, "hello world");
        txt.chunked = true;

        let schemas = [
            RecordSchema::new("A", vec![FieldSpec::new("A", "IPv4 Address", Text, "1.2.3.4")]),
            RecordSchema::new(
                "AAAA",
                vec![FieldSpec::new("AAAA", "IPv6 Address", Text, "2001:db8::1")],
            ),
            RecordSchema::new(
                "CAA",
                vec![
                    FieldSpec::new("Flag", "Flag", Number, "0"),
                    FieldSpec::new("Tag", "Tag", Text, "issue"),
                    FieldSpec::new("Value", "CA domain name", Text, "letsencrypt.org"),
                ],
            ),
            RecordSchema::new(
                "CNAME",
                vec![FieldSpec::new("Target", "Target", Domain, "orange-ip.fly.dev")],
            ),
            RecordSchema::new(
                "MX",
                vec![
                    FieldSpec::new("Preference", "Preference", Number, "10"),
                    FieldSpec::new("Mx", "Mail Server", Domain, "mail.messagingengine.com"),
                ],
            ),
            RecordSchema::new("NS", vec![FieldSpec::new("Ns", "Nameserver", Domain, "ns1.example.com")]),
            RecordSchema::new("PTR", vec![FieldSpec::new("Ptr", "Pointer", Domain, "www.example.com")]),
            RecordSchema::new(
                "SRV",
                vec![
                    FieldSpec::new("Priority", "Priority", Number, "10"),
                    FieldSpec::new("Weight", "Weight", Number, "5"),
                    FieldSpec::new("Port", "Port", Number, "8080"),
                    FieldSpec::new("Target", "Target", Domain, "orange-ip.fly.dev"),
                ],
            ),
            RecordSchema::new("TXT", vec![txt]),
        ];

        Self {
            schemas: schemas
                .into_iter()
                .map(|s| (s.type_name.clone(), s))
                .collect(),
        }
    }

    /// Load schemas from a JSON document of the form
    /// `{"TYPE": [{"name", "label", "kind", ...}, ...]}`.
    ///
    /// A `ttl` field is appended to every type.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let raw: BTreeMap<String, Vec<FieldSpec>> =
            serde_json::from_str(json).map_err(|e| CoreError::Config {
                message: format!("invalid schema document: {e}"),
            })?;

        Ok(Self {
            schemas: raw
                .into_iter()
                .map(|(type_name, fields)| {
                    let schema = RecordSchema::new(&type_name, fields);
                    (type_name, schema)
                })
                .collect(),
        })
    }

    /// Ordered fields of `type_name`, `ttl` last.
    pub fn fields(&self, type_name: &str) -> Result<&[FieldSpec], CoreError> {
        self.schema(type_name).map(|s| s.fields.as_slice())
    }

    pub fn schema(&self, type_name: &str) -> Result<&RecordSchema, CoreError> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| CoreError::UnknownType {
                type_name: type_name.into(),
            })
    }

    /// A single field, or `None` if the type or the field is unknown.
    pub fn field(&self, type_name: &str, name: &str) -> Option<&FieldSpec> {
        self.schemas.get(type_name)?.field(name)
    }

    /// Known type names in sorted order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
