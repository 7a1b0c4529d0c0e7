// Wire types exchanged with the backend.
//
// Records mirror the backend's JSON rendering of a DNS resource record:
// a `Hdr` object plus type-specific fields with capitalized names
// (`A`, `Target`, `Mx`, `Txt`, ...). Field order is preserved.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// DNS class IN. The only class the backend stores.
pub const CLASS_IN: u16 = 1;

/// Resource record header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireHeader {
    /// Fully-qualified, ASCII-compatible owner name with a trailing dot.
    pub name: String,
    pub rrtype: u16,
    pub class: u16,
    pub ttl: u32,
    /// Unused placeholder, always 0 on the way out.
    pub rdlength: u16,
}

impl WireHeader {
    pub fn new(name: impl Into<String>, rrtype: u16, ttl: u32) -> Self {
        Self {
            name: name.into(),
            rrtype,
            class: CLASS_IN,
            ttl,
            rdlength: 0,
        }
    }
}

/// A single type-specific field value.
///
/// Untagged: numbers stay numbers, TXT content is a list of strings,
/// and anything the backend adds later survives as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Number(i64),
    Text(String),
    Chunks(Vec<String>),
    Other(serde_json::Value),
}

impl WireValue {
    /// Flatten into the string form used by the flat record model.
    ///
    /// Chunk sequences are concatenated back into one string.
    pub fn to_field_string(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Chunks(chunks) => chunks.concat(),
            Self::Other(v) => v.to_string(),
        }
    }
}

/// A resource record in wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    #[serde(rename = "Hdr")]
    pub header: WireHeader,

    /// Type-specific fields keyed by their DNS-conventional names.
    #[serde(flatten)]
    pub fields: IndexMap<String, WireValue>,
}

impl WireRecord {
    pub fn new(header: WireHeader) -> Self {
        Self {
            header,
            fields: IndexMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&WireValue> {
        self.fields.get(name)
    }
}

/// One entry of `GET /domains/{domain}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub record: WireRecord,
}

/// One entry of `GET /requests`, or one frame of the request stream.
///
/// `request` and `response` are themselves JSON documents encoded as
/// strings; `mwdns-core` performs the second decode pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequestEvent {
    /// Present on bulk-fetched entries, absent on streamed ones.
    #[serde(default, deserialize_with = "opt_id_as_string")]
    pub id: Option<String>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: i64,
    pub request: String,
    pub response: String,
    #[serde(default)]
    pub src_ip: String,
    #[serde(default)]
    pub src_host: String,
}

// ── Id helpers ───────────────────────────────────────────────────────

/// The backend has used both integer and string ids over time.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Int(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

fn id_as_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_as_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|id| id.map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wire_record_serializes_header_and_fields_in_order() {
        let mut record = WireRecord::new(WireHeader::new("test.example.messwithdns.com.", 15, 30));
        record
            .fields
            .insert("Preference".into(), WireValue::Number(10));
        record
            .fields
            .insert("Mx".into(), WireValue::Text("mail.example.com.".into()));

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"Hdr":{"Name":"test.example.messwithdns.com.","Rrtype":15,"Class":1,"Ttl":30,"Rdlength":0},"Preference":10,"Mx":"mail.example.com."}"#
        );
    }

    #[test]
    fn wire_record_deserializes_txt_chunks() {
        let json = r#"{
            "Hdr": {"Name": "example.messwithdns.com.", "Rrtype": 16, "Class": 1, "Ttl": 5, "Rdlength": 0},
            "Txt": ["hello", " world"]
        }"#;
        let record: WireRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.header.rrtype, 16);
        assert_eq!(
            record.field("Txt"),
            Some(&WireValue::Chunks(vec!["hello".into(), " world".into()]))
        );
        assert_eq!(record.field("Txt").unwrap().to_field_string(), "hello world");
    }

    #[test]
    fn stored_record_accepts_integer_and_string_ids() {
        let int_id = r#"{"id": 42, "record": {"Hdr": {"Name": "a.", "Rrtype": 1, "Class": 1, "Ttl": 1, "Rdlength": 0}, "A": "1.2.3.4"}}"#;
        let str_id = r#"{"id": "abc", "record": {"Hdr": {"Name": "a.", "Rrtype": 1, "Class": 1, "Ttl": 1, "Rdlength": 0}, "A": "1.2.3.4"}}"#;

        let a: StoredRecord = serde_json::from_str(int_id).unwrap();
        let b: StoredRecord = serde_json::from_str(str_id).unwrap();
        assert_eq!(a.id, "42");
        assert_eq!(b.id, "abc");
    }

    #[test]
    fn raw_request_event_without_id() {
        let json = r#"{"created_at": 1700000000, "request": "{}", "response": "{}", "src_ip": "1.1.1.1", "src_host": "one.one"}"#;
        let event: RawRequestEvent = serde_json::from_str(json).unwrap();
        assert!(event.id.is_none());
        assert_eq!(event.created_at, 1_700_000_000);
        assert_eq!(event.src_host, "one.one");
    }

    #[test]
    fn unknown_value_shapes_are_kept() {
        let value: WireValue = serde_json::from_str(r#"{"nested": true}"#).unwrap();
        assert!(matches!(value, WireValue::Other(_)));
        assert_eq!(value.to_field_string(), r#"{"nested":true}"#);
    }
}
