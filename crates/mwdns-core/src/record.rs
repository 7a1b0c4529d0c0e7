// ── Domain-level record model ──
//
// The flat, user-facing form of a resource record. Type-specific values
// are kept as strings in wire order; the codec applies the schema.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keys owned by the record itself. Never treated as type-specific fields.
pub const RESERVED_KEYS: &[&str] = &["id", "domain", "subdomain", "type", "ttl"];

/// A record as the user edits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Server-assigned id. Empty until the record has been stored.
    #[serde(default)]
    pub id: String,
    pub domain: String,
    /// `"@"` for the zone apex.
    pub subdomain: String,
    #[serde(rename = "type")]
    pub record_type: String,
    /// Decimal string; parsed on encode.
    pub ttl: String,
    /// Type-specific values keyed by their wire names (`A`, `Target`, ...).
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

impl DomainRecord {
    pub fn new(subdomain: &str, record_type: &str, ttl: &str) -> Self {
        Self {
            subdomain: subdomain.into(),
            record_type: record_type.into(),
            ttl: ttl.into(),
            ..Self::default()
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.set_field(name, value);
        self
    }

    /// Set a type-specific field. Reserved keys are routed to the
    /// matching struct member instead.
    pub fn set_field(&mut self, name: &str, value: &str) {
        match name {
            "id" => self.id = value.into(),
            "domain" => self.domain = value.into(),
            "subdomain" => self.subdomain = value.into(),
            "type" => self.record_type = value.into(),
            "ttl" => self.ttl = value.into(),
            _ => {
                self.fields.insert(name.into(), value.into());
            }
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Field values joined with spaces, in wire order.
    pub fn content(&self) -> String {
        self.fields
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Partial update applied over a stored record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub record_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

impl RecordPatch {
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        match name {
            "subdomain" => self.subdomain = Some(value.into()),
            "type" => self.record_type = Some(value.into()),
            "ttl" => self.ttl = Some(value.into()),
            _ => {
                self.fields.insert(name.into(), value.into());
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.subdomain.is_none()
            && self.record_type.is_none()
            && self.ttl.is_none()
            && self.fields.is_empty()
    }

    /// Merge over `base`: patch values win. A type change drops every
    /// field of the old type first. `id` and `domain` always come from
    /// `base`.
    pub fn apply(&self, base: &DomainRecord) -> DomainRecord {
        let mut merged = base.clone();

        if let Some(record_type) = self
            .record_type
            .as_ref()
            .filter(|t| **t != base.record_type)
        {
            merged.record_type.clone_from(record_type);
            merged.fields.clear();
        }
        if let Some(subdomain) = &self.subdomain {
            merged.subdomain.clone_from(subdomain);
        }
        if let Some(ttl) = &self.ttl {
            merged.ttl.clone_from(ttl);
        }
        for (name, value) in &self.fields {
            if !RESERVED_KEYS.contains(&name.as_str()) {
                merged.fields.insert(name.clone(), value.clone());
            }
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stored_mx() -> DomainRecord {
        let mut record = DomainRecord::new("mail", "MX", "300")
            .with_field("Preference", "10")
            .with_field("Mx", "mx1.example.net.");
        record.id = "9".into();
        record.domain = "example".into();
        record
    }

    #[test]
    fn reserved_keys_route_to_members() {
        let record = DomainRecord::default()
            .with_field("type", "A")
            .with_field("ttl", "60")
            .with_field("A", "1.2.3.4");
        assert_eq!(record.record_type, "A");
        assert_eq!(record.ttl, "60");
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn patch_overrides_matching_fields() {
        let patch = RecordPatch::default()
            .with_field("ttl", "60")
            .with_field("Mx", "mx2.example.net.");
        let merged = patch.apply(&stored_mx());

        assert_eq!(merged.id, "9");
        assert_eq!(merged.ttl, "60");
        assert_eq!(merged.field("Preference"), Some("10"));
        assert_eq!(merged.field("Mx"), Some("mx2.example.net."));
    }

    #[test]
    fn type_change_drops_old_fields() {
        let patch = RecordPatch::default()
            .with_field("type", "A")
            .with_field("A", "1.2.3.4");
        let merged = patch.apply(&stored_mx());

        assert_eq!(merged.record_type, "A");
        assert_eq!(merged.fields.keys().collect::<Vec<_>>(), ["A"]);
    }

    #[test]
    fn same_type_keeps_fields() {
        let patch = RecordPatch::default().with_field("type", "MX");
        assert_eq!(patch.apply(&stored_mx()), stored_mx());
    }

    #[test]
    fn content_joins_in_wire_order() {
        let record = stored_mx();
        assert_eq!(record.content(), "10 mx1.example.net.");
    }

    #[test]
    fn serializes_type_key() {
        let json = serde_json::to_value(DomainRecord::new("@", "A", "5")).unwrap_or_default();
        assert_eq!(json["type"], "A");
    }
}
