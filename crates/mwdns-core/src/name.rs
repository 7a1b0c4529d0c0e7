// ── Owner-name codec ──
//
// (subdomain, domain) <-> fully-qualified wire name under a fixed suffix.
// Labels are punycode-encoded one at a time; ASCII labels pass through
// untouched so case and spelling survive the round trip.

use tracing::debug;

use crate::error::CoreError;

/// Zone the backend serves every user domain under.
pub const DEFAULT_SUFFIX: &str = "messwithdns.com";

/// Subdomain marker for the zone apex.
pub const APEX: &str = "@";

const ACE_PREFIX: &str = "xn--";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameCodec {
    suffix: String,
}

impl NameCodec {
    pub fn new(suffix: impl Into<String>) -> Self {
        let suffix: String = suffix.into();
        Self {
            suffix: suffix.trim_matches('.').to_owned(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// `("@", "example")` -> `"example.messwithdns.com."`,
    /// `("www", "example")` -> `"www.example.messwithdns.com."`.
    pub fn to_wire_name(&self, subdomain: &str, domain: &str) -> Result<String, CoreError> {
        let unicode = if subdomain == APEX {
            format!("{domain}.{}.", self.suffix)
        } else {
            format!("{subdomain}.{domain}.{}.", self.suffix)
        };

        unicode
            .split('.')
            .map(encode_label)
            .collect::<Result<Vec<_>, _>>()
            .map(|labels| labels.join("."))
    }

    /// Inverse of [`to_wire_name`](Self::to_wire_name).
    ///
    /// A name with one label left under the suffix is the apex of that
    /// domain; otherwise the last label is the domain and the rest is the
    /// subdomain.
    pub fn from_wire_name(&self, fqdn: &str) -> (String, String) {
        let name = fqdn.strip_suffix('.').unwrap_or(fqdn);
        let mut labels: Vec<String> = name.split('.').map(decode_label).collect();

        let suffix_labels: Vec<&str> = self.suffix.split('.').collect();
        if ends_with_suffix(&labels, &suffix_labels) {
            labels.truncate(labels.len() - suffix_labels.len());
        } else {
            debug!(fqdn, suffix = %self.suffix, "name is outside the managed suffix");
        }

        match labels.split_last() {
            None => (APEX.to_owned(), String::new()),
            Some((domain, [])) => (APEX.to_owned(), domain.clone()),
            Some((domain, rest)) => (rest.join("."), domain.clone()),
        }
    }
}

impl Default for NameCodec {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

fn ends_with_suffix(labels: &[String], suffix: &[&str]) -> bool {
    labels.len() >= suffix.len()
        && labels
            .iter()
            .rev()
            .zip(suffix.iter().rev())
            .all(|(label, s)| label.eq_ignore_ascii_case(s))
}

fn encode_label(label: &str) -> Result<String, CoreError> {
    if label.is_ascii() {
        return Ok(label.to_owned());
    }
    idna::punycode::encode_str(label)
        .map(|encoded| format!("{ACE_PREFIX}{encoded}"))
        .ok_or_else(|| CoreError::Encoding {
            field: "name".into(),
            value: label.into(),
            reason: "label cannot be punycode-encoded".into(),
        })
}

fn decode_label(label: &str) -> String {
    let Some(encoded) = label
        .get(..ACE_PREFIX.len())
        .filter(|prefix| prefix.eq_ignore_ascii_case(ACE_PREFIX))
        .and_then(|_| label.get(ACE_PREFIX.len()..))
    else {
        return label.to_owned();
    };
    idna::punycode::decode_to_string(encoded).unwrap_or_else(|| label.to_owned())
}
