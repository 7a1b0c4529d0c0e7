// ── Filter predicates for entity streams ──
//
// Used by the CLI to narrow snapshots without re-querying the backend.

use crate::record::DomainRecord;
use crate::requests::RequestEvent;

/// Filter predicate for record collections.
pub enum RecordFilter {
    All,
    /// Record type, case-insensitive.
    ByType(String),
    /// Exact subdomain; `"@"` selects the apex.
    BySubdomain(String),
    Custom(Box<dyn Fn(&DomainRecord) -> bool + Send + Sync>),
}

impl RecordFilter {
    pub fn matches(&self, record: &DomainRecord) -> bool {
        match self {
            Self::All => true,
            Self::ByType(t) => record.record_type.eq_ignore_ascii_case(t),
            Self::BySubdomain(s) => record.subdomain == *s,
            Self::Custom(f) => f(record),
        }
    }
}

/// Filter predicate for request events.
pub enum RequestFilter {
    All,
    /// Query type, case-insensitive.
    ByQueryType(String),
    /// Query names containing the given text, case-insensitive.
    NameContains(String),
}

impl RequestFilter {
    pub fn matches(&self, event: &RequestEvent) -> bool {
        match self {
            Self::All => true,
            Self::ByQueryType(t) => event.query.query_type.eq_ignore_ascii_case(t),
            Self::NameContains(needle) => event
                .query
                .name
                .to_ascii_lowercase()
                .contains(&needle.to_ascii_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subdomain: &str, record_type: &str) -> DomainRecord {
        DomainRecord::new(subdomain, record_type, "60")
    }

    #[test]
    fn type_filter_ignores_case() {
        let filter = RecordFilter::ByType("cname".into());
        assert!(filter.matches(&record("www", "CNAME")));
        assert!(!filter.matches(&record("www", "A")));
    }

    #[test]
    fn subdomain_filter_matches_apex() {
        let filter = RecordFilter::BySubdomain("@".into());
        assert!(filter.matches(&record("@", "MX")));
        assert!(!filter.matches(&record("mail", "MX")));
    }

    #[test]
    fn custom_filter() {
        let filter = RecordFilter::Custom(Box::new(|r| r.ttl == "60"));
        assert!(filter.matches(&record("@", "A")));
        assert!(RecordFilter::All.matches(&record("x", "TXT")));
    }
}
