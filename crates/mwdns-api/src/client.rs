// Backend HTTP client
//
// Wraps `reqwest::Client` with URL construction and response handling for
// the six record/request endpoints. Non-2xx bodies are surfaced verbatim;
// they are plain text meant for humans and are never parsed.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{RawRequestEvent, StoredRecord, WireRecord};
use crate::transport::TransportConfig;

/// Raw HTTP client for the record and request-log endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the server root, e.g. `https://messwithdns.net`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Records ──────────────────────────────────────────────────────

    /// `GET /domains/{domain}`
    pub async fn list_records(&self, domain: &str) -> Result<Vec<StoredRecord>, Error> {
        let url = self.segment_url("domains", domain)?;
        // The backend encodes an empty list as `null`.
        let records: Option<Vec<StoredRecord>> = self.get_json(url).await?;
        Ok(records.unwrap_or_default())
    }

    /// `POST /record/new`. Returns the response body.
    pub async fn create_record(&self, record: &WireRecord) -> Result<String, Error> {
        let url = self.url("record/new")?;
        self.post_json(url, record).await
    }

    /// `POST /record/{id}`. Returns the response body.
    pub async fn update_record(&self, id: &str, record: &WireRecord) -> Result<String, Error> {
        let url = self.segment_url("record", id)?;
        self.post_json(url, record).await
    }

    /// `DELETE /record/{id}`
    pub async fn delete_record(&self, id: &str) -> Result<String, Error> {
        let url = self.segment_url("record", id)?;
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await?;
        read_body(resp).await
    }

    // ── Request log ──────────────────────────────────────────────────

    /// `GET /requests`, newest first.
    pub async fn list_requests(&self) -> Result<Vec<RawRequestEvent>, Error> {
        let url = self.url("requests")?;
        let requests: Option<Vec<RawRequestEvent>> = self.get_json(url).await?;
        Ok(requests.unwrap_or_default())
    }

    /// `DELETE /requests`
    pub async fn delete_requests(&self) -> Result<String, Error> {
        let url = self.url("requests")?;
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).send().await?;
        read_body(resp).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating a trailing slash on the base.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Build `{base}/{prefix}/{segment}` with `segment` percent-encoded as
    /// a single path segment.
    pub(crate) fn segment_url(&self, prefix: &str, segment: &str) -> Result<Url, Error> {
        let mut url = self.url(prefix)?;
        url.path_segments_mut()
            .map_err(|()| Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(segment);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let body = read_body(resp).await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body: body.clone(),
            }
        })
    }

    async fn post_json(&self, url: Url, body: &WireRecord) -> Result<String, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).json(body).send().await?;
        read_body(resp).await
    }
}

/// Read the body, turning any non-2xx status into [`Error::Rejected`].
async fn read_body(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        debug!(status = status.as_u16(), "backend rejected request");
        return Err(Error::Rejected {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(body)
}

fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
