//! REST fetcher for the telephony API.
//!
//! Implements [`PageFetcher`] over the vendor's JSON REST interface:
//! HTTP basic auth with the account sid and auth token, list endpoints
//! with `PageSize`/`Page` query parameters, and `next_page_uri` as the
//! continuation token.
//!
//! ```text
//! GET /2010-04-01/Accounts/{AC}/Calls.json?PageSize=50&Page=0
//! GET /2010-04-01/Accounts/{AC}/Calls/{CA}.json
//! GET /2010-04-01/Accounts/{AC}/SMS/Messages.json
//! ```

use crate::config::AccountConfig;
use crate::error::DaemonError;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use sync_client::{FetchError, Page, PageFetcher, PageRequest};
use sync_types::{RawRecord, ResourceType, Sid};
use tracing::{debug, warn};

/// REST path segment of a resource collection under an account.
///
/// `None` for types that are not listed per account.
pub fn collection(resource_type: ResourceType) -> Option<&'static str> {
    match resource_type {
        ResourceType::Account => None,
        ResourceType::Call => Some("Calls"),
        ResourceType::SmsMessage => Some("SMS/Messages"),
        ResourceType::Recording => Some("Recordings"),
        ResourceType::Transcription => Some("Transcriptions"),
        ResourceType::Notification => Some("Notifications"),
        ResourceType::Conference => Some("Conferences"),
        // Participants live under /Conferences/{CF}/Participants.
        ResourceType::Participant => None,
        ResourceType::OutgoingCallerId => Some("OutgoingCallerIds"),
        ResourceType::IncomingPhoneNumber => Some("IncomingPhoneNumbers"),
    }
}

/// Key holding the records in a list response body.
pub fn list_key(resource_type: ResourceType) -> &'static str {
    match resource_type {
        ResourceType::Account => "accounts",
        ResourceType::Call => "calls",
        ResourceType::SmsMessage => "sms_messages",
        ResourceType::Recording => "recordings",
        ResourceType::Transcription => "transcriptions",
        ResourceType::Notification => "notifications",
        ResourceType::Conference => "conferences",
        ResourceType::Participant => "participants",
        ResourceType::OutgoingCallerId => "outgoing_caller_ids",
        ResourceType::IncomingPhoneNumber => "incoming_phone_numbers",
    }
}

/// Decode one list response body.
///
/// Items that are not objects or lack a sid are skipped with a warning and
/// reported in [`Page::skipped`], so they still count towards `total`. A
/// body without `total` reports `u64::MAX`, which forces a sweep.
pub fn parse_page(resource_type: ResourceType, body: Value) -> Result<Page, FetchError> {
    let Value::Object(mut body) = body else {
        return Err(FetchError::Decode("list response is not an object".into()));
    };

    let key = list_key(resource_type);
    let items = match body.remove(key) {
        Some(Value::Array(items)) => items,
        _ => return Err(FetchError::Decode(format!("list response has no `{key}` array"))),
    };

    let total = body.get("total").and_then(Value::as_u64).unwrap_or(u64::MAX);
    let next_page_token = body
        .get("next_page_uri")
        .and_then(Value::as_str)
        .filter(|uri| !uri.is_empty())
        .map(str::to_string);

    let listed = items.len();
    let items: Vec<RawRecord> = items
        .into_iter()
        .filter_map(|item| match RawRecord::from_json(resource_type, item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(resource_type = %resource_type, error = %e, "Skipping malformed list item");
                None
            }
        })
        .collect();
    let skipped = (listed - items.len()) as u64;

    Ok(Page {
        items,
        total,
        next_page_token,
        skipped,
    })
}

/// HTTP client for one account.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    account_sid: String,
    auth_token: String,
    page_size: u32,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("account_sid", &self.account_sid)
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl HttpFetcher {
    /// Build a fetcher from account settings.
    pub fn new(account: &AccountConfig, page_size: u32) -> Result<Self, DaemonError> {
        let auth_token = account
            .auth_token
            .clone()
            .ok_or_else(|| DaemonError::Api("auth token not configured".into()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(account.request_timeout_secs))
            .user_agent(concat!("twiliodb-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DaemonError::Api(e.to_string()))?;

        Ok(Self {
            client,
            base_url: account.base_url.trim_end_matches('/').to_string(),
            api_version: account.api_version.clone(),
            account_sid: account.sid.clone(),
            auth_token,
            page_size,
        })
    }

    fn account_root(&self) -> String {
        format!("/{}/Accounts/{}", self.api_version, self.account_sid)
    }

    /// Path of the list endpoint of `resource_type`.
    pub fn list_path(&self, resource_type: ResourceType) -> Option<String> {
        match resource_type {
            ResourceType::Account => Some(format!("/{}/Accounts.json", self.api_version)),
            other => collection(other).map(|c| format!("{}/{c}.json", self.account_root())),
        }
    }

    /// Path of the single-record endpoint of `resource_type`.
    pub fn record_path(&self, resource_type: ResourceType, sid: &Sid) -> Option<String> {
        match resource_type {
            ResourceType::Account => Some(format!("/{}/Accounts/{sid}.json", self.api_version)),
            other => collection(other).map(|c| format!("{}/{c}/{sid}.json", self.account_root())),
        }
    }

    /// Path of the audio of a recording.
    pub fn media_path(&self, sid: &Sid, extension: &str) -> String {
        format!("{}/Recordings/{sid}.{extension}", self.account_root())
    }

    /// Absolute URL of the page described by `request`.
    pub fn page_url(&self, resource_type: ResourceType, request: &PageRequest) -> Option<String> {
        if let Some(token) = &request.token {
            return Some(self.absolute(token));
        }
        self.list_path(resource_type).map(|path| {
            format!(
                "{}{path}?PageSize={}&Page={}",
                self.base_url, self.page_size, request.index
            )
        })
    }

    fn absolute(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}{path_or_url}", self.base_url)
        }
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!(url, "GET");
        self.client
            .get(url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }

    async fn get_json(&self, url: &str) -> Result<Option<Value>, FetchError> {
        let response = self.get(url).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json()
                .await
                .map(Some)
                .map_err(|e| FetchError::Decode(e.to_string())),
            status => Err(FetchError::Transport(format!("HTTP {status} from {url}"))),
        }
    }

    /// Download a file under the account (recording audio).
    pub async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.absolute(path);
        let response = self.get(&url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {status} from {url}")));
        }
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    fn supports(&self, resource_type: ResourceType) -> bool {
        self.list_path(resource_type).is_some()
    }

    async fn fetch_page(
        &self,
        resource_type: ResourceType,
        request: &PageRequest,
    ) -> Result<Page, FetchError> {
        let url = self.page_url(resource_type, request).ok_or_else(|| {
            FetchError::Transport(format!("{resource_type} cannot be listed"))
        })?;
        match self.get_json(&url).await? {
            Some(body) => parse_page(resource_type, body),
            None => Err(FetchError::Transport(format!("list endpoint not found: {url}"))),
        }
    }

    async fn fetch_one(
        &self,
        resource_type: ResourceType,
        sid: &Sid,
    ) -> Result<RawRecord, FetchError> {
        let path = self.record_path(resource_type, sid).ok_or_else(|| {
            FetchError::Transport(format!("{resource_type} cannot be fetched"))
        })?;
        let url = self.absolute(&path);
        match self.get_json(&url).await? {
            Some(body) => RawRecord::from_json(resource_type, body)
                .map_err(|e| FetchError::Decode(e.to_string())),
            None => Err(FetchError::NotFound {
                resource_type,
                sid: sid.clone(),
            }),
        }
    }
}
