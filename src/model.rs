//! Data models for the URL shortener
//!
//! `UrlMapping` is the stored entity. The remaining types are the JSON
//! payloads of the HTTP adapter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum accepted length of a long URL, in characters
pub const MAX_URL_LENGTH: usize = 500;

/// A short code and the destination it resolves to.
///
/// Once stored, `short_code`, `long_url` and `created_at` never change.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UrlMapping {
    /// Unique code, 1 to 10 ASCII alphanumerics (e.g. "Xk9p2Q")
    pub short_code: String,

    /// Destination, stored exactly as submitted
    pub long_url: String,

    /// Identity of the submitter; `None` for anonymous submissions
    /// or after the owner has been released
    pub owner: Option<String>,

    /// Set once when the mapping is committed
    pub created_at: DateTime<Utc>,
}

impl UrlMapping {
    /// Builds the absolute short link under `base_url`
    pub fn short_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.short_code)
    }
}

/// Request payload for shortening a URL
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/a",
///   "owner": "alice"
/// }
/// ```
#[derive(Deserialize, Debug)]
pub struct ShortenRequest {
    /// The long URL; a missing field is treated like an empty one
    #[serde(default)]
    pub url: String,

    /// Optional identity of the submitter
    pub owner: Option<String>,
}

/// A mapping as returned to HTTP clients
#[derive(Serialize, Deserialize, Debug)]
pub struct MappingResponse {
    pub short_code: String,
    pub short_url: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

impl MappingResponse {
    pub fn new(mapping: UrlMapping, base_url: &str) -> Self {
        Self {
            short_url: mapping.short_url(base_url),
            short_code: mapping.short_code,
            long_url: mapping.long_url,
            created_at: mapping.created_at,
        }
    }
}

/// Query parameters for listing an owner's recent mappings
///
/// Query string: `?owner=alice&limit=20`
#[derive(Deserialize, Debug)]
pub struct RecentParams {
    /// Owner to list for; absent means anonymous, which has no recent list
    pub owner: Option<String>,

    /// Defaults to 10, capped at 100
    pub limit: Option<usize>,
}
