//! HTTP request handlers for the URL shortener API
//!
//! This module holds thin wrappers over [`crate::service::Shortener`]:
//! - Shortening a URL (with dedup by exact long URL)
//! - Redirecting a short code to its destination
//! - Listing an owner's most recent mappings
//!
//! Handlers translate JSON bodies and path/query parameters into engine calls,
//! and [`ShortenerError`] into JSON error responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};
use serde_json::json;

use crate::error::ShortenerError;
use crate::model::{MappingResponse, RecentParams, ShortenRequest};
use crate::route::AppState;
use crate::service::recent_limit;

/// Shortens a URL
///
/// This handler:
/// 1. Accepts a long URL and an optional owner
/// 2. Returns the existing mapping if the exact URL is already stored
/// 3. Otherwise allocates a fresh short code, retrying on collisions
/// 4. Returns the mapping together with its absolute short URL
///
/// The engine call commits a redb write transaction, so it runs on the
/// blocking thread pool instead of an async worker.
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "owner": "alice"
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - A new mapping was stored
/// - **200 OK** - The URL was already known; the existing mapping is returned
/// - **400 Bad Request** - Missing or malformed URL
/// - **503 Service Unavailable** - No free short code could be allocated
///
/// ```json
/// {
///   "short_code": "Xk9p2Q",
///   "short_url": "http://localhost:8080/Xk9p2Q",
///   "long_url": "https://example.com/very/long/url",
///   "created_at": "2026-01-17T13:40:00Z"
/// }
/// ```
pub async fn create_short_url(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<impl IntoResponse, ShortenerError> {
    let shortener = state.shortener.clone();
    let shortened = tokio::task::spawn_blocking(move || {
        shortener.shorten(&payload.url, payload.owner.as_deref())
    })
    .await
    .map_err(|e| ShortenerError::Task(e.to_string()))??;

    let status = if shortened.is_created() {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    let response = MappingResponse::new(shortened.into_mapping(), &state.base_url);

    Ok((status, Json(response)))
}

/// Redirects a short code to its long URL
///
/// When a client visits `http://localhost:8080/Xk9p2Q`, this handler:
/// 1. Looks up "Xk9p2Q" through the short code index
/// 2. Sends a 307 Temporary Redirect to the stored long URL
///
/// # Path Parameters
///
/// - `code` - The short code
///
/// # Response
///
/// - **307 Temporary Redirect** - Redirects to the long URL
/// - **404 Not Found** - Unknown or malformed code
pub async fn redirect_url(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, ShortenerError> {
    let long_url = state.shortener.resolve(&code)?;
    Ok(Redirect::temporary(&long_url))
}

/// Lists an owner's most recent mappings, newest first
///
/// # Query Parameters
///
/// - `owner` (optional) - Whose mappings to list; anonymous lists are empty
/// - `limit` (optional) - Items to return (default: 10, max: 100)
///
/// # Example Request
///
/// `GET /api/urls?owner=alice&limit=10`
///
/// # Response
///
/// ```json
/// {
///   "owner": "alice",
///   "limit": 10,
///   "total_fetched": 2,
///   "data": [...]
/// }
/// ```
///
/// # Performance
///
/// Reads a reverse range of the `(owner, created_at, id)` index, so the cost
/// depends on `limit`, not on how many mappings the owner has.
pub async fn list_urls(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<impl IntoResponse, ShortenerError> {
    let limit = recent_limit(params.limit);
    let mappings = state
        .shortener
        .list_recent(params.owner.as_deref(), Some(limit))?;

    let data: Vec<MappingResponse> = mappings
        .into_iter()
        .map(|mapping| MappingResponse::new(mapping, &state.base_url))
        .collect();

    Ok(Json(json!({
        "owner": params.owner,
        "limit": limit,
        "total_fetched": data.len(),
        "data": data,
    })))
}
