//! Route definitions for the URL shortener API
//!
//! Builds the axum router around a shared [`Shortener`].

use axum::routing::get;
use axum::Router;

use crate::handler::{create_short_url, list_urls, redirect_url};
use crate::service::Shortener;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub shortener: Shortener,

    /// Public prefix for short links, e.g. "https://sho.rt"
    pub base_url: String,
}

impl AppState {
    pub fn new(shortener: Shortener, base_url: impl Into<String>) -> Self {
        Self {
            shortener,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }
}

/// Creates the application router
///
/// # Route Definitions
///
/// - `GET /{code}` - Redirects to the long URL
/// - `GET /api/urls` - Lists an owner's recent mappings
/// - `POST /api/urls` - Shortens a URL
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use urlshortener::allocator::RandomAllocator;
/// # use urlshortener::route::{create_app, AppState};
/// # use urlshortener::service::Shortener;
/// # use urlshortener::store::Store;
/// let store = Arc::new(Store::open("data.db").unwrap());
/// let shortener = Shortener::new(store, RandomAllocator::default());
/// let app = create_app(AppState::new(shortener, "http://localhost:8080"));
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new().route("/urls", get(list_urls).post(create_short_url));

    Router::new()
        .route("/{code}", get(redirect_url))
        .nest("/api", api_routes)
        .with_state(state)
}
