//! Short-code allocation and lookup engine for a URL shortener
//!
//! [`service::Shortener`] is the entry point: it deduplicates submissions,
//! allocates collision-free codes and resolves codes back to URLs, on top of
//! the redb-backed [`store::Store`]. The `route` and `handler` modules expose
//! it over HTTP.

pub mod allocator;
pub mod config;
pub mod error;
pub mod handler;
pub mod model;
pub mod route;
pub mod service;
pub mod store;

pub use error::{ShortenerError, StoreError};
pub use model::UrlMapping;
pub use service::{Shortened, Shortener};
pub use store::Store;
