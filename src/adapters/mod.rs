// Adapters layer: concrete implementations for external systems (http, document query).

pub mod document;
pub mod http;

pub use document::Document;
pub use http::HttpFetcher;
