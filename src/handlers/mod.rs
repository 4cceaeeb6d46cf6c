//! HTTP handlers shared across routes.

pub mod http;

pub use http::AppState;
