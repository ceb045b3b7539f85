//! Route bindings that expose a geospatial API library over HTTP.
//!
//! This crate **is**:
//!
//! - Url paths bound to API operations
//! - Conversion of the library's (headers, status, body) triples into HTTP
//!   responses, negotiating on the `Content-Type` the library sets
//! - Configuration and environment plumbing
//!
//! This crate **is not**:
//!
//! - The API implementation. OpenAPI generation, collection and item
//!   queries, and content rendering all live behind the [Backend] trait.
//!
//! # Examples
//!
//! Implement [Backend] for your API library, then build a router from it:
//!
//! ```
//! use geoapi_server::{Api, ApiRequest, ApiResponse, Backend, Config, Result, routes};
//! use http::StatusCode;
//!
//! #[derive(Clone)]
//! struct MyApi;
//!
//! impl Backend for MyApi {
//!     fn landing_page(&self, _: &ApiRequest) -> Result<ApiResponse> {
//!         ApiResponse::new(StatusCode::OK, "application/json", r#"{"title":"my api"}"#)
//!     }
//!     // ... the other five operations look the same ...
//!     # fn openapi(&self, request: &ApiRequest) -> Result<ApiResponse> { self.landing_page(request) }
//!     # fn conformance(&self, request: &ApiRequest) -> Result<ApiResponse> { self.landing_page(request) }
//!     # fn collections(&self, request: &ApiRequest, _: Option<&str>) -> Result<ApiResponse> { self.landing_page(request) }
//!     # fn items(&self, request: &ApiRequest, _: &str) -> Result<ApiResponse> { self.landing_page(request) }
//!     # fn item(&self, request: &ApiRequest, _: &str, _: &str) -> Result<ApiResponse> { self.landing_page(request) }
//! }
//!
//! let api = Api::new(MyApi, Config::default());
//! let router = routes::from_api(api);
//! ```

#![warn(missing_docs, unused_qualifications)]

mod api;
mod config;
mod error;
#[cfg(feature = "axum")]
pub mod routes;

pub use {
    api::{Api, ApiRequest, ApiResponse, Backend},
    config::{
        Bind, Config, GEOAPI_CONFIG, GEOAPI_HOME, GEOAPI_OPENAPI, ServerConfig, Templates,
        load_openapi_document, openapi_from_path,
    },
    error::Error,
};

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, Error>;
