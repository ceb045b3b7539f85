use crate::{Config, Result};
use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode, header, request::Parts};
use std::collections::HashMap;

/// The adapter-side view of an incoming HTTP request.
///
/// This is what gets handed across the seam to the API library: the method,
/// the path, the parsed query parameters, and the request headers. The body
/// is not carried because every bound route is a GET.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// The request method.
    pub method: Method,

    /// The request path.
    pub path: String,

    /// The parsed query parameters.
    pub params: HashMap<String, String>,

    /// The request headers.
    pub headers: HeaderMap,
}

impl ApiRequest {
    /// Creates an [ApiRequest] from the parts of an [http::Request].
    ///
    /// # Examples
    ///
    /// ```
    /// use geoapi_server::ApiRequest;
    ///
    /// let (parts, _) = http::Request::get("/collections?f=json")
    ///     .body(())
    ///     .unwrap()
    ///     .into_parts();
    /// let request = ApiRequest::new(&parts).unwrap();
    /// assert_eq!(request.path, "/collections");
    /// assert_eq!(request.params["f"], "json");
    /// ```
    pub fn new(parts: &Parts) -> Result<ApiRequest> {
        let params = match parts.uri.query() {
            Some(query) => serde_urlencoded::from_str(query)?,
            None => HashMap::new(),
        };
        Ok(ApiRequest {
            method: parts.method.clone(),
            path: parts.uri.path().to_string(),
            params,
            headers: parts.headers.clone(),
        })
    }
}

/// The triple an API library call returns: headers, status, and body.
///
/// The adapter never inspects the body; it only reads the `Content-Type`
/// header to pick the response serialization.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// The response headers, as set by the API library.
    pub headers: HeaderMap,

    /// The response status code.
    pub status: StatusCode,

    /// The serialized response body.
    pub body: Bytes,
}

impl ApiResponse {
    /// Creates an [ApiResponse] with the given content type.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoapi_server::ApiResponse;
    /// use http::StatusCode;
    ///
    /// let response = ApiResponse::new(StatusCode::OK, "application/json", "{}").unwrap();
    /// assert_eq!(response.content_type(), Some("application/json"));
    /// ```
    pub fn new(
        status: StatusCode,
        content_type: &str,
        body: impl Into<Bytes>,
    ) -> Result<ApiResponse> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type)?);
        Ok(ApiResponse {
            headers,
            status,
            body: body.into(),
        })
    }

    /// Returns the `Content-Type` header, if there is one and it is valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// The seam to the external geospatial API library.
///
/// An implementation is the "API instance": a process-wide object that
/// encapsulates the configuration and the OpenAPI document and executes
/// requests. Each method is one library function with the same narrow
/// contract: a request in, a (headers, status, body) triple out.
///
/// This crate does not ship an implementation; request parsing, content
/// rendering, OpenAPI generation, and collection queries all happen on the
/// other side of this trait.
pub trait Backend: Clone + Send + Sync + 'static {
    /// Returns the landing page.
    fn landing_page(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Returns the OpenAPI document.
    fn openapi(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Returns the conformance declaration.
    fn conformance(&self, request: &ApiRequest) -> Result<ApiResponse>;

    /// Describes all collections, or a single one if `collection_id` is set.
    fn collections(
        &self,
        request: &ApiRequest,
        collection_id: Option<&str>,
    ) -> Result<ApiResponse>;

    /// Returns the items of a collection.
    fn items(&self, request: &ApiRequest, collection_id: &str) -> Result<ApiResponse>;

    /// Returns a single item of a collection.
    fn item(&self, request: &ApiRequest, collection_id: &str, item_id: &str)
    -> Result<ApiResponse>;
}

/// A backend paired with the adapter's own configuration.
///
/// Built once at startup and treated as read-only afterwards; cloning is
/// cheap enough to use it directly as router state.
#[derive(Debug, Clone)]
pub struct Api<B: Backend> {
    /// The API library seam.
    pub backend: B,

    /// The adapter configuration.
    pub config: Config,
}

impl<B: Backend> Api<B> {
    /// Creates a new [Api].
    pub fn new(backend: B, config: Config) -> Api<B> {
        Api { backend, config }
    }
}
