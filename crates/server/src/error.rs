use thiserror::Error;

/// Error enum for crate-specific errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The backend rejected the request parameters.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// An error from the external API library.
    #[error(transparent)]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),

    /// [http::Error]
    #[error(transparent)]
    Http(#[from] http::Error),

    /// [http::header::InvalidHeaderValue]
    #[error(transparent)]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// [std::io::Error]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A required environment variable is not set.
    #[error("{0} is not set")]
    MissingEnv(&'static str),

    /// The request named a collection or item the backend doesn't have.
    #[error("not found: {0}")]
    NotFound(String),

    /// The query string could not be parsed.
    #[error("invalid query string: {0}")]
    Query(#[from] serde_urlencoded::de::Error),

    /// [serde_json::Error]
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

#[cfg(feature = "axum")]
impl axum::response::IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        use axum::{Json, http::StatusCode};

        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) | Error::Query(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("error while handling request: {}", self);
        } else {
            tracing::debug!("client error: {}", self);
        }
        (
            status,
            Json(serde_json::json!({"error": self.to_string()})),
        )
            .into_response()
    }
}
