//! Bind the API operations to url paths with [axum].

use crate::{Api, ApiRequest, ApiResponse, Backend, Error};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

/// Creates a router from an [Api].
///
/// Every route other than `/static` delegates to exactly one backend
/// operation; `/static` serves files from the configured static directory.
///
/// # Examples
///
/// ```no_run
/// # use geoapi_server::{Api, ApiRequest, ApiResponse, Backend, Config, Result, routes};
/// # #[derive(Clone)]
/// # struct MyApi;
/// # impl Backend for MyApi {
/// #     fn landing_page(&self, _: &ApiRequest) -> Result<ApiResponse> { unimplemented!() }
/// #     fn openapi(&self, _: &ApiRequest) -> Result<ApiResponse> { unimplemented!() }
/// #     fn conformance(&self, _: &ApiRequest) -> Result<ApiResponse> { unimplemented!() }
/// #     fn collections(&self, _: &ApiRequest, _: Option<&str>) -> Result<ApiResponse> { unimplemented!() }
/// #     fn items(&self, _: &ApiRequest, _: &str) -> Result<ApiResponse> { unimplemented!() }
/// #     fn item(&self, _: &ApiRequest, _: &str, _: &str) -> Result<ApiResponse> { unimplemented!() }
/// # }
/// # #[tokio::main] async fn main() {
/// let api = Api::new(MyApi, Config::default());
/// let router = routes::from_api(api);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await.unwrap();
/// axum::serve(listener, router).await.unwrap();
/// # }
/// ```
pub fn from_api<B: Backend>(api: Api<B>) -> Router {
    Router::new()
        .route("/", get(landing_page::<B>))
        .route("/openapi", get(openapi::<B>))
        .route("/conformance", get(conformance::<B>))
        .route("/collections", get(collections::<B>))
        .route("/collections/{collection_id}", get(collection::<B>))
        .route("/collections/{collection_id}/items", get(items::<B>))
        .route(
            "/collections/{collection_id}/items/{item_id}",
            get(item::<B>),
        )
        .nest_service("/static", ServeDir::new(api.config.static_dir()))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(api)
}

async fn landing_page<B: Backend>(State(api): State<Api<B>>, request: Request) -> Response {
    execute(&api, request, |backend, request| {
        backend.landing_page(request)
    })
}

async fn openapi<B: Backend>(State(api): State<Api<B>>, request: Request) -> Response {
    execute(&api, request, |backend, request| backend.openapi(request))
}

async fn conformance<B: Backend>(State(api): State<Api<B>>, request: Request) -> Response {
    execute(&api, request, |backend, request| {
        backend.conformance(request)
    })
}

async fn collections<B: Backend>(State(api): State<Api<B>>, request: Request) -> Response {
    execute(&api, request, |backend, request| {
        backend.collections(request, None)
    })
}

async fn collection<B: Backend>(
    State(api): State<Api<B>>,
    Path(collection_id): Path<String>,
    request: Request,
) -> Response {
    execute(&api, request, |backend, request| {
        backend.collections(request, Some(&collection_id))
    })
}

async fn items<B: Backend>(
    State(api): State<Api<B>>,
    Path(collection_id): Path<String>,
    request: Request,
) -> Response {
    execute(&api, request, |backend, request| {
        backend.items(request, &collection_id)
    })
}

async fn item<B: Backend>(
    State(api): State<Api<B>>,
    Path((collection_id, item_id)): Path<(String, String)>,
    request: Request,
) -> Response {
    execute(&api, request, |backend, request| {
        backend.item(request, &collection_id, &item_id)
    })
}

/// Adapts the request, invokes one backend operation, and converts the
/// returned triple into a response.
fn execute<B, F>(api: &Api<B>, request: Request, f: F) -> Response
where
    B: Backend,
    F: FnOnce(&B, &ApiRequest) -> crate::Result<ApiResponse>,
{
    let (parts, _) = request.into_parts();
    let request = match ApiRequest::new(&parts) {
        Ok(request) => request,
        Err(error) => return error.into_response(),
    };
    tracing::debug!("executing {} {}", request.method, request.path);
    match f(&api.backend, &request) {
        Ok(response) => to_response(response),
        Err(error) => error.into_response(),
    }
}

/// Converts a triple into a response, negotiating on its `Content-Type`.
///
/// Json, plain text, and html get canonical header values. Anything else is
/// passed through verbatim as a generic byte response, and a missing header
/// falls back to json.
fn to_response(response: ApiResponse) -> Response {
    let content_type = response
        .content_type()
        .unwrap_or(mime::APPLICATION_JSON.as_ref())
        .to_string();
    match content_type.parse::<mime::Mime>() {
        Ok(m) if m.type_() == mime::APPLICATION && m.subtype() == mime::JSON => {
            with_content_type(
                response.status,
                mime::APPLICATION_JSON.as_ref(),
                response.body,
            )
        }
        Ok(m) if m.type_() == mime::TEXT && m.subtype() == mime::PLAIN => with_content_type(
            response.status,
            mime::TEXT_PLAIN_UTF_8.as_ref(),
            response.body,
        ),
        Ok(m) if m.type_() == mime::TEXT && m.subtype() == mime::HTML => with_content_type(
            response.status,
            mime::TEXT_HTML_UTF_8.as_ref(),
            response.body,
        ),
        _ => with_content_type(response.status, &content_type, response.body),
    }
}

fn with_content_type(status: StatusCode, content_type: &str, body: Bytes) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap_or_else(|error| Error::from(error).into_response())
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "panic while handling request".to_string()
    };
    tracing::error!("panic while handling request: {}", detail);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": detail})),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::{Api, ApiRequest, ApiResponse, Backend, Config, Error};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http::HeaderMap;
    use serde_json::Value;
    use std::io::Write;
    use tower::util::ServiceExt;

    #[derive(Debug, Clone)]
    struct StubBackend;

    impl StubBackend {
        fn json(body: &str) -> crate::Result<ApiResponse> {
            ApiResponse::new(StatusCode::OK, "application/json", body.to_string())
        }
    }

    impl Backend for StubBackend {
        fn landing_page(&self, request: &ApiRequest) -> crate::Result<ApiResponse> {
            if let Some(content_type) = request.params.get("ct") {
                ApiResponse::new(StatusCode::OK, content_type, "landing page")
            } else {
                StubBackend::json(r#"{"page":"landing"}"#)
            }
        }

        fn openapi(&self, _: &ApiRequest) -> crate::Result<ApiResponse> {
            StubBackend::json(r#"{"openapi":"3.0.2"}"#)
        }

        fn conformance(&self, _: &ApiRequest) -> crate::Result<ApiResponse> {
            // no content-type at all
            Ok(ApiResponse {
                headers: HeaderMap::new(),
                status: StatusCode::OK,
                body: r#"{"conformsTo":[]}"#.into(),
            })
        }

        fn collections(
            &self,
            _: &ApiRequest,
            collection_id: Option<&str>,
        ) -> crate::Result<ApiResponse> {
            match collection_id {
                None => StubBackend::json(r#"{"collections":[]}"#),
                Some("missing") => Err(Error::NotFound("collection: missing".to_string())),
                Some(id) => StubBackend::json(&format!(r#"{{"id":"{id}"}}"#)),
            }
        }

        fn items(&self, _: &ApiRequest, collection_id: &str) -> crate::Result<ApiResponse> {
            if collection_id == "bad" {
                Err(Error::BadRequest("limit must be positive".to_string()))
            } else {
                StubBackend::json(&format!(
                    r#"{{"type":"FeatureCollection","collection":"{collection_id}"}}"#
                ))
            }
        }

        fn item(
            &self,
            _: &ApiRequest,
            collection_id: &str,
            item_id: &str,
        ) -> crate::Result<ApiResponse> {
            match item_id {
                "panic" => panic!("boom"),
                "broken" => Err(Error::Backend("backend exploded".into())),
                _ => ApiResponse::new(
                    StatusCode::OK,
                    "text/html",
                    format!("<html>{collection_id}/{item_id}</html>"),
                ),
            }
        }
    }

    fn app() -> Router {
        super::from_api(Api::new(StubBackend, Config::default()))
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, String, bytes::Bytes) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|value| value.to_str().unwrap().to_string())
            .unwrap_or_default();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn each_route_maps_to_one_operation() {
        for (uri, marker) in [
            ("/", r#""page":"landing""#),
            ("/openapi", r#""openapi":"3.0.2""#),
            ("/conformance", r#""conformsTo""#),
            ("/collections", r#""collections":[]"#),
            ("/collections/lakes", r#""id":"lakes""#),
            ("/collections/lakes/items", r#""collection":"lakes""#),
            ("/collections/lakes/items/42", "lakes/42"),
        ] {
            let (status, _, body) = get(app(), uri).await;
            assert_eq!(status, StatusCode::OK, "uri: {uri}");
            let body = String::from_utf8(body.to_vec()).unwrap();
            assert!(body.contains(marker), "uri: {uri}, body: {body}");
        }
    }

    #[tokio::test]
    async fn json_content_type() {
        let (status, content_type, _) = get(app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
    }

    #[tokio::test]
    async fn plain_text_content_type() {
        let (status, content_type, body) = get(app(), "/?ct=text/plain").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/plain; charset=utf-8");
        assert_eq!(body.as_ref(), b"landing page");
    }

    #[tokio::test]
    async fn html_content_type() {
        let (status, content_type, _) = get(app(), "/collections/lakes/items/42").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn html_with_charset_is_canonicalized() {
        let (_, content_type, _) = get(app(), "/?ct=text/html;%20charset=iso-8859-1").await;
        assert_eq!(content_type, "text/html; charset=utf-8");
    }

    #[tokio::test]
    async fn unrecognized_content_type_passes_through() {
        let (status, content_type, body) = get(app(), "/?ct=application/geo%2Bjson").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/geo+json");
        assert_eq!(body.as_ref(), b"landing page");
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_json() {
        let (status, content_type, _) = get(app(), "/conformance").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
    }

    #[tokio::test]
    async fn not_found_is_a_json_404() {
        let (status, content_type, body) = get(app(), "/collections/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(content_type, "application/json");
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "not found: collection: missing");
    }

    #[tokio::test]
    async fn bad_request_is_a_json_400() {
        let (status, _, body) = get(app(), "/collections/bad/items").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "bad request: limit must be positive");
    }

    #[tokio::test]
    async fn backend_error_is_a_json_500() {
        let (status, content_type, body) = get(app(), "/collections/lakes/items/broken").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type, "application/json");
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "backend exploded");
    }

    #[tokio::test]
    async fn panic_is_a_json_500() {
        let (status, content_type, body) = get(app(), "/collections/lakes/items/panic").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(content_type, "application/json");
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "boom");
    }

    #[tokio::test]
    async fn static_files() {
        let directory = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(directory.path().join("style.css")).unwrap();
        file.write_all(b"body {}").unwrap();
        let config: Config = serde_json::from_value(serde_json::json!({
            "server": {"templates": {"static": directory.path()}}
        }))
        .unwrap();
        let router = super::from_api(Api::new(StubBackend, config));

        let (status, _, body) = get(router.clone(), "/static/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_ref(), b"body {}");

        let (status, _, _) = get(router, "/static/missing.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_path_is_a_404() {
        let (status, _, _) = get(app(), "/not-a-route").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
