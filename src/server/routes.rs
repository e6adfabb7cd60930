use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub const BANNER: &str = "Radar Alert Sender is LIVE 🚀";

const ALLOWED_METHODS: &str = "GET, HEAD, OPTIONS, POST";

const NOT_FOUND_PAGE: &str = "<!doctype html>\n<title>404 Not Found</title>\n<h1>Not Found</h1>\n\
<p>The requested URL was not found on the server.</p>\n";

pub fn router() -> Router {
    Router::new()
        .route(
            "/",
            get(index)
                .post(index)
                .options(allowed_methods)
                .fallback(method_not_allowed),
        )
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

// Request body and query string are ignored.
async fn index(method: Method) -> Html<&'static str> {
    tracing::debug!("Liveness banner requested via {}", method);
    Html(BANNER)
}

async fn allowed_methods() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
    )
}

async fn method_not_allowed(method: Method) -> Response {
    tracing::warn!("Rejected {} on /", method);
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, HeaderValue::from_static(ALLOWED_METHODS))],
        Html("<!doctype html>\n<title>405 Method Not Allowed</title>\n<h1>Method Not Allowed</h1>\n"),
    )
        .into_response()
}

async fn not_found() -> (StatusCode, Html<&'static str>) {
    (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE))
}
