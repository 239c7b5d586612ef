//! Response hardening applied to every route, static files included.
//!
//! Mirrors the usual helmet defaults plus a content security policy that
//! admits Google fonts, Google sign-in scripts and the analysis webhook.
//! Dotfiles under the static roots are never served.

use axum::{
    extract::Request,
    http::{header, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

const FALLBACK_CSP: &str = "default-src 'self'";

/// Builds the `Content-Security-Policy` value. `connect_origin` is added to connect-src.
pub fn content_security_policy(connect_origin: &str) -> String {
    [
        "default-src 'self'".to_string(),
        "style-src 'self' 'unsafe-inline' https://fonts.googleapis.com".to_string(),
        "font-src 'self' https://fonts.gstatic.com".to_string(),
        "script-src 'self' 'unsafe-inline' https://accounts.google.com https://apis.google.com"
            .to_string(),
        "img-src 'self' data: https:".to_string(),
        format!("connect-src 'self' {connect_origin}"),
    ]
    .join("; ")
}

fn static_headers() -> [(HeaderName, HeaderValue); 6] {
    [
        (
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ),
        (header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN")),
        (header::REFERRER_POLICY, HeaderValue::from_static("no-referrer")),
        (
            header::X_DNS_PREFETCH_CONTROL,
            HeaderValue::from_static("off"),
        ),
        (
            HeaderName::from_static("cross-origin-opener-policy"),
            HeaderValue::from_static("same-origin"),
        ),
        (
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=15552000; includeSubDomains"),
        ),
    ]
}

/// Layers the security headers onto `router`, without overriding ones a handler already set.
pub fn harden<S>(router: Router<S>, connect_origin: &str) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let csp = HeaderValue::from_str(&content_security_policy(connect_origin))
        .unwrap_or_else(|_| HeaderValue::from_static(FALLBACK_CSP));

    static_headers()
        .into_iter()
        .fold(router, |router, (name, value)| {
            router.layer(SetResponseHeaderLayer::if_not_present(name, value))
        })
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            csp,
        ))
}

fn is_hidden_path(path: &str) -> bool {
    path.split('/').any(|segment| {
        let segment = segment.to_ascii_lowercase();
        segment.starts_with('.') || segment.starts_with("%2e")
    })
}

/// 404 for any path with a segment starting with `.` (`/.env`, `/.git/config`).
pub async fn hide_dotfiles(request: Request, next: Next) -> Response {
    if is_hidden_path(request.uri().path()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_paths() {
        assert!(is_hidden_path("/.env"));
        assert!(is_hidden_path("/.git/config"));
        assert!(is_hidden_path("/assets/.cache/app.js"));
        assert!(is_hidden_path("/%2Eenv"));
        assert!(!is_hidden_path("/"));
        assert!(!is_hidden_path("/scripts/main.js"));
        assert!(!is_hidden_path("/BRK.A"));
    }

    #[test]
    fn csp_includes_webhook_origin() {
        let csp = content_security_policy("https://hooks.example.com");
        assert!(csp.starts_with("default-src 'self'; "));
        assert!(csp.contains("connect-src 'self' https://hooks.example.com"));
        assert!(csp.contains("https://accounts.google.com"));
        assert!(HeaderValue::from_str(&csp).is_ok());
    }
}
