//! Viewer-context resolution.
//!
//! All read endpoints are public. A pre-shared key (constant-time compared to
//! mitigate timing attacks) marks a trusted caller; only then is the viewer
//! id header honored, which enables the seen/unseen filter dimension. Session
//! management proper lives outside this service.

use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Header name for the authenticated viewer id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// An authenticated viewer, as resolved from trusted request headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: i64,
}

/// Middleware resolving the viewer, if any, into a request extension.
///
/// Never rejects a request: an absent or invalid key simply yields no viewer,
/// and status filters are then silently ignored downstream.
pub async fn viewer_context_layer(
    expected_psk: Option<String>,
    mut request: Request,
    next: Next,
) -> Response {
    let viewer = resolve_viewer(expected_psk.as_deref(), request.headers());
    request.extensions_mut().insert(viewer);
    next.run(request).await
}

fn resolve_viewer(expected_psk: Option<&str>, headers: &HeaderMap) -> Option<Viewer> {
    let expected = expected_psk?;
    let provided = headers.get(API_KEY_HEADER)?.to_str().ok()?;
    if !constant_time_compare(provided, expected) {
        return None;
    }
    let user_id = headers.get(USER_ID_HEADER)?.to_str().ok()?.parse().ok()?;
    Some(Viewer { user_id })
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
