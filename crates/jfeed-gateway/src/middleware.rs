//! Redirect middleware in front of page routes.

use crate::error::ApiError;
use crate::server::AppState;
use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jfeed_core::RouteDecision;
use std::sync::Arc;
use tracing::debug;

/// Resolve the request path and either answer it here (redirect, 404) or pass
/// it on with the matched entity in the request extensions.
pub async fn resolve_redirects(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    let query = request.uri().query().map(str::to_owned);

    match state.api.resolve(&path, query.as_deref()).await {
        RouteDecision::Pass { entity } => {
            if let Some(entity) = entity {
                request.extensions_mut().insert(entity);
            }
            next.run(request).await
        }
        RouteDecision::Redirect {
            location,
            permanent,
        } => {
            let status = redirect_status(request.method(), permanent);
            debug!("{} {} -> {} {}", request.method(), path, status.as_u16(), location);
            (status, [(header::LOCATION, location)]).into_response()
        }
        RouteDecision::NotFound => ApiError::not_found(&path).into_response(),
    }
}

/// 301/302 for safe methods; 308/307 keep the method and body for the rest.
pub fn redirect_status(method: &Method, permanent: bool) -> StatusCode {
    let safe = method == Method::GET || method == Method::HEAD;
    match (safe, permanent) {
        (true, true) => StatusCode::MOVED_PERMANENTLY,
        (true, false) => StatusCode::FOUND,
        (false, true) => StatusCode::PERMANENT_REDIRECT,
        (false, false) => StatusCode::TEMPORARY_REDIRECT,
    }
}
