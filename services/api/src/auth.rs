use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::error::ApiError;
use crate::state::SharedState;

/// Reject requests without valid `Authorization: Basic` credentials.
pub async fn require_basic_auth(
    State(state): State<SharedState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let Some(header) = header else {
        return Err(ApiError::unauthorized("Authentication credentials were not provided."));
    };
    match parse_basic(header) {
        Some((user, pass)) if state.credentials.matches(&user, &pass) => Ok(next.run(req).await),
        _ => {
            debug!(path = %req.uri().path(), "rejected credentials");
            Err(ApiError::unauthorized("Invalid username/password."))
        }
    }
}

/// `Basic base64(user:pass)` → `(user, pass)`
fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, pass) = decoded.split_once(':')?;
    Some((user.to_string(), pass.to_string()))
}
