//! Defines the routes of the image host.
//!
//! ## Structure
//! - `GET    /`                        — usage text
//! - `POST   /`                        — upload (REST or Lutim reply)
//! - `GET    /infos`                   — Lutim server capabilities
//! - `GET    /d/{identifier}/{token}`  — Lutim delete-by-link
//! - `GET    /{identifier}`            — fetch (or `X-Accel-Redirect`)
//! - `DELETE /{identifier}`            — REST delete, token in `X-Deletion-Token`
//!
//! Unknown paths answer `404`, known paths with another verb `405`.

use crate::{
    errors::AppError,
    handlers::{
        lutim_handlers::{delete_link, infos},
        object_handlers::{delete, fetch, upload, usage},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::get,
};
use tower_http::trace::TraceLayer;

/// Room for boundaries, part headers and the small text fields of an upload.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

/// Build the router, with the upload size limit taken from the config.
pub fn routes(state: AppState) -> Router {
    // The file itself is capped in the upload handler; this only bounds the framing.
    let body_limit = state.config.max_file_size.saturating_add(MULTIPART_OVERHEAD);
    let body_limit = usize::try_from(body_limit).unwrap_or(usize::MAX);

    Router::new()
        .route("/", get(usage).post(upload))
        .route("/infos", get(infos))
        .route("/d/{identifier}/{token}", get(delete_link))
        .route("/{identifier}", get(fetch).delete(delete))
        .fallback(|| async { AppError::not_found("not found") })
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
