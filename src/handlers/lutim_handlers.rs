//! Lutim-compatible endpoints that have no REST counterpart.

use crate::{
    errors::AppError,
    handlers::replies,
    models::{
        identifier::{DeletionToken, Identifier},
        lutim::LutimInfo,
    },
    services::content_store::StoreError,
    state::AppState,
};
use axum::{
    Json,
    extract::{Path, State},
    response::Response,
};

/// `GET /d/{identifier}/{token}` — delete-by-link.
///
/// A link whose parts do not have the right shape is not a delete link at
/// all and gets a plain 404. Otherwise the answer is a JSON envelope, 200 on
/// success and 400 when the object is gone or the token is wrong.
pub async fn delete_link(
    State(state): State<AppState>,
    Path((name, token)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let identifier = Identifier::parse(&name).ok_or(StoreError::InvalidIdentifier)?;
    if DeletionToken::parse_hex(&token).is_none() {
        return Err(AppError::not_found("not found"));
    }

    let outcome = state.store.delete(&identifier, &token).await;
    Ok(replies::lutim_delete(outcome))
}

/// `GET /infos` — server capabilities, as Lutim clients expect them.
pub async fn infos(State(state): State<AppState>) -> Json<LutimInfo> {
    let cfg = &state.config;
    Json(LutimInfo {
        always_encrypt: false,
        broadcast_message: cfg.motd.clone(),
        contact: cfg.contact.clone(),
        default_delay: cfg.default_lifetime_days,
        image_magick: false,
        max_delay: cfg.max_lifetime_days,
        max_file_size: cfg.max_file_size,
    })
}
