//! Response encoders for the two API dialects.
//!
//! Uploads and deletes share one code path in the store; only the shape of
//! the answer differs. [`Dialect::detect`] picks the shape.

use crate::{
    errors::AppError,
    models::{
        lutim::{LutimDeleteReply, LutimUploadMessage, LutimUploadReply},
        stored_object::StoredObject,
    },
    services::content_store::StoreError,
};
use axum::{
    Json,
    body::Body,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};

pub const DELETION_TOKEN_HEADER: &str = "x-deletion-token";
pub const X_ACCEL_REDIRECT_HEADER: &str = "x-accel-redirect";

/// Which API flavour an upload request speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Redirect to the object, token in a response header.
    Rest,
    /// Lutim-compatible JSON envelope.
    Lutim,
}

impl Dialect {
    /// Lutim clients either ask for `format=json` or send a `delete-day`.
    pub fn detect(format: Option<&str>, delete_day: Option<&str>) -> Self {
        let wants_json = format.is_some_and(|f| f.trim() == "json");
        let has_lifetime = delete_day.is_some_and(|d| !d.trim().is_empty());
        if wants_json || has_lifetime {
            Dialect::Lutim
        } else {
            Dialect::Rest
        }
    }
}

pub fn upload_reply(
    dialect: Dialect,
    stored: &StoredObject,
    original_filename: &str,
) -> Result<Response, AppError> {
    match dialect {
        Dialect::Rest => rest_upload(stored),
        Dialect::Lutim => Ok(lutim_upload(stored, original_filename)),
    }
}

/// `302` to the object with the deletion token (and expiry) in headers.
fn rest_upload(stored: &StoredObject) -> Result<Response, AppError> {
    let mut builder = Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, format!("/{}", stored.identifier))
        .header(DELETION_TOKEN_HEADER, stored.deletion_token.to_hex());
    if let Some(expires_at) = stored.expires_at {
        builder = builder.header(header::EXPIRES, http_date(expires_at));
    }
    builder
        .body(Body::empty())
        .map_err(|e| AppError::internal(e.to_string()))
}

fn lutim_upload(stored: &StoredObject, original_filename: &str) -> Response {
    let short = stored.identifier.to_string();
    let reply = LutimUploadReply {
        success: true,
        msg: LutimUploadMessage {
            real_short: short.clone(),
            short,
            token: stored.deletion_token.to_hex(),
            thumb: String::new(),
            filename: original_filename.to_string(),
            created_at: stored.created_at.timestamp(),
            del_at_view: false,
            ext: format!(".{}", stored.identifier.extension()),
            limit: stored.lifetime_days,
        },
    };
    (StatusCode::OK, Json(reply)).into_response()
}

/// Lutim delete answers JSON whatever happened; the status follows the outcome.
pub fn lutim_delete(outcome: Result<(), StoreError>) -> Response {
    match outcome {
        Ok(()) => (
            StatusCode::OK,
            Json(LutimDeleteReply {
                success: true,
                msg: "file deleted".into(),
            }),
        )
            .into_response(),
        Err(StoreError::Io(err)) => {
            tracing::error!(error = %err, "lutim delete failed");
            lutim_failure(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
        Err(err) => lutim_failure(StatusCode::BAD_REQUEST, err.to_string()),
    }
}

/// `{success: false, msg}` envelope for any failed Lutim request.
pub fn lutim_failure(status: StatusCode, msg: impl Into<String>) -> Response {
    let reply = LutimDeleteReply {
        success: false,
        msg: msg.into(),
    };
    (status, Json(reply)).into_response()
}

/// IMF-fixdate, as used by the `Expires` header.
pub fn http_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn plain_upload_is_rest() {
        assert_eq!(Dialect::detect(None, None), Dialect::Rest);
        assert_eq!(Dialect::detect(Some(""), Some("")), Dialect::Rest);
        assert_eq!(Dialect::detect(Some("html"), Some("  ")), Dialect::Rest);
    }

    #[test]
    fn json_format_or_lifetime_selects_lutim() {
        assert_eq!(Dialect::detect(Some("json"), None), Dialect::Lutim);
        assert_eq!(Dialect::detect(None, Some("3")), Dialect::Lutim);
        assert_eq!(Dialect::detect(Some("xml"), Some("garbage")), Dialect::Lutim);
    }

    #[test]
    fn http_date_is_imf_fixdate() {
        let at = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(at), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn failed_lutim_delete_is_bad_request() {
        let response = lutim_delete(Err(StoreError::NotFound));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = lutim_delete(Ok(()));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn lutim_failure_keeps_status() {
        let response = lutim_failure(StatusCode::INTERNAL_SERVER_ERROR, "storage failure");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
