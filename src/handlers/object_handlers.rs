//! HTTP handlers for uploading, fetching and deleting images.
//! Upload bodies are streamed straight into a staging file; storage concerns
//! are delegated to `ContentStore`.

use crate::{
    errors::AppError,
    handlers::replies::{self, DELETION_TOKEN_HEADER, Dialect, X_ACCEL_REDIRECT_HEADER},
    models::identifier::Identifier,
    services::content_store::{ContentStore, PendingUpload, StoreError},
    state::AppState,
};
use axum::{
    body::Body,
    extract::{
        Multipart, Path, Request, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

const FILE_FIELD: &str = "file";
const FORMAT_FIELD: &str = "format";
const LIFETIME_FIELD: &str = "delete-day";

/// Fields of an upload form we care about.
#[derive(Default)]
struct UploadForm {
    file: Option<(PendingUpload, String)>,
    format: Option<String>,
    delete_day: Option<String>,
}

/// `POST /` — store the `file` part and answer in the detected dialect.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(|rej| AppError::bad_request(rej.body_text()))?;
    let form = read_upload_form(&state.store, &mut multipart, state.config.max_file_size).await?;

    let Some((pending, filename)) = form.file else {
        return Err(AppError::bad_request("missing `file` part"));
    };

    let dialect = Dialect::detect(form.format.as_deref(), form.delete_day.as_deref());
    let lifetime_days = state.config.effective_lifetime(form.delete_day.as_deref());
    let stored = match state.store.commit(pending, &filename, lifetime_days).await {
        Ok(stored) => stored,
        Err(err) => {
            let err = AppError::from(err);
            return Ok(match dialect {
                Dialect::Rest => err.into_response(),
                Dialect::Lutim => replies::lutim_failure(err.status, err.message),
            });
        }
    };

    replies::upload_reply(dialect, &stored, &filename)
}

/// Walk the multipart body. The file part is streamed into the store as it
/// arrives; the other fields may come before or after it.
///
/// `max_file_size` caps the file bytes alone; the body limit on the router
/// leaves room for multipart framing and the other fields.
async fn read_upload_form(
    store: &ContentStore,
    multipart: &mut Multipart,
    max_file_size: u64,
) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            // A `file` field without a filename is a plain text field, not an upload.
            FILE_FIELD if form.file.is_none() && field.file_name().is_some() => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let mut pending = store.begin_upload().await?;
                while let Some(chunk) = field.chunk().await.map_err(malformed)? {
                    if pending.size_bytes() + chunk.len() as u64 > max_file_size {
                        return Err(AppError::bad_request(format!(
                            "file exceeds {} bytes",
                            max_file_size
                        )));
                    }
                    pending.write_chunk(&chunk).await?;
                }
                form.file = Some((pending, filename));
            }
            FORMAT_FIELD => form.format = Some(field.text().await.map_err(malformed)?),
            LIFETIME_FIELD => form.delete_day = Some(field.text().await.map_err(malformed)?),
            _ => {}
        }
    }

    Ok(form)
}

/// Oversized bodies surface here too; both are client errors.
fn malformed(err: MultipartError) -> AppError {
    AppError::bad_request(err.body_text())
}

/// `GET /{identifier}` — serve the image, or hand it to the front proxy.
pub async fn fetch(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Request,
) -> Result<Response, AppError> {
    let identifier = Identifier::parse(&name).ok_or(StoreError::InvalidIdentifier)?;

    if let Some(prefix) = state.config.x_accel_prefix.as_deref() {
        let target = HeaderValue::from_str(&format!("{}/{}", prefix, identifier))
            .map_err(|e| AppError::internal(e.to_string()))?;
        let mut response = StatusCode::NO_CONTENT.into_response();
        response
            .headers_mut()
            .insert(X_ACCEL_REDIRECT_HEADER, target);
        return Ok(response);
    }

    if !state.store.is_committed(&identifier).await? {
        return Err(AppError::not_found("not found"));
    }

    let response = match ServeFile::new(state.store.object_path(&identifier))
        .oneshot(request)
        .await
    {
        Ok(response) => response,
        Err(never) => match never {},
    };
    Ok(response.map(Body::new))
}

/// `DELETE /{identifier}` — token in `X-Deletion-Token`. `204`, or a bare
/// `404` whatever the reason the delete was refused.
pub async fn delete(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let Some(identifier) = Identifier::parse(&name) else {
        return Ok(StatusCode::NOT_FOUND);
    };
    let token = headers
        .get(DELETION_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    match state.store.delete(&identifier, token).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(StoreError::NotFound | StoreError::InvalidIdentifier) => Ok(StatusCode::NOT_FOUND),
        Err(err) => Err(err.into()),
    }
}

/// `GET /` — plain-text usage.
pub async fn usage() -> &'static str {
    USAGE
}

const USAGE: &str = r#"
imgdrop - dead simple image hosting

Upload:
  $ curl -v -F file=@image.png [ -F delete-day=<lifetime in days> ] /
    Returns a 302 redirect to the image, with an X-Deletion-Token header.

  or (Lutim compatibility):
  $ curl -v -F file=@image.png -F format=json [ -F delete-day=<lifetime in days> ] /
    Returns a JSON reply which includes the deletion token.

Delete an image:
  $ curl -v -X DELETE -H 'X-Deletion-Token: <token>' /<image>

  or (Lutim compatibility):
  $ curl -v /d/<image>/<token>

Server settings:
  GET /infos
"#;
