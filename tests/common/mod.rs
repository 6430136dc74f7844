#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, header},
};
use imgdrop::{config::AppConfig, routes::routes::routes, services::content_store::ContentStore, state::AppState};
use std::path::Path;
use tempfile::TempDir;

pub const BOUNDARY: &str = "imgdrop-test-boundary";

/// Storage root under cargo's target dir, which supports user xattrs
/// (unlike some tmpfs mounts).
pub fn storage_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("imgdrop-")
        .tempdir_in(env!("CARGO_TARGET_TMPDIR"))
        .expect("create storage dir")
}

pub fn test_config(dir: &Path) -> AppConfig {
    AppConfig {
        storage_dir: dir.to_string_lossy().into_owned(),
        default_lifetime_days: 0,
        ..AppConfig::default()
    }
}

pub fn build_app(config: AppConfig) -> Router {
    let store = ContentStore::new(config.storage_dir.clone(), config.max_lifetime_days);
    routes(AppState::new(store, config))
}

/// Names of everything in `dir`, sorted.
pub fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read storage dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Hand-rolled multipart/form-data body.
#[derive(Default)]
pub struct Form {
    body: Vec<u8>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, name: &str, filename: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
        self
    }

    pub fn into_request(mut self) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri("/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("DELETE").uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-Deletion-Token", token);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
