//! imgdrop — a minimal image-hosting daemon.
//!
//! Uploads are stored under a content-derived identifier and come back with
//! a secret deletion token. Objects may expire; a background sweeper purges
//! them. A subset of the Lutim API is emulated for existing clients.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
