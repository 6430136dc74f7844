//! Core data models for the image host.
//!
//! Identifiers and tokens are validated newtypes; the Lutim structs describe
//! the JSON the compatibility dialect puts on the wire.

pub mod identifier;
pub mod lutim;
pub mod stored_object;
