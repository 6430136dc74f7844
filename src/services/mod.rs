pub mod content_store;
pub mod metadata;
pub mod sweeper;
