//! Persistent entities and manifest types.

pub mod api_key;
pub mod manifest;
pub mod package;
