//! Registry services.

pub mod api_key_service;
pub mod extract_service;
pub mod identity_service;
pub mod name_validator;
pub mod package_service;
pub mod version_order;
