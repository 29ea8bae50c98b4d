//! Package name validation.
//!
//! Pure lexical checks, applied in a fixed order so the first failing rule
//! determines the error message a publisher sees.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, Result};

/// Names rejected regardless of casing. Windows device names would collide
/// with on-disk staging directories and confuse downstream tooling.
const RESERVED_NAMES: &[&str] = &[
    "nul", "con", "prn", "aux", "clock$", "com1", "com2", "com3", "com4", "com5", "com6", "com7",
    "com8", "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Maximum accepted package name length.
const MAX_NAME_LENGTH: usize = 64;

fn name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_]*[a-z0-9]$").unwrap())
}

/// Validate a package name, returning the first failing rule as a
/// `Validation` error. Deterministic and side-effect free.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AppError::Validation("Package name cannot be empty".into()));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "Package name cannot contain white spaces".into(),
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "Package name cannot be longer than {} characters",
            MAX_NAME_LENGTH
        )));
    }
    if !name_pattern().is_match(name) {
        return Err(AppError::Validation(
            "Package name can only contain small letter alphanumeric characters and/or underscores"
                .into(),
        ));
    }
    if name.contains("--") || name.contains("__") {
        return Err(AppError::Validation(
            "Package name cannot contain double dashes or underscores".into(),
        ));
    }
    if RESERVED_NAMES.contains(&name.to_lowercase().as_str()) {
        return Err(AppError::Validation(format!(
            "Package name cannot use the reserved name {}",
            name
        )));
    }
    Ok(())
}
