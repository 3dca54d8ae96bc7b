//! Data models for the ArtFestLive festival.
//!
//! Each stored collection has a wire/record type here. Records are kept in the store without
//! their id; the `from_record` constructors attach the key and apply field defaults in one place.

mod event;
mod gallery;
mod unit;
mod venue;

pub use event::*;
pub use gallery::*;
pub use unit::*;
pub use venue::*;

/// Trim a required text field, failing with a validation error naming the field.
pub(crate) fn required(value: &str, field: &str) -> Result<String, crate::errors::AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(crate::errors::AppError::Validation(format!(
            "{} is required",
            field
        )));
    }
    Ok(trimmed.to_string())
}
