pub mod ingredient;
pub mod recipe;
pub mod user;

pub use ingredient::*;
pub use recipe::*;
pub use user::*;

use crate::error::FieldErrors;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";

pub(crate) fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

pub(crate) fn push(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}
