use std::borrow::Cow;
use std::collections::HashSet;

use uuid::Uuid;
use validator::ValidationError;

pub const MAX_NAME_LENGTH: u64 = 100;

pub(crate) fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// ID lists behave like ordered sets
#[allow(clippy::ptr_arg)]
pub fn unique_ids(ids: &Vec<Uuid>) -> Result<(), ValidationError> {
    match first_duplicate(ids) {
        Some(dup) => Err(error(
            "duplicate_ids",
            format!("ID list contains duplicate {dup}"),
        )),
        None => Ok(()),
    }
}

pub fn first_duplicate(ids: &[Uuid]) -> Option<Uuid> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().find(|id| !seen.insert(**id)).copied()
}

pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "Value must not be blank"));
    }
    Ok(())
}
