use std::collections::HashSet;

use crate::error::{AppError, ValidationErrors};

/// Trim `name` and check it is 1..=`max` characters, recording a message
/// under `field` otherwise.
pub fn check_name(errors: &mut ValidationErrors, field: &str, name: &str, max: usize) -> String {
    let name = name.trim();
    if name.is_empty() {
        errors.add(field, "Name must not be empty");
    } else if name.chars().count() > max {
        errors.add(field, format!("Name must be at most {max} characters"));
    }
    name.to_string()
}

/// Single-field variant of [`check_name`].
pub fn validate_name(field: &str, name: &str, max: usize) -> Result<String, AppError> {
    let mut errors = ValidationErrors::new();
    let name = check_name(&mut errors, field, name, max);
    errors.into_result()?;
    Ok(name)
}

/// Reject duplicate ids in a reference list.
pub fn validate_unique_ids(ids: &[i32], field: &str) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for &id in ids {
        if !seen.insert(id) {
            return Err(AppError::invalid(field, format!("Duplicate id {id}")));
        }
    }
    Ok(())
}
