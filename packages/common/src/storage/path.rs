use super::error::StorageError;

const MAX_PATH_LENGTH: usize = 512;

/// Validate a relative, slash-separated blob path such as `user_alice/movie.mp4`.
///
/// Rejects absolute paths, backslashes, control characters, and empty,
/// hidden (`.`-prefixed) or traversal segments.
pub fn validate_blob_path(path: &str) -> Result<&str, StorageError> {
    let invalid = |msg: &str| StorageError::InvalidPath(format!("{msg}: {path:?}"));

    if path.is_empty() {
        return Err(invalid("path is empty"));
    }
    if path.len() > MAX_PATH_LENGTH {
        return Err(invalid("path is too long"));
    }
    if path.starts_with('/') {
        return Err(invalid("path must be relative"));
    }
    if path.contains('\\') {
        return Err(invalid("backslashes are not allowed"));
    }
    if path.chars().any(|c| c.is_control()) {
        return Err(invalid("control characters are not allowed"));
    }
    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty path segment"));
        }
        if segment.starts_with('.') {
            return Err(invalid("hidden or traversal segment"));
        }
    }
    Ok(path)
}
