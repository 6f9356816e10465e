use std::path::Path;

/// Longest accepted upload filename, in bytes.
const MAX_FILENAME_LENGTH: usize = 255;

/// Result of validating a flat filename.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename is longer than 255 bytes.
    TooLong,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename contains path traversal patterns (`..`).
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::TooLong => "Filename must be at most 255 bytes",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.len() > MAX_FILENAME_LENGTH {
        return Err(FilenameError::TooLong);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Reject ASCII control characters to prevent
    // HTTP header injection (e.g. CRLF in Content-Disposition).
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Extracts the filename stem (without extension) from a path.
pub fn extract_stem(path: &str) -> Option<(&str, &str)> {
    let filename = Path::new(path).file_name()?.to_str()?;
    let (stem, ext) = filename.rsplit_once('.')?;

    if stem.is_empty() {
        return None;
    }

    let stem_end = path.len() - ext.len() - 1; // -1 for the dot
    Some((&path[..stem_end], ext))
}

/// Storage namespace owned by a user.
pub fn user_namespace(username: &str) -> String {
    format!("user_{username}")
}

/// Blob path of a content file: `user_<username>/<filename>`.
pub fn derive_content_path(username: &str, filename: &str) -> String {
    format!("{}/{filename}", user_namespace(username))
}

/// Blob path of an attachment: the content path without its extension,
/// then `_<filename>`.
pub fn derive_attachment_path(content_path: &str, filename: &str) -> String {
    let base = extract_stem(content_path).map_or(content_path, |(stem, _)| stem);
    format!("{base}_{filename}")
}

/// Whether the last segment of a derived blob path still fits the
/// filename limit of the underlying store.
pub fn stored_name_fits(path: &str) -> bool {
    let name = path.rsplit_once('/').map_or(path, |(_, name)| name);
    name.len() <= MAX_FILENAME_LENGTH
}
