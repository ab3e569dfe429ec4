use crate::error::StorageError;

/// Checks if a path string contains path traversal patterns.
pub fn contains_path_traversal(path: &str) -> bool {
    path == ".."
        || path.starts_with("../")
        || path.contains("/../")
        || path.ends_with("/..")
}

/// Validates and normalizes an object path.
///
/// Object paths are flat virtual paths (`dir/name.ext`) relative to the
/// disk root. Backends call this before touching the underlying store, so a
/// hostile path can never escape the base directory.
pub fn validate_object_path(path: &str) -> Result<String, StorageError> {
    let trimmed = path.trim();

    if trimmed.is_empty() {
        return Err(StorageError::InvalidPath("path cannot be empty".into()));
    }

    if trimmed.len() > 512 {
        return Err(StorageError::InvalidPath(
            "path exceeds maximum length of 512 characters".into(),
        ));
    }

    if trimmed.contains('\0') {
        return Err(StorageError::InvalidPath(
            "path must not contain null bytes".into(),
        ));
    }

    if trimmed.contains('\\') {
        return Err(StorageError::InvalidPath(
            "path must not contain backslashes".into(),
        ));
    }

    if trimmed.starts_with('/') {
        return Err(StorageError::InvalidPath(
            "path must not start with '/'".into(),
        ));
    }

    if trimmed.ends_with('/') {
        return Err(StorageError::InvalidPath(
            "path must not end with '/'".into(),
        ));
    }

    if trimmed.contains("//") {
        return Err(StorageError::InvalidPath(
            "path must not contain consecutive slashes".into(),
        ));
    }

    if contains_path_traversal(trimmed) {
        return Err(StorageError::InvalidPath(
            "path must not contain '..' traversal".into(),
        ));
    }

    for segment in trimmed.split('/') {
        if segment.starts_with('.') {
            return Err(StorageError::InvalidPath(
                "path segments must not start with '.'".into(),
            ));
        }
    }

    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '-' | '_' | '.'))
    {
        return Err(StorageError::InvalidPath(
            "path contains invalid characters (allowed: a-zA-Z0-9, /, -, _, .)".into(),
        ));
    }

    Ok(trimmed.to_string())
}
