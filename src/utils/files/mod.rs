use crate::CoreError;
use crate::Result;
use std::path::{Path, PathBuf};

/// Copy `src` into `dir` under `file_name`, returning the destination path.
pub fn copy_into(src: &Path, dir: &Path, file_name: &str) -> Result<PathBuf> {
    let dest = dir.join(file_name);
    std::fs::copy(src, &dest).map_err(|e| {
        CoreError::io(
            format!("copying {} to {}", src.display(), dest.display()),
            e,
        )
    })?;
    Ok(dest)
}

/// Read a small optional text file, trimming whitespace. Missing or empty
/// files yield `None`.
pub fn read_optional_text(path: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(path).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Lowercase UTF-8 file stem, if the path has one.
pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
}
