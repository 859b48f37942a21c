use std::path::Path;

use crate::{MAX_SLICE_SIZE, TransferError};

/// Checks that `path` names a readable regular file with a usable name.
///
/// Returns the file name (used as the remote filename) and the size.
///
/// Rejects:
/// - Missing paths
/// - Directories and other non-regular files
/// - Paths without a final component (`/`, `..`)
/// - File names that are not valid UTF-8
pub fn validate_source_file(path: &Path) -> Result<(String, u64), TransferError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TransferError::InvalidSource(format!(
                "file not found: {}",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_file() {
        return Err(TransferError::InvalidSource(format!(
            "not a regular file: {}",
            path.display()
        )));
    }

    let name = path.file_name().ok_or_else(|| {
        TransferError::InvalidSource(format!("path has no file name: {}", path.display()))
    })?;
    let name = name.to_str().ok_or_else(|| {
        TransferError::InvalidSource(format!(
            "file name is not valid UTF-8: {}",
            path.display()
        ))
    })?;

    Ok((name.to_string(), metadata.len()))
}

/// Rejects a zero slice size or one above [`MAX_SLICE_SIZE`].
pub fn validate_slice_size(slice_size: u64) -> Result<(), TransferError> {
    if slice_size == 0 || slice_size > MAX_SLICE_SIZE {
        return Err(TransferError::InvalidSliceSize(slice_size));
    }
    Ok(())
}
