use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use crate::types::{Slice, SourceFile};
use crate::{TransferError, validate_slice_size, validate_source_file};

// ---------------------------------------------------------------------------
// Checksum helpers
// ---------------------------------------------------------------------------

/// Computes MD5 of `data` and returns the lowercase hex digest.
pub fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes MD5 of an entire file and returns the lowercase hex digest.
pub fn calculate_file_md5(path: &Path) -> Result<String, TransferError> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Md5::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Validates `path` and hashes its contents.
///
/// Blocking; callers on an async runtime should run it in `spawn_blocking`.
pub fn describe_file(path: &Path) -> Result<SourceFile, TransferError> {
    let (file_name, size) = validate_source_file(path)?;
    let md5 = calculate_file_md5(path)?;
    Ok(SourceFile {
        path: path.to_path_buf(),
        file_name,
        size,
        md5,
    })
}

/// Number of slices covering a file of `file_size` bytes.
///
/// An empty file has no slices. Fails when slice numbers would not fit a
/// `u32`.
pub fn slice_count(file_size: u64, slice_size: u64) -> Result<u32, TransferError> {
    validate_slice_size(slice_size)?;
    u32::try_from(file_size.div_ceil(slice_size)).map_err(|_| TransferError::TooManySlices {
        file_size,
        slice_size,
    })
}

// ---------------------------------------------------------------------------
// SliceReader
// ---------------------------------------------------------------------------

/// Reads a file in fixed-size slices, numbering them from 1 and hashing each.
///
/// Only the slice being returned is held in memory.
pub struct SliceReader {
    file: std::fs::File,
    slice_size: usize,
    offset: u64,
    read: u64,
}

impl SliceReader {
    /// Opens `path` for sliced reading.
    pub fn new(path: &Path, slice_size: u64) -> Result<Self, TransferError> {
        validate_slice_size(slice_size)?;
        let file = std::fs::File::open(path)?;
        Ok(Self {
            file,
            slice_size: slice_size as usize,
            offset: 0,
            read: 0,
        })
    }

    /// Reads the next slice. Returns `None` at EOF.
    ///
    /// Short reads are retried until the slice is full or the file ends, so
    /// only the final slice can be shorter than the slice size.
    pub fn next_slice(&mut self) -> Result<Option<Slice>, TransferError> {
        let mut buf = vec![0u8; self.slice_size];
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            return Ok(None);
        }
        buf.truncate(filled);

        let number = u32::try_from(self.read + 1).map_err(|_| TransferError::TooManySlices {
            file_size: self.offset + filled as u64,
            slice_size: self.slice_size as u64,
        })?;
        let slice = Slice {
            number,
            offset: self.offset,
            md5: md5_hex(&buf),
            data: buf,
        };
        self.offset += filled as u64;
        self.read += 1;
        Ok(Some(slice))
    }
}
