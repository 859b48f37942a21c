//! File slicing with per-slice MD5 checksums, source validation and
//! transfer speed tracking.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::{SliceReader, calculate_file_md5, describe_file, md5_hex, slice_count};
pub use progress::SpeedCalculator;
pub use types::{Slice, SourceFile};
pub use validation::{validate_slice_size, validate_source_file};

/// Largest slice size accepted from the server: 1 GiB.
///
/// Each in-flight slice is held in memory whole.
pub const MAX_SLICE_SIZE: u64 = 1024 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid source file: {0}")]
    InvalidSource(String),

    #[error("invalid slice size: {0}")]
    InvalidSliceSize(u64),

    #[error("{file_size} bytes in {slice_size}-byte slices exceeds the slice number range")]
    TooManySlices { file_size: u64, slice_size: u64 },
}
