use std::path::PathBuf;

/// A slice of the source file, ready for transmission.
#[derive(Debug, Clone)]
pub struct Slice {
    /// 1-based sequence number.
    pub number: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Raw slice data.
    pub data: Vec<u8>,
    /// Lowercase hex MD5 of `data`.
    pub md5: String,
}

/// A validated local file with its whole-file content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Final path component, used as the remote filename.
    pub file_name: String,
    pub size: u64,
    /// Lowercase hex MD5 of the whole file.
    pub md5: String,
}
