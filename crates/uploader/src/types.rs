//! Data types for the upload flow.

use std::fmt;

use panup_openapi::{Error as ApiError, resolve_upload_host};
use panup_protocol::{CreateFileResponse, DuplicatePolicy};

/// Key under which the direct link is exported by default.
pub const DEFAULT_OUTPUT_KEY: &str = "download_url";

/// Settings for one upload run.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory the file is uploaded into.
    pub parent_id: i64,
    /// Conflict policy for an existing file of the same name.
    pub duplicate: DuplicatePolicy,
    /// Maximum slices in flight. `1` sends strictly one after another.
    pub slice_concurrency: usize,
    /// Key the direct link is exported under.
    pub output_key: String,
}

impl UploadConfig {
    pub fn new(parent_id: i64) -> Self {
        Self {
            parent_id,
            duplicate: DuplicatePolicy::default(),
            slice_concurrency: 1,
            output_key: DEFAULT_OUTPUT_KEY.to_string(),
        }
    }
}

/// Outcome of upload negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Negotiation {
    /// The server already has identical content; no bytes need to move.
    Reused { file_id: i64 },
    /// The file must be sent in slices.
    PendingUpload(PendingUpload),
}

/// A sliced upload the server is waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub preupload_id: String,
    pub slice_size: u64,
    /// Validated base URL slices and completion are sent to.
    pub upload_host: String,
}

impl Negotiation {
    /// Interprets a create response.
    ///
    /// `fallback_host` is used when the response advertises no servers.
    pub fn from_response(
        resp: CreateFileResponse,
        fallback_host: &str,
    ) -> Result<Self, ApiError> {
        if resp.reuse {
            if resp.file_id <= 0 {
                return Err(ApiError::MissingField("fileID"));
            }
            return Ok(Negotiation::Reused {
                file_id: resp.file_id,
            });
        }

        if resp.preupload_id.is_empty() {
            return Err(ApiError::MissingField("preuploadID"));
        }
        if resp.slice_size == 0 {
            return Err(ApiError::MissingField("sliceSize"));
        }
        let upload_host = resolve_upload_host(&resp.servers, fallback_host)?;

        Ok(Negotiation::PendingUpload(PendingUpload {
            preupload_id: resp.preupload_id,
            slice_size: resp.slice_size,
            upload_host,
        }))
    }
}

/// Flow state transitions, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStage {
    Started,
    Authenticated,
    Negotiated,
    Reused,
    SlicesUploading,
    SlicesComplete,
    Finalized,
    LinkResolved,
}

impl fmt::Display for FlowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlowStage::Started => "started",
            FlowStage::Authenticated => "authenticated",
            FlowStage::Negotiated => "negotiated",
            FlowStage::Reused => "reused",
            FlowStage::SlicesUploading => "uploading slices",
            FlowStage::SlicesComplete => "slices complete",
            FlowStage::Finalized => "finalized",
            FlowStage::LinkResolved => "link resolved",
        };
        f.write_str(s)
    }
}

/// Progress event emitted during an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// The flow entered a new stage.
    Stage(FlowStage),
    /// A slice finished. `skipped` means the server already had it.
    SliceUploaded {
        number: u32,
        total: u32,
        bytes: u64,
        skipped: bool,
    },
    /// Overall progress in `0.0..=1.0`.
    Progress(f64),
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub file_id: i64,
    pub url: String,
    /// `true` when negotiation reused existing content.
    pub reused: bool,
    pub slices_sent: u32,
    pub slices_skipped: u32,
}
