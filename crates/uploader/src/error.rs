//! Upload error types.

use panup_openapi::Error as ApiError;

/// Errors produced by the upload flow.
///
/// Each remote stage wraps the client error that stopped it, so the HTTP
/// status or API message stays available to the caller.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("authentication failed: {0}")]
    Auth(#[source] ApiError),

    #[error("upload negotiation failed: {0}")]
    Negotiation(#[source] ApiError),

    #[error("slice {slice_no} upload failed: {source}")]
    SliceUpload { slice_no: u32, source: ApiError },

    #[error("upload completion failed: {0}")]
    Completion(#[source] ApiError),

    #[error("direct link resolution failed: {0}")]
    LinkResolution(#[source] ApiError),

    #[error("transfer error: {0}")]
    Transfer(#[from] panup_transfer::TransferError),

    /// The link was resolved but could not be exported.
    #[error("failed to export {url}: {source}")]
    Output { url: String, source: std::io::Error },

    #[error("cancelled")]
    Cancelled,

    #[error("task join error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl UploadError {
    /// The client error behind a failed remote stage, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            UploadError::Auth(e)
            | UploadError::Negotiation(e)
            | UploadError::Completion(e)
            | UploadError::LinkResolution(e)
            | UploadError::SliceUpload { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_error_names_the_slice() {
        let err = UploadError::SliceUpload {
            slice_no: 7,
            source: ApiError::Api {
                code: 1,
                message: "md5 mismatch".into(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("slice 7"));
        assert!(msg.contains("md5 mismatch"));
        assert_eq!(err.api_error().and_then(ApiError::api_code), Some(1));
    }

    #[test]
    fn local_errors_have_no_api_error() {
        assert!(UploadError::Cancelled.api_error().is_none());
    }
}
