//! Wire types for the 123pan open platform API used by the uploader.

pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use envelope::{ApiFailure, ApiResponse};
pub use messages::{
    AccessTokenRequest, AccessTokenResponse, CreateFileRequest, CreateFileResponse,
    DirectLinkQuery, DirectLinkResponse, SliceForm, UploadCompleteRequest,
    UploadCompleteResponse,
};
pub use types::{AccessToken, Credentials, DuplicatePolicy, ParsePolicyError};
