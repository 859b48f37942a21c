//! Upload flow for the 123pan open platform.
//!
//! This crate holds the **business logic** of a release upload. It has no
//! CLI or environment dependencies: the binary supplies a [`StorageApi`]
//! (normally [`panup_openapi::Client`]) and an [`OutputSink`].
//!
//! # Pipeline
//!
//! 1. **Hash** the local file (MD5, on a blocking thread)
//! 2. **Authenticate** with client credentials
//! 3. **Negotiate**: the server either reuses identical content or asks
//!    for slices
//! 4. **Upload** slices in order, skipping ones the server already has
//! 5. **Finalize** the sliced upload and **resolve** the direct link
//!
//! Any failure ends the run. Only duplicate-slice responses are recovered.

pub mod api;
pub mod error;
pub mod flow;
pub mod output;
pub mod types;

// Re-export primary types for convenience.
pub use api::{ApiFuture, StorageApi};
pub use error::UploadError;
pub use flow::UploadFlow;
pub use output::{GithubOutput, MemorySink, NullSink, OutputSink};
pub use types::{
    DEFAULT_OUTPUT_KEY, FlowStage, Negotiation, PendingUpload, UploadConfig, UploadEvent,
    UploadOutcome,
};
