//! Async client for the 123pan open platform.
//!
//! Covers the five calls the uploader needs: access token, file create,
//! slice upload, upload complete and direct link. Slice and complete calls
//! go to the upload host picked by [`resolve_upload_host`], the rest to the
//! API domain.

pub mod client;
pub mod endpoint;

pub use client::{Client, ClientConfig, Error, SliceOutcome};
pub use endpoint::resolve_upload_host;
