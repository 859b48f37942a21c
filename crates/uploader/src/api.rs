//! Remote storage trait used by the flow.
//!
//! [`panup_openapi::Client`] implements it for real runs; tests substitute
//! an in-memory mock.

use std::future::Future;
use std::pin::Pin;

use panup_openapi::{Client, Error as ApiError, SliceOutcome};
use panup_protocol::{
    AccessToken, AccessTokenResponse, CreateFileRequest, CreateFileResponse, Credentials,
    DirectLinkResponse, SliceForm, UploadCompleteResponse,
};

/// Boxed future returned by [`StorageApi`] calls.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Abstract connection to the storage service.
pub trait StorageApi: Send + Sync {
    /// Exchanges credentials for an access token.
    fn access_token<'a>(&'a self, creds: &'a Credentials) -> ApiFuture<'a, AccessTokenResponse>;

    /// Registers the upload and returns the raw negotiation response.
    fn create_file<'a>(
        &'a self,
        token: &'a AccessToken,
        req: &'a CreateFileRequest,
    ) -> ApiFuture<'a, CreateFileResponse>;

    /// Sends one slice to `upload_host`.
    fn upload_slice<'a>(
        &'a self,
        token: &'a AccessToken,
        upload_host: &'a str,
        form: &'a SliceForm,
        data: Vec<u8>,
    ) -> ApiFuture<'a, SliceOutcome>;

    /// Finalizes a sliced upload.
    fn upload_complete<'a>(
        &'a self,
        token: &'a AccessToken,
        upload_host: &'a str,
        preupload_id: &'a str,
    ) -> ApiFuture<'a, UploadCompleteResponse>;

    /// Resolves the direct download URL of `file_id`.
    fn direct_link<'a>(
        &'a self,
        token: &'a AccessToken,
        file_id: i64,
    ) -> ApiFuture<'a, DirectLinkResponse>;

    /// API domain, used as the upload host when none is advertised.
    fn api_base(&self) -> &str;
}

impl StorageApi for Client {
    fn access_token<'a>(&'a self, creds: &'a Credentials) -> ApiFuture<'a, AccessTokenResponse> {
        Box::pin(Client::access_token(self, creds))
    }

    fn create_file<'a>(
        &'a self,
        token: &'a AccessToken,
        req: &'a CreateFileRequest,
    ) -> ApiFuture<'a, CreateFileResponse> {
        Box::pin(Client::create_file(self, token, req))
    }

    fn upload_slice<'a>(
        &'a self,
        token: &'a AccessToken,
        upload_host: &'a str,
        form: &'a SliceForm,
        data: Vec<u8>,
    ) -> ApiFuture<'a, SliceOutcome> {
        Box::pin(Client::upload_slice(self, token, upload_host, form, data))
    }

    fn upload_complete<'a>(
        &'a self,
        token: &'a AccessToken,
        upload_host: &'a str,
        preupload_id: &'a str,
    ) -> ApiFuture<'a, UploadCompleteResponse> {
        Box::pin(Client::upload_complete(self, token, upload_host, preupload_id))
    }

    fn direct_link<'a>(
        &'a self,
        token: &'a AccessToken,
        file_id: i64,
    ) -> ApiFuture<'a, DirectLinkResponse> {
        Box::pin(Client::direct_link(self, token, file_id))
    }

    fn api_base(&self) -> &str {
        self.base_url()
    }
}
