//! 123pan open platform client.
//!
//! Async HTTP client using `reqwest`. Every request carries the `Platform`
//! header; authenticated calls add the Bearer token per request.

use std::time::Duration;

use panup_protocol::constants::{
    API_DOMAIN, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT, DUPLICATE_SLICE_MESSAGE,
    FORM_SLICE, HEADER_PLATFORM, PATH_ACCESS_TOKEN, PATH_DIRECT_LINK, PATH_FILE_CREATE,
    PATH_FILE_SLICE, PATH_UPLOAD_COMPLETE, PLATFORM,
};
use panup_protocol::{
    AccessToken, AccessTokenRequest, AccessTokenResponse, ApiResponse, CreateFileRequest,
    CreateFileResponse, Credentials, DirectLinkQuery, DirectLinkResponse, SliceForm,
    UploadCompleteRequest, UploadCompleteResponse,
};
use reqwest::RequestBuilder;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Longest HTTP error body kept in [`Error::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Errors from the open API client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid access token")]
    InvalidToken,

    #[error("response is missing {0}")]
    MissingField(&'static str),

    #[error("no usable upload host in: {0}")]
    InvalidUploadHost(String),
}

impl Error {
    /// Returns `true` for the "slice already uploaded" API error.
    pub fn is_duplicate_slice(&self) -> bool {
        matches!(self, Error::Api { message, .. } if message == DUPLICATE_SLICE_MESSAGE)
    }

    /// HTTP status of a non-success response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// API `code` of a failed response, if that is what failed.
    pub fn api_code(&self) -> Option<i64> {
        match self {
            Error::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Result of a single slice upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// The server stored the slice.
    Accepted,
    /// The server already had the slice; nothing was stored.
    AlreadyUploaded,
}

/// Connection settings for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API domain, e.g. `https://open-api.123pan.com`.
    pub base_url: String,
    /// Whole-request timeout, including the slice body upload.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: API_DOMAIN.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Open API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(HEADER_PLATFORM),
            HeaderValue::from_static(PLATFORM),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// API domain this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a request and decodes the response envelope.
    ///
    /// A non-2xx status whose body is still a failed envelope is reported as
    /// [`Error::Api`], so callers see the API message either way.
    async fn execute(&self, request: RequestBuilder) -> Result<ApiResponse, Error> {
        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            if let Ok(envelope) = serde_json::from_slice::<ApiResponse>(&body)
                && let Some(failure) = envelope.failure()
            {
                return Err(Error::Api {
                    code: failure.code,
                    message: failure.message,
                });
            }
            let mut text = String::from_utf8_lossy(&body).into_owned();
            if text.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !text.is_char_boundary(end) {
                    end -= 1;
                }
                text.truncate(end);
            }
            return Err(Error::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }

    /// Sends a request and returns the decoded `data` of a successful response.
    async fn call<T: for<'de> serde::Deserialize<'de>>(
        &self,
        request: RequestBuilder,
        what: &'static str,
    ) -> Result<T, Error> {
        let envelope = self.execute(request).await?;
        check(&envelope)?;
        envelope.parse_data::<T>()?.ok_or(Error::MissingField(what))
    }

    /// Exchanges client credentials for an access token.
    pub async fn access_token(&self, creds: &Credentials) -> Result<AccessTokenResponse, Error> {
        let url = format!("{}{}", self.base_url, PATH_ACCESS_TOKEN);
        debug!(%url, client_id = %creds.client_id, "requesting access token");
        let body = AccessTokenRequest::from(creds);
        let data: AccessTokenResponse = self
            .call(self.http.post(&url).json(&body), "access token data")
            .await?;
        if data.access_token.is_empty() {
            return Err(Error::MissingField("accessToken"));
        }
        Ok(data)
    }

    /// Registers an upload and learns whether it can be reused or must be sliced.
    pub async fn create_file(
        &self,
        token: &AccessToken,
        req: &CreateFileRequest,
    ) -> Result<CreateFileResponse, Error> {
        let url = format!("{}{}", self.base_url, PATH_FILE_CREATE);
        debug!(%url, filename = %req.filename, size = req.size, etag = %req.etag, "creating file");
        self.call(
            self.http
                .post(&url)
                .header(AUTHORIZATION, auth_header(token)?)
                .json(req),
            "create data",
        )
        .await
    }

    /// Uploads one slice to `upload_host` as multipart form data.
    ///
    /// A duplicate-slice response is returned as
    /// [`SliceOutcome::AlreadyUploaded`] rather than an error.
    pub async fn upload_slice(
        &self,
        token: &AccessToken,
        upload_host: &str,
        form: &SliceForm,
        data: Vec<u8>,
    ) -> Result<SliceOutcome, Error> {
        let url = format!("{}{}", upload_host.trim_end_matches('/'), PATH_FILE_SLICE);
        let len = data.len();

        let mut multipart = Form::new();
        for (name, value) in form.fields() {
            multipart = multipart.text(name, value);
        }
        let part = Part::bytes(data)
            .file_name(form.part_file_name())
            .mime_str("application/octet-stream")?;
        multipart = multipart.part(FORM_SLICE, part);

        debug!(%url, slice_no = form.slice_no, bytes = len, "uploading slice");
        let result = self
            .execute(
                self.http
                    .post(&url)
                    .header(AUTHORIZATION, auth_header(token)?)
                    .multipart(multipart),
            )
            .await
            .and_then(|envelope| check(&envelope));

        match result {
            Ok(()) => Ok(SliceOutcome::Accepted),
            Err(e) if e.is_duplicate_slice() => Ok(SliceOutcome::AlreadyUploaded),
            Err(e) => Err(e),
        }
    }

    /// Finalizes a sliced upload on `upload_host`.
    pub async fn upload_complete(
        &self,
        token: &AccessToken,
        upload_host: &str,
        preupload_id: &str,
    ) -> Result<UploadCompleteResponse, Error> {
        let url = format!(
            "{}{}",
            upload_host.trim_end_matches('/'),
            PATH_UPLOAD_COMPLETE
        );
        debug!(%url, preupload_id, "completing upload");
        let body = UploadCompleteRequest {
            preupload_id: preupload_id.to_string(),
        };
        self.call(
            self.http
                .post(&url)
                .header(AUTHORIZATION, auth_header(token)?)
                .json(&body),
            "upload complete data",
        )
        .await
    }

    /// Resolves the direct download URL of a file.
    pub async fn direct_link(
        &self,
        token: &AccessToken,
        file_id: i64,
    ) -> Result<DirectLinkResponse, Error> {
        let url = format!("{}{}", self.base_url, PATH_DIRECT_LINK);
        debug!(%url, file_id, "resolving direct link");
        let query = DirectLinkQuery { file_id };
        let data: DirectLinkResponse = self
            .call(
                self.http
                    .get(&url)
                    .header(AUTHORIZATION, auth_header(token)?)
                    .query(&query),
                "direct link data",
            )
            .await?;
        if data.url.is_empty() {
            return Err(Error::MissingField("url"));
        }
        Ok(data)
    }
}

/// Converts a failed envelope into [`Error::Api`].
fn check(envelope: &ApiResponse) -> Result<(), Error> {
    match envelope.failure() {
        Some(failure) => Err(Error::Api {
            code: failure.code,
            message: failure.message,
        }),
        None => Ok(()),
    }
}

fn auth_header(token: &AccessToken) -> Result<HeaderValue, Error> {
    if token.is_empty() {
        return Err(Error::InvalidToken);
    }
    let mut value = HeaderValue::from_str(&token.bearer()).map_err(|_| Error::InvalidToken)?;
    value.set_sensitive(true);
    Ok(value)
}
