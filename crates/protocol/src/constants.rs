use std::time::Duration;

/// Default open API domain.
pub const API_DOMAIN: &str = "https://open-api.123pan.com";

/// Value of the `Platform` header sent with every request.
pub const PLATFORM: &str = "open_platform";

/// Name of the platform header (HTTP header names are case-insensitive).
pub const HEADER_PLATFORM: &str = "platform";

/// `code` value of a successful API response.
pub const SUCCESS_CODE: i64 = 0;

/// Message returned by the slice endpoint when the slice was already accepted.
pub const DUPLICATE_SLICE_MESSAGE: &str = "分片重复上传";

// ---------------------------------------------------------------------------
// Endpoint paths
// ---------------------------------------------------------------------------

/// Exchanges client credentials for an access token (API domain).
pub const PATH_ACCESS_TOKEN: &str = "/api/v1/access_token";

/// Registers an upload and negotiates reuse or slicing (API domain).
pub const PATH_FILE_CREATE: &str = "/upload/v2/file/create";

/// Receives a single slice as multipart form data (upload host).
pub const PATH_FILE_SLICE: &str = "/upload/v2/file/slice";

/// Finalizes a sliced upload (upload host).
pub const PATH_UPLOAD_COMPLETE: &str = "/upload/v2/file/upload_complete";

/// Resolves a direct download URL for a file (API domain).
pub const PATH_DIRECT_LINK: &str = "/api/v1/direct-link/url";

// ---------------------------------------------------------------------------
// Slice form fields
// ---------------------------------------------------------------------------

pub const FORM_PREUPLOAD_ID: &str = "preuploadID";
pub const FORM_SLICE_NO: &str = "sliceNo";
pub const FORM_SLICE_MD5: &str = "sliceMD5";
/// Name of the multipart file part carrying the slice bytes.
pub const FORM_SLICE: &str = "slice";

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Whole-request timeout. Large enough to cover one slice POST on a slow link.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for establishing a TCP/TLS connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
