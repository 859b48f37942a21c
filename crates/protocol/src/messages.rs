use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::constants::{FORM_PREUPLOAD_ID, FORM_SLICE_MD5, FORM_SLICE_NO};
use crate::types::{Credentials, DuplicatePolicy};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Body of `POST /api/v1/access_token`.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenRequest {
    #[serde(rename = "clientID")]
    pub client_id: String,
    #[serde(rename = "clientSecret")]
    pub client_secret: String,
}

impl From<&Credentials> for AccessTokenRequest {
    fn from(creds: &Credentials) -> Self {
        Self {
            client_id: creds.client_id.clone(),
            client_secret: creds.client_secret.clone(),
        }
    }
}

impl fmt::Debug for AccessTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenRequest")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Body of `POST /upload/v2/file/create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFileRequest {
    #[serde(rename = "parentFileID")]
    pub parent_file_id: i64,
    pub filename: String,
    /// Lowercase hex MD5 of the whole file.
    pub etag: String,
    pub size: u64,
    pub duplicate: DuplicatePolicy,
    #[serde(rename = "containDir")]
    pub contain_dir: bool,
}

/// Body of `POST /upload/v2/file/upload_complete`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadCompleteRequest {
    #[serde(rename = "preuploadID")]
    pub preupload_id: String,
}

/// Query of `GET /api/v1/direct-link/url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectLinkQuery {
    #[serde(rename = "fileID")]
    pub file_id: i64,
}

/// Text fields of the multipart slice upload. The slice bytes travel in a
/// separate file part named by [`SliceForm::part_file_name`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceForm {
    pub preupload_id: String,
    /// 1-based slice number.
    pub slice_no: u32,
    pub slice_md5: String,
}

impl SliceForm {
    /// Form fields in wire order.
    pub fn fields(&self) -> [(&'static str, String); 3] {
        [
            (FORM_PREUPLOAD_ID, self.preupload_id.clone()),
            (FORM_SLICE_NO, self.slice_no.to_string()),
            (FORM_SLICE_MD5, self.slice_md5.clone()),
        ]
    }

    /// File name attached to the slice part.
    pub fn part_file_name(&self) -> String {
        format!("chunk_{}", self.slice_no)
    }
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// `data` of the access token response.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(
        rename = "expiredAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expired_at: Option<DateTime<FixedOffset>>,
}

impl fmt::Debug for AccessTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenResponse")
            .field("expired_at", &self.expired_at)
            .finish_non_exhaustive()
    }
}

/// `data` of the create response.
///
/// With `reuse == true` only `file_id` is meaningful. Otherwise the upload
/// must be sliced: `preupload_id`, `slice_size` and `servers` describe it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateFileResponse {
    #[serde(rename = "fileID", default)]
    pub file_id: i64,
    #[serde(rename = "preuploadID", default)]
    pub preupload_id: String,
    #[serde(default)]
    pub reuse: bool,
    #[serde(rename = "sliceSize", default)]
    pub slice_size: u64,
    #[serde(default)]
    pub servers: Vec<String>,
}

/// `data` of the upload-complete response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadCompleteResponse {
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "fileID", default)]
    pub file_id: i64,
}

/// `data` of the direct-link response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectLinkResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_request_field_names() {
        let req = AccessTokenRequest::from(&Credentials::new("id-1", "secret-1"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["clientID"], "id-1");
        assert_eq!(json["clientSecret"], "secret-1");
        assert!(!format!("{req:?}").contains("secret-1"));
    }

    #[test]
    fn create_request_field_names() {
        let req = CreateFileRequest {
            parent_file_id: 29037672,
            filename: "build.zip".into(),
            etag: "d41d8cd98f00b204e9800998ecf8427e".into(),
            size: 0,
            duplicate: DuplicatePolicy::Overwrite,
            contain_dir: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["parentFileID"], 29037672);
        assert_eq!(json["filename"], "build.zip");
        assert_eq!(json["duplicate"], 2);
        assert_eq!(json["containDir"], false);
    }

    #[test]
    fn create_response_reuse() {
        let json = r#"{"fileID":9001,"reuse":true}"#;
        let resp: CreateFileResponse = serde_json::from_str(json).unwrap();
        assert!(resp.reuse);
        assert_eq!(resp.file_id, 9001);
        assert!(resp.servers.is_empty());
        assert_eq!(resp.slice_size, 0);
    }

    #[test]
    fn create_response_pending() {
        let json = r#"{
            "fileID": 0,
            "preuploadID": "pre-1",
            "reuse": false,
            "sliceSize": 16777216,
            "servers": ["http://openapi-upload.123242.com"]
        }"#;
        let resp: CreateFileResponse = serde_json::from_str(json).unwrap();
        assert!(!resp.reuse);
        assert_eq!(resp.preupload_id, "pre-1");
        assert_eq!(resp.slice_size, 16 * 1024 * 1024);
        assert_eq!(resp.servers.len(), 1);
    }

    #[test]
    fn access_token_response_parses_expiry() {
        let json = r#"{"accessToken":"tok","expiredAt":"2025-03-23T15:48:37+08:00"}"#;
        let resp: AccessTokenResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.access_token, "tok");
        let exp = resp.expired_at.unwrap();
        assert_eq!(exp.offset().local_minus_utc(), 8 * 3600);
        assert!(!format!("{resp:?}").contains("tok"));
    }

    #[test]
    fn access_token_response_without_expiry() {
        let resp: AccessTokenResponse = serde_json::from_str(r#"{"accessToken":"t"}"#).unwrap();
        assert!(resp.expired_at.is_none());
    }

    #[test]
    fn slice_form_fields() {
        let form = SliceForm {
            preupload_id: "pre-1".into(),
            slice_no: 3,
            slice_md5: "abc".into(),
        };
        let fields = form.fields();
        assert_eq!(fields[0], ("preuploadID", "pre-1".to_string()));
        assert_eq!(fields[1], ("sliceNo", "3".to_string()));
        assert_eq!(fields[2], ("sliceMD5", "abc".to_string()));
        assert_eq!(form.part_file_name(), "chunk_3");
    }

    #[test]
    fn direct_link_query_name() {
        let q = DirectLinkQuery { file_id: 77 };
        assert_eq!(serde_json::to_value(&q).unwrap()["fileID"], 77);
    }
}
