use serde::{Deserialize, Serialize};

use crate::constants::SUCCESS_CODE;

/// Non-zero `code` reported inside an API response body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("API code {code}: {message}")]
pub struct ApiFailure {
    pub code: i64,
    pub message: String,
}

/// Envelope shared by every open API response.
///
/// The `data` field uses `serde_json::value::RawValue` so the payload is only
/// decoded once `code` says the call succeeded. Failed calls often carry a
/// `data` shape that does not match the success type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Box<serde_json::value::RawValue>>,
    #[serde(
        rename = "x-traceID",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub trace_id: String,
}

impl ApiResponse {
    /// Returns `true` when `code` is zero.
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Returns the failure details, or `None` for a successful response.
    pub fn failure(&self) -> Option<ApiFailure> {
        if self.is_success() {
            None
        } else {
            Some(ApiFailure {
                code: self.code,
                message: self.message.clone(),
            })
        }
    }

    /// Deserializes the payload into the given type.
    ///
    /// A missing or `null` payload yields `Ok(None)`.
    pub fn parse_data<T: for<'de> Deserialize<'de>>(&self) -> Result<Option<T>, serde_json::Error> {
        match &self.data {
            Some(raw) if raw.get() != "null" => Ok(Some(serde_json::from_str(raw.get())?)),
            _ => Ok(None),
        }
    }
}
