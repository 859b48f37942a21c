use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Long-lived client credentials issued by the open platform.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Short-lived bearer token. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// What the server does when the target directory already has a file with
/// the same name. Sent as the integer `duplicate` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DuplicatePolicy {
    /// Keep both files; the server renames the new one.
    Rename,
    /// Replace the existing file.
    #[default]
    Overwrite,
}

impl DuplicatePolicy {
    /// Wire value of the policy.
    pub fn code(self) -> u8 {
        match self {
            DuplicatePolicy::Rename => 1,
            DuplicatePolicy::Overwrite => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(DuplicatePolicy::Rename),
            2 => Some(DuplicatePolicy::Overwrite),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DuplicatePolicy::Rename => "rename",
            DuplicatePolicy::Overwrite => "overwrite",
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a duplicate policy name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown duplicate policy: {0} (expected \"rename\" or \"overwrite\")")]
pub struct ParsePolicyError(pub String);

impl FromStr for DuplicatePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rename" | "1" => Ok(DuplicatePolicy::Rename),
            "overwrite" | "2" => Ok(DuplicatePolicy::Overwrite),
            _ => Err(ParsePolicyError(s.to_string())),
        }
    }
}

impl Serialize for DuplicatePolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for DuplicatePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        DuplicatePolicy::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duplicate policy {code}")))
    }
}
