//! Upload host selection.
//!
//! The create call returns a `servers` list naming the hosts that accept
//! slices. Entries are plain host strings in practice, sometimes without a
//! scheme, so each one is normalised and validated before use.

use reqwest::Url;
use tracing::{debug, warn};

use crate::client::Error;

/// Picks the upload host from the server-provided list.
///
/// - Entries are trimmed and empty entries skipped.
/// - Entries without a scheme get `https://`.
/// - The first entry that parses as an `http`/`https` URL with a host wins.
/// - An empty list falls back to `fallback` (the API domain).
///
/// A non-empty list with no usable entry is an error.
pub fn resolve_upload_host(servers: &[String], fallback: &str) -> Result<String, Error> {
    if servers.iter().all(|s| s.trim().is_empty()) {
        debug!(fallback, "no upload servers advertised, using API domain");
        return normalize_host(fallback).ok_or_else(|| Error::InvalidUploadHost(fallback.into()));
    }

    for server in servers {
        let trimmed = server.trim();
        if trimmed.is_empty() {
            continue;
        }
        match normalize_host(trimmed) {
            Some(host) => return Ok(host),
            None => warn!(server = %trimmed, "skipping unusable upload server"),
        }
    }

    Err(Error::InvalidUploadHost(servers.join(", ")))
}

/// Returns `raw` as a base URL without trailing slash, or `None` if invalid.
fn normalize_host(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{raw}")
    };

    let url = Url::parse(&candidate).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    if url.host_str().is_none_or(str::is_empty) {
        return None;
    }
    if url.query().is_some() || url.fragment().is_some() {
        return None;
    }
    Some(url.as_str().trim_end_matches('/').to_string())
}
