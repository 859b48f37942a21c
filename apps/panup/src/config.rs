//! Uploader configuration.
//!
//! Optional TOML file, read from `--config` or `~/.config/panup/panup.toml`.
//! A missing default file means defaults; nothing is written back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use panup_openapi::ClientConfig;
use panup_protocol::DuplicatePolicy;
use panup_protocol::constants::{API_DOMAIN, DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT};
use panup_uploader::DEFAULT_OUTPUT_KEY;
use serde::{Deserialize, Serialize};

use crate::Cli;

/// Uploader configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Open API domain.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Whole-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Slices uploaded in parallel (1 = one at a time).
    #[serde(default = "default_slice_concurrency")]
    pub slice_concurrency: usize,

    /// `"rename"` or `"overwrite"`.
    #[serde(default, with = "policy_name")]
    pub duplicate: DuplicatePolicy,

    /// Key the link is exported under.
    #[serde(default = "default_output_key")]
    pub output_key: String,
}

fn default_api_base() -> String {
    API_DOMAIN.into()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT.as_secs()
}

fn default_slice_concurrency() -> usize {
    1
}

fn default_output_key() -> String {
    DEFAULT_OUTPUT_KEY.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            slice_concurrency: default_slice_concurrency(),
            duplicate: DuplicatePolicy::default(),
            output_key: default_output_key(),
        }
    }
}

impl Config {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load_default(config_path()),
        }
    }

    /// Reads `path` when it exists. No path means no home directory.
    fn load_default(path: Option<PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            None => {
                tracing::debug!("no home directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        tracing::debug!(path = %path.display(), "configuration file read");
        Ok(config)
    }

    /// Applies command-line overrides.
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(api_base) = &cli.api_base {
            self.api_base = api_base.clone();
        }
        if let Some(concurrency) = cli.concurrency {
            self.slice_concurrency = concurrency;
        }
        if let Some(timeout) = cli.timeout {
            self.request_timeout_secs = timeout;
        }
        if let Some(duplicate) = cli.duplicate {
            self.duplicate = duplicate;
        }
        if let Some(key) = &cli.output_key {
            self.output_key = key.clone();
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.api_base.starts_with("http://") || self.api_base.starts_with("https://"),
            "api_base must be an http(s) URL: {}",
            self.api_base
        );
        anyhow::ensure!(self.slice_concurrency >= 1, "slice_concurrency must be at least 1");
        anyhow::ensure!(self.request_timeout_secs > 0, "request timeout must be positive");
        anyhow::ensure!(self.connect_timeout_secs > 0, "connect timeout must be positive");
        anyhow::ensure!(!self.output_key.is_empty(), "output_key must not be empty");
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api_base.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }
}

/// Duplicate policy as its name rather than its wire code.
mod policy_name {
    use panup_protocol::DuplicatePolicy;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(policy: &DuplicatePolicy, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(policy.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DuplicatePolicy, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// Returns the platform-specific configuration file path, if there is a
/// home directory to put it in.
fn config_path() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Some(PathBuf::from(appdata).join("panup").join("panup.toml"))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var_os("HOME").filter(|home| !home.is_empty())?;
        Some(
            PathBuf::from(home)
                .join(".config")
                .join("panup")
                .join("panup.toml"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(extra: &[&str]) -> Cli {
        let mut args = vec![
            "panup",
            "--file",
            "app.zip",
            "--client-id",
            "cid",
            "--client-secret",
            "secret",
            "--parent-id",
            "29037672",
        ];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.api_base, "https://open-api.123pan.com");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.connect_timeout_secs, 30);
        assert_eq!(config.slice_concurrency, 1);
        assert_eq!(config.duplicate, DuplicatePolicy::Overwrite);
        assert_eq!(config.output_key, "download_url");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_partial_toml() {
        let config: Config = toml::from_str(r#"slice_concurrency = 4"#).unwrap();
        assert_eq!(config.slice_concurrency, 4);
        assert_eq!(config.api_base, "https://open-api.123pan.com");
        assert_eq!(config.duplicate, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = Config {
            api_base: "https://api.example.com".into(),
            request_timeout_secs: 60,
            connect_timeout_secs: 5,
            slice_concurrency: 2,
            duplicate: DuplicatePolicy::Rename,
            output_key: "pan_url".into(),
        };
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains(r#"duplicate = "rename""#));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn config_rejects_unknown_policy() {
        assert!(toml::from_str::<Config>(r#"duplicate = "merge""#).is_err());
    }

    #[test]
    fn load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("panup.toml");
        std::fs::write(&path, "duplicate = \"rename\"\nrequest_timeout_secs = 90\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.duplicate, DuplicatePolicy::Rename);
        assert_eq!(config.request_timeout_secs, 90);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(tmp.path().join("nope.toml").as_path())).is_err());
    }

    #[test]
    fn no_home_directory_uses_defaults() {
        let config = Config::load_default(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn missing_default_file_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let config = Config::load_default(Some(tmp.path().join("panup.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn existing_default_file_is_read() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("panup.toml");
        std::fs::write(&path, "slice_concurrency = 2\n").unwrap();
        let config = Config::load_default(Some(path)).unwrap();
        assert_eq!(config.slice_concurrency, 2);
    }

    #[test]
    fn cli_overrides_file_values() {
        let mut config = Config {
            slice_concurrency: 2,
            ..Config::default()
        };
        config.merge_cli(&cli(&[
            "--api-base",
            "http://127.0.0.1:8080",
            "--concurrency",
            "4",
            "--timeout",
            "30",
            "--duplicate",
            "rename",
            "--output-key",
            "pan_url",
        ]));
        assert_eq!(config.api_base, "http://127.0.0.1:8080");
        assert_eq!(config.slice_concurrency, 4);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.duplicate, DuplicatePolicy::Rename);
        assert_eq!(config.output_key, "pan_url");
    }

    #[test]
    fn absent_flags_keep_file_values() {
        let mut config = Config {
            slice_concurrency: 3,
            duplicate: DuplicatePolicy::Rename,
            ..Config::default()
        };
        config.merge_cli(&cli(&[]));
        assert_eq!(config.slice_concurrency, 3);
        assert_eq!(config.duplicate, DuplicatePolicy::Rename);
    }

    #[test]
    fn cli_rejects_bad_policy() {
        let result = Cli::try_parse_from([
            "panup",
            "--file",
            "a",
            "--client-id",
            "c",
            "--client-secret",
            "s",
            "--parent-id",
            "1",
            "--duplicate",
            "merge",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let zero = Config {
            slice_concurrency: 0,
            ..Config::default()
        };
        assert!(zero.validate().is_err());

        let bad_base = Config {
            api_base: "open-api.123pan.com".into(),
            ..Config::default()
        };
        assert!(bad_base.validate().is_err());
    }

    #[test]
    fn client_config_uses_seconds() {
        let config = Config {
            request_timeout_secs: 12,
            ..Config::default()
        };
        let client = config.client_config();
        assert_eq!(client.request_timeout, Duration::from_secs(12));
        assert_eq!(client.connect_timeout, Duration::from_secs(30));
        assert_eq!(client.base_url, "https://open-api.123pan.com");
    }

    #[test]
    fn config_path_not_empty() {
        if let Some(path) = config_path() {
            assert!(path.to_string_lossy().contains("panup"));
        }
    }
}
