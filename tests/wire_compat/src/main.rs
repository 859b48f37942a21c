fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use panup_protocol::messages::{
        AccessTokenRequest, AccessTokenResponse, CreateFileRequest, CreateFileResponse,
        DirectLinkResponse, UploadCompleteResponse,
    };
    use panup_protocol::constants::DUPLICATE_SLICE_MESSAGE;
    use panup_protocol::{ApiResponse, DuplicatePolicy};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    fn read_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    /// Parses a recorded response through the envelope type.
    fn load_envelope(name: &str) -> ApiResponse {
        serde_json::from_str(&read_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse envelope {name}: {e}"))
    }

    /// Returns the decoded `data` of a successful recorded response.
    fn load_data<T: serde::de::DeserializeOwned>(name: &str) -> T {
        let envelope = load_envelope(name);
        assert!(envelope.is_success(), "{name} is not a success response");
        envelope
            .parse_data::<T>()
            .unwrap_or_else(|e| panic!("failed to decode data of {name}: {e}"))
            .unwrap_or_else(|| panic!("{name} has no data"))
    }

    /// Deserializes a request fixture, re-serializes it, and compares the
    /// JSON values (order-independent).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));
        assert_eq!(
            fixture, reserialized,
            "roundtrip mismatch for {name}:\n  recorded: {fixture}\n  rust:     {reserialized}"
        );
    }

    // --- Requests ---

    #[test]
    fn fixture_access_token_request() {
        roundtrip_test::<AccessTokenRequest>("access_token_request.json");
    }

    #[test]
    fn fixture_create_file_request() {
        roundtrip_test::<CreateFileRequest>("create_file_request.json");
        let req: CreateFileRequest =
            serde_json::from_value(load_fixture("create_file_request.json")).unwrap();
        assert_eq!(req.duplicate, DuplicatePolicy::Overwrite);
        assert!(!req.contain_dir);
    }

    // --- Responses ---

    #[test]
    fn fixture_access_token_response() {
        let data: AccessTokenResponse = load_data("access_token_response.json");
        assert!(data.access_token.starts_with("eyJ"));
        let expires = data.expired_at.expect("expiredAt parsed");
        assert_eq!(expires.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(
            load_envelope("access_token_response.json").trace_id,
            "5c1f7a3e-token_1742629717"
        );
    }

    #[test]
    fn fixture_create_reuse() {
        let data: CreateFileResponse = load_data("create_reuse.json");
        assert!(data.reuse);
        assert_eq!(data.file_id, 13589461);
        assert!(data.preupload_id.is_empty());
        assert!(data.servers.is_empty());
    }

    #[test]
    fn fixture_create_pending() {
        let data: CreateFileResponse = load_data("create_pending.json");
        assert!(!data.reuse);
        assert_eq!(
            data.preupload_id,
            "WvjyUgonimrlI0dkdJHNX3vdIkNqTgKjCIhPbY_mfIE="
        );
        assert_eq!(data.slice_size, 16 * 1024 * 1024);
        assert_eq!(data.servers, vec!["http://openapi-upload.123242.com"]);
    }

    #[test]
    fn fixture_slice_duplicate() {
        let envelope = load_envelope("slice_duplicate.json");
        let failure = envelope.failure().expect("failure");
        assert_ne!(failure.code, 0);
        assert_eq!(failure.message, DUPLICATE_SLICE_MESSAGE);
        assert!(
            envelope
                .parse_data::<serde_json::Value>()
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn fixture_upload_complete() {
        let data: UploadCompleteResponse = load_data("upload_complete.json");
        assert!(data.completed);
        assert_eq!(data.file_id, 13589462);
    }

    #[test]
    fn fixture_direct_link() {
        let data: DirectLinkResponse = load_data("direct_link.json");
        assert_eq!(
            data.url,
            "https://vip.123pan.cn/1815309870/XianYuLauncher-v1.4.2.zip"
        );
    }

    #[test]
    fn fixture_error() {
        let envelope = load_envelope("error.json");
        let failure = envelope.failure().expect("failure");
        assert_eq!(failure.code, 401);
        assert_ne!(failure.message, DUPLICATE_SLICE_MESSAGE);
    }

    #[test]
    fn every_fixture_is_valid_json() {
        let mut count = 0;
        for entry in fs::read_dir(fixtures_dir()).unwrap() {
            let path = entry.unwrap().path();
            if path.extension().is_some_and(|e| e == "json") {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                load_fixture(&name);
                count += 1;
            }
        }
        assert!(count >= 9, "expected fixtures, found {count}");
    }
}
