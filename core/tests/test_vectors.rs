//! Verify request shaping and response interpretation against the JSON test
//! vectors stored in `test-vectors/`.
//!
//! Requests are captured by a recording transport; form bodies are compared
//! as decoded pairs so percent-encoding details do not cause false negatives.

use std::sync::Mutex;

use subsonic_core::{
    ApiError, Credentials, ErrorKind, HttpRequest, IndexesQuery, Payload, Search2Query,
    SearchQuery, ServiceClient, Transport, TransportError,
};

const BASE_URL: &str = "http://localhost:4040";

struct Recording {
    body: String,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Recording {
    fn replying(body: &str) -> Self {
        Self {
            body: body.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn last(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

impl Transport for Recording {
    fn send(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.body.as_bytes().to_vec())
    }
}

fn client(transport: &Recording) -> ServiceClient<&Recording> {
    let creds = Credentials::new(BASE_URL, "admin", "pass", false);
    ServiceClient::new(&creds, transport)
}

fn parse_kind(s: &str) -> ErrorKind {
    match s {
        "Generic" => ErrorKind::Generic,
        "ParameterMissing" => ErrorKind::ParameterMissing,
        "IncompatibleClient" => ErrorKind::IncompatibleClient,
        "IncompatibleServer" => ErrorKind::IncompatibleServer,
        "AuthFailure" => ErrorKind::AuthFailure,
        "Unauthorized" => ErrorKind::Unauthorized,
        "TrialExpired" => ErrorKind::TrialExpired,
        "NotFound" => ErrorKind::NotFound,
        other => panic!("unknown error kind: {other}"),
    }
}

fn decode_form(body: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[test]
fn response_test_vectors() {
    let raw = include_str!("../../test-vectors/responses.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let transport = Recording::replying(case["body"].as_str().unwrap());
        let c = client(&transport);

        let result = c.ping();
        assert_eq!(
            c.api_version().as_deref(),
            case["expected_version"].as_str(),
            "{name}: recorded version"
        );

        if let Some(expected) = case.get("expected_error") {
            let err = result.unwrap_err();
            match (expected["kind"].as_str().unwrap(), err) {
                ("Decode", ApiError::Decode(_)) => {}
                (
                    kind,
                    ApiError::Protocol {
                        kind: actual,
                        code,
                        message,
                    },
                ) => {
                    assert_eq!(actual, parse_kind(kind), "{name}: kind");
                    assert_eq!(code, expected["code"].as_i64(), "{name}: code");
                    assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
                }
                (kind, other) => panic!("{name}: expected {kind}, got {other:?}"),
            }
        } else {
            let payload = result.unwrap();
            let expected: Payload = case["expected_payload"].clone();
            assert_eq!(payload, expected, "{name}: payload");
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    // No version in the reply, so version gating never interferes.
    let transport = Recording::replying(r#"{"subsonic-response":{"status":"ok"}}"#);
    let c = client(&transport);

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = case["input"].clone();

        match case["operation"].as_str().unwrap() {
            "ping" => {
                c.ping().unwrap();
            }
            "getLicense" => {
                c.get_license().unwrap();
            }
            "getMusicFolders" => {
                c.get_music_folders().unwrap();
            }
            "getNowPlaying" => {
                c.get_now_playing().unwrap();
            }
            "getIndexes" => {
                let query: IndexesQuery = serde_json::from_value(input).unwrap();
                c.get_indexes(&query).unwrap();
            }
            "search" => {
                let query: SearchQuery = serde_json::from_value(input).unwrap();
                assert!(c.search(&query).unwrap().is_some(), "{name}: gated");
            }
            "search2" => {
                let query: Search2Query = serde_json::from_value(input).unwrap();
                assert!(c.search2(&query).unwrap().is_some(), "{name}: gated");
            }
            other => panic!("{name}: unknown operation {other}"),
        }

        let req = transport.last();
        assert_eq!(
            req.url,
            format!("{BASE_URL}{}", case["expected_path"].as_str().unwrap()),
            "{name}: url"
        );

        let pairs = decode_form(req.body.as_deref().unwrap());
        let (base, method_params) = pairs.split_at(5);
        let base_keys: Vec<&str> = base.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(base_keys, ["u", "p", "v", "c", "f"], "{name}: base keys");
        assert_eq!(base[1].1, "enc:70617373", "{name}: password");
        assert_eq!(base[4].1, "json", "{name}: format");

        let expected: Vec<(String, String)> = case["expected_params"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| {
                let arr = p.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(method_params, expected.as_slice(), "{name}: method params");
    }
}
