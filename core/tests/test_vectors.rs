//! Verify request building and response handling against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each vector file describes inputs, the expected request, a script of
//! simulated responses, how many transport calls the client should make,
//! and the expected result or API error. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use std::sync::Arc;

use accounts_client::testing::{MockTransport, RecordingSleeper};
use accounts_client::{
    Account, AccountCreate, AccountsClient, ApiError, ClientConfig, Context, Error, HttpMethod,
    HttpRequest, HttpResponse,
};
use pretty_assertions::assert_eq;
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080";

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn scripted_client(case: &serde_json::Value) -> (AccountsClient, Arc<MockTransport>) {
    let outcomes: Vec<_> = case["simulated_responses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|sim| {
            Ok(HttpResponse::new(
                sim["status"].as_u64().unwrap() as u16,
                sim["body"].as_str().unwrap(),
            ))
        })
        .collect();
    let transport = Arc::new(MockTransport::sequence(outcomes));
    let client = AccountsClient::with_capabilities(
        ClientConfig::new(BASE_URL),
        transport.clone(),
        Arc::new(RecordingSleeper::new()),
    )
    .unwrap();
    (client, transport)
}

/// Check every request the transport saw against `expected_request`.
fn verify_requests(name: &str, requests: &[HttpRequest], expected: &serde_json::Value) {
    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();

    for req in requests {
        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: url");

        let headers: Vec<(String, String)> = req
            .headers
            .iter()
            .filter(|(k, _)| k != "date")
            .cloned()
            .collect();
        assert_eq!(headers, expected_headers, "{name}: headers");
        assert!(req.header("date").is_some(), "{name}: date header");

        match expected.get("body") {
            Some(body) => {
                let req_body: serde_json::Value =
                    serde_json::from_slice(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&req_body, body, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body should be None"),
        }
    }
}

fn expected_api_error(value: &serde_json::Value) -> ApiError {
    let mut err: ApiError = serde_json::from_value(value.clone()).unwrap();
    err.status = value["status"].as_u64().unwrap() as u16;
    err
}

fn verify_outcome<T: std::fmt::Debug>(
    name: &str,
    case: &serde_json::Value,
    result: Result<T, Error>,
    check_ok: impl FnOnce(T),
) {
    match case.get("expected_error") {
        Some(expected) => match result {
            Err(Error::Api(err)) => assert_eq!(err, expected_api_error(expected), "{name}: error"),
            other => panic!("{name}: expected API error, got {other:?}"),
        },
        None => check_ok(result.unwrap_or_else(|e| panic!("{name}: unexpected error {e}"))),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let raw = include_str!("../../test-vectors/create.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input: AccountCreate = serde_json::from_value(case["input"].clone()).unwrap();
        let (client, transport) = scripted_client(case);

        let result = client.create(&Context::background(), &input);

        assert_eq!(
            transport.calls() as u64,
            case["expected_calls"].as_u64().unwrap(),
            "{name}: calls"
        );
        verify_requests(name, &transport.requests(), &case["expected_request"]);
        verify_outcome(name, case, result, |account| {
            let expected: Account = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(account, expected, "{name}: parsed result");
        });
    }
}

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

#[test]
fn fetch_test_vectors() {
    let raw = include_str!("../../test-vectors/fetch.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id: Uuid = case["input_id"].as_str().unwrap().parse().unwrap();
        let (client, transport) = scripted_client(case);

        let result = client.fetch(&Context::background(), id);

        assert_eq!(
            transport.calls() as u64,
            case["expected_calls"].as_u64().unwrap(),
            "{name}: calls"
        );
        verify_requests(name, &transport.requests(), &case["expected_request"]);
        verify_outcome(name, case, result, |account| {
            let expected: Account = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(account, expected, "{name}: parsed result");
        });
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let raw = include_str!("../../test-vectors/delete.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let id: Uuid = case["input_id"].as_str().unwrap().parse().unwrap();
        let version = case["input_version"].as_i64().unwrap();
        let (client, transport) = scripted_client(case);

        let result = client.delete(&Context::background(), id, version);

        assert_eq!(
            transport.calls() as u64,
            case["expected_calls"].as_u64().unwrap(),
            "{name}: calls"
        );
        verify_requests(name, &transport.requests(), &case["expected_request"]);
        verify_outcome(name, case, result, |()| {});
    }
}

// ---------------------------------------------------------------------------
// Build/parse without the transport
// ---------------------------------------------------------------------------

#[test]
fn build_and_parse_split_matches_vectors() {
    let raw = include_str!("../../test-vectors/fetch.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    let case = &vectors["cases"][0];

    let (client, _) = scripted_client(case);
    let id: Uuid = case["input_id"].as_str().unwrap().parse().unwrap();
    let req = client.build_fetch_account(id).unwrap();
    verify_requests("build_fetch_account", &[req], &case["expected_request"]);

    let sim = &case["simulated_responses"][0];
    let response = HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    );
    let account = client.parse_fetch_account(response).unwrap();
    let expected: Account = serde_json::from_value(case["expected_result"].clone()).unwrap();
    assert_eq!(account, expected);
}
