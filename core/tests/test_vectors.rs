//! Verify builders and the envelope parser against JSON test vectors stored
//! in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences.

use cluster_api_core::{ApiError, ClusterClient, DistanceId, HttpMethod, HttpRequest, HttpResponse, Point};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:3000";

fn client() -> ClusterClient {
    ClusterClient::new(BASE_URL)
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        other => panic!("unknown method: {other}"),
    }
}

fn points(value: &Value) -> Vec<Point> {
    serde_json::from_value(value.clone()).unwrap()
}

fn build(c: &ClusterClient, operation: &str, input: &Value) -> HttpRequest {
    let id = || input["id"].as_u64().unwrap();
    match operation {
        "add_area" => c.build_add_area(),
        "add_points" => c.build_add_points(id(), &points(&input["points"])),
        "add_clusters" => c.build_add_clusters(id(), &points(&input["clusters"])),
        "train" => {
            let dist_id: DistanceId = serde_json::from_value(input["dist_id"].clone()).unwrap();
            c.build_train(
                id(),
                dist_id,
                input["by_step"].as_bool().unwrap(),
                input["max_age"].as_u64().unwrap() as u32,
            )
        }
        "clear_area" => c.build_clear_area(id()),
        other => panic!("unknown operation: {other}"),
    }
    .unwrap()
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let raw = include_str!("../../test-vectors/requests.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected = &case["expected_request"];
        let req = build(&c, case["operation"].as_str().unwrap(), &case["input"]);

        assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

        let expected_headers: Vec<(String, String)> = expected["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, expected["body"], "{name}: body");
    }
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[test]
fn envelope_test_vectors() {
    let raw = include_str!("../../test-vectors/envelopes.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let expected = &case["expected"];
        let result = c.parse_envelope::<Value>(response);

        match (expected["outcome"].as_str().unwrap(), result) {
            ("success", Ok(data)) => assert_eq!(data, expected["data"], "{name}: data"),
            ("application", Err(ApiError::Application { status, message })) => {
                assert_eq!(status, expected["status"].as_i64().unwrap(), "{name}: status");
                assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
            }
            ("http", Err(ApiError::Http { status, .. })) => {
                assert_eq!(u64::from(status), expected["status"].as_u64().unwrap(), "{name}: status");
            }
            ("deserialization", Err(ApiError::Deserialization(_))) => {}
            (outcome, other) => panic!("{name}: expected {outcome}, got {other:?}"),
        }
    }
}
