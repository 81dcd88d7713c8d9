//! Verify request building and response parsing against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Each case names an operation, its inputs, the exact request it must
//! build, a simulated response and either the parsed result or the expected
//! error. JSON bodies are compared as parsed values so field order does not
//! matter; form bodies are compared byte for byte.

use std::sync::Arc;

use admin_core::{
    ApiClient, ApiError, ErrorBody, HttpMethod, HttpResponse, LoginForm, Message, ReqwestTransport,
    RequestSpec, Token, UserPublic, UsersPublic,
};
use pretty_assertions::assert_eq;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8000";

fn client() -> ApiClient {
    ApiClient::new(BASE_URL, Arc::new(ReqwestTransport::new("vectors").unwrap()))
}

fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn input<T: DeserializeOwned>(case: &Value) -> T {
    serde_json::from_value(case["input"].clone()).unwrap()
}

fn user_id(case: &Value) -> Uuid {
    case["user_id"].as_str().unwrap().parse().unwrap()
}

fn login_form(case: &Value) -> LoginForm {
    let field = |name: &str| case["input"][name].as_str().map(str::to_string);
    LoginForm {
        username: field("username").unwrap(),
        password: field("password").unwrap(),
        grant_type: field("grant_type"),
        scope: field("scope").unwrap_or_default(),
        client_id: field("client_id"),
        client_secret: field("client_secret"),
    }
}

type Parser = fn(Value) -> Value;

/// The request an operation describes, plus a parser into its typed result
/// re-serialized as JSON.
fn describe(client: &ApiClient, case: &Value) -> (RequestSpec, Parser) {
    fn typed<T: DeserializeOwned + serde::Serialize>(value: Value) -> Value {
        serde_json::to_value(serde_json::from_value::<T>(value).unwrap()).unwrap()
    }

    let users = client.users();
    let operation = case["operation"].as_str().unwrap();
    match operation {
        "access_token" => (
            client.login().access_token(&login_form(case)).spec().unwrap().clone(),
            typed::<Token> as Parser,
        ),
        "test_token" => (
            client.login().test_token().spec().unwrap().clone(),
            typed::<UserPublic> as Parser,
        ),
        "list" => {
            let skip = case["input"]["skip"].as_u64().unwrap();
            let limit = case["input"]["limit"].as_u64().unwrap();
            (
                users.list(skip, limit).spec().unwrap().clone(),
                typed::<UsersPublic> as Parser,
            )
        }
        "create" => (
            users.create(&input(case)).spec().unwrap().clone(),
            typed::<UserPublic> as Parser,
        ),
        "read_me" => (users.read_me().spec().unwrap().clone(), typed::<UserPublic> as Parser),
        "update_me" => (
            users.update_me(&input(case)).spec().unwrap().clone(),
            typed::<UserPublic> as Parser,
        ),
        "update_password_me" => (
            users.update_password_me(&input(case)).spec().unwrap().clone(),
            typed::<Message> as Parser,
        ),
        "delete_me" => (users.delete_me().spec().unwrap().clone(), typed::<Message> as Parser),
        "read_by_id" => (
            users.read_by_id(user_id(case)).spec().unwrap().clone(),
            typed::<UserPublic> as Parser,
        ),
        "update" => (
            users.update(user_id(case), &input(case)).spec().unwrap().clone(),
            typed::<UserPublic> as Parser,
        ),
        "delete" => (
            users.delete(user_id(case)).spec().unwrap().clone(),
            typed::<Message> as Parser,
        ),
        other => panic!("unknown operation: {other}"),
    }
}

fn run_vectors(raw: &str) {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    let c = client();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (spec, parse_typed) = describe(&c, case);
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_request(&spec, case["token"].as_str()).unwrap();
        let method = parse_method(expected_req["method"].as_str().unwrap());
        assert_eq!(req.method, method, "{name}: method");
        let path = expected_req["path"].as_str().unwrap();
        assert_eq!(req.url, format!("{BASE_URL}{path}"), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (
                    arr[0].as_str().unwrap().to_string(),
                    arr[1].as_str().unwrap().to_string(),
                )
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        match &expected_req["body"] {
            Value::Null => assert_eq!(req.body, None, "{name}: body"),
            Value::String(form) => {
                assert_eq!(req.body.as_deref(), Some(form.as_str()), "{name}: body");
            }
            json => {
                let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&body, json, "{name}: body");
            }
        }

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        let parsed = c.parse_response(response);

        if let Some(expected) = case.get("expected_result") {
            let value = parsed.unwrap_or_else(|e| panic!("{name}: unexpected error {e:?}"));
            assert_eq!(&parse_typed(value), expected, "{name}: parsed result");
        } else {
            let expected = &case["expected_error"];
            let err = parsed.expect_err(name);
            let status = expected["status"].as_u64().map(|s| s as u16);
            assert_eq!(err.status(), status, "{name}: status");
            assert_eq!(
                err.body().and_then(ErrorBody::message),
                expected["message"].as_str(),
                "{name}: message"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[test]
fn login_test_vectors() {
    run_vectors(include_str!("../../test-vectors/login.json"));
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[test]
fn users_test_vectors() {
    run_vectors(include_str!("../../test-vectors/users.json"));
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

fn variant(err: &ApiError) -> &'static str {
    match err {
        ApiError::Validation { .. } => "Validation",
        ApiError::Conflict { .. } => "Conflict",
        ApiError::Unauthorized { .. } => "Unauthorized",
        ApiError::Forbidden { .. } => "Forbidden",
        ApiError::NotFound { .. } => "NotFound",
        ApiError::Http { .. } => "Http",
        ApiError::Network(_) => "Network",
        ApiError::Cancelled => "Cancelled",
        ApiError::Serialization(_) => "Serialization",
        ApiError::Deserialization(_) => "Deserialization",
    }
}

#[test]
fn error_test_vectors() {
    let raw = include_str!("../../test-vectors/errors.json");
    let vectors: Value = serde_json::from_str(raw).unwrap();

    let c = client();
    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let response = HttpResponse {
            status,
            headers: Vec::new(),
            body: case["body"].as_str().unwrap().to_string(),
        };
        let err = c.parse_response(response).expect_err(name);

        assert_eq!(variant(&err), case["variant"].as_str().unwrap(), "{name}: variant");
        assert_eq!(err.status(), Some(status), "{name}: status");
        assert_eq!(
            err.body().and_then(ErrorBody::message),
            case["message"].as_str(),
            "{name}: message"
        );
    }
}
