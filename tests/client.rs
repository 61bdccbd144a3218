//! End-to-end tests against local mock servers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::{Value, json};

use typefetch::{
    Body, ClientConfig, ClientError, FetchClient, Payload, RetryPolicy, SchemaFn, SchemaIssue,
};

#[cfg(feature = "json-schema")]
use typefetch::JsonSchema;

/// Serve a router on an ephemeral port and return its address.
async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client_for(addr: SocketAddr) -> FetchClient {
    FetchClient::builder(format!("http://{addr}")).build().unwrap()
}

async fn user_endpoint() -> impl IntoResponse {
    axum::Json(json!({
        "id": 1,
        "name": "Test User",
        "email": "test@example.com"
    }))
}

#[tokio::test]
async fn test_get_json_scenario() {
    let addr = serve(Router::new().route("/users/1", get(user_endpoint))).await;
    let client = client_for(addr);

    let response = client.get::<Value>("/users/1").await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        *response.get_ref(),
        json!({"id": 1, "name": "Test User", "email": "test@example.com"})
    );
}

#[tokio::test]
async fn test_get_typed_decoding() {
    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct User {
        id: u32,
        name: String,
        email: String,
    }

    let addr = serve(Router::new().route("/users/1", get(user_endpoint))).await;
    let client = client_for(addr);

    let user = client.get::<User>("/users/1").await.unwrap().into_inner();
    assert_eq!(user.id, 1);
    assert_eq!(user.name, "Test User");
    assert_eq!(user.email, "test@example.com");
}

/// Echo endpoint: reports the received content type and body back to the
/// caller so tests can assert on what actually went over the wire.
async fn echo_created(headers: HeaderMap, body: axum::body::Bytes) -> impl IntoResponse {
    let received: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    (
        StatusCode::CREATED,
        axum::Json(json!({"content_type": content_type, "body": received})),
    )
}

#[tokio::test]
async fn test_post_round_trips_json_body() {
    let addr = serve(Router::new().route("/users", post(echo_created))).await;
    let client = client_for(addr);

    let response = client
        .post::<Value, _>("/users", json!({"name": "New User", "email": "new@example.com"}))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let observed = response.get_ref();
    assert_eq!(observed["content_type"], "application/json");
    assert_eq!(
        observed["body"],
        json!({"name": "New User", "email": "new@example.com"})
    );
}

#[tokio::test]
async fn test_post_respects_caller_content_type() {
    let addr = serve(Router::new().route("/users", post(echo_created))).await;
    let client = client_for(addr);

    let response = client
        .post_with_options::<Value, _>(
            "/users",
            json!({"ok": true}),
            ClientConfig::new().header("content-type", "application/vnd.acme+json"),
        )
        .await
        .unwrap();

    assert_eq!(
        response.get_ref()["content_type"],
        "application/vnd.acme+json"
    );
}

#[tokio::test]
async fn test_form_body_encoding() {
    let addr = serve(Router::new().route(
        "/submit",
        post(|headers: HeaderMap, body: axum::body::Bytes| async move {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            axum::Json(json!({
                "content_type": content_type,
                "body": String::from_utf8_lossy(&body),
            }))
        }),
    ))
    .await;
    let client = client_for(addr);

    let response = client
        .post::<Value, _>("/submit", Body::form([("a", "1"), ("b", "x y")]))
        .await
        .unwrap();

    assert_eq!(
        response.get_ref()["content_type"],
        "application/x-www-form-urlencoded"
    );
    assert_eq!(response.get_ref()["body"], "a=1&b=x+y");
}

#[tokio::test]
async fn test_query_params_merge_and_encode() {
    let addr = serve(Router::new().route(
        "/search",
        get(|RawQuery(query): RawQuery| async move { query.unwrap_or_default() }),
    ))
    .await;

    let client = FetchClient::builder(format!("http://{addr}"))
        .param("page", 1)
        .build()
        .unwrap();

    let response = client
        .get_with_options::<String>(
            "/search",
            ClientConfig::new().param("q", "a b").param("page", 2),
        )
        .await
        .unwrap();

    // Override wins for `page`; values are percent-encoded; keys are in
    // map order.
    assert_eq!(response.into_inner(), "page=2&q=a+b");
}

#[tokio::test]
async fn test_non_success_status_is_error_envelope() {
    let addr = serve(Router::new().route(
        "/missing",
        get(|| async {
            (
                StatusCode::NOT_FOUND,
                axum::Json(json!({"message": "no such thing"})),
            )
        }),
    ))
    .await;
    let client = client_for(addr);

    let err = client.get::<Value>("/missing").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    match &err {
        ClientError::Status { body, .. } => {
            assert_eq!(
                body.as_json(),
                Some(&json!({"message": "no such thing"}))
            );
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    let err = client.get::<Value>("/users/1").await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn test_timeout_beats_slow_response() {
    let addr = serve(Router::new().route(
        "/slow",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "too late"
        }),
    ))
    .await;

    let client = FetchClient::builder(format!("http://{addr}"))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let started = Instant::now();
    let err = client.get::<Value>("/slow").await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_parse_json_false_returns_text() {
    let addr = serve(Router::new().route("/users/1", get(user_endpoint))).await;
    let client = client_for(addr);

    let response = client
        .get_with_options::<String>("/users/1", ClientConfig::new().parse_json(false))
        .await
        .unwrap();
    assert!(response.get_ref().starts_with('{'));
}

#[tokio::test]
async fn test_binary_payload_via_request_raw() {
    let addr = serve(Router::new().route(
        "/blob",
        get(|| async {
            (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                vec![0xde_u8, 0xad, 0xbe, 0xef],
            )
        }),
    ))
    .await;
    let client = client_for(addr);

    let config = typefetch::RequestConfig::merged(
        client.defaults(),
        &ClientConfig::new(),
        typefetch::Method::GET,
        "/blob",
        None,
    );
    let response = client.request_raw(config).await.unwrap();
    match response.get_ref() {
        Payload::Binary(bytes) => assert_eq!(&bytes[..], &[0xde, 0xad, 0xbe, 0xef]),
        other => panic!("expected binary payload, got {other:?}"),
    }
}

#[tokio::test]
async fn test_request_interceptor_adds_header() {
    let addr = serve(Router::new().route(
        "/whoami",
        get(|headers: HeaderMap| async move {
            headers
                .get("x-trace-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string()
        }),
    ))
    .await;
    let client = client_for(addr);

    client.interceptors().request.add_sync(|mut config| {
        config.headers.insert("x-trace-id", "abc123".parse().unwrap());
        Ok(config)
    });

    let response = client.get::<String>("/whoami").await.unwrap();
    assert_eq!(response.into_inner(), "abc123");
}

#[tokio::test]
async fn test_response_interceptors_run_in_order() {
    let addr = serve(Router::new().route("/value", get(|| async { axum::Json(json!(1)) }))).await;
    let client = client_for(addr);

    client.interceptors().response.add_sync(|payload| {
        let n = payload.as_json().and_then(Value::as_i64).unwrap_or(0);
        Ok(Payload::Json(json!(n + 1)))
    });
    client.interceptors().response.add_sync(|payload| {
        let n = payload.as_json().and_then(Value::as_i64).unwrap_or(0);
        Ok(Payload::Json(json!(n * 10)))
    });

    // (1 + 1) * 10: addition first, registration order.
    let response = client.get::<i64>("/value").await.unwrap();
    assert_eq!(response.into_inner(), 20);
}

#[tokio::test]
async fn test_ejected_interceptor_is_skipped() {
    let addr = serve(Router::new().route(
        "/whoami",
        get(|headers: HeaderMap| async move {
            headers
                .get("x-trace-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string()
        }),
    ))
    .await;
    let client = client_for(addr);

    let id = client.interceptors().request.add_sync(|mut config| {
        config.headers.insert("x-trace-id", "abc123".parse().unwrap());
        Ok(config)
    });
    client.interceptors().request.eject(id);

    let response = client.get::<String>("/whoami").await.unwrap();
    assert_eq!(response.into_inner(), "none");
}

#[tokio::test]
async fn test_error_interceptor_transforms_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr);
    client
        .interceptors()
        .error
        .add_sync(|_| Ok(ClientError::Transport("upstream unreachable".into())));

    let err = client.get::<Value>("/users/1").await.unwrap_err();
    assert_eq!(err.to_string(), "transport error: upstream unreachable");
}

#[tokio::test]
async fn test_schema_fn_validation_failure_envelope() {
    let addr = serve(Router::new().route(
        "/users/1",
        get(|| async { axum::Json(json!({"id": "not-a-number"})) }),
    ))
    .await;
    let client = client_for(addr);

    let schema = SchemaFn::new(|value: &Value| {
        if value.get("id").map(Value::is_u64).unwrap_or(false) {
            Ok(value.clone())
        } else {
            Err(vec![SchemaIssue::new("/id", "expected an integer")])
        }
    });

    let err = client
        .get_with_options::<Value>("/users/1", ClientConfig::new().schema(schema))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Validation failed");
    assert_eq!(err.status(), Some(StatusCode::OK));
    assert_eq!(err.issues().len(), 1);
    assert_eq!(err.issues()[0].path, "/id");
    assert_eq!(err.raw_payload(), Some(&json!({"id": "not-a-number"})));
}

#[cfg(feature = "json-schema")]
#[tokio::test]
async fn test_json_schema_validation() {
    let addr = serve(
        Router::new()
            .route("/users/1", get(user_endpoint))
            .route(
                "/users/2",
                get(|| async { axum::Json(json!({"id": 2, "name": 42})) }),
            ),
    )
    .await;
    let client = client_for(addr);

    let schema = || {
        JsonSchema::compile(&json!({
            "type": "object",
            "required": ["id", "name"],
            "properties": {
                "id": {"type": "integer"},
                "name": {"type": "string"}
            }
        }))
        .unwrap()
    };

    let ok = client
        .get_with_options::<Value>("/users/1", ClientConfig::new().schema(schema()))
        .await
        .unwrap();
    assert_eq!(ok.get_ref()["name"], "Test User");

    let err = client
        .get_with_options::<Value>("/users/2", ClientConfig::new().schema(schema()))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Validation failed");
    assert!(err.issues().iter().any(|i| i.path == "/name"));
    assert_eq!(err.raw_payload(), Some(&json!({"id": 2, "name": 42})));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_statuses() {
    let attempts = Arc::new(AtomicU32::new(0));

    async fn flaky(State(attempts): State<Arc<AtomicU32>>) -> impl IntoResponse {
        let n = attempts.fetch_add(1, Ordering::SeqCst);
        if n < 2 {
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(json!("down")))
        } else {
            (StatusCode::OK, axum::Json(json!("up")))
        }
    }

    let addr = serve(
        Router::new()
            .route("/flaky", get(flaky))
            .with_state(Arc::clone(&attempts)),
    )
    .await;

    let client = FetchClient::builder(format!("http://{addr}"))
        .retry(
            RetryPolicy::new()
                .max_retries(3)
                .base_delay(Duration::from_millis(1))
                .jitter(0.0),
        )
        .build()
        .unwrap();

    let response = client.get::<String>("/flaky").await.unwrap();
    assert_eq!(response.into_inner(), "up");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_no_retry_without_policy() {
    let attempts = Arc::new(AtomicU32::new(0));

    async fn always_down(State(attempts): State<Arc<AtomicU32>>) -> impl IntoResponse {
        attempts.fetch_add(1, Ordering::SeqCst);
        StatusCode::SERVICE_UNAVAILABLE
    }

    let addr = serve(
        Router::new()
            .route("/down", get(always_down))
            .with_state(Arc::clone(&attempts)),
    )
    .await;
    let client = client_for(addr);

    let err = client.get::<Value>("/down").await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_empty_json_body_is_null() {
    let addr = serve(Router::new().route(
        "/empty",
        get(|| async { ([(header::CONTENT_TYPE, "application/json")], "") }),
    ))
    .await;
    let client = client_for(addr);

    let response = client.get::<Value>("/empty").await.unwrap();
    assert_eq!(*response.get_ref(), Value::Null);
}

#[tokio::test]
async fn test_defaults_are_not_mutated_by_calls() {
    let addr = serve(Router::new().route("/users/1", get(user_endpoint))).await;
    let client = FetchClient::builder(format!("http://{addr}"))
        .header("x-api-key", "secret")
        .param("version", 1)
        .build()
        .unwrap();

    client
        .get_with_options::<Value>(
            "/users/1",
            ClientConfig::new().header("x-api-key", "other").param("version", 9),
        )
        .await
        .unwrap();

    assert_eq!(client.defaults().headers.get("x-api-key").unwrap(), "secret");
    assert_eq!(client.defaults().params.get("version"), Some(Some("1")));
}
