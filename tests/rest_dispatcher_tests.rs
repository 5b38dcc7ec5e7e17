use hmac::{Hmac, Mac};
use httpmock::MockServer;
use mbx_trade::core::audit::{MemoryAuditSink, REDACTED};
use mbx_trade::core::errors::ExchangeError;
use mbx_trade::core::kernel::{
    HmacSigner, RequestSpec, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig,
    API_KEY_HEADER,
};
use serde_json::{json, Value};
use sha2::Sha256;
use std::sync::Arc;

const API_KEY: &str = "vmPUZE6mv9SD5VNHk4HlWFsOr6aKE2zvsw0MuIgwCIPy6utIco14y7Ju91duEh8A";
const SECRET: &str = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

fn rest_client(base_url: &str, api_key: &str, secret: &str) -> ReqwestRest {
    RestClientBuilder::new(RestClientConfig::new(base_url.to_string(), "binance".to_string()))
        .with_signer(Arc::new(HmacSigner::new(api_key.to_string(), secret.to_string())))
        .build()
        .unwrap()
}

fn audited_client(base_url: &str, sink: MemoryAuditSink) -> ReqwestRest {
    RestClientBuilder::new(RestClientConfig::new(base_url.to_string(), "binance".to_string()))
        .with_signer(Arc::new(HmacSigner::new(API_KEY.to_string(), SECRET.to_string())))
        .with_audit_sink(Arc::new(sink))
        .build()
        .unwrap()
}

fn hmac_hex(secret: &str, message: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
async fn signed_call_with_empty_secret_never_reaches_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.path("/api/v3/account");
        then.status(200).json_body(json!({"balances": []}));
    });

    let rest = rest_client(&server.base_url(), API_KEY, "");
    let result: Result<Value, _> = rest
        .execute(RequestSpec::get("/api/v3/account").signed())
        .await;

    assert!(matches!(result, Err(ExchangeError::MissingCredentials)));
    mock.assert_calls(0);
}

#[tokio::test]
async fn signed_call_with_empty_api_key_never_reaches_network() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.path("/api/v3/openOrders");
        then.status(200).json_body(json!([]));
    });

    let rest = rest_client(&server.base_url(), "", SECRET);
    let result: Result<Vec<Value>, _> = rest
        .get_json("/api/v3/openOrders", Vec::new(), true)
        .await;

    assert!(matches!(result, Err(ExchangeError::MissingCredentials)));
    mock.assert_calls(0);
}

#[tokio::test]
async fn signed_call_carries_header_timestamp_and_signature() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/api/v3/order")
            .header(API_KEY_HEADER, API_KEY)
            .header("Accept", "application/json")
            .query_param("symbol", "LTCBTC")
            .query_param("orderId", "42")
            .query_param_exists("timestamp")
            .query_param_exists("signature");
        then.status(200).json_body(json!({"ok": true}));
    });

    let rest = rest_client(&server.base_url(), API_KEY, SECRET);
    let body: Value = rest
        .execute(
            RequestSpec::get("/api/v3/order")
                .signed()
                .param("symbol", "LTCBTC")
                .param("orderId", 42),
        )
        .await
        .unwrap();

    assert_eq!(body["ok"], true);
    mock.assert();
}

#[tokio::test]
async fn sent_query_reproduces_its_signature() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/api/v3/order");
        then.status(200).json_body(json!({"symbol": "LTCBTC", "orderId": 1}));
    });

    let sink = MemoryAuditSink::new();
    let rest = audited_client(&server.base_url(), sink.clone());

    let _: Value = rest
        .execute(
            RequestSpec::post("/api/v3/order")
                .signed()
                .param("symbol", "LTCBTC")
                .param("side", "BUY")
                .param("type", "LIMIT")
                .param("timeInForce", "GTC")
                .param("quantity", "1")
                .param("price", "0.1")
                .param("recvWindow", 5000),
        )
        .await
        .unwrap();

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);

    let (_, query) = entries[0].url.split_once('?').unwrap();
    let (signed, signature) = query.rsplit_once("&signature=").unwrap();

    assert!(signed.starts_with(
        "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp="
    ));
    assert_eq!(signature, hmac_hex(SECRET, signed));
    assert_eq!(signature.len(), 64);
}

#[tokio::test]
async fn non_success_status_passes_body_through() {
    let server = MockServer::start();
    let error_body = r#"{"code":-1121,"msg":"Invalid symbol."}"#;
    server.mock(|when, then| {
        when.path("/api/v3/order");
        then.status(400)
            .header("content-type", "application/json")
            .body(error_body);
    });

    let rest = rest_client(&server.base_url(), API_KEY, SECRET);
    let err = rest
        .execute::<Value>(RequestSpec::get("/api/v3/order").signed().param("symbol", "NOPE"))
        .await
        .unwrap_err();

    match &err {
        ExchangeError::RemoteRejected { status, body } => {
            assert_eq!(*status, 400);
            assert_eq!(body, error_body);
        }
        other => panic!("expected RemoteRejected, got {other:?}"),
    }
    let remote = err.remote_code().unwrap();
    assert_eq!(remote.code, -1121);
    assert_eq!(remote.msg, "Invalid symbol.");
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn undecodable_success_body_is_malformed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.path("/api/v3/account");
        then.status(200).body("<html>maintenance</html>");
    });

    let rest = rest_client(&server.base_url(), API_KEY, SECRET);
    let err = rest
        .execute::<Value>(RequestSpec::get("/api/v3/account").signed())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExchangeError::MalformedResponse { ref body, .. } if body == "<html>maintenance</html>"
    ));
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    // Port 9 (discard) is closed on test machines.
    let rest = rest_client("http://127.0.0.1:9", API_KEY, SECRET);
    let err = rest
        .execute::<Value>(RequestSpec::get("/api/v3/account").signed())
        .await
        .unwrap_err();

    assert!(matches!(err, ExchangeError::Transport(_)), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn public_call_is_not_signed() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/api/v3/ping")
            .query_param("symbol", "BNBBTC");
        then.status(200).json_body(json!({}));
    });

    let sink = MemoryAuditSink::new();
    let rest = audited_client(&server.base_url(), sink.clone());
    let _: Value = rest
        .execute(RequestSpec::get("/api/v3/ping").param("symbol", "BNBBTC"))
        .await
        .unwrap();

    mock.assert();
    let entries = sink.entries();
    assert!(!entries[0].url.contains("signature="));
    assert!(!entries[0].url.contains("timestamp="));
    assert!(entries[0]
        .request_headers
        .iter()
        .all(|(name, _)| name != API_KEY_HEADER));
}

#[tokio::test]
async fn audit_entry_redacts_api_key_and_keeps_rejections() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.path("/api/v3/myTrades");
        then.status(418).body(r#"{"code":-1003,"msg":"banned"}"#);
    });

    let sink = MemoryAuditSink::new();
    let rest = audited_client(&server.base_url(), sink.clone());
    let result = rest
        .execute::<Value>(RequestSpec::get("/api/v3/myTrades").signed().param("symbol", "BNBBTC"))
        .await;

    assert!(matches!(
        result,
        Err(ExchangeError::RemoteRejected { status: 418, .. })
    ));

    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.response_status, 418);
    assert_eq!(entry.response_body, r#"{"code":-1003,"msg":"banned"}"#);
    assert!(entry.query_time <= entry.response_time);
    assert!(entry
        .request_headers
        .contains(&(API_KEY_HEADER.to_string(), REDACTED.to_string())));
    assert!(!serde_json::to_string(entry).unwrap().contains(API_KEY));
}
