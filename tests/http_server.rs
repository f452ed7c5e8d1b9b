//! The gateway served over HTTP.

use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use gatehouse::service::session;

mod common;
use common::{harness, start_gateway, token, GET_EXECS};

#[tokio::test]
async fn test_http_round_trip() {
    let h = harness(100, Duration::from_secs(60));
    let (addr, shutdown) = start_gateway(h.pipeline).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    let res = client
        .post(format!("http://{}{}", addr, GET_EXECS))
        .bearer_auth(token("admin"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-response-time"));
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["requested_by"], "ada");

    shutdown.trigger();
}

#[tokio::test]
async fn test_http_error_mapping() {
    let h = harness(1, Duration::from_secs(60));
    let (addr, shutdown) = start_gateway(h.pipeline).await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("http://{}{}", addr, session::WHO_AM_I))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("x-response-time"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "Unauthenticated");
    assert_eq!(body["message"], "missing authorization metadata");

    // Same loopback client, so the single-call budget is already spent.
    let res = client
        .post(format!("http://{}{}", addr, session::WHO_AM_I))
        .bearer_auth(token("admin"))
        .body("{}")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);

    shutdown.trigger();
}
