//! Shared utilities for integration tests.
#![allow(dead_code)]

use axum::http::{header::AUTHORIZATION, HeaderValue};
use chrono::{Duration as ChronoDuration, Utc};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use gatehouse::config::GatewayConfig;
use gatehouse::http::GatewayServer;
use gatehouse::lifecycle::Shutdown;
use gatehouse::observability::ResponseTimer;
use gatehouse::pipeline::{Call, Chain, Pipeline, Reply, Status};
use gatehouse::security::{authorize, Authenticator, RateLimiter, RevocationStore, TokenClaims, TokenIssuer};
use gatehouse::service::{session, LogoutHandler, ServiceRegistry, WhoAmIHandler};

pub const SECRET: &str = "integration-test-secret-0123456789";
pub const GET_EXECS: &str = "/main.ExecsService/GetExecs";

/// A running pipeline and the shared state behind it.
pub struct Harness {
    pub pipeline: Pipeline,
    pub limiter: Arc<RateLimiter>,
    pub revocations: Arc<RevocationStore>,
}

/// Rate limiter → response timer → authenticator in front of a registry
/// holding the session operations and an admin/manager-only listing.
pub fn harness(limit: u64, window: Duration) -> Harness {
    let limiter = Arc::new(RateLimiter::new(limit, window).unwrap());
    let revocations = Arc::new(RevocationStore::new());
    let skip = [session::LOGIN, "/main.ExecsService/ForgotPassword", "/main.ExecsService/ResetPassword"];

    let registry = ServiceRegistry::new()
        .register(session::LOGOUT, LogoutHandler::new(revocations.clone()))
        .register(session::WHO_AM_I, WhoAmIHandler)
        .register(session::LOGIN, |_call: Call| async {
            Ok::<_, Status>(Reply::new(r#"{"status":true,"token":""}"#))
        })
        .register(GET_EXECS, |call: Call| async move {
            let identity = authorize(&call, &["admin", "manager"])?;
            Reply::json(&serde_json::json!({ "execs": [], "requested_by": identity.username }))
        });

    let pipeline = Chain::new()
        .with(limiter.clone())
        .with(Arc::new(ResponseTimer::new()))
        .with(Arc::new(Authenticator::new(SECRET, skip, revocations.clone())))
        .wrap(registry);

    Harness {
        pipeline,
        limiter,
        revocations,
    }
}

pub fn issuer() -> TokenIssuer {
    TokenIssuer::new(SECRET, Duration::from_secs(3600)).unwrap()
}

pub fn token(role: &str) -> String {
    issuer().issue("64f0c0ffee64f0c0ffee64f0", "ada", role).unwrap().token
}

pub fn expired_token() -> String {
    issuer()
        .sign(&TokenClaims {
            uid: "64f0c0ffee64f0c0ffee64f0".into(),
            username: "ada".into(),
            role: "admin".into(),
            exp: (Utc::now() - ChronoDuration::seconds(5)).timestamp(),
        })
        .unwrap()
}

pub fn client(last_octet: u8) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)), 40000)
}

/// A call from `peer`, optionally carrying a bearer credential.
pub fn call(peer: SocketAddr, method: &str, token: Option<&str>) -> Call {
    let call = Call::new(method, "{}").with_peer(peer);
    match token {
        Some(token) => call.with_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        ),
        None => call,
    }
}

/// Serve `pipeline` on an ephemeral local port.
pub async fn start_gateway(pipeline: Pipeline) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        GatewayServer::new(GatewayConfig::default(), pipeline)
            .run(listener, receiver)
            .await
            .unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    (addr, shutdown)
}
