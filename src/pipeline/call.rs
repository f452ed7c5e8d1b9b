//! Per-call execution context and reply.

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::pipeline::Status;

/// Principal resolved by the authenticator for a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallIdentity {
    pub subject_id: String,
    pub username: String,
    pub role: String,
    /// Natural expiry of the credential that produced this identity.
    pub expires_at: DateTime<Utc>,
}

/// One inbound call travelling through the chain.
#[derive(Debug, Clone)]
pub struct Call {
    method: String,
    peer: Option<SocketAddr>,
    metadata: HeaderMap,
    payload: Bytes,
    identity: Option<CallIdentity>,
}

impl Call {
    /// Create a call for a fully-qualified operation name such as
    /// `/main.ExecsService/Login`.
    pub fn new(method: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            method: method.into(),
            peer: None,
            metadata: HeaderMap::new(),
            payload: payload.into(),
            identity: None,
        }
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    pub fn with_metadata(mut self, metadata: HeaderMap) -> Self {
        self.metadata = metadata;
        self
    }

    /// Add a single inbound metadata entry.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.metadata.insert(name, value);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Decode the JSON payload, mapping malformed input to `InvalidArgument`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Status> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| Status::invalid_argument(format!("malformed request: {}", e)))
    }

    pub fn identity(&self) -> Option<&CallIdentity> {
        self.identity.as_ref()
    }

    pub(crate) fn set_identity(&mut self, identity: CallIdentity) {
        self.identity = Some(identity);
    }
}

/// Successful call result.
#[derive(Debug, Clone, Default)]
pub struct Reply {
    metadata: HeaderMap,
    payload: Bytes,
}

impl Reply {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            metadata: HeaderMap::new(),
            payload: payload.into(),
        }
    }

    /// Serialize `value` as the JSON payload.
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Status> {
        let body = serde_json::to_vec(value).map_err(Status::internal)?;
        Ok(Self::new(body))
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn metadata(&self) -> &HeaderMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HeaderMap {
        &mut self.metadata
    }

    /// Decode the JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}
