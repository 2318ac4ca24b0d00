//! Boundary with the external game-protocol client
//!
//! The scanner never speaks the game protocol itself. Everything it needs from a
//! protocol client is captured by two capabilities:
//! - [`Pinger`]: a single status round-trip that reports the advertised protocol number
//! - [`JoinClient`]: one join attempt that yields a stream of [`ProbeEvent`]s
//!
//! Implementations may be real network clients, bridges to helper programs
//! (see [`crate::network::CommandClient`]) or scripted fakes in tests.

use async_trait::async_trait;
use serde::Deserialize;
use shared::{AuthMode, ProbeEvent};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to start protocol client: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("protocol client setup failed: {0}")]
    Setup(String),
    #[error("server unreachable: {0}")]
    Unreachable(String),
    #[error("malformed status response: {0}")]
    Malformed(String),
    #[error("timed out")]
    Timeout,
}

/// Answer to a server status query.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct StatusResponse {
    pub protocol: i32,
}

/// Everything the protocol client needs to attempt one join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinRequest {
    pub username: String,
    pub auth_mode: AuthMode,
    pub host: String,
    pub port: u16,
    pub version: String,
}

#[async_trait]
pub trait Pinger: Send + Sync {
    async fn ping(&self, host: &str, port: u16) -> Result<StatusResponse, ProbeError>;
}

/// Starts a join attempt.
///
/// The returned receiver yields lifecycle events until the client gives up or
/// the receiver is dropped; dropping it must end the session.
#[async_trait]
pub trait JoinClient: Send + Sync {
    async fn join(&self, request: &JoinRequest) -> Result<mpsc::Receiver<ProbeEvent>, ProbeError>;
}
