//! # Server Probe Library
//!
//! This library turns one connection attempt against a remote game server into a
//! single, well-defined verdict about that server's access policy. It is the
//! part of the scanner that touches the network; everything above it works on
//! plain [`shared::Outcome`] values.
//!
//! ## Architecture Overview
//!
//! ### Protocol Boundary (`protocol`)
//! The game protocol itself is provided by an external client. This crate only
//! depends on two capabilities of it:
//! - a status ping reporting the server's advertised protocol number
//! - a join attempt that emits `login`, `kicked(reason)` and `error(reason)` events
//!
//! ### Classification (`classifier`)
//! A small state machine consumes the event stream of one attempt under a
//! connect timeout and, for authenticated sessions, a post-login confirmation
//! window. Rate-limited attempts are retried after a fixed delay until the
//! server produces a terminal answer, so callers never see a transient state.
//!
//! ### Reason Matching (`matcher`)
//! Kick and error texts are inspected in exactly one place. The patterns are
//! plain data and can be replaced from configuration.
//!
//! ### Helper Bridge (`network`)
//! [`network::CommandClient`] implements both protocol capabilities by running
//! an external helper program and reading JSON lines from its output.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use prober::classifier::{ClassifierSettings, JoinClassifier};
//! use prober::matcher::ReasonMatcher;
//! use prober::network::CommandClient;
//! use prober::protocol::JoinRequest;
//! use shared::AuthMode;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn probe() -> Result<(), Box<dyn std::error::Error>> {
//! let command = vec!["node".to_string(), "probe.js".to_string()];
//! let client = Arc::new(CommandClient::new(&command, Duration::from_secs(5))?);
//! let classifier = JoinClassifier::new(
//!     client,
//!     ReasonMatcher::default(),
//!     ClassifierSettings::default(),
//! );
//!
//! let outcome = classifier
//!     .classify(&JoinRequest {
//!         username: "Prober".to_string(),
//!         auth_mode: AuthMode::Offline,
//!         host: "play.example.net".to_string(),
//!         port: 25565,
//!         version: "1.20.4".to_string(),
//!     })
//!     .await;
//! println!("{}", outcome);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod matcher;
pub mod network;
pub mod protocol;
