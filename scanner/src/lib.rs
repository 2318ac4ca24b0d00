//! # Bookmark Scanner Library
//!
//! This library checks the access policy of every bookmarked game server that
//! opted into scanning, then tags or removes bookmarks based on what it finds.
//!
//! ## Core Responsibilities
//!
//! ### Two Probe Passes
//! - **Cracked pass**: joins with an unverified offline session to learn whether
//!   the server accepts players without an account. Runs with a bounded number
//!   of probes in flight.
//! - **Whitelist pass**: joins with a verified account to learn whether the
//!   server enforces an allow-list. Runs strictly one server at a time.
//!
//! ### Intent-Driven Mutation
//! Each pass has an intent. `true` removes servers with the positive finding,
//! `false` tags them, and an unset intent skips the pass. Servers that give no
//! usable answer are handled by the `deleteOffline` and `deleteUnsupported`
//! switches. Tags are appended to the label at most once.
//!
//! ### Safe Persistence
//! Deletions are collected during the scan and applied once as a filter over
//! the loaded list. Bookmarks that were never eligible are written back exactly
//! as they were read.
//!
//! ## Module Organization
//!
//! ### Catalog (`catalog`)
//! Resolves the protocol number from a server ping to a client version string.
//!
//! ### Config (`config`)
//! JSON configuration, defaults and validation.
//!
//! ### Orchestrator (`orchestrator`)
//! Eligibility, pass scheduling, cancellation and the [`orchestrator::run`] entry point.
//!
//! ### Policy (`policy`)
//! The pure mapping from probe outcome and intent to a [`policy::Decision`].
//!
//! ### Progress (`progress`)
//! Per-pass progress reporting and the run summary.
//!
//! ### Store (`store`)
//! The record store boundary and the deferred deletion filter.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use scanner::catalog::HttpCatalog;
//! use scanner::config::ScanConfig;
//! use scanner::orchestrator::{run, CancelFlag, Collaborators};
//! use scanner::store::BincodeStore;
//! use prober::network::CommandClient;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScanConfig::from_file(Path::new("config.json"))?;
//!     let client = Arc::new(CommandClient::new(&config.client_command, config.ping_timeout())?);
//!
//!     let collaborators = Collaborators {
//!         store: Arc::new(BincodeStore::new(&config.store_path)),
//!         catalog: Arc::new(HttpCatalog::new(&config.catalog_url)),
//!         pinger: client.clone(),
//!         join_client: client,
//!     };
//!
//!     let summary = run(config, collaborators, CancelFlag::new(), false).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod policy;
pub mod progress;
pub mod store;
