//! Kick and error reason inspection
//!
//! Servers and the protocol client report why a session ended as human-readable
//! text (or a translation key). All knowledge of that text lives here, so the
//! patterns can change without touching the classifier or the scan policy.

use serde::Deserialize;
use shared::{AuthMode, Outcome};

/// What a transport or protocol error means for the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Authentication backend throttled us; try again later
    RateLimited,
    /// The server cannot be joined with the client version we have
    Unsupported,
    Other,
}

/// Substring patterns matched case-insensitively against reasons.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReasonMatcher {
    pub not_whitelisted: Vec<String>,
    pub unverified: Vec<String>,
    pub rate_limited: Vec<String>,
    pub unsupported: Vec<String>,
}

impl Default for ReasonMatcher {
    fn default() -> Self {
        Self {
            not_whitelisted: strings(&[
                "You are not whitelisted on this server",
                "multiplayer.disconnect.not_whitelisted",
                "not white-listed",
            ]),
            unverified: strings(&[
                "Failed to verify username",
                "multiplayer.disconnect.unverified_username",
                "Invalid session",
            ]),
            rate_limited: strings(&[
                "RateLimiter disallowed request",
                "Failed to obtain profile data",
            ]),
            unsupported: strings(&[
                "ECONNRESET",
                "unsupported protocol version",
                "please specify the correct version",
                "multiplayer.disconnect.incompatible",
            ]),
        }
    }
}

impl ReasonMatcher {
    /// Maps a kick reason to an outcome for the given auth mode.
    pub fn classify_kick(&self, mode: AuthMode, reason: &str) -> Outcome {
        if matches_any(&self.not_whitelisted, reason) {
            return Outcome::Allowed;
        }

        match mode {
            AuthMode::Offline if matches_any(&self.unverified, reason) => Outcome::Denied,
            _ => Outcome::Unknown,
        }
    }

    pub fn classify_error(&self, reason: &str) -> ErrorClass {
        if matches_any(&self.rate_limited, reason) {
            ErrorClass::RateLimited
        } else if matches_any(&self.unsupported, reason) {
            ErrorClass::Unsupported
        } else {
            ErrorClass::Other
        }
    }
}

fn strings(patterns: &[&str]) -> Vec<String> {
    patterns.iter().map(|p| p.to_string()).collect()
}

fn matches_any(patterns: &[String], text: &str) -> bool {
    let text = text.to_lowercase();
    patterns
        .iter()
        .filter(|p| !p.is_empty())
        .any(|p| text.contains(&p.to_lowercase()))
}
