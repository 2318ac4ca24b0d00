//! Join classification
//!
//! Reduces the event stream of one join attempt to a single [`Outcome`].
//! Each attempt is a small state machine:
//!
//! ```text
//! Connecting --login (offline)--------> Allowed
//! Connecting --login (authenticated)--> Confirming
//! Connecting --timeout / stream end---> Unknown
//! Confirming --window elapsed / end---> Denied
//! any        --kicked / error---------> matcher decides
//! ```
//!
//! An error the matcher recognises as rate limiting makes the attempt
//! non-terminal; [`JoinClassifier::classify`] retries it after the configured
//! delay until a terminal outcome is produced.

use crate::matcher::{ErrorClass, ReasonMatcher};
use crate::protocol::{JoinClient, JoinRequest};
use log::{debug, warn};
use shared::{AuthMode, Outcome, ProbeEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, sleep_until, timeout_at, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierSettings {
    /// Time allowed from starting the attempt until a login or a kick
    pub connect_timeout: Duration,
    /// How long an authenticated session must survive after login
    pub confirm_window: Duration,
    /// Pause between rate-limited attempts
    pub retry_delay: Duration,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(6000),
            confirm_window: Duration::from_millis(3000),
            retry_delay: Duration::from_millis(1000),
        }
    }
}

/// Result of a single join attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Settled(Outcome),
    RateLimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connecting,
    Confirming,
}

impl Phase {
    /// Outcome when the phase ends without a kick or an error.
    fn quiet_end(self) -> Outcome {
        match self {
            Phase::Connecting => Outcome::Unknown,
            Phase::Confirming => Outcome::Denied,
        }
    }
}

pub struct JoinClassifier {
    client: Arc<dyn JoinClient>,
    matcher: ReasonMatcher,
    settings: ClassifierSettings,
}

impl JoinClassifier {
    pub fn new(
        client: Arc<dyn JoinClient>,
        matcher: ReasonMatcher,
        settings: ClassifierSettings,
    ) -> Self {
        Self {
            client,
            matcher,
            settings,
        }
    }

    /// Probes until the server gives a terminal answer.
    ///
    /// Rate-limited attempts are retried without an upper bound.
    pub async fn classify(&self, request: &JoinRequest) -> Outcome {
        let mut attempts = 1u32;
        loop {
            match self.attempt(request).await {
                Attempt::Settled(outcome) => return outcome,
                Attempt::RateLimited => {
                    debug!(
                        "{}:{} rate limited on attempt {}, retrying in {:?}",
                        request.host, request.port, attempts, self.settings.retry_delay
                    );
                    if attempts % 10 == 0 {
                        warn!(
                            "{}:{} still rate limited after {} attempts",
                            request.host, request.port, attempts
                        );
                    }
                    sleep(self.settings.retry_delay).await;
                    attempts += 1;
                }
            }
        }
    }

    /// Runs exactly one join attempt.
    pub async fn attempt(&self, request: &JoinRequest) -> Attempt {
        let deadline = Instant::now() + self.settings.connect_timeout;

        let events = match timeout_at(deadline, self.client.join(request)).await {
            Ok(Ok(events)) => events,
            Ok(Err(e)) => {
                warn!(
                    "Could not start probe on {}:{}: {}",
                    request.host, request.port, e
                );
                return Attempt::Settled(Outcome::Unsupported);
            }
            Err(_) => return Attempt::Settled(Outcome::Unknown),
        };

        self.drive(events, request.auth_mode, deadline).await
    }

    async fn drive(
        &self,
        mut events: mpsc::Receiver<ProbeEvent>,
        mode: AuthMode,
        deadline: Instant,
    ) -> Attempt {
        let mut phase = Phase::Connecting;
        let timer = sleep_until(deadline);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                biased;

                event = events.recv() => {
                    let event = match event {
                        Some(event) => event,
                        None => return Attempt::Settled(phase.quiet_end()),
                    };

                    match event {
                        ProbeEvent::Login => match (mode, phase) {
                            (AuthMode::Offline, _) => return Attempt::Settled(Outcome::Allowed),
                            (AuthMode::Authenticated, Phase::Connecting) => {
                                phase = Phase::Confirming;
                                timer
                                    .as_mut()
                                    .reset(Instant::now() + self.settings.confirm_window);
                            }
                            (AuthMode::Authenticated, Phase::Confirming) => {}
                        },
                        ProbeEvent::Kicked { reason } => {
                            debug!("Kicked ({}): {}", mode, reason);
                            return Attempt::Settled(self.matcher.classify_kick(mode, &reason));
                        }
                        ProbeEvent::Error { reason } => {
                            debug!("Client error ({}): {}", mode, reason);
                            return match self.matcher.classify_error(&reason) {
                                ErrorClass::RateLimited => Attempt::RateLimited,
                                ErrorClass::Unsupported => Attempt::Settled(Outcome::Unsupported),
                                ErrorClass::Other => Attempt::Settled(Outcome::Unknown),
                            };
                        }
                    }
                }

                _ = &mut timer => return Attempt::Settled(phase.quiet_end()),
            }
        }
    }
}
