//! Bridge to an external protocol-client helper program
//!
//! The helper is invoked once per operation:
//! - `<cmd> ping <host> <port>` prints one JSON line such as `{"protocol":765}`
//! - `<cmd> join <username> <offline|microsoft> <host> <port> <version>` prints
//!   one JSON event per line (`{"event":"login"}`, `{"event":"kicked","reason":"..."}`,
//!   `{"event":"error","reason":"..."}`) for as long as the session lives
//!
//! The join helper is killed as soon as the probe stops listening.

use crate::protocol::{JoinClient, JoinRequest, Pinger, ProbeError, StatusResponse};
use async_trait::async_trait;
use log::{debug, warn};
use shared::ProbeEvent;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::timeout;

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone)]
pub struct CommandClient {
    program: String,
    args: Vec<String>,
    ping_timeout: Duration,
}

impl CommandClient {
    /// `command` is the helper program followed by any fixed leading arguments.
    pub fn new(command: &[String], ping_timeout: Duration) -> Result<Self, ProbeError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| ProbeError::Setup("empty client command".to_string()))?;

        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            ping_timeout,
        })
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).stdin(Stdio::null()).kill_on_drop(true);
        command
    }
}

/// Extracts the status from the helper's ping output.
///
/// The first line that parses wins; anything else the helper prints is noise.
pub fn parse_status(output: &str) -> Result<StatusResponse, ProbeError> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find_map(|line| serde_json::from_str::<StatusResponse>(line).ok())
        .ok_or_else(|| ProbeError::Malformed(output.trim().to_string()))
}

/// Parses one line of join output. Blank or foreign lines yield None.
pub fn parse_event(line: &str) -> Option<ProbeEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            debug!("Ignoring helper output {:?}: {}", line, e);
            None
        }
    }
}

#[async_trait]
impl Pinger for CommandClient {
    async fn ping(&self, host: &str, port: u16) -> Result<StatusResponse, ProbeError> {
        let mut command = self.command();
        command
            .arg("ping")
            .arg(host)
            .arg(port.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = timeout(self.ping_timeout, command.output())
            .await
            .map_err(|_| ProbeError::Timeout)??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProbeError::Unreachable(stderr.trim().to_string()));
        }

        parse_status(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl JoinClient for CommandClient {
    async fn join(&self, request: &JoinRequest) -> Result<mpsc::Receiver<ProbeEvent>, ProbeError> {
        let mut child = self
            .command()
            .arg("join")
            .arg(&request.username)
            .arg(request.auth_mode.client_name())
            .arg(&request.host)
            .arg(request.port.to_string())
            .arg(&request.version)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProbeError::Setup("helper stdout not captured".to_string()))?;

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();

            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    line = lines.next_line() => match line {
                        Ok(Some(line)) => {
                            if let Some(event) = parse_event(&line) {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let _ = tx.send(ProbeEvent::Error { reason: e.to_string() }).await;
                            break;
                        }
                    },
                }
            }

            if let Err(e) = child.kill().await {
                warn!("Failed to stop probe helper: {}", e);
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        let result = CommandClient::new(&[], Duration::from_secs(1));
        assert!(matches!(result, Err(ProbeError::Setup(_))));
    }

    #[test]
    fn test_command_split() {
        let command = vec!["node".to_string(), "probe.js".to_string()];
        let client = CommandClient::new(&command, Duration::from_secs(1)).unwrap();
        assert_eq!(client.program, "node");
        assert_eq!(client.args, vec!["probe.js".to_string()]);
    }

    #[test]
    fn test_parse_status_skips_noise() {
        let status = parse_status("connecting...\n{\"protocol\":765}\n").unwrap();
        assert_eq!(status.protocol, 765);
    }

    #[test]
    fn test_parse_status_requires_protocol() {
        assert!(matches!(
            parse_status("{\"version\":{}}"),
            Err(ProbeError::Malformed(_))
        ));
        assert!(matches!(parse_status(""), Err(ProbeError::Malformed(_))));
    }

    #[test]
    fn test_parse_event_lines() {
        assert_eq!(parse_event("{\"event\":\"login\"}"), Some(ProbeEvent::Login));
        assert_eq!(
            parse_event("{\"event\":\"error\",\"reason\":\"read ECONNRESET\"}"),
            Some(ProbeEvent::Error {
                reason: "read ECONNRESET".to_string()
            })
        );
        assert_eq!(parse_event("   "), None);
        assert_eq!(parse_event("[mineflayer] chat message"), None);
    }

    #[test]
    fn test_missing_helper_fails_setup() {
        let command = vec!["/nonexistent/probe-helper".to_string()];
        let client = CommandClient::new(&command, Duration::from_secs(1)).unwrap();
        let request = JoinRequest {
            username: "Prober".to_string(),
            auth_mode: shared::AuthMode::Offline,
            host: "127.0.0.1".to_string(),
            port: 25565,
            version: "1.20.4".to_string(),
        };

        tokio_test::block_on(async {
            assert!(matches!(
                client.join(&request).await,
                Err(ProbeError::Spawn(_))
            ));
            assert!(matches!(
                client.ping("127.0.0.1", 25565).await,
                Err(ProbeError::Spawn(_))
            ));
        });
    }
}
