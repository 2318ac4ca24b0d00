use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_PORT: u16 = 25565;
pub const DEFAULT_WATCH_MARKER: &str = "Re:SS";

/// One bookmark entry from the record store.
///
/// `opaque` carries every field of the persisted entry other than the address
/// and the name. It is never interpreted and is written back exactly as loaded.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Record {
    pub address: String,
    pub label: String,
    pub opaque: Vec<u8>,
}

impl Record {
    pub fn new(address: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: label.into(),
            opaque: Vec::new(),
        }
    }

    pub fn with_opaque(mut self, opaque: Vec<u8>) -> Self {
        self.opaque = opaque;
        self
    }

    pub fn endpoint(&self) -> Option<Endpoint> {
        Endpoint::parse(&self.address)
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        has_tag(&self.label, tag)
    }

    /// Appends `tag` to the label unless it is already there.
    /// Returns true when the label changed.
    pub fn append_tag(&mut self, tag: Tag) -> bool {
        append_tag(&mut self.label, tag)
    }
}

/// Host and port of a bookmarked server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parses `host`, `host:port`, `[v6]` or `[v6]:port`.
    /// Returns None for an empty host or a port that is not a valid u16.
    pub fn parse(address: &str) -> Option<Self> {
        let address = address.trim();

        let (host, port) = if let Some(rest) = address.strip_prefix('[') {
            let (host, tail) = rest.split_once(']')?;
            match tail {
                "" => (host, None),
                _ => (host, Some(tail.strip_prefix(':')?)),
            }
        } else {
            match address.split_once(':') {
                // More than one colon without brackets is a bare IPv6 address
                Some((_, tail)) if tail.contains(':') => (address, None),
                Some((host, port)) => (host, Some(port)),
                None => (address, None),
            }
        };

        if host.is_empty() {
            return None;
        }

        let port = match port {
            Some(port) => port.parse().ok()?,
            None => DEFAULT_PORT,
        };

        Some(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How a probe authenticates against the target server.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Unverified session, used by the cracked pass
    Offline,
    /// Verified account session, used by the whitelist pass
    Authenticated,
}

impl AuthMode {
    /// Name of the mode as the protocol client understands it.
    pub fn client_name(self) -> &'static str {
        match self {
            AuthMode::Offline => "offline",
            AuthMode::Authenticated => "microsoft",
        }
    }

    /// Name of the scan pass that uses this mode.
    pub fn pass_name(self) -> &'static str {
        match self {
            AuthMode::Offline => "cracked",
            AuthMode::Authenticated => "whitelist",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.client_name())
    }
}

/// Terminal result of one probe against one server.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Allowed,
    Denied,
    Unsupported,
    Unknown,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Allowed => "allowed",
            Outcome::Denied => "denied",
            Outcome::Unsupported => "unsupported",
            Outcome::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Lifecycle events emitted by the protocol client during one join attempt.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ProbeEvent {
    Login,
    Kicked { reason: String },
    Error { reason: String },
}

/// Tags the scanner writes into record labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Cracked,
    Whitelisted,
    UnsupportedVersion,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Cracked => "cracked",
            Tag::Whitelisted => "whitelisted",
            Tag::UnsupportedVersion => "UNSUPPORTEDVERSION",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tag is present when it is one of the label's whitespace-separated words,
/// in any letter case.
pub fn has_tag(label: &str, tag: Tag) -> bool {
    label
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case(tag.as_str()))
}

pub fn append_tag(label: &mut String, tag: Tag) -> bool {
    if has_tag(label, tag) {
        return false;
    }

    if !label.is_empty() && !label.ends_with(char::is_whitespace) {
        label.push(' ');
    }
    label.push_str(tag.as_str());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_default_port() {
        let endpoint = Endpoint::parse("play.example.net").unwrap();
        assert_eq!(endpoint.host, "play.example.net");
        assert_eq!(endpoint.port, DEFAULT_PORT);
    }

    #[test]
    fn test_endpoint_explicit_port() {
        let endpoint = Endpoint::parse("play.example.net:25566").unwrap();
        assert_eq!(endpoint.host, "play.example.net");
        assert_eq!(endpoint.port, 25566);
        assert_eq!(endpoint.to_string(), "play.example.net:25566");
    }

    #[test]
    fn test_endpoint_ipv6() {
        let endpoint = Endpoint::parse("[2001:db8::1]:25570").unwrap();
        assert_eq!(endpoint.host, "2001:db8::1");
        assert_eq!(endpoint.port, 25570);
        assert_eq!(endpoint.to_string(), "[2001:db8::1]:25570");

        let bare = Endpoint::parse("2001:db8::1").unwrap();
        assert_eq!(bare.host, "2001:db8::1");
        assert_eq!(bare.port, DEFAULT_PORT);
    }

    #[test]
    fn test_endpoint_rejects_garbage() {
        assert!(Endpoint::parse("").is_none());
        assert!(Endpoint::parse(":25565").is_none());
        assert!(Endpoint::parse("host:notaport").is_none());
        assert!(Endpoint::parse("host:70000").is_none());
        assert!(Endpoint::parse("[::1]x").is_none());
    }

    #[test]
    fn test_append_tag_once() {
        let mut label = String::from("Re:SS Fun Server");
        assert!(append_tag(&mut label, Tag::Cracked));
        assert_eq!(label, "Re:SS Fun Server cracked");

        assert!(!append_tag(&mut label, Tag::Cracked));
        assert_eq!(label, "Re:SS Fun Server cracked");
    }

    #[test]
    fn test_append_tag_idempotent_for_every_tag() {
        for tag in [Tag::Cracked, Tag::Whitelisted, Tag::UnsupportedVersion] {
            let mut once = String::from("Re:SS Survival");
            append_tag(&mut once, tag);

            let mut twice = String::from("Re:SS Survival");
            append_tag(&mut twice, tag);
            append_tag(&mut twice, tag);

            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_tag_is_a_whole_word() {
        // "crackedpvp" is part of the server name, not the tag
        let mut label = String::from("Re:SS crackedpvp");
        assert!(!has_tag(&label, Tag::Cracked));
        assert!(append_tag(&mut label, Tag::Cracked));
        assert_eq!(label, "Re:SS crackedpvp cracked");
    }

    #[test]
    fn test_tag_match_ignores_case() {
        let mut label = "Re:SS Castle Whitelisted".to_string();
        assert!(has_tag(&label, Tag::Whitelisted));
        assert!(has_tag("Re:SS Old unsupportedversion", Tag::UnsupportedVersion));
        assert!(!append_tag(&mut label, Tag::Whitelisted));
        assert_eq!(label, "Re:SS Castle Whitelisted");
        assert!(!has_tag("Re:SS Whitelisted2", Tag::Whitelisted));
    }

    #[test]
    fn test_append_tag_to_empty_label() {
        let mut label = String::new();
        append_tag(&mut label, Tag::Whitelisted);
        assert_eq!(label, "whitelisted");
    }

    #[test]
    fn test_record_tags() {
        let mut record = Record::new("host", "Re:SS Box").with_opaque(vec![1, 2, 3]);
        assert!(!record.has_tag(Tag::Whitelisted));
        assert!(record.append_tag(Tag::Whitelisted));
        assert!(record.has_tag(Tag::Whitelisted));
        assert_eq!(record.opaque, vec![1, 2, 3]);
    }

    #[test]
    fn test_probe_event_json_shape() {
        let login: ProbeEvent = serde_json::from_str(r#"{"event":"login"}"#).unwrap();
        assert_eq!(login, ProbeEvent::Login);

        let kicked: ProbeEvent =
            serde_json::from_str(r#"{"event":"kicked","reason":"You are banned"}"#).unwrap();
        assert_eq!(
            kicked,
            ProbeEvent::Kicked {
                reason: "You are banned".to_string()
            }
        );
    }

    #[test]
    fn test_auth_mode_names() {
        assert_eq!(AuthMode::Offline.client_name(), "offline");
        assert_eq!(AuthMode::Authenticated.client_name(), "microsoft");
        assert_eq!(AuthMode::Offline.pass_name(), "cracked");
        assert_eq!(AuthMode::Authenticated.pass_name(), "whitelist");
    }
}
