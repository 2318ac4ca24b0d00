//! Outcome to mutation policy
//!
//! The two probe modes read outcomes differently. For the cracked pass
//! `Allowed` means the server accepted an unverified session; for the
//! whitelist pass it means the server enforces an allow-list the probing
//! account is not on. `intent` says what the operator wants done with a
//! positive finding: `true` removes the server, `false` tags it.

use shared::{AuthMode, Outcome, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PolicyFlags {
    pub delete_offline: bool,
    pub delete_unsupported: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    NoOp,
    Delete,
    AppendTag(Tag),
    AppendTagAndDelete(Tag),
}

impl Decision {
    pub fn tag(self) -> Option<Tag> {
        match self {
            Decision::AppendTag(tag) | Decision::AppendTagAndDelete(tag) => Some(tag),
            Decision::NoOp | Decision::Delete => None,
        }
    }

    pub fn deletes(self) -> bool {
        matches!(self, Decision::Delete | Decision::AppendTagAndDelete(_))
    }
}

pub fn decide(mode: AuthMode, outcome: Outcome, intent: bool, flags: PolicyFlags) -> Decision {
    match (mode, outcome, intent) {
        (_, Outcome::Unsupported, _) if flags.delete_unsupported => {
            Decision::AppendTagAndDelete(Tag::UnsupportedVersion)
        }
        (_, Outcome::Unsupported, _) => Decision::AppendTag(Tag::UnsupportedVersion),
        (_, Outcome::Unknown, _) if flags.delete_offline => Decision::Delete,
        (_, Outcome::Unknown, _) => Decision::NoOp,

        (AuthMode::Offline, Outcome::Allowed, false) => Decision::AppendTag(Tag::Cracked),
        (AuthMode::Offline, Outcome::Denied, true) => Decision::Delete,
        (AuthMode::Authenticated, Outcome::Allowed, true) => Decision::Delete,
        (AuthMode::Authenticated, Outcome::Allowed, false) => Decision::AppendTag(Tag::Whitelisted),

        _ => Decision::NoOp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_FLAGS: PolicyFlags = PolicyFlags {
        delete_offline: false,
        delete_unsupported: false,
    };

    #[test]
    fn test_cracked_pass_table() {
        use AuthMode::Offline;
        assert_eq!(
            decide(Offline, Outcome::Allowed, false, NO_FLAGS),
            Decision::AppendTag(Tag::Cracked)
        );
        assert_eq!(decide(Offline, Outcome::Allowed, true, NO_FLAGS), Decision::NoOp);
        assert_eq!(decide(Offline, Outcome::Denied, true, NO_FLAGS), Decision::Delete);
        assert_eq!(decide(Offline, Outcome::Denied, false, NO_FLAGS), Decision::NoOp);
    }

    #[test]
    fn test_whitelist_pass_table() {
        use AuthMode::Authenticated;
        assert_eq!(
            decide(Authenticated, Outcome::Allowed, true, NO_FLAGS),
            Decision::Delete
        );
        assert_eq!(
            decide(Authenticated, Outcome::Allowed, false, NO_FLAGS),
            Decision::AppendTag(Tag::Whitelisted)
        );
        assert_eq!(
            decide(Authenticated, Outcome::Denied, true, NO_FLAGS),
            Decision::NoOp
        );
        assert_eq!(
            decide(Authenticated, Outcome::Denied, false, NO_FLAGS),
            Decision::NoOp
        );
    }

    #[test]
    fn test_unsupported_in_any_mode() {
        let delete = PolicyFlags {
            delete_unsupported: true,
            ..NO_FLAGS
        };
        for mode in [AuthMode::Offline, AuthMode::Authenticated] {
            for intent in [true, false] {
                assert_eq!(
                    decide(mode, Outcome::Unsupported, intent, NO_FLAGS),
                    Decision::AppendTag(Tag::UnsupportedVersion)
                );
                let decision = decide(mode, Outcome::Unsupported, intent, delete);
                assert_eq!(decision, Decision::AppendTagAndDelete(Tag::UnsupportedVersion));
                assert!(decision.deletes());
                assert_eq!(decision.tag(), Some(Tag::UnsupportedVersion));
            }
        }
    }

    #[test]
    fn test_unknown_follows_delete_offline() {
        let delete = PolicyFlags {
            delete_offline: true,
            ..NO_FLAGS
        };
        for mode in [AuthMode::Offline, AuthMode::Authenticated] {
            for intent in [true, false] {
                assert_eq!(decide(mode, Outcome::Unknown, intent, NO_FLAGS), Decision::NoOp);
                assert_eq!(decide(mode, Outcome::Unknown, intent, delete), Decision::Delete);
            }
        }
    }

    #[test]
    fn test_delete_offline_does_not_touch_answers() {
        let flags = PolicyFlags {
            delete_offline: true,
            delete_unsupported: true,
        };
        assert_eq!(
            decide(AuthMode::Authenticated, Outcome::Denied, false, flags),
            Decision::NoOp
        );
        assert_eq!(
            decide(AuthMode::Offline, Outcome::Allowed, false, flags),
            Decision::AppendTag(Tag::Cracked)
        );
    }

    #[test]
    fn test_decision_accessors() {
        assert!(!Decision::NoOp.deletes());
        assert_eq!(Decision::NoOp.tag(), None);
        assert!(Decision::Delete.deletes());
        assert_eq!(Decision::Delete.tag(), None);
        assert!(!Decision::AppendTag(Tag::Cracked).deletes());
    }
}
