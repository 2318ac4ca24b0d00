use log::info;
use shared::{AuthMode, Outcome};
use std::fmt;

/// Running count of completed probes in one pass.
#[derive(Debug)]
pub struct Progress {
    mode: AuthMode,
    total: usize,
    completed: usize,
}

impl Progress {
    pub fn new(mode: AuthMode, total: usize) -> Self {
        info!("Starting {} pass over {} servers", mode.pass_name(), total);
        Self {
            mode,
            total,
            completed: 0,
        }
    }

    pub fn advance(&mut self) {
        self.completed += 1;
        info!(
            "Checked server {}/{} ({} pass)",
            self.completed,
            self.total,
            self.mode.pass_name()
        );
    }

    /// Counts a server the pass did not need to probe.
    pub fn skip(&mut self) {
        self.completed += 1;
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Totals for one scan run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub eligible: usize,
    pub probes: usize,
    pub allowed: usize,
    pub denied: usize,
    pub unsupported: usize,
    pub unknown: usize,
    /// Ping failed or gave no protocol number
    pub unreachable: usize,
    /// Protocol number missing from the catalog
    pub unresolved: usize,
    pub tagged: usize,
    pub deleted: usize,
    pub cancelled: bool,
}

impl ScanSummary {
    pub fn count_outcome(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Allowed => self.allowed += 1,
            Outcome::Denied => self.denied += 1,
            Outcome::Unsupported => self.unsupported += 1,
            Outcome::Unknown => self.unknown += 1,
        }
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} eligible, {} probes (allowed {}, denied {}, unsupported {}, unknown {}), \
             {} unreachable, {} unresolved, {} tagged, {} deleted",
            self.eligible,
            self.probes,
            self.allowed,
            self.denied,
            self.unsupported,
            self.unknown,
            self.unreachable,
            self.unresolved,
            self.tagged,
            self.deleted
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts() {
        let mut progress = Progress::new(AuthMode::Offline, 3);
        progress.advance();
        progress.advance();
        assert_eq!(progress.completed(), 2);
        assert_eq!(progress.total(), 3);
    }

    #[test]
    fn test_skipped_servers_count_toward_total() {
        let mut progress = Progress::new(AuthMode::Authenticated, 4);
        progress.skip();
        progress.advance();
        progress.skip();
        progress.advance();
        assert_eq!(progress.completed(), progress.total());
    }

    #[test]
    fn test_summary_outcomes_and_display() {
        let mut summary = ScanSummary {
            eligible: 4,
            probes: 3,
            ..ScanSummary::default()
        };
        summary.count_outcome(Outcome::Allowed);
        summary.count_outcome(Outcome::Unknown);
        summary.count_outcome(Outcome::Unknown);
        summary.cancelled = true;

        assert_eq!(summary.allowed, 1);
        assert_eq!(summary.unknown, 2);
        let text = summary.to_string();
        assert!(text.starts_with("4 eligible, 3 probes (allowed 1"));
        assert!(text.ends_with("(cancelled)"));
    }
}
