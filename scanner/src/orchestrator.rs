//! Scan orchestration
//!
//! A [`Scanner`] owns nothing but configuration and collaborators; the record
//! list is borrowed for the duration of [`Scanner::scan`]. Probe tasks only get
//! cloned inputs and hand their [`ProbeReport`] back, so labels and the
//! deletion set are only ever touched from the orchestrating task.
//!
//! Pass scheduling:
//! - cracked pass: at most `concurrency` probes in flight, completion order free
//! - whitelist pass: one record at a time, in list order
//!
//! Cancellation stops new probes from starting. Probes already running finish
//! and their decisions are applied before the caller saves.
//!
//! A probe helper that cannot be started at all is a local failure, not a
//! silent server: the scan stops and reports [`ScanError::Helper`] so nothing
//! is deleted on its account.

use crate::catalog::{CatalogSource, VersionCatalog};
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::policy::{decide, PolicyFlags};
use crate::progress::{Progress, ScanSummary};
use crate::store::{apply_deletions, DeletionSet, RecordStore};
use log::{debug, error, info, warn};
use prober::classifier::JoinClassifier;
use prober::protocol::{JoinClient, JoinRequest, Pinger, ProbeError};
use shared::{AuthMode, Endpoint, Outcome, Record, Tag};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Cooperative cancel signal shared between the scan and whoever stops it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns true only for the trigger that actually set it.
    pub fn trigger(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What one probe of one record found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeReport {
    /// Address unusable, ping failed or returned no protocol number
    Unreachable,
    /// Protocol number not in the catalog; the record is left alone
    Unresolved { protocol: i32 },
    Classified { version: String, outcome: Outcome },
    /// The probe helper itself could not run
    HelperFailed(String),
}

#[derive(Clone)]
struct ProbeContext {
    username: String,
    pinger: Arc<dyn Pinger>,
    classifier: Arc<JoinClassifier>,
    catalog: Arc<VersionCatalog>,
}

impl ProbeContext {
    async fn probe(self, address: String, mode: AuthMode) -> ProbeReport {
        let Some(endpoint) = Endpoint::parse(&address) else {
            warn!("Cannot parse server address {:?}", address);
            return ProbeReport::Unreachable;
        };

        let status = match self.pinger.ping(&endpoint.host, endpoint.port).await {
            Ok(status) => status,
            Err(ProbeError::Spawn(e)) => {
                error!("Cannot start probe helper: {}", e);
                return ProbeReport::HelperFailed(e.to_string());
            }
            Err(e) => {
                debug!("Ping {} failed: {}", endpoint, e);
                return ProbeReport::Unreachable;
            }
        };

        let Some(version) = self.catalog.resolve(status.protocol) else {
            debug!("{} uses unknown protocol {}", endpoint, status.protocol);
            return ProbeReport::Unresolved {
                protocol: status.protocol,
            };
        };

        let request = JoinRequest {
            username: self.username.clone(),
            auth_mode: mode,
            host: endpoint.host.clone(),
            port: endpoint.port,
            version: version.to_string(),
        };

        let started = Instant::now();
        let outcome = self.classifier.classify(&request).await;
        info!(
            "{} {} {} {} {:.1}s",
            endpoint,
            request.version,
            mode.pass_name(),
            outcome,
            started.elapsed().as_secs_f32()
        );

        ProbeReport::Classified {
            version: request.version,
            outcome,
        }
    }
}

/// Mutable side of a scan: the records being scanned and what was found.
struct ScanState<'a> {
    records: &'a mut [Record],
    deletions: DeletionSet,
    summary: ScanSummary,
    flags: PolicyFlags,
    helper_failure: Option<String>,
}

impl ScanState<'_> {
    fn halted(&self) -> bool {
        self.helper_failure.is_some()
    }

    fn apply(&mut self, index: usize, mode: AuthMode, intent: bool, report: ProbeReport) {
        match report {
            ProbeReport::Unreachable => {
                self.summary.unreachable += 1;
                if self.flags.delete_offline {
                    self.deletions.mark(index);
                }
            }
            ProbeReport::Unresolved { .. } => self.summary.unresolved += 1,
            ProbeReport::HelperFailed(reason) => {
                self.helper_failure.get_or_insert(reason);
            }
            ProbeReport::Classified { version, outcome } => {
                self.summary.probes += 1;
                self.summary.count_outcome(outcome);

                let decision = decide(mode, outcome, intent, self.flags);
                let record = &mut self.records[index];
                debug!(
                    "{:?} ({}): {} -> {:?}",
                    record.label, version, outcome, decision
                );

                if let Some(tag) = decision.tag() {
                    if record.append_tag(tag) {
                        self.summary.tagged += 1;
                    }
                }
                if decision.deletes() {
                    self.deletions.mark(index);
                }
            }
        }
    }
}

pub struct Scanner {
    config: ScanConfig,
    context: ProbeContext,
    cancel: CancelFlag,
}

impl Scanner {
    pub fn new(
        config: ScanConfig,
        pinger: Arc<dyn Pinger>,
        join_client: Arc<dyn JoinClient>,
        catalog: VersionCatalog,
        cancel: CancelFlag,
    ) -> Self {
        let classifier =
            JoinClassifier::new(join_client, config.reasons.clone(), config.classifier_settings());

        let context = ProbeContext {
            username: config.username.clone(),
            pinger,
            classifier: Arc::new(classifier),
            catalog: Arc::new(catalog),
        };

        Self {
            config,
            context,
            cancel,
        }
    }

    /// Whether a record takes part in the scan at all.
    pub fn is_eligible(&self, record: &Record) -> bool {
        if !record.label.contains(&self.config.watch_marker) {
            return false;
        }

        !(self.config.ignore_rescanned
            && (record.has_tag(Tag::Cracked) || record.has_tag(Tag::Whitelisted)))
    }

    /// Runs both enabled passes over `records`.
    ///
    /// Labels are updated in place; deletions are returned for the caller to
    /// apply once. Fails without deciding anything further when the probe
    /// helper cannot be started.
    pub async fn scan(
        &self,
        records: &mut [Record],
    ) -> Result<(DeletionSet, ScanSummary), ScanError> {
        let eligible: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| self.is_eligible(record))
            .map(|(index, _)| index)
            .collect();

        info!(
            "{} of {} servers match {:?}",
            eligible.len(),
            records.len(),
            self.config.watch_marker
        );

        let mut state = ScanState {
            records,
            deletions: DeletionSet::new(),
            summary: ScanSummary {
                eligible: eligible.len(),
                ..ScanSummary::default()
            },
            flags: self.config.policy_flags(),
            helper_failure: None,
        };

        if let Some(intent) = self.config.intent(AuthMode::Offline) {
            self.run_cracked_pass(&mut state, &eligible, intent).await;
        }

        if let Some(intent) = self.config.intent(AuthMode::Authenticated) {
            if !state.halted() {
                self.run_whitelist_pass(&mut state, &eligible, intent).await;
            }
        }

        if let Some(reason) = state.helper_failure {
            return Err(ScanError::Helper(reason));
        }

        state.summary.deleted = state.deletions.len();
        state.summary.cancelled = self.cancel.is_cancelled();
        Ok((state.deletions, state.summary))
    }

    async fn run_cracked_pass(&self, state: &mut ScanState<'_>, eligible: &[usize], intent: bool) {
        let mode = AuthMode::Offline;
        let limit = self.config.concurrency.max(1);
        let mut progress = Progress::new(mode, eligible.len());
        let mut pending = eligible.iter().copied();
        let mut in_flight = JoinSet::new();

        loop {
            while in_flight.len() < limit && !self.cancel.is_cancelled() && !state.halted() {
                let Some(index) = pending.next() else { break };

                let context = self.context.clone();
                let address = state.records[index].address.clone();
                in_flight.spawn(async move { (index, context.probe(address, mode).await) });
            }

            match in_flight.join_next().await {
                Some(Ok((index, report))) => {
                    state.apply(index, mode, intent, report);
                    progress.advance();
                }
                Some(Err(e)) => {
                    error!("Probe task failed: {}", e);
                    progress.advance();
                }
                None => break,
            }
        }

        if self.cancel.is_cancelled() {
            info!(
                "Cracked pass cancelled after {}/{} servers",
                progress.completed(),
                progress.total()
            );
        }
    }

    async fn run_whitelist_pass(&self, state: &mut ScanState<'_>, eligible: &[usize], intent: bool) {
        let mode = AuthMode::Authenticated;

        let mut progress = Progress::new(mode, eligible.len());

        for &index in eligible {
            if self.cancel.is_cancelled() {
                info!(
                    "Whitelist pass cancelled after {}/{} servers",
                    progress.completed(),
                    progress.total()
                );
                break;
            }

            // Records the cracked pass already condemned need no second probe
            if state.deletions.contains(index) {
                progress.skip();
                continue;
            }

            let address = state.records[index].address.clone();
            let report = self.context.clone().probe(address, mode).await;
            state.apply(index, mode, intent, report);
            if state.halted() {
                break;
            }
            progress.advance();
        }
    }
}

/// External services a scan run depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub catalog: Arc<dyn CatalogSource>,
    pub pinger: Arc<dyn Pinger>,
    pub join_client: Arc<dyn JoinClient>,
}

/// Loads, scans and saves.
///
/// Store and catalog failures before scanning, and a probe helper that cannot
/// be started, abort the run without saving.
/// A cancelled scan still saves whatever its completed probes decided. With
/// `dry_run` the save is skipped.
pub async fn run(
    config: ScanConfig,
    collaborators: Collaborators,
    cancel: CancelFlag,
    dry_run: bool,
) -> Result<ScanSummary, ScanError> {
    config.validate()?;
    if !config.any_pass_enabled() {
        warn!("Both crackedIntent and whitelistIntent are unset, nothing will be probed");
    }

    info!("Loading server list");
    let mut records = collaborators.store.load().await?;

    info!("Fetching versions");
    let catalog = VersionCatalog::fetch(collaborators.catalog.as_ref()).await?;

    let scanner = Scanner::new(
        config,
        collaborators.pinger,
        collaborators.join_client,
        catalog,
        cancel,
    );
    let (deletions, summary) = scanner.scan(&mut records).await?;
    let survivors = apply_deletions(records, &deletions);

    if dry_run {
        info!("Dry run, not saving {} servers", survivors.len());
    } else {
        info!("Saving server list");
        collaborators.store.save(&survivors).await?;
    }

    info!("Done: {}", summary);
    Ok(summary)
}
