use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use dco_core::{classify, AttestationStore, ClassificationOutcome, Commit, Inclusion};
use dco_github::GithubClient;
use dco_report::{AttestationWriter, ReportSink};
use dco_source::{CommitSource, RepoCatalog};
use dco_source_git::GitSource;
use tracing::{debug, info, warn};

use crate::scratch::{remove_if_present, ScratchDir};
use crate::{CommitSourceKind, Config};

/// Per-run counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub repos_seen: usize,
    pub repos_skipped: usize,
    pub repos_scanned: usize,
    pub repos_failed: usize,
    pub compliant: usize,
    pub merge_exempt: usize,
    pub prior_attested: usize,
    pub non_compliant: usize,
    pub attestation_write_failures: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: ClassificationOutcome) {
        match outcome {
            ClassificationOutcome::Compliant => self.compliant += 1,
            ClassificationOutcome::MergeExempt => self.merge_exempt += 1,
            ClassificationOutcome::PriorAttested => self.prior_attested += 1,
            ClassificationOutcome::NonCompliant => self.non_compliant += 1,
        }
    }
}

/// Drives one end-to-end scan of an organization.
pub struct Scanner {
    pub cfg: Config,
    pub catalog: Arc<dyn RepoCatalog>,
    pub source: Arc<dyn CommitSource>,
}

impl Scanner {
    /// Wire the GitHub catalog and the commit source selected by `commit_source`.
    pub fn open(cfg: Config) -> Result<Self> {
        let catalog: Arc<dyn RepoCatalog> = Arc::new(GithubClient::new(&cfg.token)?);
        let source: Arc<dyn CommitSource> = match cfg.commit_source {
            CommitSourceKind::Clone => Arc::new(GitSource::new(cfg.temp_dir.clone()).with_token(cfg.token.clone())),
            CommitSourceKind::Api => Arc::new(GithubClient::new(&cfg.token)?),
        };
        Ok(Self::with_adapters(cfg, catalog, source))
    }

    pub fn with_adapters(cfg: Config, catalog: Arc<dyn RepoCatalog>, source: Arc<dyn CommitSource>) -> Self {
        Self { cfg, catalog, source }
    }

    /// Remove outputs of an earlier run so forward attestation files do not
    /// collect duplicate lines.
    pub fn cleanup_previous_run(&self) -> Result<()> {
        remove_if_present(&self.cfg.csvfile)?;
        if self.cfg.create_prior_commits_file {
            remove_if_present(&self.cfg.create_prior_commits_dir)?;
        }
        remove_if_present(&self.cfg.temp_dir)?;
        Ok(())
    }

    pub fn run(&self) -> Result<ScanSummary> {
        let started = Instant::now();
        let policy = self.cfg.policy();

        self.cleanup_previous_run()?;
        let scratch = ScratchDir::acquire(&self.cfg.temp_dir)?;
        debug!(path = %scratch.path().display(), "scratch directory ready");

        let mut sink = ReportSink::create(&policy.csvfile)?;
        let writer = policy
            .create_prior_commits_file
            .then(|| AttestationWriter::new(policy.create_prior_commits_dir.clone()));

        let repos = self
            .catalog
            .list_repositories(&self.cfg.org)
            .with_context(|| format!("discover repositories of {}", self.cfg.org))?;

        let mut store = AttestationStore::new();
        let mut summary = ScanSummary::default();
        for repo in &repos {
            summary.repos_seen += 1;
            if let Inclusion::Skip(reason) = policy.evaluate(&repo.name, repo.archived) {
                debug!(repo = %repo.name, ?reason, "skipping repository");
                summary.repos_skipped += 1;
                continue;
            }

            info!(repo = %repo.name, origin = ?self.source.origin(), "searching repository");
            let snapshot = match self.source.fetch(repo, &self.cfg.dco_signoffs_directories) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!(repo = %repo.name, error = %format!("{:#}", e), "abandoning repository");
                    summary.repos_failed += 1;
                    continue;
                }
            };
            store.extend(snapshot.attestations);
            // Report write failures are fatal for the whole run.
            self.process_commits(&snapshot.commits, &store, &mut sink, writer.as_ref(), &mut summary)?;
            summary.repos_scanned += 1;
        }

        sink.flush()?;
        drop(scratch);
        info!(
            repos = summary.repos_scanned,
            skipped = summary.repos_skipped,
            failed = summary.repos_failed,
            non_compliant = summary.non_compliant,
            rows = sink.rows(),
            elapsed = ?started.elapsed(),
            "scan complete"
        );
        Ok(summary)
    }

    fn process_commits<W: std::io::Write>(
        &self,
        commits: &[Commit],
        store: &AttestationStore,
        sink: &mut ReportSink<W>,
        writer: Option<&AttestationWriter>,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        for commit in commits {
            if let Err(e) = commit.check_locator() {
                warn!(sha = %commit.sha, error = %e, "prior attestation matching disabled for commit");
            }
            let outcome = classify(commit, store);
            summary.record(outcome);
            debug!(sha = %commit.sha, ?outcome, "classified");
            if !outcome.is_reportable() {
                continue;
            }

            sink.write_commit(commit)?;
            if let Some(writer) = writer {
                if let Err(e) = writer.record(commit) {
                    warn!(sha = %commit.sha, error = %e, "could not write prior commits file");
                    summary.attestation_write_failures += 1;
                }
            }
        }
        Ok(())
    }
}
