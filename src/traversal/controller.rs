//! Traversal controller - the sweep's main loop
//!
//! The controller owns the traversal state and drives one cycle per page:
//! - navigate to the target page and verify the session landed there
//! - read the page's rows
//! - turn each row into a record, deduplicate and accumulate it
//! - offer checkpoint opportunities
//! - advance to the next page
//!
//! Every terminal path (natural end, end page, fatal navigation loss,
//! cancellation) runs the same finalization.

use crate::checkpoint::{CheckpointStore, PersistenceError, Recovered, SnapshotStore};
use crate::config::{ColumnLayout, Config};
use crate::record::{RawRow, Record, RowDetail, RowIssue};
use crate::state::{Accumulator, Admission, Phase, TraversalState};
use crate::surface::{ActualPage, Summarizer, Surface, SurfaceResult};
use crate::traversal::report::{RunReport, RunStats, TraversalOutcome};
use crate::traversal::retry::{OperationKind, RetryPolicy};
use crate::SweepError;
use chrono::Utc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Result of reading back the session's page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Mismatch { actual: ActualPage },
}

/// Result of a row's detail view after retries
#[derive(Debug)]
enum DetailRead {
    Read(Option<RowDetail>),
    Exhausted,
}

/// How processing a page ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageEnd {
    Finished,
    Interrupted,
}

/// Tunables of a traversal
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub layout: ColumnLayout,
    pub policy: RetryPolicy,
    /// Pause before moving to the next page
    pub page_delay: Duration,
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            layout: config.surface.columns.clone(),
            policy: RetryPolicy::from_config(&config.traversal),
            page_delay: Duration::from_millis(config.traversal.page_delay_ms),
        }
    }
}

/// Drives a surface page by page and accumulates its records
pub struct TraversalController<S: Surface, St: SnapshotStore> {
    surface: S,
    summarizer: Box<dyn Summarizer>,
    checkpoints: CheckpointStore<St>,
    accumulator: Accumulator,
    layout: ColumnLayout,
    policy: RetryPolicy,
    page_delay: Duration,
    cancel: CancellationToken,
    state: TraversalState,
    stats: RunStats,
    recovered: usize,
    last_page: Option<u32>,
    persistence_failures: Vec<PersistenceError>,
}

impl<S: Surface, St: SnapshotStore> TraversalController<S, St> {
    /// Creates a controller with an empty accumulator
    ///
    /// # Arguments
    ///
    /// * `surface` - The navigation surface to drive
    /// * `summarizer` - Turns description markup into summaries
    /// * `checkpoints` - Where snapshots and the final dataset go
    /// * `settings` - Column layout, retry policy and page delay
    /// * `cancel` - Token that requests a graceful stop
    pub fn new(
        surface: S,
        summarizer: Box<dyn Summarizer>,
        checkpoints: CheckpointStore<St>,
        settings: ControllerSettings,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            surface,
            summarizer,
            checkpoints,
            accumulator: Accumulator::new(),
            layout: settings.layout,
            policy: settings.policy,
            page_delay: settings.page_delay,
            cancel,
            state: TraversalState::new(1),
            stats: RunStats::default(),
            recovered: 0,
            last_page: None,
            persistence_failures: Vec::new(),
        }
    }

    /// Seeds the controller with records recovered from an earlier run
    pub fn with_recovered(mut self, recovered: Recovered) -> Self {
        self.recovered = recovered.accumulator.len();
        self.checkpoints.seed(self.recovered);
        self.accumulator = recovered.accumulator;
        self
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn checkpoints(&self) -> &CheckpointStore<St> {
        &self.checkpoints
    }

    pub fn state(&self) -> &TraversalState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Runs the traversal from `start_page` until the surface runs out of
    /// pages, `end_page` is processed, navigation is lost or cancellation
    /// is requested
    ///
    /// Always finalizes: the final chunk and the consolidated dataset are
    /// written whatever the outcome.
    pub async fn run(&mut self, start_page: u32, end_page: Option<u32>) -> RunReport {
        let started_at = Utc::now();
        self.state = TraversalState::new(start_page);

        tracing::info!(
            "Starting traversal at page {} ({} records already held)",
            start_page,
            self.accumulator.len()
        );

        let outcome = match self.traverse(end_page).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Traversal aborted on page {}: {}", self.state.target, e);
                self.settle(Phase::Aborting, Phase::Failed);
                TraversalOutcome::Failed(e)
            }
        };

        let finals = self.checkpoints.final_checkpoint(&self.accumulator);
        self.persistence_failures.extend(finals.failures);

        let report = RunReport {
            outcome,
            stats: self.stats.clone(),
            started_at,
            finished_at: Utc::now(),
            start_page,
            last_page: self.last_page,
            recovered: self.recovered,
            total_records: self.accumulator.len(),
            checkpoints: self.checkpoints.written().to_vec(),
            persistence_failures: std::mem::take(&mut self.persistence_failures),
        };

        tracing::info!(
            "Traversal {}: {} pages, {} new records, {} total",
            report.outcome.as_str(),
            report.stats.pages_visited,
            report.stats.admitted,
            report.total_records
        );

        report
    }

    async fn traverse(&mut self, end_page: Option<u32>) -> Result<TraversalOutcome, SweepError> {
        let start_time = Instant::now();

        loop {
            if self.cancel.is_cancelled() {
                return self.interrupt();
            }

            let target = self.state.target;
            self.reach(target).await?;

            if self.process_page(target).await? == PageEnd::Interrupted {
                return self.interrupt();
            }

            self.state.pages_visited += 1;
            self.stats.pages_visited += 1;
            self.last_page = Some(target);
            self.offer_checkpoint();

            let elapsed = start_time.elapsed().as_secs_f64().max(f64::EPSILON);
            tracing::info!(
                "Progress: page {} done, {} records, {:.2} pages/min",
                target,
                self.accumulator.len(),
                self.stats.pages_visited as f64 * 60.0 / elapsed
            );

            self.state.enter(Phase::Advancing)?;

            if end_page.is_some_and(|end| target >= end) {
                tracing::info!("Reached end page {}", target);
                self.state.enter(Phase::Done)?;
                return Ok(TraversalOutcome::Completed);
            }

            if !self.has_next().await? {
                tracing::info!("Page {} is the last page", target);
                self.state.enter(Phase::Done)?;
                return Ok(TraversalOutcome::Completed);
            }

            self.state.target = target + 1;

            if !self.page_delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.page_delay) => {}
                }
            }
        }
    }

    fn interrupt(&mut self) -> Result<TraversalOutcome, SweepError> {
        tracing::warn!(
            "Interrupted on page {}, draining with {} records",
            self.state.target,
            self.accumulator.len()
        );
        self.state.enter(Phase::Interrupted)?;
        self.state.enter(Phase::Draining)?;
        Ok(TraversalOutcome::Interrupted)
    }

    /// Moves along a terminal path without failing the run if the phase table objects
    fn settle(&mut self, first: Phase, last: Phase) {
        for phase in [first, last] {
            if let Err(e) = self.state.enter(phase) {
                tracing::warn!("{}", e);
            }
        }
    }

    /// Brings the session to `target` within the navigation attempt budget
    async fn reach(&mut self, target: u32) -> Result<(), SweepError> {
        let mut attempts = self.policy.attempts(OperationKind::Navigate);
        let mut last_seen = None;

        while let Some(attempt) = attempts.next_attempt() {
            self.state.enter(Phase::Navigating)?;

            if let Err(e) = self.step_toward(target).await {
                tracing::warn!(
                    "Navigation to page {} failed (attempt {}/{}): {}",
                    target,
                    attempt,
                    attempts.ceiling(),
                    e
                );
                self.state.record_failure();
                attempts.pause().await;
                continue;
            }

            self.state.enter(Phase::Verifying)?;
            match self.verify(target).await {
                Ok(Verification::Verified) => {
                    self.state.reset_failures();
                    return Ok(());
                }
                Ok(Verification::Mismatch { actual }) => {
                    last_seen = actual;
                    self.stats.nav_mismatches += 1;
                    tracing::warn!(
                        "Expected page {}, session is on {:?} (attempt {}/{})",
                        target,
                        actual,
                        attempt,
                        attempts.ceiling()
                    );
                }
                Err(e) => {
                    tracing::warn!("Could not read back the current page: {}", e);
                }
            }

            self.state.record_failure();
            attempts.pause().await;
        }

        tracing::error!(
            "Giving up on page {} after {} navigation attempts",
            target,
            attempts.made()
        );
        Err(SweepError::NavigationExhausted {
            target,
            attempts: attempts.made(),
            last_seen,
        })
    }

    /// One navigation attempt
    ///
    /// Clicks the target directly when it is linked; otherwise advances
    /// pager blocks while they keep revealing higher page numbers. The
    /// target is clicked at most once per block in view.
    async fn step_toward(&mut self, target: u32) -> SurfaceResult<()> {
        if self.surface.go_to(target).await? == Some(target) {
            return Ok(());
        }

        let mut clicked = true;
        let mut horizon: Option<u32> = None;
        loop {
            let visible = self.surface.visible_pages().await?;
            if visible.contains(&target) {
                if !clicked {
                    self.surface.go_to(target).await?;
                }
                return Ok(());
            }

            let Some(highest) = visible.iter().copied().max() else {
                return Ok(());
            };
            if highest > target || horizon.is_some_and(|h| highest <= h) {
                return Ok(());
            }
            horizon = Some(highest);

            tracing::debug!("Page {} not in view (up to {}), advancing pager block", target, highest);
            if !self.surface.advance_block().await? {
                return Ok(());
            }
            clicked = false;
        }
    }

    async fn verify(&mut self, target: u32) -> SurfaceResult<Verification> {
        let actual = self.surface.current_page().await?;
        if actual == Some(target) {
            Ok(Verification::Verified)
        } else {
            Ok(Verification::Mismatch { actual })
        }
    }

    /// Re-verifies the session after an operation that may have moved it,
    /// re-navigating on drift, then returns to `resume`
    async fn ensure_on(&mut self, target: u32, resume: Phase) -> Result<(), SweepError> {
        self.state.enter(Phase::Verifying)?;

        match self.verify(target).await {
            Ok(Verification::Verified) => return self.state.enter(resume),
            Ok(Verification::Mismatch { actual }) => {
                tracing::debug!("Session drifted to {:?}, returning to page {}", actual, target)
            }
            Err(e) => tracing::warn!("Could not verify page {}: {}", target, e),
        }

        self.stats.drift_corrections += 1;
        self.reach(target).await?;
        self.state.enter(resume)
    }

    async fn process_page(&mut self, page: u32) -> Result<PageEnd, SweepError> {
        self.state.enter(Phase::Extracting)?;

        let Some(rows) = self.extract_rows(page).await? else {
            return Ok(PageEnd::Finished);
        };

        self.state.enter(Phase::Accumulating)?;
        for row in &rows {
            if self.cancel.is_cancelled() {
                return Ok(PageEnd::Interrupted);
            }
            self.process_row(page, row).await?;
        }

        Ok(PageEnd::Finished)
    }

    /// Reads the page's rows; `None` when every attempt failed
    async fn extract_rows(&mut self, page: u32) -> Result<Option<Vec<RawRow>>, SweepError> {
        let mut attempts = self.policy.attempts(OperationKind::Secondary);

        while let Some(attempt) = attempts.next_attempt() {
            match self.surface.rows_of_current_page().await {
                Ok(rows) => {
                    tracing::debug!("Page {}: {} rows", page, rows.len());
                    return Ok(Some(rows));
                }
                Err(e) => {
                    tracing::warn!(
                        "Reading rows of page {} failed (attempt {}/{}): {}",
                        page,
                        attempt,
                        attempts.ceiling(),
                        e
                    );
                    attempts.pause().await;
                    if !attempts.exhausted() {
                        self.ensure_on(page, Phase::Extracting).await?;
                    }
                }
            }
        }

        tracing::error!(
            "Skipping page {}: rows unreadable after {} attempts",
            page,
            attempts.made()
        );
        self.stats.extraction_failures += 1;
        Ok(None)
    }

    async fn process_row(&mut self, page: u32, row: &RawRow) -> Result<(), SweepError> {
        let identity = match Record::inspect_row(row, &self.layout, page) {
            Ok(identity) => identity,
            Err(issue @ RowIssue::Malformed { .. }) => {
                tracing::warn!("Skipping malformed row: {}", issue);
                self.stats.malformed_rows += 1;
                return Ok(());
            }
            Err(issue @ RowIssue::MissingIdentity { .. }) => {
                tracing::error!("Skipping row: {}", issue);
                self.stats.missing_identity += 1;
                return Ok(());
            }
        };

        if self.accumulator.contains(identity) {
            tracing::warn!("Duplicate ID {} on page {}, skipping", identity, page);
            self.stats.duplicates += 1;
            return Ok(());
        }

        let detail = match self.read_detail(page, row, identity).await? {
            DetailRead::Read(detail) => detail,
            DetailRead::Exhausted => {
                self.stats.detail_failures += 1;
                return Ok(());
            }
        };

        let record = Record::from_row(row, &self.layout, detail, self.summarizer.as_ref());
        match self.accumulator.admit(record) {
            Ok(Admission::Admitted) => {
                self.stats.admitted += 1;
                tracing::debug!("Admitted {} from page {}", identity, page);
            }
            Ok(Admission::Duplicate) => {
                tracing::warn!("Duplicate ID {} on page {}, skipping", identity, page);
                self.stats.duplicates += 1;
            }
            Err(e) => {
                tracing::error!("Rejected row {} on page {}: {}", row.position, page, e);
                self.stats.missing_identity += 1;
            }
        }

        self.offer_checkpoint();
        Ok(())
    }

    /// Runs the row's detail view with retries, correcting drift after each try
    async fn read_detail(
        &mut self,
        page: u32,
        row: &RawRow,
        identity: &str,
    ) -> Result<DetailRead, SweepError> {
        let mut attempts = self.policy.attempts(OperationKind::Secondary);

        while let Some(attempt) = attempts.next_attempt() {
            let result = self.surface.open_detail(row).await;
            self.ensure_on(page, Phase::Accumulating).await?;

            match result {
                Ok(detail) => return Ok(DetailRead::Read(detail)),
                Err(e) => {
                    tracing::warn!(
                        "Detail view of {} failed (attempt {}/{}): {}",
                        identity,
                        attempt,
                        attempts.ceiling(),
                        e
                    );
                    attempts.pause().await;
                }
            }
        }

        tracing::warn!(
            "Skipping {} on page {}: detail view failed {} times",
            identity,
            page,
            attempts.made()
        );
        Ok(DetailRead::Exhausted)
    }

    fn offer_checkpoint(&mut self) {
        if let Err(e) = self.checkpoints.maybe_checkpoint(&self.accumulator) {
            tracing::error!("{}", e);
            self.persistence_failures.push(e);
        }
    }

    /// Asks the surface whether a page follows, within the navigation budget
    async fn has_next(&mut self) -> Result<bool, SweepError> {
        let mut attempts = self.policy.attempts(OperationKind::Navigate);
        let mut last_error = None;

        while let Some(attempt) = attempts.next_attempt() {
            match self.surface.has_next().await {
                Ok(more) => return Ok(more),
                Err(e) => {
                    tracing::warn!(
                        "Could not read the pager on page {} (attempt {}/{}): {}",
                        self.state.target,
                        attempt,
                        attempts.ceiling(),
                        e
                    );
                    last_error = Some(e);
                    attempts.pause().await;
                }
            }
        }

        match last_error {
            Some(e) => tracing::error!("Lost the pager after page {}: {}", self.state.target, e),
            None => tracing::error!("Lost the pager after page {}", self.state.target),
        }
        Err(SweepError::NavigationExhausted {
            target: self.state.target + 1,
            attempts: attempts.made(),
            last_seen: Some(self.state.target),
        })
    }
}
