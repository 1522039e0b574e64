//! Integration tests for the traversal engine
//!
//! These tests drive the controller with a scripted in-process surface and
//! check checkpoint cadence, recovery, drift correction and every terminal
//! path end to end.

use async_trait::async_trait;
use page_sweep::checkpoint::{
    load_latest, CheckpointStore, FsSnapshotStore, MemorySnapshotStore, SnapshotKind,
    SnapshotNames, SnapshotStore,
};
use page_sweep::config::ColumnLayout;
use page_sweep::record::{RawRow, Record, RowDetail};
use page_sweep::state::Phase;
use page_sweep::surface::{
    ActualPage, PageNavigator, PlainTextSummarizer, RowExtractor, SurfaceError, SurfaceResult,
};
use page_sweep::traversal::{ControllerSettings, RetryPolicy, TraversalController, TraversalOutcome};
use page_sweep::SweepError;
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const ROWS_PER_PAGE: usize = 10;

/// Builds a complete listing row for `identity`
fn row(position: usize, identity: &str) -> RawRow {
    RawRow::new(
        position,
        vec![
            String::new(),
            String::new(),
            identity.to_string(),
            format!("Item {}", identity),
            "Furniture".to_string(),
            "2".to_string(),
            "€100".to_string(),
            "No".to_string(),
            "Active".to_string(),
            "01/01/2025".to_string(),
        ],
    )
}

/// `pages` pages of ten rows each, IDs R1, R2, ... in page order
fn numbered_pages(pages: usize) -> Vec<Vec<RawRow>> {
    (0..pages)
        .map(|p| {
            (1..=ROWS_PER_PAGE)
                .map(|r| row(r, &format!("R{}", p * ROWS_PER_PAGE + r)))
                .collect()
        })
        .collect()
}

/// A surface whose pages, failures and drift are scripted
#[derive(Default)]
struct ScriptedSurface {
    pages: Vec<Vec<RawRow>>,
    current: ActualPage,
    go_to_calls: u32,
    detail_calls: u32,
    /// `go_to` always lands one page past the target
    lands_wrong: bool,
    /// `visible_pages` shows no page links
    hides_pager: bool,
    /// `has_next` always fails
    pager_unreadable: bool,
    /// Opening a detail view leaves the listing
    drifts_on_detail: bool,
    failing_details: HashSet<String>,
    unreadable_page: Option<u32>,
    cancel_on_page: Option<(u32, CancellationToken)>,
}

impl ScriptedSurface {
    fn new(pages: Vec<Vec<RawRow>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }
}

#[async_trait]
impl PageNavigator for ScriptedSurface {
    async fn go_to(&mut self, page: u32) -> SurfaceResult<ActualPage> {
        self.go_to_calls += 1;
        if self.lands_wrong {
            self.current = Some(page + 1);
        } else if (1..=self.page_count()).contains(&page) {
            self.current = Some(page);
        }
        Ok(self.current)
    }

    async fn current_page(&mut self) -> SurfaceResult<ActualPage> {
        Ok(self.current)
    }

    async fn visible_pages(&mut self) -> SurfaceResult<Vec<u32>> {
        if self.hides_pager {
            return Ok(Vec::new());
        }
        Ok((1..=self.page_count()).collect())
    }

    async fn advance_block(&mut self) -> SurfaceResult<bool> {
        Ok(false)
    }

    async fn has_next(&mut self) -> SurfaceResult<bool> {
        if self.pager_unreadable {
            return Err(SurfaceError::Other("pager did not render".to_string()));
        }
        Ok(self.current.is_some_and(|p| p < self.page_count()))
    }
}

#[async_trait]
impl RowExtractor for ScriptedSurface {
    async fn rows_of_current_page(&mut self) -> SurfaceResult<Vec<RawRow>> {
        let page = self.current.ok_or(SurfaceError::NoDocument)?;

        if self.unreadable_page == Some(page) {
            return Err(SurfaceError::Other(format!("page {} did not render", page)));
        }
        if let Some((cancel_page, token)) = &self.cancel_on_page {
            if *cancel_page == page {
                token.cancel();
            }
        }

        Ok(self.pages[(page - 1) as usize].clone())
    }

    async fn open_detail(&mut self, row: &RawRow) -> SurfaceResult<Option<RowDetail>> {
        self.detail_calls += 1;
        let identity = row.cells[2].clone();

        if self.drifts_on_detail {
            self.current = None;
        }
        if self.failing_details.contains(&identity) {
            return Err(SurfaceError::Other(format!("detail of {} timed out", identity)));
        }

        Ok(Some(RowDetail {
            media: vec![format!("http://img.example.com/{}.jpg", identity)],
            description_markup: Some(format!("<p>About <b>{}</b></p>", identity)),
        }))
    }
}

fn settings(nav_retries: u32) -> ControllerSettings {
    ControllerSettings {
        layout: ColumnLayout::default(),
        policy: RetryPolicy::new(nav_retries, 3, Duration::ZERO),
        page_delay: Duration::ZERO,
    }
}

fn controller<St: SnapshotStore>(
    surface: ScriptedSurface,
    store: St,
    interval: usize,
) -> TraversalController<ScriptedSurface, St> {
    controller_with_token(surface, store, interval, CancellationToken::new())
}

fn controller_with_token<St: SnapshotStore>(
    surface: ScriptedSurface,
    store: St,
    interval: usize,
    cancel: CancellationToken,
) -> TraversalController<ScriptedSurface, St> {
    TraversalController::new(
        surface,
        Box::new(PlainTextSummarizer::new(200)),
        CheckpointStore::new(store, SnapshotNames::new("items"), interval),
        settings(5),
        cancel,
    )
}

fn stored_ids<S: SnapshotStore>(store: &S, name: &str) -> Vec<String> {
    let bytes = store.read(name).unwrap();
    let records: Vec<Record> = serde_json::from_slice(&bytes).unwrap();
    records.into_iter().map(|r| r.identity).collect()
}

fn ids(range: std::ops::RangeInclusive<usize>) -> Vec<String> {
    range.map(|i| format!("R{}", i)).collect()
}

#[tokio::test]
async fn test_checkpoint_cadence_and_final_chunk() {
    let mut sweep = controller(
        ScriptedSurface::new(numbered_pages(25)),
        MemorySnapshotStore::new(),
        100,
    );

    let report = sweep.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.total_records, 250);
    assert_eq!(report.stats.pages_visited, 25);
    assert_eq!(report.last_page, Some(25));
    assert_eq!(sweep.state().phase(), Phase::Done);

    let store = sweep.checkpoints().store();
    assert_eq!(
        store.names(),
        vec![
            "items_all.csv".to_string(),
            "items_all.json".to_string(),
            "items_backup_100.json".to_string(),
            "items_backup_200.json".to_string(),
            "items_backup_final.json".to_string(),
        ]
    );

    // every snapshot is a prefix of the consolidated dataset
    let all = stored_ids(store, "items_all.json");
    assert_eq!(all, ids(1..=250));
    assert_eq!(stored_ids(store, "items_backup_100.json"), all[..100].to_vec());
    assert_eq!(stored_ids(store, "items_backup_200.json"), all[..200].to_vec());

    assert_eq!(stored_ids(store, "items_backup_final.json"), ids(201..=250));

    let kinds: Vec<SnapshotKind> = report.checkpoints.iter().map(|c| c.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SnapshotKind::Interval(100),
            SnapshotKind::Interval(200),
            SnapshotKind::FinalChunk,
            SnapshotKind::Consolidated,
        ]
    );
}

#[tokio::test]
async fn test_final_chunk_on_interval_boundary() {
    let mut sweep = controller(
        ScriptedSurface::new(numbered_pages(30)),
        MemorySnapshotStore::new(),
        100,
    );

    sweep.run(1, None).await;

    let store = sweep.checkpoints().store();
    assert!(store.contents("items_backup_300.json").is_some());
    assert_eq!(stored_ids(store, "items_backup_final.json"), ids(201..=300));
}

#[tokio::test]
async fn test_records_carry_detail_fields() {
    let mut sweep = controller(
        ScriptedSurface::new(numbered_pages(1)),
        MemorySnapshotStore::new(),
        100,
    );

    sweep.run(1, None).await;

    let record = &sweep.accumulator().records()[0];
    assert_eq!(record.identity, "R1");
    assert_eq!(record.name, "Item R1");
    assert_eq!(record.image_links, vec!["https://img.example.com/R1.jpg".to_string()]);
    assert_eq!(record.description_summary.as_deref(), Some("About R1"));
}

#[tokio::test]
async fn test_duplicates_are_skipped_before_detail_view() {
    let mut pages = numbered_pages(2);
    // page 2 repeats three rows of page 1
    pages[1][0] = row(1, "R1");
    pages[1][4] = row(5, "R5");
    pages[1][9] = row(10, "R10");

    let mut sweep = controller(ScriptedSurface::new(pages), MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert_eq!(report.total_records, 17);
    assert_eq!(report.stats.duplicates, 3);
    assert_eq!(sweep.surface().detail_calls, 17);

    let unique: HashSet<&str> = sweep
        .accumulator()
        .records()
        .iter()
        .map(|r| r.identity.as_str())
        .collect();
    assert_eq!(unique.len(), 17);
}

#[tokio::test]
async fn test_malformed_rows_do_not_stop_traversal() {
    let mut pages = numbered_pages(2);
    pages[0][3] = RawRow::new(4, vec!["only".to_string(), "three".to_string(), "cells".to_string()]);
    pages[1][2] = row(3, "  ");

    let mut sweep = controller(ScriptedSurface::new(pages), MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.stats.malformed_rows, 1);
    assert_eq!(report.stats.missing_identity, 1);
    assert_eq!(report.total_records, 18);
    assert!(!sweep.accumulator().contains("R4"));
}

#[tokio::test]
async fn test_always_wrong_navigator_exhausts_attempts() {
    let mut surface = ScriptedSurface::new(numbered_pages(3));
    surface.lands_wrong = true;
    surface.hides_pager = true;

    let mut sweep = controller(surface, MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert_eq!(sweep.surface().go_to_calls, 5);
    assert!(matches!(
        report.outcome,
        TraversalOutcome::Failed(SweepError::NavigationExhausted {
            target: 1,
            attempts: 5,
            last_seen: Some(2),
        })
    ));
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.stats.nav_mismatches, 5);
    assert_eq!(sweep.state().phase(), Phase::Failed);

    // finalization still ran
    let store = sweep.checkpoints().store();
    assert!(store.contents("items_all.json").is_some());
    assert!(store.contents("items_backup_final.json").is_none());
}

#[tokio::test]
async fn test_wrong_landing_on_visible_target_clicks_once_per_attempt() {
    let mut surface = ScriptedSurface::new(numbered_pages(3));
    surface.lands_wrong = true;

    let mut sweep = controller(surface, MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    // the target is in view, so each attempt clicks it exactly once
    assert_eq!(sweep.surface().go_to_calls, 5);
    assert!(matches!(
        report.outcome,
        TraversalOutcome::Failed(SweepError::NavigationExhausted {
            target: 1,
            attempts: 5,
            last_seen: Some(2),
        })
    ));
}

#[tokio::test]
async fn test_unreadable_pager_is_cursor_loss() {
    let mut surface = ScriptedSurface::new(numbered_pages(3));
    surface.pager_unreadable = true;

    let mut sweep = controller(surface, MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert!(matches!(
        report.outcome,
        TraversalOutcome::Failed(SweepError::NavigationExhausted {
            target: 2,
            attempts: 5,
            last_seen: Some(1),
        })
    ));
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.total_records, 10);
    assert_eq!(
        stored_ids(sweep.checkpoints().store(), "items_all.json"),
        ids(1..=10)
    );
}

#[tokio::test]
async fn test_drift_after_detail_view_is_corrected() {
    let mut surface = ScriptedSurface::new(numbered_pages(3));
    surface.drifts_on_detail = true;

    let mut sweep = controller(surface, MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.total_records, 30);
    assert_eq!(report.stats.drift_corrections, 30);
    assert_eq!(
        sweep.accumulator().records().iter().map(|r| r.identity.clone()).collect::<Vec<_>>(),
        ids(1..=30)
    );
}

#[tokio::test]
async fn test_failed_detail_view_skips_row() {
    let mut surface = ScriptedSurface::new(numbered_pages(1));
    surface.failing_details.insert("R3".to_string());

    let mut sweep = controller(surface, MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.total_records, 9);
    assert_eq!(report.stats.detail_failures, 1);
    assert!(!sweep.accumulator().contains("R3"));
    // three attempts for R3, one for each other row
    assert_eq!(sweep.surface().detail_calls, 12);
}

#[tokio::test]
async fn test_unreadable_page_is_skipped() {
    let mut surface = ScriptedSurface::new(numbered_pages(3));
    surface.unreadable_page = Some(2);

    let mut sweep = controller(surface, MemorySnapshotStore::new(), 100);
    let report = sweep.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.stats.extraction_failures, 1);
    assert_eq!(report.total_records, 20);
    assert!(sweep.accumulator().contains("R21"));
    assert!(!sweep.accumulator().contains("R11"));
}

#[tokio::test]
async fn test_interrupt_drains_and_writes_final_checkpoint() {
    let cancel = CancellationToken::new();
    let mut surface = ScriptedSurface::new(numbered_pages(10));
    surface.cancel_on_page = Some((3, cancel.clone()));

    let mut sweep = controller_with_token(surface, MemorySnapshotStore::new(), 100, cancel);
    let report = sweep.run(1, None).await;

    assert!(matches!(report.outcome, TraversalOutcome::Interrupted));
    assert_eq!(report.exit_code(), 130);
    assert_eq!(report.total_records, 20);
    assert_eq!(sweep.state().phase(), Phase::Draining);

    let store = sweep.checkpoints().store();
    assert_eq!(stored_ids(store, "items_backup_final.json"), ids(1..=20));
    assert_eq!(stored_ids(store, "items_all.json"), ids(1..=20));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut sweep = controller_with_token(
        ScriptedSurface::new(numbered_pages(2)),
        MemorySnapshotStore::new(),
        100,
        cancel,
    );
    let report = sweep.run(1, None).await;

    assert!(matches!(report.outcome, TraversalOutcome::Interrupted));
    assert_eq!(sweep.surface().go_to_calls, 0);
    assert_eq!(report.total_records, 0);
}

#[tokio::test]
async fn test_persistence_failure_does_not_stop_traversal() {
    let mut store = MemorySnapshotStore::new();
    store.set_fail_writes(true);

    let mut sweep = controller(ScriptedSurface::new(numbered_pages(25)), store, 100);
    let report = sweep.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.total_records, 250);
    assert!(report.checkpoints.is_empty());

    let failed: HashSet<&str> = report
        .persistence_failures
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    for name in [
        "items_backup_100.json",
        "items_backup_200.json",
        "items_backup_final.json",
        "items_all.json",
        "items_all.csv",
    ] {
        assert!(failed.contains(name), "missing failure for {}", name);
    }
}

#[tokio::test]
async fn test_end_page_and_start_page() {
    let mut sweep = controller(
        ScriptedSurface::new(numbered_pages(10)),
        MemorySnapshotStore::new(),
        100,
    );

    let report = sweep.run(4, Some(6)).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.start_page, 4);
    assert_eq!(report.last_page, Some(6));
    assert_eq!(
        sweep.accumulator().records().iter().map(|r| r.identity.clone()).collect::<Vec<_>>(),
        ids(31..=60)
    );
}

#[tokio::test]
async fn test_resume_after_partial_run() {
    let dir = TempDir::new().unwrap();
    let names = SnapshotNames::new("items");

    // first run stops after page 12
    let mut first = controller(
        ScriptedSurface::new(numbered_pages(25)),
        FsSnapshotStore::new(dir.path()),
        50,
    );
    let report = first.run(1, Some(12)).await;
    assert_eq!(report.total_records, 120);

    let store = FsSnapshotStore::new(dir.path());
    let recovered = load_latest(&store, &names).unwrap();
    assert_eq!(recovered.accumulator.len(), 120);

    // loading again yields the same state
    let again = load_latest(&store, &names).unwrap();
    assert_eq!(
        again.accumulator.records(),
        recovered.accumulator.records()
    );

    // second run starts over from page 1 and relies on dedup
    let mut second = controller(ScriptedSurface::new(numbered_pages(25)), store, 50)
        .with_recovered(recovered);
    let report = second.run(1, None).await;

    assert!(report.outcome.is_completed());
    assert_eq!(report.recovered, 120);
    assert_eq!(report.stats.duplicates, 120);
    assert_eq!(report.stats.admitted, 130);
    assert_eq!(report.total_records, 250);
    assert_eq!(second.surface().detail_calls, 130);

    let intervals: Vec<&str> = report
        .checkpoints
        .iter()
        .filter(|c| matches!(c.kind, SnapshotKind::Interval(_)))
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(
        intervals,
        vec!["items_backup_150.json", "items_backup_200.json", "items_backup_250.json"]
    );

    let store = FsSnapshotStore::new(dir.path());
    assert_eq!(stored_ids(&store, "items_all.json"), ids(1..=250));
    assert_eq!(stored_ids(&store, "items_backup_final.json"), ids(201..=250));
    assert_eq!(stored_ids(&store, "items_backup_100.json"), ids(1..=100));
}

#[tokio::test]
async fn test_recovery_prefers_newer_smaller_snapshot() {
    let mut store = MemorySnapshotStore::new();
    let older: Vec<Record> = (1..=30).map(|i| Record::with_identity(format!("R{}", i))).collect();
    let newer: Vec<Record> = (1..=20).map(|i| Record::with_identity(format!("R{}", i))).collect();
    store
        .write("items_backup_30.json", &serde_json::to_vec(&older).unwrap())
        .unwrap();
    store
        .write("items_backup_20.json", &serde_json::to_vec(&newer).unwrap())
        .unwrap();

    let recovered = load_latest(&store, &SnapshotNames::new("items")).unwrap();
    assert_eq!(recovered.source.as_deref(), Some("items_backup_20.json"));

    let mut sweep = controller(ScriptedSurface::new(numbered_pages(3)), store, 10)
        .with_recovered(recovered);
    let report = sweep.run(1, None).await;

    assert_eq!(report.recovered, 20);
    assert_eq!(report.stats.admitted, 10);
    assert_eq!(report.total_records, 30);
    // the recovered count is not written again
    assert!(report
        .checkpoints
        .iter()
        .all(|c| c.name != "items_backup_20.json"));
}
