use crate::checkpoint::names::{SnapshotKind, SnapshotNames};
use crate::checkpoint::traits::{SnapshotStore, StoreResult, StoredSnapshot};
use crate::record::Record;
use crate::state::Accumulator;

/// A snapshot that could seed a new run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCandidate {
    pub snapshot: StoredSnapshot,
    pub kind: SnapshotKind,
}

/// State rehydrated from earlier runs
#[derive(Debug, Default)]
pub struct Recovered {
    pub accumulator: Accumulator,
    /// Name of the snapshot the accumulator was rebuilt from
    pub source: Option<String>,
    /// Records dropped for an empty or repeated identity
    pub discarded: usize,
}

impl Recovered {
    /// Nothing to resume from
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Full-accumulator snapshots, most preferred first
///
/// Newest modification time wins; on a tie the consolidated dataset comes
/// first, then the larger interval count. Final chunks hold only a tail and
/// are never candidates.
pub fn recovery_candidates<S: SnapshotStore>(
    store: &S,
    names: &SnapshotNames,
) -> StoreResult<Vec<RecoveryCandidate>> {
    let mut candidates: Vec<RecoveryCandidate> = store
        .list()?
        .into_iter()
        .filter_map(|snapshot| {
            let kind = names.classify(&snapshot.name)?;
            kind.is_full_image().then_some(RecoveryCandidate { snapshot, kind })
        })
        .collect();

    candidates.sort_by(|a, b| {
        b.snapshot
            .modified
            .cmp(&a.snapshot.modified)
            .then_with(|| rank(b.kind).cmp(&rank(a.kind)))
    });

    Ok(candidates)
}

fn rank(kind: SnapshotKind) -> (u8, usize) {
    match kind {
        SnapshotKind::Consolidated => (1, 0),
        SnapshotKind::Interval(count) => (0, count),
        SnapshotKind::FinalChunk => (0, 0),
    }
}

/// Rebuilds the accumulator from the most recent usable snapshot
///
/// A candidate that cannot be read or parsed is skipped with a warning and
/// the next one is tried. The identity index is rebuilt by re-admitting
/// every record in order.
pub fn load_latest<S: SnapshotStore>(store: &S, names: &SnapshotNames) -> StoreResult<Recovered> {
    for candidate in recovery_candidates(store, names)? {
        let name = &candidate.snapshot.name;

        let records: Vec<Record> = match store
            .read(name)
            .and_then(|bytes| serde_json::from_slice(&bytes).map_err(Into::into))
        {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Skipping unreadable snapshot {}: {}", name, e);
                continue;
            }
        };

        let loaded = records.len();
        let (accumulator, discarded) = Accumulator::rebuild(records);

        if discarded > 0 {
            tracing::warn!(
                "Dropped {} of {} records from {} (empty or repeated ID)",
                discarded,
                loaded,
                name
            );
        }
        tracing::info!(
            "Recovered {} records from {} ({})",
            accumulator.len(),
            name,
            candidate.kind
        );

        return Ok(Recovered {
            accumulator,
            source: Some(name.clone()),
            discarded,
        });
    }

    tracing::info!("No snapshot to recover from, starting empty");
    Ok(Recovered::empty())
}
