use crate::catalog::{check_unique_ids, fingerprint, CatalogError, CatalogItem};
use crate::index::{build, TermMatrix, Vocabulary};
use crate::rank::{rank, RankError, Ranking};
use crate::tokenizer::Tokenizer;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A catalog together with the vocabulary and term matrix built from it.
///
/// Fields are private so the three can only be produced together.
#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    fingerprint: String,
    tokenizer: Tokenizer,
    catalog: Vec<CatalogItem>,
    vocabulary: Vocabulary,
    matrix: TermMatrix,
}

impl Snapshot {
    pub fn build(catalog: Vec<CatalogItem>, tokenizer: Tokenizer, version: u64) -> Result<Self, CatalogError> {
        check_unique_ids(&catalog)?;
        let fingerprint = fingerprint(&catalog);
        let (vocabulary, matrix) = build(&catalog, &tokenizer);
        tracing::info!(version, items = catalog.len(), terms = vocabulary.len(), %fingerprint, "built snapshot");
        Ok(Self { version, fingerprint, tokenizer, catalog, vocabulary, matrix })
    }

    pub(crate) fn from_parts(
        version: u64,
        fingerprint: String,
        tokenizer: Tokenizer,
        catalog: Vec<CatalogItem>,
        vocabulary: Vocabulary,
        matrix: TermMatrix,
    ) -> Self {
        Self { version, fingerprint, tokenizer, catalog, vocabulary, matrix }
    }

    pub fn rank(&self, query: &str, limit: i64) -> Result<Ranking<'_>, RankError> {
        rank(query, &self.vocabulary, &self.matrix, &self.catalog, &self.tokenizer, limit)
    }

    pub fn version(&self) -> u64 { self.version }
    pub fn fingerprint(&self) -> &str { &self.fingerprint }
    pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }
    pub fn catalog(&self) -> &[CatalogItem] { &self.catalog }
    pub fn vocabulary(&self) -> &Vocabulary { &self.vocabulary }
    pub fn matrix(&self) -> &TermMatrix { &self.matrix }
}

/// Holds the active snapshot. Readers clone an `Arc` and never observe a partial rebuild.
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
    next_version: AtomicU64,
}

impl SnapshotStore {
    pub fn new(initial: Snapshot) -> Self {
        let next = initial.version() + 1;
        Self { current: RwLock::new(Arc::new(initial)), next_version: AtomicU64::new(next) }
    }

    pub fn current(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current.read())
    }

    /// Rebuild from `catalog` and swap it in. Returns the snapshot that is active afterwards.
    /// An unchanged catalog keeps the current snapshot.
    pub fn publish(&self, catalog: Vec<CatalogItem>) -> Result<Arc<Snapshot>, CatalogError> {
        let active = self.current();
        if fingerprint(&catalog) == active.fingerprint() {
            tracing::debug!(version = active.version(), "catalog unchanged, keeping snapshot");
            return Ok(active);
        }
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let fresh = Arc::new(Snapshot::build(catalog, active.tokenizer().clone(), version)?);
        let mut guard = self.current.write();
        // a concurrent publish with a later version wins
        if guard.version() < fresh.version() {
            *guard = Arc::clone(&fresh);
        }
        Ok(Arc::clone(&guard))
    }
}
