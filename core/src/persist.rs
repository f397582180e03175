use crate::catalog::{fingerprint, load_catalog, CatalogError, CatalogItem};
use crate::index::{TermMatrix, Vocabulary};
use crate::snapshot::Snapshot;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("snapshot fingerprint {found} does not match meta.json ({expected})")]
    StaleSnapshot { expected: String, found: String },
    #[error("unsupported snapshot format version {0}")]
    UnsupportedVersion(u32),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Bincode(#[from] bincode::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_items: usize,
    pub num_terms: usize,
    pub fingerprint: String,
    pub created_at: String,
    pub version: u32,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    tokenizer: Tokenizer,
    catalog: Vec<CatalogItem>,
    vocabulary: Vocabulary,
    matrix: TermMatrix,
}

pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn snapshot(&self) -> PathBuf { self.root.join("snapshot.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }

    pub fn exists(&self) -> bool {
        self.meta().is_file() && self.snapshot().is_file()
    }
}

pub fn save_snapshot(paths: &SnapshotPaths, snapshot: &Snapshot) -> Result<MetaFile, PersistError> {
    create_dir_all(&paths.root)?;
    let body = SnapshotFile {
        tokenizer: snapshot.tokenizer().clone(),
        catalog: snapshot.catalog().to_vec(),
        vocabulary: snapshot.vocabulary().clone(),
        matrix: snapshot.matrix().clone(),
    };
    let mut f = File::create(paths.snapshot())?;
    f.write_all(&bincode::serialize(&body)?)?;

    let meta = MetaFile {
        num_items: snapshot.catalog().len(),
        num_terms: snapshot.vocabulary().len(),
        fingerprint: snapshot.fingerprint().to_string(),
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: FORMAT_VERSION,
    };
    save_meta(paths, &meta)?;
    Ok(meta)
}

pub fn save_meta(paths: &SnapshotPaths, meta: &MetaFile) -> Result<(), PersistError> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &SnapshotPaths) -> Result<MetaFile, PersistError> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Ok(serde_json::from_str(&buf)?)
}

/// Load a saved snapshot, refusing one whose catalog no longer matches its meta fingerprint.
pub fn load_snapshot(paths: &SnapshotPaths, version: u64) -> Result<Snapshot, PersistError> {
    let meta = load_meta(paths)?;
    if meta.version != FORMAT_VERSION {
        return Err(PersistError::UnsupportedVersion(meta.version));
    }
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let body: SnapshotFile = bincode::deserialize(&buf)?;

    let found = fingerprint(&body.catalog);
    if found != meta.fingerprint || body.matrix.num_rows() != body.catalog.len() {
        return Err(PersistError::StaleSnapshot { expected: meta.fingerprint, found });
    }
    tracing::info!(root = %paths.root.display(), items = meta.num_items, terms = meta.num_terms, "loaded snapshot");
    Ok(Snapshot::from_parts(version, found, body.tokenizer, body.catalog, body.vocabulary, body.matrix))
}

/// Open a snapshot directory written by `save_snapshot`, or build a fresh snapshot from a catalog file.
pub fn open_snapshot(source: impl AsRef<Path>) -> Result<Snapshot, PersistError> {
    let source = source.as_ref();
    if source.is_dir() {
        return load_snapshot(&SnapshotPaths::new(source), 1);
    }
    let report = load_catalog(source)?;
    Ok(Snapshot::build(report.items, Tokenizer::default(), 1)?)
}
