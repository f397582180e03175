//! Course recommendation by bag-of-words cosine similarity over a catalog snapshot.

pub mod catalog;
pub mod index;
pub mod persist;
pub mod preferences;
pub mod rank;
pub mod snapshot;
pub mod tokenizer;

pub use catalog::{CatalogError, CatalogItem, Level};
pub use index::{build, ItemIdx, SparseVector, TermId, TermMatrix, Vocabulary};
pub use preferences::{PreferenceError, Preferences};
pub use rank::{rank, RankError, RankedItem, Ranking};
pub use snapshot::{Snapshot, SnapshotStore};
pub use tokenizer::{StopWords, Tokenizer};
