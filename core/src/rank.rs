use crate::catalog::CatalogItem;
use crate::index::{TermMatrix, Vocabulary};
use crate::tokenizer::Tokenizer;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankError {
    #[error("limit must be positive, got {0}")]
    InvalidArgument(i64),
    #[error("term matrix has {rows} rows but catalog has {items} items")]
    Mismatch { rows: usize, items: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedItem<'a> {
    pub item: &'a CatalogItem,
    pub score: f32,
}

/// Items ordered by descending score, ties in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ranking<'a> {
    pub entries: Vec<RankedItem<'a>>,
    /// Query tokens that survived tokenization and matched the vocabulary.
    pub query_terms: usize,
}

impl<'a> Ranking<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with a non-zero score.
    pub fn matched(&self) -> usize {
        self.entries.iter().filter(|e| e.score > 0.0).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RankedItem<'a>> {
        self.entries.iter()
    }
}

/// Rank the catalog against a free-text query by cosine similarity of term-frequency vectors.
///
/// `vocabulary` and `matrix` must come from one `build` over `catalog`. A query that reduces
/// to no known tokens gives every item a score of 0 rather than an error.
pub fn rank<'a>(
    query: &str,
    vocabulary: &Vocabulary,
    matrix: &TermMatrix,
    catalog: &'a [CatalogItem],
    tokenizer: &Tokenizer,
    limit: i64,
) -> Result<Ranking<'a>, RankError> {
    if limit <= 0 {
        return Err(RankError::InvalidArgument(limit));
    }
    if matrix.num_rows() != catalog.len() {
        return Err(RankError::Mismatch { rows: matrix.num_rows(), items: catalog.len() });
    }

    let q = vocabulary.encode(query, tokenizer);
    let query_terms: usize = q.entries().iter().map(|&(_, c)| c as usize).sum();

    let mut scored: Vec<RankedItem<'a>> = catalog
        .iter()
        .zip(matrix.rows())
        .map(|(item, row)| RankedItem { item, score: q.cosine(row) as f32 })
        .collect();
    // sort_by is stable, so equal scores keep catalog order
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(usize::try_from(limit).unwrap_or(usize::MAX));

    tracing::debug!(query, query_terms, returned = scored.len(), "ranked catalog");
    Ok(Ranking { entries: scored, query_terms })
}
