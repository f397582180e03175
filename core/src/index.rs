use crate::catalog::CatalogItem;
use crate::tokenizer::Tokenizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type TermId = u32;
pub type ItemIdx = usize;

/// Token to column mapping, columns assigned in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.terms.get(id as usize).map(String::as_str)
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    fn intern(&mut self, term: String) -> TermId {
        if let Some(&id) = self.dictionary.get(&term) {
            return id;
        }
        let id = self.terms.len() as TermId;
        self.terms.push(term.clone());
        self.dictionary.insert(term, id);
        id
    }

    /// Encode text as a term-frequency vector. Unknown tokens are dropped; the vocabulary never grows here.
    pub fn encode(&self, text: &str, tokenizer: &Tokenizer) -> SparseVector {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for token in tokenizer.tokenize(text) {
            if let Some(tid) = self.index_of(&token) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        SparseVector::from_counts(counts)
    }
}

/// Sparse row of raw term counts, sorted by term id, with its L2 norm cached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(TermId, u32)>,
    norm: f64,
}

impl SparseVector {
    fn from_counts(counts: HashMap<TermId, u32>) -> Self {
        let mut entries: Vec<(TermId, u32)> = counts.into_iter().collect();
        entries.sort_unstable_by_key(|&(tid, _)| tid);
        let norm = entries.iter().map(|&(_, c)| (c as f64) * (c as f64)).sum::<f64>().sqrt();
        Self { entries, norm }
    }

    pub fn entries(&self) -> &[(TermId, u32)] {
        &self.entries
    }

    pub fn norm(&self) -> f64 {
        self.norm
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, tid: TermId) -> u32 {
        self.entries
            .binary_search_by_key(&tid, |&(t, _)| t)
            .map(|i| self.entries[i].1)
            .unwrap_or(0)
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        // merge join over two sorted lists
        let (mut i, mut j, mut acc) = (0, 0, 0.0f64);
        while i < self.entries.len() && j < other.entries.len() {
            let (ta, ca) = self.entries[i];
            let (tb, cb) = other.entries[j];
            if ta == tb {
                acc += (ca as f64) * (cb as f64);
                i += 1;
                j += 1;
            } else if ta < tb {
                i += 1;
            } else {
                j += 1;
            }
        }
        acc
    }

    /// Cosine similarity; 0 when either side has zero norm.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        if self.norm == 0.0 || other.norm == 0.0 {
            return 0.0;
        }
        (self.dot(other) / (self.norm * other.norm)).clamp(0.0, 1.0)
    }
}

/// One row per catalog item, one column per vocabulary entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermMatrix {
    rows: Vec<SparseVector>,
    num_columns: usize,
}

impl TermMatrix {
    pub fn rows(&self) -> &[SparseVector] {
        &self.rows
    }

    pub fn row(&self, idx: ItemIdx) -> Option<&SparseVector> {
        self.rows.get(idx)
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.num_columns
    }

    /// Raw count at (row, column), zero for anything out of range.
    pub fn get(&self, row: ItemIdx, col: TermId) -> u32 {
        self.rows.get(row).map(|r| r.count(col)).unwrap_or(0)
    }
}

/// Build the vocabulary and term matrix from one catalog snapshot. Does not touch the catalog.
pub fn build(catalog: &[CatalogItem], tokenizer: &Tokenizer) -> (Vocabulary, TermMatrix) {
    let mut vocabulary = Vocabulary::default();
    let mut rows = Vec::with_capacity(catalog.len());
    for item in catalog {
        let mut counts: HashMap<TermId, u32> = HashMap::new();
        for token in tokenizer.tokenize(&item.combined_text()) {
            let tid = vocabulary.intern(token);
            *counts.entry(tid).or_insert(0) += 1;
        }
        rows.push(SparseVector::from_counts(counts));
    }
    let num_columns = vocabulary.len();
    tracing::debug!(items = catalog.len(), terms = num_columns, "built term matrix");
    (vocabulary, TermMatrix { rows, num_columns })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Level;

    fn catalog() -> Vec<CatalogItem> {
        vec![
            CatalogItem::new("1", "Python for Beginners", "Programming", Level::Beginner),
            CatalogItem::new("2", "Advanced AI", "Data Science", Level::Advanced),
        ]
    }

    #[test]
    fn assigns_columns_in_first_seen_order() {
        let (vocab, matrix) = build(&catalog(), &Tokenizer::default());
        assert_eq!(vocab.terms(), &["python", "beginners", "programming", "beginner", "advanced", "ai", "data", "science"]);
        assert_eq!(matrix.num_rows(), 2);
        assert_eq!(matrix.num_columns(), 8);
        // "advanced" appears in both title and level
        assert_eq!(matrix.get(1, vocab.index_of("advanced").unwrap()), 2);
        assert_eq!(matrix.get(0, vocab.index_of("advanced").unwrap()), 0);
    }

    #[test]
    fn empty_catalog_gives_empty_structures() {
        let (vocab, matrix) = build(&[], &Tokenizer::default());
        assert!(vocab.is_empty());
        assert_eq!(matrix.num_rows(), 0);
        assert_eq!(matrix.num_columns(), 0);
    }

    #[test]
    fn encode_ignores_unknown_tokens() {
        let tok = Tokenizer::default();
        let (vocab, _) = build(&catalog(), &tok);
        let q = vocab.encode("quantum python python", &tok);
        assert_eq!(q.entries(), &[(0, 2)]);
        assert_eq!(q.norm(), 2.0);
        assert_eq!(vocab.len(), 8);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        let tok = Tokenizer::default();
        let (vocab, matrix) = build(&catalog(), &tok);
        let empty = vocab.encode("the and of", &tok);
        assert!(empty.is_empty());
        assert_eq!(empty.cosine(&matrix.rows()[0]), 0.0);
    }
}
