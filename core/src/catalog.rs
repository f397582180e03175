use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unknown course level: {0:?}")]
    UnknownLevel(String),
    #[error("price must be non-negative, got {0}")]
    NegativePrice(f64),
    #[error("duplicate course id: {0}")]
    DuplicateId(String),
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid CSV catalog: {0}")]
    Csv(#[from] csv::Error),
}

/// Serialized as its display name and parsed leniently, so files and HTTP bodies accept the same spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "Beginner",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase();
        let norm = norm.strip_suffix(" level").unwrap_or(&norm);
        match norm {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" | "expert" => Ok(Level::Advanced),
            _ => Err(CatalogError::UnknownLevel(s.to_string())),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = CatalogError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.as_str().to_string()
    }
}

/// One course. Immutable once it is part of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub level: Level,
    pub price: f64,
    pub subscriber_count: u64,
    /// Display only, never scored.
    #[serde(default)]
    pub num_lectures: Option<u32>,
    /// Hours of content. Display only, never scored.
    #[serde(default)]
    pub content_duration: Option<f32>,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, subject: impl Into<String>, level: Level) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subject: subject.into(),
            level,
            price: 0.0,
            subscriber_count: 0,
            num_lectures: None,
            content_duration: None,
        }
    }

    /// Space-joined title, subject and level. This is the only text that gets vectorized.
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.title, self.subject, self.level)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.price.is_nan() || self.price < 0.0 {
            return Err(CatalogError::NegativePrice(self.price));
        }
        Ok(())
    }
}

/// Row shape accepted from CSV/JSON files, including column names of the course export.
#[derive(Debug, Deserialize)]
struct InputCourse {
    #[serde(alias = "course_id")]
    id: String,
    #[serde(alias = "coursetitle", alias = "course_title")]
    title: String,
    subject: String,
    level: String,
    #[serde(default)]
    price: f64,
    #[serde(default, alias = "num_subscribers")]
    subscriber_count: u64,
    #[serde(default)]
    num_lectures: Option<u32>,
    #[serde(default)]
    content_duration: Option<f32>,
}

impl TryFrom<InputCourse> for CatalogItem {
    type Error = CatalogError;

    fn try_from(raw: InputCourse) -> Result<Self, Self::Error> {
        let item = CatalogItem {
            id: raw.id,
            title: raw.title,
            subject: raw.subject,
            level: raw.level.parse()?,
            price: raw.price,
            subscriber_count: raw.subscriber_count,
            num_lectures: raw.num_lectures,
            content_duration: raw.content_duration,
        };
        item.validate()?;
        Ok(item)
    }
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub items: Vec<CatalogItem>,
    pub skipped: usize,
}

impl LoadReport {
    fn admit(&mut self, row: InputCourse) {
        let id = row.id.clone();
        match CatalogItem::try_from(row) {
            Ok(item) => self.items.push(item),
            Err(err) => {
                tracing::warn!(%id, %err, "skipping catalog row");
                self.skipped += 1;
            }
        }
    }

    fn admit_json(&mut self, row: serde_json::Result<InputCourse>, record: usize) {
        match row {
            Ok(row) => self.admit(row),
            Err(err) => {
                tracing::warn!(record, %err, "skipping undecodable catalog row");
                self.skipped += 1;
            }
        }
    }
}

/// Load a catalog from a `.csv`, `.json` (array or single object) or `.jsonl` file.
/// Invalid rows are skipped and counted; duplicate ids fail the whole load.
pub fn load_catalog(path: impl AsRef<Path>) -> Result<LoadReport, CatalogError> {
    let path = path.as_ref();
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_lowercase();
    let mut report = LoadReport::default();
    match ext.as_str() {
        "csv" => {
            let mut reader = csv::Reader::from_path(path)?;
            for (line, record) in reader.deserialize::<InputCourse>().enumerate() {
                match record {
                    Ok(row) => report.admit(row),
                    Err(err) if matches!(err.kind(), csv::ErrorKind::Deserialize { .. }) => {
                        tracing::warn!(record = line + 1, %err, "skipping undecodable catalog row");
                        report.skipped += 1;
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        }
        "jsonl" => {
            let reader = BufReader::new(File::open(path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() { continue; }
                report.admit_json(serde_json::from_str(&line), line_no + 1);
            }
        }
        "json" => {
            let json: serde_json::Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
            let values = match json {
                serde_json::Value::Array(values) => values,
                other => vec![other],
            };
            for (idx, value) in values.into_iter().enumerate() {
                report.admit_json(serde_json::from_value(value), idx + 1);
            }
        }
        other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
    }

    check_unique_ids(&report.items)?;
    tracing::info!(path = %path.display(), items = report.items.len(), skipped = report.skipped, "loaded catalog");
    Ok(report)
}

pub fn check_unique_ids(catalog: &[CatalogItem]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(catalog.len());
    for item in catalog {
        if !seen.insert(item.id.as_str()) {
            return Err(CatalogError::DuplicateId(item.id.clone()));
        }
    }
    Ok(())
}

/// Hex SHA-1 over every field of every item, in catalog order.
pub fn fingerprint(catalog: &[CatalogItem]) -> String {
    let mut hasher = Sha1::new();
    for item in catalog {
        hasher.update(item.id.as_bytes());
        hasher.update([0u8]);
        hasher.update(item.combined_text().as_bytes());
        hasher.update([0u8]);
        hasher.update(item.price.to_bits().to_le_bytes());
        hasher.update(item.subscriber_count.to_le_bytes());
        hasher.update(item.num_lectures.map_or(u64::MAX, u64::from).to_le_bytes());
        hasher.update(item.content_duration.map_or(u32::MAX, f32::to_bits).to_le_bytes());
    }
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parses_export_levels() {
        assert_eq!("Beginner Level".parse::<Level>().unwrap(), Level::Beginner);
        assert_eq!("intermediate".parse::<Level>().unwrap(), Level::Intermediate);
        assert_eq!("Expert Level".parse::<Level>().unwrap(), Level::Advanced);
        assert!("All Levels".parse::<Level>().is_err());
    }

    #[test]
    fn combined_text_joins_fields() {
        let item = CatalogItem::new("1", "Python for Beginners", "Programming", Level::Beginner);
        assert_eq!(item.combined_text(), "Python for Beginners Programming Beginner");
    }

    #[test]
    fn loads_csv_with_export_headers_and_skips_bad_rows() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "course_id,coursetitle,subject,level,price,num_subscribers,num_lectures").unwrap();
        writeln!(file, "1,Learn Guitar,Musical Instruments,Beginner Level,20,150,12").unwrap();
        writeln!(file, "2,Everything Finance,Business Finance,All Levels,0,10,3").unwrap();
        writeln!(file, "3,Web Design,Web Development,Expert Level,45,9,40").unwrap();
        let report = load_catalog(file.path()).unwrap();
        assert_eq!(report.items.len(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.items[1].level, Level::Advanced);
        assert_eq!(report.items[0].subscriber_count, 150);
        assert_eq!(report.items[0].num_lectures, Some(12));
    }

    #[test]
    fn undecodable_rows_are_skipped_not_fatal() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "course_id,coursetitle,subject,level,price,num_subscribers").unwrap();
        writeln!(file, "1,Learn Guitar,Musical Instruments,Beginner Level,20,150").unwrap();
        writeln!(file, "2,Free Finance,Business Finance,Beginner Level,Free,10").unwrap();
        let report = load_catalog(file.path()).unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.items[0].id, "1");

        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"id":"a","title":"T","subject":"S","level":"Beginner","subscriber_count":-4}}"#).unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(file, r#"{{"id":"b","title":"U","subject":"S","level":"expert"}}"#).unwrap();
        let report = load_catalog(file.path()).unwrap();
        assert_eq!(report.items.len(), 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.items[0].level, Level::Advanced);
    }

    #[test]
    fn level_deserializes_leniently_and_serializes_by_name() {
        assert_eq!(serde_json::from_str::<Level>("\"beginner\"").unwrap(), Level::Beginner);
        assert_eq!(serde_json::from_str::<Level>("\"Intermediate Level\"").unwrap(), Level::Intermediate);
        assert!(serde_json::from_str::<Level>("\"All Levels\"").is_err());
        assert_eq!(serde_json::to_string(&Level::Advanced).unwrap(), "\"Advanced\"");
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"id":"a","title":"T","subject":"S","level":"Beginner"}}"#).unwrap();
        writeln!(file, r#"{{"id":"a","title":"U","subject":"S","level":"Advanced"}}"#).unwrap();
        assert!(matches!(load_catalog(file.path()), Err(CatalogError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = NamedTempFile::new().unwrap();
        assert!(matches!(load_catalog(file.path()), Err(CatalogError::UnsupportedFormat(_))));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = vec![CatalogItem::new("1", "Rust", "Programming", Level::Beginner)];
        let mut b = a.clone();
        assert_eq!(fingerprint(&a), fingerprint(&b));
        b[0].title = "Go".into();
        assert_ne!(fingerprint(&a), fingerprint(&b));
        let mut c = a.clone();
        c[0].price = 9.99;
        assert_ne!(fingerprint(&a), fingerprint(&c));
    }
}
