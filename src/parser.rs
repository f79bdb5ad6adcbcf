//! Decoding of grade collections exported by the provider layer.
//!
//! Collections come as a JSON array of grades or as a flat CSV file, either
//! of them optionally gzip-compressed.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use serde::Deserialize;
use tracing::debug;

use crate::model::{Grade, Score};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeFormat {
    Json,
    Csv,
}

impl GradeFormat {
    /// Infers the format from the file extension, looking through a trailing `.gz`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_ascii_lowercase)
            .with_context(|| format!("no file name in {}", path.display()))?;
        let name = name.strip_suffix(".gz").unwrap_or(&name);

        if name.ends_with(".json") {
            Ok(GradeFormat::Json)
        } else if name.ends_with(".csv") {
            Ok(GradeFormat::Csv)
        } else {
            bail!("cannot tell the grade format of {} (expected .json or .csv)", path.display())
        }
    }
}

/// A row of the flat CSV export.
///
/// Score cells hold a number, nothing (score absent) or a status code such
/// as `Abs`, which yields a disabled score.
#[derive(Debug, Deserialize)]
struct GradeRow {
    subject_id: String,
    #[serde(default)]
    subject_name: String,
    given_at: DateTime<Utc>,
    #[serde(default)]
    out_of: Option<String>,
    #[serde(default)]
    coefficient: Option<f64>,
    #[serde(default)]
    student_score: Option<String>,
    #[serde(default)]
    average_score: Option<String>,
    #[serde(default)]
    min_score: Option<String>,
    #[serde(default)]
    max_score: Option<String>,
    #[serde(default)]
    bonus: Option<bool>,
    #[serde(default)]
    optional: Option<bool>,
    #[serde(default)]
    created_by_account: Option<String>,
}

fn score_cell(cell: Option<String>) -> Option<Score> {
    let text = cell?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) => Some(Score::new(value)),
        Err(_) => Some(Score::disabled(text)),
    }
}

impl From<GradeRow> for Grade {
    fn from(row: GradeRow) -> Self {
        Grade {
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            given_at: row.given_at,
            out_of: score_cell(row.out_of),
            coefficient: row.coefficient.unwrap_or(1.0),
            student_score: score_cell(row.student_score),
            average_score: score_cell(row.average_score),
            min_score: score_cell(row.min_score),
            max_score: score_cell(row.max_score),
            bonus: row.bonus.unwrap_or(false),
            optional: row.optional.unwrap_or(false),
            created_by_account: row.created_by_account.unwrap_or_default(),
        }
    }
}

fn decompress(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoded = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .context("invalid gzip stream")?;
    Ok(decoded)
}

/// Decodes a grade collection, decompressing one gzip layer first.
///
/// # Errors
///
/// Returns an error if the bytes are not a valid collection in `format`.
pub fn parse_grades(bytes: &[u8], format: GradeFormat) -> Result<Vec<Grade>> {
    if bytes.starts_with(&GZIP_MAGIC) {
        let decoded = decompress(bytes)?;
        debug!(compressed = bytes.len(), decoded = decoded.len(), "Gzip input decoded");
        return parse_plain(&decoded, format);
    }
    parse_plain(bytes, format)
}

fn parse_plain(bytes: &[u8], format: GradeFormat) -> Result<Vec<Grade>> {
    let grades: Vec<Grade> = match format {
        GradeFormat::Json => serde_json::from_slice(bytes).context("invalid grade JSON")?,
        GradeFormat::Csv => {
            let mut rdr = csv::Reader::from_reader(bytes);
            let mut grades: Vec<Grade> = Vec::new();
            for result in rdr.deserialize::<GradeRow>() {
                grades.push(result.context("invalid grade CSV row")?.into());
            }
            grades
        }
    };

    Ok(grades)
}

/// Reads and decodes the grade collection stored at `path`.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_grades(path: &Path) -> Result<Vec<Grade>> {
    let format = GradeFormat::from_path(path)?;
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let grades = parse_grades(&bytes, format)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    debug!(count = grades.len(), ?format, "Grades loaded");
    Ok(grades)
}
