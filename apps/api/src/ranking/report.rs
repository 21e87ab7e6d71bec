//! CSV rendering of a `BatchReport`.
//!
//! Columns: "Candidate Name", every criterion id in criteria-set order, "Total Score".
//! Rows follow the report's record order. Failure markers and warnings are not part
//! of the tabular schema; they stay on the JSON form of the report.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::ranking::batch::BatchReport;

pub const CANDIDATE_NAME_COLUMN: &str = "Candidate Name";
pub const TOTAL_SCORE_COLUMN: &str = "Total Score";

#[derive(Debug, Error)]
pub enum ReportWriteError {
    #[error("I/O error writing report: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error writing report: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not move report into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub struct ReportSerializer;

impl ReportSerializer {
    pub fn header(report: &BatchReport) -> Vec<String> {
        std::iter::once(CANDIDATE_NAME_COLUMN.to_string())
            .chain(report.criteria.ids().map(str::to_string))
            .chain(std::iter::once(TOTAL_SCORE_COLUMN.to_string()))
            .collect()
    }

    pub fn write_csv<W: Write>(report: &BatchReport, writer: W) -> Result<(), ReportWriteError> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(Self::header(report))?;

        for record in &report.records {
            let mut row = Vec::with_capacity(report.criteria.len() + 2);
            row.push(record.candidate_name.clone());
            row.extend(
                report
                    .criteria
                    .ids()
                    .map(|id| record.score_for(id).unwrap_or(0).to_string()),
            );
            row.push(record.total_score.to_string());
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_csv_bytes(report: &BatchReport) -> Result<Vec<u8>, ReportWriteError> {
        let mut buffer = Vec::new();
        Self::write_csv(report, &mut buffer)?;
        Ok(buffer)
    }

    /// Writes `ranking-<report_id>.csv` into `dir` via a temp file + rename, so
    /// readers never see a half-written artifact.
    pub fn write_to_dir(report: &BatchReport, dir: &Path) -> Result<PathBuf, ReportWriteError> {
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        Self::write_csv(report, &mut file)?;

        let path = dir.join(format!("ranking-{}.csv", report.report_id));
        file.persist(&path)?;

        info!("Report written to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::candidate::{CriterionScore, ScoreRecord};
    use crate::ranking::criteria::{CriteriaSet, CriteriaSource, Strategy};
    use chrono::Utc;
    use uuid::Uuid;

    fn record(name: &str, scores: &[(&str, u32)]) -> ScoreRecord {
        ScoreRecord {
            candidate_name: name.to_string(),
            per_criterion: scores
                .iter()
                .map(|&(id, score)| CriterionScore {
                    criterion_id: id.to_string(),
                    score,
                })
                .collect(),
            total_score: scores.iter().map(|(_, s)| s).sum(),
            warnings: vec![],
            failure: None,
        }
    }

    fn sample_report() -> BatchReport {
        let criteria = CriteriaSet::from_labels(
            ["Rust", "Leadership, mentoring"],
            Strategy::Judged,
            CriteriaSource::Supplied,
        );
        BatchReport {
            report_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            criteria,
            records: vec![
                record("Jane Doe", &[("Rust", 5), ("Leadership, mentoring", 2)]),
                record("Unknown", &[("Rust", 0), ("Leadership, mentoring", 3)]),
            ],
        }
    }

    #[test]
    fn test_header_order() {
        let header = ReportSerializer::header(&sample_report());
        assert_eq!(
            header,
            vec!["Candidate Name", "Rust", "Leadership, mentoring", "Total Score"]
        );
    }

    #[test]
    fn test_csv_round_trip_preserves_columns_and_values() {
        let report = sample_report();
        let bytes = ReportSerializer::to_csv_bytes(&report).unwrap();

        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(headers, ReportSerializer::header(&report));

        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), report.records.len());

        for (row, source) in rows.iter().zip(&report.records) {
            assert_eq!(&row[0], source.candidate_name);
            for (i, id) in report.criteria.ids().enumerate() {
                let value: u32 = row[i + 1].parse().unwrap();
                assert_eq!(Some(value), source.score_for(id));
            }
            let total: u32 = row[row.len() - 1].parse().unwrap();
            assert_eq!(total, source.total_score);
        }
    }

    #[test]
    fn test_empty_report_writes_header_only() {
        let mut report = sample_report();
        report.records.clear();
        let text = String::from_utf8(ReportSerializer::to_csv_bytes(&report).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_write_to_dir_persists_file() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let path = ReportSerializer::write_to_dir(&report, dir.path()).unwrap();

        assert!(path.ends_with(format!("ranking-{}.csv", report.report_id)));
        let written = std::fs::read(&path).unwrap();
        assert_eq!(written, ReportSerializer::to_csv_bytes(&report).unwrap());
    }

    #[test]
    fn test_write_to_missing_dir_is_report_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = ReportSerializer::write_to_dir(&sample_report(), &missing).unwrap_err();
        assert!(matches!(err, ReportWriteError::Io(_)));
    }
}
