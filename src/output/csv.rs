// CSV export of a (filtered) result set.
//
// The layout is fixed: the text column is always quoted with embedded quotes
// doubled, categories are joined with ';', confidence has two decimals and
// timestamps are ISO-8601. Rows are separated by '\n' with no trailing newline.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::models::{iso_millis, DetectionResult};
use crate::stats::ResultFilter;

pub const CSV_HEADER: [&str; 7] = [
    "ID",
    "Text",
    "Language",
    "Is Toxic",
    "Confidence",
    "Categories",
    "Timestamp",
];

/// Quote a field, doubling any embedded double quotes.
pub fn quote_field(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// One CSV row for a result.
pub fn csv_row(result: &DetectionResult) -> String {
    [
        result.id.clone(),
        quote_field(&result.text),
        result.language.to_string(),
        result.is_toxic.to_string(),
        format!("{:.2}", result.confidence),
        result.categories.join(";"),
        iso_millis::format(&result.timestamp),
    ]
    .join(",")
}

/// Render a header plus one row per result.
pub fn to_csv<'a, I>(results: I) -> String
where
    I: IntoIterator<Item = &'a DetectionResult>,
{
    std::iter::once(CSV_HEADER.join(","))
        .chain(results.into_iter().map(csv_row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Default file name for an export, e.g. `cybershield-toxic-2024-05-01.csv`.
pub fn default_export_filename(filter: ResultFilter, date: NaiveDate) -> String {
    format!("cybershield-{}-{}.csv", filter.as_str(), date.format("%Y-%m-%d"))
}

/// Write the CSV for `results` to `path`. Returns the number of data rows.
pub fn write_csv(path: &Path, results: &[&DetectionResult]) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", path.display()))?;
        }
    }

    let content = to_csv(results.iter().copied());
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write CSV export to {}", path.display()))?;

    info!(rows = results.len(), path = %path.display(), "CSV export written");
    Ok(results.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;
    use chrono::{DateTime, Utc};

    fn sample() -> DetectionResult {
        let mut result = DetectionResult::new(
            r#"He said "go die""#,
            Language::English,
            true,
            0.876,
            vec!["Threats/Violence".to_string(), "Profanity".to_string()],
        );
        result.id = "1714557600000abc123xyz".to_string();
        result.timestamp = DateTime::parse_from_rfc3339("2024-05-01T10:00:00.000Z")
            .unwrap()
            .with_timezone(&Utc);
        result
    }

    #[test]
    fn test_header_only_for_empty_set() {
        let csv = to_csv(std::iter::empty());
        assert_eq!(csv, "ID,Text,Language,Is Toxic,Confidence,Categories,Timestamp");
    }

    #[test]
    fn test_row_format() {
        let row = csv_row(&sample());
        assert_eq!(
            row,
            r#"1714557600000abc123xyz,"He said ""go die""",english,true,0.88,Threats/Violence;Profanity,2024-05-01T10:00:00.000Z"#
        );
    }

    #[test]
    fn test_rows_joined_without_trailing_newline() {
        let a = sample();
        let b = sample();
        let csv = to_csv([&a, &b]);
        assert_eq!(csv.lines().count(), 3);
        assert!(!csv.ends_with('\n'));
    }

    #[test]
    fn test_default_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            default_export_filename(ResultFilter::Toxic, date),
            "cybershield-toxic-2024-05-01.csv"
        );
    }

    #[test]
    fn test_write_csv_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("export.csv");
        let r = sample();
        let rows = write_csv(&path, &[&r]).unwrap();
        assert_eq!(rows, 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ID,Text,"));
    }
}
