//! CSV writer and reader for report files
//!
//! Written files carry an unquoted header line followed by fully quoted rows.
//! Double quotes inside values become single quotes and line breaks become
//! spaces, so no cell ever needs escaping or spans lines.

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use storeman_core::{Result, StoremanError};
use tracing::{info, warn};

use crate::stats::FieldSource;

/// Make a value safe to place between quotes.
pub fn escape_value(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(|c: char| c == '\n' || c == '\r', " ")
        .replace('"', "'")
}

fn csv_error(err: csv::Error) -> StoremanError {
    StoremanError::Serialization(format!("CSV error: {}", err))
}

/// Header line, then one quoted record per row.
fn write_table<W, H>(mut out: W, headers: &[H], rows: &[Vec<String>]) -> Result<W>
where
    W: Write,
    H: AsRef<str>,
{
    let header_line = headers
        .iter()
        .map(|h| h.as_ref())
        .collect::<Vec<_>>()
        .join(",");
    writeln!(out, "{}", header_line)?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);
    for row in rows {
        writer
            .write_record(row.iter().map(|value| escape_value(value)))
            .map_err(csv_error)?;
    }
    writer.into_inner().map_err(|e| StoremanError::Io(e.into_error()))
}

pub fn render_csv<H: AsRef<str>>(headers: &[H], rows: &[Vec<String>]) -> Result<String> {
    let bytes = write_table(Vec::new(), headers, rows)?;
    String::from_utf8(bytes).map_err(|e| StoremanError::Serialization(e.to_string()))
}

pub fn write_csv<H: AsRef<str>>(path: &Path, headers: &[H], rows: &[Vec<String>]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_table(File::create(path)?, headers, rows)?;
    info!(path = %path.display(), rows = rows.len(), "Wrote CSV");
    Ok(())
}

/// One data row keyed by header
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvRecord {
    values: HashMap<String, String>,
}

impl CsvRecord {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    /// Values in the given column order, empty for unknown columns.
    pub fn row(&self, headers: &[String]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.get(h).unwrap_or_default().to_string())
            .collect()
    }
}

impl FieldSource for CsvRecord {
    fn field_value(&self, field: &str) -> Option<Cow<'_, str>> {
        self.get(field).map(Cow::Borrowed)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub records: Vec<CsvRecord>,
}

/// Header names with surrounding whitespace and stray quotes removed
fn header_names(record: &StringRecord) -> Vec<String> {
    record
        .iter()
        .map(|h| h.trim().trim_matches('"').to_string())
        .collect()
}

/// Parse CSV content. Rows whose column count differs from the header are
/// skipped with a warning.
pub fn parse_csv(content: &str) -> CsvTable {
    let content = content.trim();
    if content.is_empty() {
        return CsvTable::default();
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut rows = reader.records();

    let headers = match rows.next() {
        Some(Ok(record)) => header_names(&record),
        Some(Err(e)) => {
            warn!(error = %e, "Unreadable CSV header");
            return CsvTable::default();
        }
        None => return CsvTable::default(),
    };

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable CSV line");
                skipped += 1;
                continue;
            }
        };
        if row.len() != headers.len() {
            warn!(
                line = row.position().map(|p| p.line()),
                columns = row.len(),
                expected = headers.len(),
                "Skipping malformed CSV line"
            );
            skipped += 1;
            continue;
        }
        records.push(CsvRecord::from_pairs(
            headers.iter().cloned().zip(row.iter().map(str::to_string)),
        ));
    }

    if records.is_empty() {
        warn!("CSV content has no data rows");
    }
    info!(records = records.len(), skipped, "Parsed CSV");
    CsvTable { headers, records }
}

pub fn read_csv(path: &Path) -> Result<CsvTable> {
    let content = fs::read_to_string(path).map_err(|e| {
        StoremanError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
    })?;
    Ok(parse_csv(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_quotes_and_escapes() {
        let rows = vec![vec!["a \"quoted\"\nvalue".to_string(), "2".to_string()]];
        let rendered = render_csv(&["Name", "Count"], &rows).unwrap();
        assert_eq!(rendered, "Name,Count\n\"a 'quoted' value\",\"2\"\n");
    }

    #[test]
    fn test_comma_inside_quotes_survives() {
        let rows = vec![vec!["x, y".to_string(), "z".to_string()]];
        let table = parse_csv(&render_csv(&["A", "B"], &rows).unwrap());

        assert_eq!(table.headers, vec!["A", "B"]);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].get("A"), Some("x, y"));
        assert_eq!(table.records[0].get("B"), Some("z"));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let content = "a,b,c\n\"1\",\"2\",\"3\"\n\"1\",\"2\"\n\"4\",\"5\",\"6\"\n";
        let table = parse_csv(content);

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].get("a"), Some("1"));
        assert_eq!(table.records[1].get("c"), Some("6"));
    }

    #[test]
    fn test_long_rows_and_crlf_lines() {
        let content = "a,b\r\n\"1\",\"2\",\"3\"\r\n\"4\",\"5\"\r\n";
        let table = parse_csv(content);

        assert_eq!(table.headers, vec!["a", "b"]);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].get("b"), Some("5"));
    }

    #[test]
    fn test_quoted_header_is_unquoted() {
        let table = parse_csv("\"Timestamp\", \"OriginTx\"\n\"t\",\"0xa\"");
        assert_eq!(table.headers, vec!["Timestamp", "OriginTx"]);
        assert_eq!(table.records[0].get("OriginTx"), Some("0xa"));
    }

    #[test]
    fn test_header_only_and_empty() {
        assert!(parse_csv("a,b").records.is_empty());
        assert_eq!(parse_csv("   "), CsvTable::default());
    }

    #[test]
    fn test_write_and_read_file() {
        let path = std::env::temp_dir().join(format!("storeman-csv-{}.csv", std::process::id()));
        write_csv(&path, &["K", "V"], &[vec!["k1".to_string(), "v1".to_string()]]).unwrap();
        let table = read_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(table.records[0].row(&table.headers), vec!["k1", "v1"]);
    }

    #[test]
    fn test_read_missing_file_is_invalid_input() {
        let err = read_csv(Path::new("/nonexistent/storeman.csv")).unwrap_err();
        assert!(matches!(err, StoremanError::InvalidInput(_)));
    }
}
