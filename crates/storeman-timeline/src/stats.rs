//! Descriptive statistics over one numeric field of a record set

use std::borrow::Cow;
use tracing::{debug, warn};

/// Number of offending values quoted in the invalid-value warning
const INVALID_SAMPLE: usize = 3;

/// Anything that exposes named string fields
pub trait FieldSource {
    fn field_value(&self, field: &str) -> Option<Cow<'_, str>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub median: f64,
    pub count: usize,
}

/// Coerce a report value to a number. A trailing `%` is accepted; the absent
/// sentinel, empty strings and non-finite results are rejected.
pub fn coerce(value: &str) -> Option<f64> {
    let value = value.trim();
    let value = value.strip_suffix('%').unwrap_or(value).trim_end();
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Statistics of `field` over the values that coerce to numbers. Zero stats
/// when nothing is numeric.
pub fn summarize<R: FieldSource>(records: &[R], field: &str) -> Stats {
    if records.is_empty() {
        warn!(field, "No records to summarize");
        return Stats::default();
    }

    let mut values = Vec::with_capacity(records.len());
    let mut invalid: Vec<(usize, String)> = Vec::new();
    for (idx, record) in records.iter().enumerate() {
        let raw = record.field_value(field);
        match raw.as_deref().and_then(coerce) {
            Some(v) => values.push(v),
            None => invalid.push((idx, raw.map(Cow::into_owned).unwrap_or_default())),
        }
    }

    if !invalid.is_empty() {
        let sample = invalid
            .iter()
            .take(INVALID_SAMPLE)
            .map(|(idx, v)| format!("[{}]={:?}", idx, v))
            .collect::<Vec<_>>()
            .join(", ");
        warn!(field, invalid = invalid.len(), sample = %sample, "Ignoring non-numeric values");
    }

    if values.is_empty() {
        warn!(field, "No numeric values");
        return Stats::default();
    }

    let stats = stats_of(values);
    debug!(field, count = stats.count, "Summarized field");
    stats
}

fn stats_of(mut values: Vec<f64>) -> Stats {
    values.sort_by(f64::total_cmp);
    let count = values.len();
    let sum: f64 = values.iter().sum();
    let mid = count / 2;
    let median = if count % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    };

    Stats {
        min: values[0],
        max: values[count - 1],
        average: sum / count as f64,
        median,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CsvRecord;

    fn records(field: &str, values: &[&str]) -> Vec<CsvRecord> {
        values
            .iter()
            .map(|v| CsvRecord::from_pairs([(field, *v)]))
            .collect()
    }

    #[test]
    fn test_mixed_values() {
        let rows = records("X", &["10", "N/A", "20", "abc", "30"]);
        let stats = summarize(&rows, "X");
        assert_eq!(
            stats,
            Stats {
                min: 10.0,
                max: 30.0,
                average: 20.0,
                median: 20.0,
                count: 3
            }
        );
    }

    #[test]
    fn test_even_count_median() {
        let rows = records("X", &["4", "1", "3", "2"]);
        let stats = summarize(&rows, "X");
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
    }

    #[test]
    fn test_percent_values() {
        let rows = records("Disk Usage", &["20%", " 40 % ", "60%"]);
        let stats = summarize(&rows, "Disk Usage");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.average, 40.0);
    }

    #[test]
    fn test_no_numeric_values() {
        assert_eq!(summarize(&records("X", &["N/A", ""]), "X"), Stats::default());
        assert_eq!(summarize::<CsvRecord>(&[], "X"), Stats::default());
        assert_eq!(summarize(&records("Y", &["1"]), "X"), Stats::default());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("1.5"), Some(1.5));
        assert_eq!(coerce("-3"), Some(-3.0));
        assert_eq!(coerce("N/A"), None);
        assert_eq!(coerce("inf"), None);
        assert_eq!(coerce("NaN"), None);
    }

    #[test]
    fn test_ordering_invariant() {
        let rows = records("X", &["0.5", "100", "7", "7", "-2"]);
        let s = summarize(&rows, "X");
        assert!(s.min <= s.median && s.median <= s.max);
        assert!(s.min <= s.average && s.average <= s.max);
    }
}
