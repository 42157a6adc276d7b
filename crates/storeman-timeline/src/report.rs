//! Plain-text summary reports

use std::path::{Path, PathBuf};

use crate::stats::{summarize, FieldSource, Stats};
use crate::timeline::column;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportField {
    pub name: &'static str,
    /// Appended to every value, e.g. `%`
    pub unit: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportSpec {
    pub title: &'static str,
    pub fields: &'static [ReportField],
}

const fn plain(name: &'static str) -> ReportField {
    ReportField { name, unit: "" }
}

pub const CROSS_CHAIN_REPORT: ReportSpec = ReportSpec {
    title: "Cross-chain Transaction Duration Analysis",
    fields: &[
        plain(column::CROSS_DURING),
        plain(column::MPC_SIGN_DURING),
        plain(column::MPC_SIGN_DURING_ACT),
        plain(column::AGENT_APPROVE_DURING),
        plain(column::AGENT_REQ_SIGN_DURING),
    ],
};

pub const METRICS_REPORT: ReportSpec = ReportSpec {
    title: "System Metrics Analysis",
    fields: &[
        plain("Load Average"),
        ReportField { name: "Disk Usage", unit: "%" },
        ReportField { name: "Memory Used (MB)", unit: " MB" },
    ],
};

impl ReportSpec {
    pub fn analyze<R: FieldSource>(&self, records: &[R]) -> Vec<(ReportField, Stats)> {
        self.fields
            .iter()
            .map(|field| (*field, summarize(records, field.name)))
            .collect()
    }

    pub fn render(&self, results: &[(ReportField, Stats)]) -> String {
        let mut out = format!("{}\n{}\n\n", self.title, "=".repeat(50));
        for (field, stats) in results {
            let unit = field.unit;
            out.push_str(&format!("{}:\n", field.name));
            out.push_str(&format!("  Count:    {}\n", stats.count));
            out.push_str(&format!("  Min:      {:.2}{}\n", stats.min, unit));
            out.push_str(&format!("  Max:      {:.2}{}\n", stats.max, unit));
            out.push_str(&format!("  Average:  {:.2}{}\n", stats.average, unit));
            out.push_str(&format!("  Median:   {:.2}{}\n", stats.median, unit));
            out.push('\n');
        }
        out
    }
}

/// `<dir>/<stem>_analysis.txt` next to the analyzed file.
pub fn analysis_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());
    input.with_file_name(format!("{}_analysis.txt", stem))
}
