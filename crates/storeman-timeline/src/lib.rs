//! Storeman Timeline - cross-chain transaction timeline reconstruction
//!
//! Turns storeman/MPC log lines and on-chain block timestamps into one
//! timeline per bridged transaction:
//! - Declarative field extraction per event kind
//! - Two-stage batched timestamp resolution over JSON-RPC
//! - Correlation into durations (cross-chain, signing, approval)
//! - CSV/JSON reports and descriptive statistics

pub mod correlate;
pub mod dedup;
pub mod duration;
pub mod event;
pub mod extract;
pub mod missing;
pub mod pipeline;
pub mod report;
pub mod resolver;
pub mod scan;
pub mod stats;
pub mod table;
pub mod timeline;

pub use correlate::correlate;
pub use dedup::dedupe_by_origin_tx;
pub use duration::{parse_duration, try_parse_duration};
pub use event::{EventKind, ExtractedEvent};
pub use extract::{extract, extract_all};
pub use missing::missing_signatures;
pub use pipeline::{TimelineOutputs, TimelinePipeline, TimelineRun};
pub use report::{analysis_path, ReportSpec, CROSS_CHAIN_REPORT, METRICS_REPORT};
pub use resolver::{TimestampMap, TimestampRecord, TimestampResolver};
pub use scan::{scan_events, write_events, DEFAULT_SCAN_SIZE};
pub use stats::{summarize, FieldSource, Stats};
pub use table::{parse_csv, read_csv, render_csv, write_csv, CsvRecord, CsvTable};
pub use timeline::{Timeline, TIMELINE_COLUMNS};
