//! Received signing requests that never completed

use std::collections::HashSet;
use tracing::info;

use crate::table::{CsvRecord, CsvTable};

pub const ORIGIN_TX_COLUMN: &str = "OriginTx";

/// Receive rows whose `OriginTx` does not appear in the success table, in
/// receive order. Rows without an origin tx are never reported.
pub fn missing_signatures(receive: &CsvTable, success: &CsvTable) -> Vec<CsvRecord> {
    let signed: HashSet<&str> = success
        .records
        .iter()
        .filter_map(|r| r.get(ORIGIN_TX_COLUMN))
        .collect();

    let missing: Vec<CsvRecord> = receive
        .records
        .iter()
        .filter(|r| {
            r.get(ORIGIN_TX_COLUMN)
                .and_then(storeman_core::from_absent)
                .is_some_and(|tx| !signed.contains(tx))
        })
        .cloned()
        .collect();

    info!(
        received = receive.records.len(),
        signed = signed.len(),
        missing = missing.len(),
        "Compared receive and success records"
    );
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_csv;

    #[test]
    fn test_reports_unsigned_requests() {
        let receive = parse_csv(
            "Timestamp,HashX,OriginTx\n\"t1\",\"0x1\",\"0xa\"\n\"t2\",\"0x2\",\"0xb\"\n\"t3\",\"0x3\",\"N/A\"\n\"t4\",\"0x4\",\"0xc\"",
        );
        let success = parse_csv("Timestamp,OriginTx\n\"t9\",\"0xb\"");
        let missing = missing_signatures(&receive, &success);

        let hashes: Vec<&str> = missing.iter().filter_map(|r| r.get("HashX")).collect();
        assert_eq!(hashes, vec!["0x1", "0x4"]);
    }

    #[test]
    fn test_nothing_missing() {
        let receive = parse_csv("OriginTx\n\"0xa\"");
        let success = parse_csv("OriginTx\n\"0xa\"");
        assert!(missing_signatures(&receive, &success).is_empty());
    }
}
