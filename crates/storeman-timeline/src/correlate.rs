//! Join of MPC events, destination hashes and block timestamps into timelines

use chrono::DateTime;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::event::ExtractedEvent;
use crate::resolver::{timestamp_of, TimestampMap};
use crate::timeline::Timeline;

/// Unix seconds of a log `@timestamp`, floored.
pub fn log_time_secs(timestamp: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()
        .map(|dt| dt.timestamp())
}

/// Round half toward positive infinity.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Build one timeline per distinct origin tx of `success`, in event order.
pub fn correlate(
    success: &[ExtractedEvent],
    receive: &[ExtractedEvent],
    dst_hashes: &[ExtractedEvent],
    origin_timestamps: &TimestampMap,
    dst_timestamps: &TimestampMap,
) -> Vec<Timeline> {
    let mut dst_by_origin: HashMap<&str, &str> = HashMap::new();
    for event in dst_hashes {
        if let (Some(origin), Some(dst)) = (event.origin_tx(), event.dst_tx_hash()) {
            dst_by_origin.insert(origin, dst);
        }
    }

    let mut seen = HashSet::new();
    let mut timelines = Vec::new();
    for event in success {
        let Some(origin_tx) = event.origin_tx() else {
            continue;
        };
        if !seen.insert(origin_tx) {
            debug!(origin_tx, "Skipping repeated success event");
            continue;
        }
        let dst_tx_hash = dst_by_origin.get(origin_tx).copied();
        timelines.push(build_timeline(
            event,
            origin_tx,
            dst_tx_hash,
            origin_timestamps,
            dst_timestamps,
        ));
    }

    let unsigned = receive
        .iter()
        .filter_map(ExtractedEvent::origin_tx)
        .filter(|tx| !seen.contains(tx))
        .collect::<HashSet<_>>()
        .len();
    if unsigned > 0 {
        warn!(count = unsigned, "Received MPC requests without a success event");
    }

    info!(
        timelines = timelines.len(),
        with_dst = timelines.iter().filter(|t| t.dst_tx_hash.is_some()).count(),
        complete = timelines.iter().filter(|t| t.cross_during.is_some()).count(),
        "Correlated timelines"
    );
    timelines
}

fn build_timeline(
    event: &ExtractedEvent,
    origin_tx: &str,
    dst_tx_hash: Option<&str>,
    origin_timestamps: &TimestampMap,
    dst_timestamps: &TimestampMap,
) -> Timeline {
    let cross_start_ts = timestamp_of(origin_timestamps, origin_tx);
    let cross_end_ts = dst_tx_hash.and_then(|hash| timestamp_of(dst_timestamps, hash));
    let cross_during = cross_start_ts
        .zip(cross_end_ts)
        .map(|(start, end)| end.saturating_sub(start));

    let mpc_return_ts = log_time_secs(&event.timestamp);
    let mpc_sign_during = event.sign_duration_secs();
    let mpc_sign_during_act = event.sign_duration_active_secs();
    let sign = mpc_sign_during.as_deref().and_then(|v| v.parse::<f64>().ok());
    let sign_act = mpc_sign_during_act.as_deref().and_then(|v| v.parse::<f64>().ok());

    let mpc_receive_ts = mpc_return_ts
        .zip(sign)
        .map(|(ret, sign)| round_half_up(ret as f64 - sign));
    let agent_approve_during = sign.zip(sign_act).map(|(sign, act)| round_half_up(sign - act));
    let agent_req_sign_during = mpc_receive_ts
        .zip(cross_start_ts)
        .map(|(received, start)| received.saturating_sub(start).max(0));

    Timeline {
        origin_tx: origin_tx.to_string(),
        dst_tx_hash: dst_tx_hash.map(str::to_string),
        cross_start_ts,
        cross_end_ts,
        cross_during,
        mpc_receive_ts,
        mpc_return_ts,
        mpc_sign_during,
        mpc_sign_during_act,
        agent_approve_during,
        agent_req_sign_during,
        raw_message: event.raw_message.clone(),
    }
}
