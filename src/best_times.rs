use itertools::Itertools;
use serde_json::Value;

/// Key the best-times record is persisted under. No other key belongs to
/// this crate's persisted state.
pub const BEST_TIMES_KEY: &str = "bestTimes";

/// The board never holds more than this many entries.
pub const MAX_ENTRIES: usize = 5;

/// Merge a new time into the board: append, sort ascending, keep the
/// lowest [`MAX_ENTRIES`]. Duplicates are retained as separate entries.
pub fn merge(times: &[u64], new_time: u64) -> Vec<u64> {
    let mut merged: Vec<u64> = times.iter().copied().chain([new_time]).sorted().collect();
    merged.truncate(MAX_ENTRIES);
    merged
}

/// 1-indexed rank `candidate` would occupy if merged into `times`.
/// Existing equal entries rank first, so this is 1 + |{t : t <= candidate}|.
pub fn rank_of(times: &[u64], candidate: u64) -> usize {
    times.iter().filter(|&&t| t <= candidate).count() + 1
}

/// Decode a persisted board value. Anything other than an array of
/// non-negative integers is treated as absent and yields an empty board.
/// The result is always ascending regardless of stored order.
pub fn decode(value: &Value) -> Vec<u64> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let mut times = Vec::with_capacity(items.len());
    for item in items {
        match item.as_u64() {
            Some(secs) => times.push(secs),
            None => return Vec::new(),
        }
    }
    times.sort_unstable();
    times
}

/// Encode a board for persistence as a JSON array of integers.
pub fn encode(times: &[u64]) -> Value {
    Value::from(times.to_vec())
}
