use chrono::{DateTime, SubsecRound, Utc};

/// Millisecond-timestamp id, bumped past `existing` so ids stay unique and
/// increasing even when two records are created within the same millisecond.
pub(crate) fn next_id(existing: impl IntoIterator<Item = i64>) -> i64 {
    let now = Utc::now().timestamp_millis();
    match existing.into_iter().max() {
        Some(max) if max >= now => max + 1,
        _ => now,
    }
}

/// Current time at the millisecond precision the store keeps, so a value
/// returned to the caller equals the one read back later.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
