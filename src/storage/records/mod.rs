pub(crate) mod message;
pub(crate) mod room;
pub(crate) mod user;

use time::OffsetDateTime;

/// Timestamps are stored as unix milliseconds so ordering and window
/// arithmetic stay plain integer comparisons.
pub(crate) fn timestamp_ms(ts: OffsetDateTime) -> i64 {
    i64::try_from(ts.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
}

pub(crate) fn from_timestamp_ms(ms: i64) -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub(crate) fn now_ms() -> i64 {
    timestamp_ms(OffsetDateTime::now_utc())
}
