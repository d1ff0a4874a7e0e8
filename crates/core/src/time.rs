#![forbid(unsafe_code)]

use crate::error::DomainError;
use std::sync::atomic::{AtomicI64, Ordering};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

static LAST_MS: AtomicI64 = AtomicI64::new(0);

fn wall_clock_ms() -> i64 {
    let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
    let ms = nanos / 1_000_000i128;
    if ms <= 0 {
        0
    } else if ms >= i64::MAX as i128 {
        i64::MAX
    } else {
        ms as i64
    }
}

/// Current wall-clock time in Unix milliseconds, never decreasing within the
/// process even if the system clock steps backwards. Equal values are
/// possible; journal ordering breaks ties with the storage sequence.
pub fn now_ms() -> i64 {
    let wall = wall_clock_ms();
    let mut prev = LAST_MS.load(Ordering::Relaxed);
    loop {
        let candidate = wall.max(prev);
        match LAST_MS.compare_exchange_weak(
            prev,
            candidate,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return candidate,
            Err(observed) => prev = observed,
        }
    }
}

pub fn ts_ms_to_rfc3339(ts_ms: i64) -> String {
    let nanos = (ts_ms as i128) * 1_000_000i128;
    let dt = OffsetDateTime::from_unix_timestamp_nanos(nanos).unwrap_or(OffsetDateTime::UNIX_EPOCH);
    dt.format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub fn rfc3339_to_ts_ms(value: &str) -> Result<i64, DomainError> {
    let dt = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|_| DomainError::InvalidTimestamp(value.to_string()))?;
    let ms = dt.unix_timestamp_nanos() / 1_000_000i128;
    i64::try_from(ms).map_err(|_| DomainError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_is_non_decreasing() {
        let mut last = now_ms();
        for _ in 0..1000 {
            let next = now_ms();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn rfc3339_round_trip() {
        let ms = 1_700_000_000_123i64;
        let text = ts_ms_to_rfc3339(ms);
        assert_eq!(rfc3339_to_ts_ms(&text).expect("parse"), ms);
    }

    #[test]
    fn rfc3339_rejects_garbage() {
        assert!(rfc3339_to_ts_ms("not-a-timestamp").is_err());
    }
}
