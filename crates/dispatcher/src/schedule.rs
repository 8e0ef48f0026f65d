//! Dispatch cadence

use std::time::Duration;

use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: u64 = 3_600;

/// Time to wait before the next dispatch cycle may start
///
/// Returns zero when no cycle has run yet, or when the whole hours elapsed since
/// `last_dispatch` reach `frequency_in_hours`. Otherwise returns the exact time left
/// until `frequency_in_hours` have passed. A clock that moved backwards counts as no
/// time elapsed.
pub fn compute_wait_time(
    now: DateTime<Utc>,
    last_dispatch: Option<DateTime<Utc>>,
    frequency_in_hours: u32,
) -> Duration {
    let Some(last_dispatch) = last_dispatch else {
        return Duration::ZERO;
    };

    let elapsed = (now - last_dispatch).to_std().unwrap_or(Duration::ZERO);
    let frequency_hours = u64::from(frequency_in_hours);

    if elapsed.as_secs() / SECONDS_PER_HOUR >= frequency_hours {
        return Duration::ZERO;
    }

    Duration::from_secs(frequency_hours * SECONDS_PER_HOUR).saturating_sub(elapsed)
}
