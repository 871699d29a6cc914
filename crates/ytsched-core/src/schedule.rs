//! Publish-slot allocation.
//!
//! Turns (start instant, cadence, reserved set, count) into an ordered
//! list of distinct future UTC timestamps, spaced evenly across a 24h day
//! starting at the cadence's local day-start time. Allocation is a pure
//! function of its inputs: the reserved set is an explicit value owned by
//! the caller, refreshed from the ledger before every call.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Per-day publishing cadence, stored on the project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cadence {
    /// IANA timezone name, e.g. "America/New_York".
    pub timezone: String,
    /// How many videos to publish per day (>= 1).
    pub videos_per_day: u32,
    /// Local time the day's first slot lands on, "HH:MM".
    pub day_start: String,
}

/// Parses "HH:MM" into a [`NaiveTime`].
pub fn parse_hhmm(value: &str) -> Result<NaiveTime, ScheduleError> {
    let invalid = || ScheduleError::InvalidDayStart(value.to_string());
    let value = value.trim();
    let (hh, mm) = value.split_once(':').ok_or_else(invalid)?;
    let hh: u32 = hh.parse().map_err(|_| invalid())?;
    let mm: u32 = mm.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hh, mm, 0).ok_or_else(invalid)
}

/// Formats an instant as RFC3339 UTC with `Z` suffix, second precision.
pub fn to_rfc3339_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Allocates `count` distinct future publish slots.
///
/// Slots start at `start`'s local day boundary plus the cadence day-start
/// time, then stride forward by `floor(86400 / videos_per_day)` seconds
/// indefinitely. The cursor never re-snaps to the day boundary, so the
/// cadence is a consistent absolute interval; after a daylight-saving
/// transition the local wall time of slots drifts relative to the nominal
/// day start. That stride is deliberate and must not be "fixed" to a
/// per-day reset.
///
/// Every returned value is strictly later than `start`, absent from the
/// input `reserved` set, and inserted into `reserved` before returning.
pub fn allocate_slots(
    start: DateTime<Utc>,
    cadence: &Cadence,
    count: usize,
    reserved: &mut BTreeSet<String>,
) -> Result<Vec<String>, ScheduleError> {
    // Above 86400/day the integer stride collapses to zero and the
    // cursor could never pass `start`.
    if cadence.videos_per_day == 0 || cadence.videos_per_day > 86_400 {
        return Err(ScheduleError::InvalidCadence(cadence.videos_per_day));
    }
    if count == 0 {
        return Ok(Vec::new());
    }

    let tz: Tz = cadence
        .timezone
        .parse()
        .map_err(|_| ScheduleError::InvalidTimezone(cadence.timezone.clone()))?;
    let day_start = parse_hhmm(&cadence.day_start)?;
    let interval = Duration::seconds(86_400 / i64::from(cadence.videos_per_day));

    // Base cursor: local midnight of start's calendar day + day start,
    // sub-second precision zeroed.
    let local_start = start.with_timezone(&tz);
    let naive = local_start.date_naive().and_time(day_start);
    let base = match tz.from_local_datetime(&naive) {
        chrono::LocalResult::Single(dt) => dt,
        chrono::LocalResult::Ambiguous(earlier, _) => earlier,
        // Day start falls in a DST gap; the hour after the gap is the
        // closest representable wall time.
        chrono::LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .ok_or_else(|| ScheduleError::InvalidTimezone(cadence.timezone.clone()))?,
    };

    let mut cursor = base.with_timezone(&Utc);
    while cursor <= start {
        cursor += interval;
    }

    let mut out = Vec::with_capacity(count);
    let mut tried = 0usize;
    while out.len() < count {
        tried += 1;
        if tried > count * 20 {
            return Err(ScheduleError::SlotExhaustion {
                needed: count,
                tried: tried - 1,
            });
        }
        let slot = to_rfc3339_utc(cursor);
        if reserved.insert(slot.clone()) {
            out.push(slot);
        }
        cursor += interval;
    }
    Ok(out)
}
