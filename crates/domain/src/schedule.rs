//! Pickup and delivery scheduling.
//!
//! The customer picks a day of month, a month name and a 12-hour clock time
//! for both pickup and delivery. A slot only resolves to a timestamp when all
//! three parts are present and valid.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

const MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// One half of a schedule as picked by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleSlot {
    /// Day of month.
    pub day: Option<u32>,
    /// Month name, e.g. "March" or "Mar".
    pub month: Option<String>,
    /// Clock time, e.g. "10:30 AM".
    pub time: Option<String>,
}

impl ScheduleSlot {
    /// Creates a fully specified slot.
    pub fn new(day: u32, month: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            day: Some(day),
            month: Some(month.into()),
            time: Some(time.into()),
        }
    }

    /// Resolves the slot in the given year.
    pub fn timestamp(&self, year: i32) -> Option<NaiveDateTime> {
        build_timestamp(year, self.day, self.month.as_deref(), self.time.as_deref())
    }
}

/// Pickup and delivery selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub pickup: ScheduleSlot,
    pub delivery: ScheduleSlot,
}

/// A schedule with both slots resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSchedule {
    pub pickup_at: NaiveDateTime,
    pub delivery_at: NaiveDateTime,
}

impl Schedule {
    /// Creates a schedule from its two slots.
    pub fn new(pickup: ScheduleSlot, delivery: ScheduleSlot) -> Self {
        Self { pickup, delivery }
    }

    /// Resolves both slots, or returns `None` if either cannot be built.
    pub fn resolve(&self, year: i32) -> Option<ResolvedSchedule> {
        Some(ResolvedSchedule {
            pickup_at: self.pickup.timestamp(year)?,
            delivery_at: self.delivery.timestamp(year)?,
        })
    }
}

/// Looks up a month number by its English name or three-letter abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    let name = name.trim().to_lowercase();
    if name.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .find(|(full, _)| *full == name || (name.len() == 3 && full.starts_with(&name)))
        .map(|(_, number)| *number)
}

/// Parses a 12-hour clock time such as `"9:05 am"` or `"10:30PM"`.
pub fn parse_clock_time(time: &str) -> Option<NaiveTime> {
    let upper = time.trim().to_uppercase();
    let (clock, pm) = if let Some(clock) = upper.strip_suffix("PM") {
        (clock, true)
    } else {
        (upper.strip_suffix("AM")?, false)
    };

    let (hour, minute) = clock.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    if !(1..=12).contains(&hour) {
        return None;
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, false) => h,
        (h, true) => h + 12,
    };
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Combines a day of month, a month name and a clock time into a timestamp.
///
/// Returns `None` if any part is missing, the month is not recognized, the
/// time is not a 12-hour clock time, or the date does not exist.
pub fn build_timestamp(
    year: i32,
    day: Option<u32>,
    month: Option<&str>,
    time: Option<&str>,
) -> Option<NaiveDateTime> {
    let month = month_number(month?)?;
    let date = NaiveDate::from_ymd_opt(year, month, day?)?;
    let time = parse_clock_time(time?)?;
    Some(date.and_time(time))
}
