use crate::model::DatePlan;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone, Utc};

/// Civil date of `now` in the given time zone.
pub fn today_in<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    now.with_timezone(tz).date_naive()
}

pub fn today_at_offset(offset: FixedOffset) -> NaiveDate {
    today_in(Utc::now(), &offset)
}

/// Plans offsets `1..=days` before `today`, yesterday first.
///
/// Dates that fall outside the era numbering are skipped.
pub fn plan_window(today: NaiveDate, days: u32) -> Vec<DatePlan> {
    (1..=days)
        .filter_map(|offset| {
            let date = today.checked_sub_days(Days::new(u64::from(offset)))?;
            DatePlan::new(offset, date).ok()
        })
        .collect()
}
