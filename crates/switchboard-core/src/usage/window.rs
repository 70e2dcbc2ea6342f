//! Calendar windows for budget periods.
//!
//! Windows are anchored in the caller's time zone: daily starts at local
//! midnight, weekly at the most recent Sunday 00:00, monthly at 00:00 on the
//! first of the month. The returned instant is in UTC for ledger queries.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};
use switchboard_types::usage::BudgetPeriod;

/// Start of the `period` window containing `now`.
pub fn window_start<Tz: TimeZone>(period: BudgetPeriod, now: &DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let start_date = match period {
        BudgetPeriod::Daily => today,
        BudgetPeriod::Weekly => {
            let since_sunday = u64::from(now.weekday().num_days_from_sunday());
            today.checked_sub_days(Days::new(since_sunday)).unwrap_or(today)
        }
        BudgetPeriod::Monthly => today.with_day(1).unwrap_or(today),
    };
    start_of_day(&now.timezone(), start_date)
}

/// 00:00 on `date` in `tz`. When midnight does not exist locally (a DST jump
/// at 00:00) the first valid instant after the gap is used.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(local) = tz.from_local_datetime(&midnight).earliest() {
        return local.with_timezone(&Utc);
    }
    (1..=2)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| tz.from_local_datetime(&date.and_time(time)).earliest())
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_daily_window_starts_at_midnight() {
        let now = at(2026, 10, 14, 15, 30);
        assert_eq!(window_start(BudgetPeriod::Daily, &now), at(2026, 10, 14, 0, 0));
    }

    #[test]
    fn test_weekly_window_starts_on_sunday() {
        // 2026-10-14 is a Wednesday; the preceding Sunday is the 11th.
        let now = at(2026, 10, 14, 9, 0);
        assert_eq!(window_start(BudgetPeriod::Weekly, &now), at(2026, 10, 11, 0, 0));

        let sunday = at(2026, 10, 11, 23, 59);
        assert_eq!(window_start(BudgetPeriod::Weekly, &sunday), at(2026, 10, 11, 0, 0));
    }

    #[test]
    fn test_weekly_window_crosses_month_boundary() {
        // Thursday 2026-10-01 belongs to the week starting Sunday 2026-09-27.
        let now = at(2026, 10, 1, 12, 0);
        assert_eq!(window_start(BudgetPeriod::Weekly, &now), at(2026, 9, 27, 0, 0));
    }

    #[test]
    fn test_monthly_window_starts_on_the_first() {
        let now = at(2026, 2, 28, 18, 0);
        assert_eq!(window_start(BudgetPeriod::Monthly, &now), at(2026, 2, 1, 0, 0));
    }

    #[test]
    fn test_window_is_anchored_in_local_zone() {
        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        // 2026-10-14 02:00 at +05:00 is still the 13th in UTC.
        let now = offset.with_ymd_and_hms(2026, 10, 14, 2, 0, 0).unwrap();
        assert_eq!(window_start(BudgetPeriod::Daily, &now), at(2026, 10, 13, 19, 0));
    }

    #[test]
    fn test_every_window_contains_now() {
        let now = at(2026, 10, 18, 8, 45);
        for period in BudgetPeriod::ALL {
            assert!(window_start(period, &now) <= now, "{period}");
        }
    }
}
