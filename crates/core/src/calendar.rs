//! Business-day arithmetic.
//!
//! The whole system uses one convention: `[start, end)` counting weekdays
//! only, so a block started Monday and completed the same Monday took 0
//! business days, and Monday to the following Monday is 5.

use chrono::{Datelike, Weekday};

use crate::Time;

/// Count business days in `[start, end)`, skipping Saturdays and Sundays.
///
/// Returns 0 when `end` is not after `start`.
pub fn business_days_between(start: Time, end: Time) -> u32 {
    let mut day = start.date_naive();
    let last = end.date_naive();
    let mut count = 0;

    while day < last {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            count += 1;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }

    count
}
