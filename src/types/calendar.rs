use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// The next `count` Monday-to-Friday dates strictly after `after`.
/// Public holidays are not considered.
pub fn next_business_days(after: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(count);
    let mut current = after;

    while dates.len() < count {
        current += Duration::days(1);
        if is_business_day(current) {
            dates.push(current);
        }
    }

    dates
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
