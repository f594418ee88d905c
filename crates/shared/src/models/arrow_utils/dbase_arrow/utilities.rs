use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

fn unix_epoch_date() -> NaiveDate {
    DateTime::<Utc>::UNIX_EPOCH.date_naive()
}

/// Days since 1970-01-01, the Arrow Date32 representation
pub fn naive_date_to_epoch_days(date: NaiveDate) -> i32 {
    date.signed_duration_since(unix_epoch_date()).num_days() as i32
}

/// Inverse of [`naive_date_to_epoch_days`]
pub fn epoch_days_to_naive_date(days: i32) -> Option<NaiveDate> {
    unix_epoch_date().checked_add_signed(chrono::Duration::days(i64::from(days)))
}

/// Milliseconds since the Unix epoch, the Arrow Timestamp(ms) representation
pub fn naive_datetime_to_epoch_millis(datetime: NaiveDateTime) -> i64 {
    datetime.and_utc().timestamp_millis()
}

/// Inverse of [`naive_datetime_to_epoch_millis`]
pub fn epoch_millis_to_naive_datetime(millis: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}
