use chrono::{DateTime, Utc};
use shared_store::records::{DurationBucket, RateTable};

use crate::models::BookingError;

/// Price a consultation window against a practitioner's rate table, in
/// minor currency units.
///
/// Up to 45 minutes the price is the smallest bucket that covers the
/// duration. Beyond that, full hours are billed at the hourly rate and the
/// remainder is bucketed the same way; a remainder of zero adds nothing.
pub fn quote(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    rates: &RateTable,
) -> Result<i64, BookingError> {
    let duration = (end - start).num_minutes();
    if duration <= 0 {
        return Err(BookingError::InvalidWindow(
            "appointment must end after it starts".to_string(),
        ));
    }

    let amount = if duration <= 45 {
        rates.rate(bucket_for(duration))
    } else {
        let hours = duration / 60;
        let remainder = duration % 60;
        let mut amount = hours * rates.rate(DurationBucket::Hour);
        if remainder > 0 {
            amount += rates.rate(bucket_for(remainder));
        }
        amount
    };

    Ok(amount)
}

fn bucket_for(minutes: i64) -> DurationBucket {
    if minutes <= 15 {
        DurationBucket::Quarter
    } else if minutes <= 30 {
        DurationBucket::Half
    } else {
        DurationBucket::ThreeQuarter
    }
}
