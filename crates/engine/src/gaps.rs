//! Missing-date detection.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use engine_core::DateRange;

/// Pure set difference: every date of `range` with no stored row.
///
/// Linear in range length; operator-facing ranges are capped at about 120
/// days, so no batching is needed.
pub fn missing_dates(range: DateRange, stored: &BTreeSet<NaiveDate>) -> Vec<NaiveDate> {
    range.days().filter(|d| !stored.contains(d)).collect()
}
