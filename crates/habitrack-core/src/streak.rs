//! Current-streak calculator.
//!
//! Computes a "current streak": the number of consecutive calendar days,
//! ending today or yesterday, on which at least one completion was
//! recorded. This is the GitHub-contribution-style metric, not a
//! longest-run-ever metric: once a gap is found the walk stops, and older
//! runs are never scanned.
//!
//! Timestamps are projected to calendar dates in UTC; see the crate-level
//! documentation for the time-zone convention.

use chrono::{DateTime, NaiveDate, Utc};

/// Compute the current streak over a completion history.
///
/// `history` is the raw sequence of completion timestamps as recorded:
/// unsorted, possibly with several entries on the same calendar day.
/// `today` anchors the walk and normally comes from [`crate::Clock::today`].
///
/// The rules:
/// - each timestamp counts only through its UTC calendar date, and
///   duplicate dates collapse to one;
/// - if the most recent date is neither `today` nor yesterday the streak
///   is 0, regardless of any older runs;
/// - otherwise the streak is the length of the unbroken run of consecutive
///   dates walking backwards from the most recent one.
///
/// Pure and total: any well-typed input yields a result, the empty history
/// yields 0, and the answer depends only on the set of dates present.
pub fn current_streak(history: &[DateTime<Utc>], today: NaiveDate) -> u32 {
    if history.is_empty() {
        return 0;
    }

    let mut dates: Vec<NaiveDate> = history.iter().map(|ts| ts.date_naive()).collect();
    dates.sort_unstable_by(|a, b| b.cmp(a));
    dates.dedup();

    let most_recent = dates[0];
    let yesterday = today.pred_opt();
    if most_recent != today && Some(most_recent) != yesterday {
        return 0;
    }

    let mut streak = 0u32;
    let mut expected = most_recent;
    for date in dates {
        if date != expected {
            break;
        }
        streak += 1;
        expected = match expected.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }
    streak
}
