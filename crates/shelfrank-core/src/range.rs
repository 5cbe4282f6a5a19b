use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::review::Review;

/// Inclusive creation-time window used to narrow which reviews feed an
/// aggregate.
///
/// Either bound may be absent. An absent bound leaves that side open, so a
/// window with neither bound admits every review. An inverted window (lower
/// bound after upper bound) is not an error; it simply admits nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewWindow {
    /// Earliest creation time admitted, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Latest creation time admitted, inclusive.
    pub to: Option<DateTime<Utc>>,
}

impl ReviewWindow {
    /// Window admitting every review regardless of creation time.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Window admitting reviews created at or after `from`.
    #[must_use]
    pub const fn since(from: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Window admitting reviews created at or before `to`.
    #[must_use]
    pub const fn until(to: DateTime<Utc>) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Window admitting reviews created between `from` and `to`, inclusive on
    /// both ends.
    #[must_use]
    pub const fn between(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Window covering the trailing `months` calendar months ending at `now`.
    ///
    /// Month arithmetic clamps to the end of shorter months, e.g. one month
    /// before March 31 is the last day of February.
    #[must_use]
    pub fn last_months(months: u32, now: DateTime<Utc>) -> Self {
        let from = now
            .checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self::between(from, now)
    }

    /// Returns `true` when neither bound is set.
    #[must_use]
    pub const fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Returns `true` when a review created at `ts` falls inside the window.
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        match (self.from, self.to) {
            (None, None) => true,
            (Some(from), None) => ts >= from,
            (None, Some(to)) => ts <= to,
            (Some(from), Some(to)) => ts >= from && ts <= to,
        }
    }

    /// Narrows a review slice to the reviews created inside the window.
    #[must_use]
    pub fn filter<'a>(&self, reviews: &'a [Review]) -> Vec<&'a Review> {
        reviews
            .iter()
            .filter(|review| self.contains(review.created_at))
            .collect()
    }
}
