//! Fixed catalog rankings exposed to consumers by name.
//!
//! Every preset attaches both derived columns over its window, applies its
//! review floor, and ends ordered by average rating because the rating sort
//! is applied last. The popular and highest-rated presets over the same
//! window therefore return identical rankings; consumers depend on that
//! published order, so the chain must not be reordered.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shelfrank_core::{CoreResult, ReviewWindow};

use crate::builder::RankingQuery;
use crate::plan::RankingPlan;

/// Named ranking preset over a trailing window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPreset {
    /// Most reviewed books of the last month.
    PopularLastMonth,
    /// Most reviewed books of the last six months.
    PopularLast6Months,
    /// Best rated books of the last month.
    HighestRatedLastMonth,
    /// Best rated books of the last six months.
    HighestRatedLast6Months,
}

impl RankingPreset {
    /// Review floor for the one-month presets.
    pub const LAST_MONTH_MIN_REVIEWS: u32 = 2;

    /// Review floor for the six-month presets.
    pub const LAST_6_MONTHS_MIN_REVIEWS: u32 = 5;

    /// All presets, in display order.
    pub const ALL: [Self; 4] = [
        Self::PopularLastMonth,
        Self::PopularLast6Months,
        Self::HighestRatedLastMonth,
        Self::HighestRatedLast6Months,
    ];

    /// Returns the stable name consumers select this preset by.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PopularLastMonth => "popular_last_month",
            Self::PopularLast6Months => "popular_last_6_months",
            Self::HighestRatedLastMonth => "highest_rated_last_month",
            Self::HighestRatedLast6Months => "highest_rated_last_6_months",
        }
    }

    /// Number of trailing calendar months the preset covers.
    #[must_use]
    pub const fn months(self) -> u32 {
        match self {
            Self::PopularLastMonth | Self::HighestRatedLastMonth => 1,
            Self::PopularLast6Months | Self::HighestRatedLast6Months => 6,
        }
    }

    /// Minimum windowed review count a book needs to appear.
    #[must_use]
    pub const fn min_reviews(self) -> u32 {
        match self.months() {
            1 => Self::LAST_MONTH_MIN_REVIEWS,
            _ => Self::LAST_6_MONTHS_MIN_REVIEWS,
        }
    }

    /// Review window the preset aggregates over, anchored at `now`.
    #[must_use]
    pub fn window(self, now: DateTime<Utc>) -> ReviewWindow {
        ReviewWindow::last_months(self.months(), now)
    }

    /// Builds the executable plan for this preset, anchored at `now`.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible for uniform chaining.
    pub fn plan(self, now: DateTime<Utc>) -> CoreResult<RankingPlan> {
        let window = self.window(now);
        Ok(RankingQuery::new()
            .popular(window)?
            .highest_rated(window)?
            .min_reviews(self.min_reviews())?
            .into_plan())
    }
}

impl FromStr for RankingPreset {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "popular_last_month" => Ok(Self::PopularLastMonth),
            "popular_last_6_months" => Ok(Self::PopularLast6Months),
            "highest_rated_last_month" => Ok(Self::HighestRatedLastMonth),
            "highest_rated_last_6_months" => Ok(Self::HighestRatedLast6Months),
            _ => Err(()),
        }
    }
}
