//! Declarative description of one ranking query.
//!
//! A [`RankingPlan`] records which derived aggregate columns are attached,
//! the creation-time window feeding each one, and the filters and ordering
//! applied on top. Steps that reference a derived column fail at construction
//! when the column is not attached, so an engine never receives a plan it
//! cannot execute.

use serde::{Deserialize, Serialize};
use shelfrank_core::{CoreError, CoreResult, ReviewWindow};

/// Derived aggregate columns a plan can attach to each result row.
///
/// The column names are part of the result contract: thresholds and sort keys
/// address aggregates through them, and engines project them under exactly
/// these names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedColumn {
    /// Number of reviews inside the count window.
    ReviewsCount,
    /// Mean star rating over the average window.
    ReviewsAvgRating,
}

impl DerivedColumn {
    /// Returns the column name used in result rows and rendered SQL.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReviewsCount => "reviews_count",
            Self::ReviewsAvgRating => "reviews_avg_rating",
        }
    }
}

/// Sort direction for a ranking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    /// Returns the SQL keyword for this direction.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Final ordering of a ranking: one derived column and a direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: DerivedColumn,
    pub direction: Direction,
}

/// Composable ranking query over the catalog.
///
/// Attachment operations always succeed and overwrite any previous window for
/// the same column. Threshold and ordering operations are checked: they
/// return [`CoreError::MissingAggregate`] when the column they reference is
/// not attached. Repeating a checked operation replaces the earlier value;
/// the last application wins.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingPlan {
    title: Option<String>,
    count_window: Option<ReviewWindow>,
    avg_window: Option<ReviewWindow>,
    min_reviews: Option<u32>,
    sort: Option<SortKey>,
}

impl RankingPlan {
    /// Creates an empty plan matching every book with no aggregates attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to books whose title contains `needle`,
    /// case-insensitively. An empty needle leaves the plan unchanged.
    #[must_use]
    pub fn with_title(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        if needle.is_empty() {
            return self;
        }
        self.title = Some(needle);
        self
    }

    /// Attaches the review count column, computed over `window`.
    #[must_use]
    pub fn attach_count(mut self, window: ReviewWindow) -> Self {
        self.count_window = Some(window);
        self
    }

    /// Attaches the average rating column, computed over `window`.
    #[must_use]
    pub fn attach_avg(mut self, window: ReviewWindow) -> Self {
        self.avg_window = Some(window);
        self
    }

    /// Keeps only books whose windowed review count is at least `min`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingAggregate`] when no count column is
    /// attached, since the threshold would have nothing to filter on.
    pub fn with_min_reviews(mut self, min: u32) -> CoreResult<Self> {
        if self.count_window.is_none() {
            return Err(CoreError::missing_aggregate(
                DerivedColumn::ReviewsCount.as_str(),
            ));
        }
        self.min_reviews = Some(min);
        Ok(self)
    }

    /// Orders results by an attached derived column.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::MissingAggregate`] when `column` is not attached.
    pub fn sort_by(mut self, column: DerivedColumn, direction: Direction) -> CoreResult<Self> {
        if !self.has_aggregate(column) {
            return Err(CoreError::missing_aggregate(column.as_str()));
        }
        self.sort = Some(SortKey { column, direction });
        Ok(self)
    }

    /// Returns `true` when the given derived column is attached.
    #[must_use]
    pub fn has_aggregate(&self, column: DerivedColumn) -> bool {
        match column {
            DerivedColumn::ReviewsCount => self.count_window.is_some(),
            DerivedColumn::ReviewsAvgRating => self.avg_window.is_some(),
        }
    }

    /// Title substring filter, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Window feeding the count column, if attached.
    #[must_use]
    pub fn count_window(&self) -> Option<&ReviewWindow> {
        self.count_window.as_ref()
    }

    /// Window feeding the average column, if attached.
    #[must_use]
    pub fn avg_window(&self) -> Option<&ReviewWindow> {
        self.avg_window.as_ref()
    }

    /// Minimum windowed review count, if a threshold was applied.
    #[must_use]
    pub fn min_reviews(&self) -> Option<u32> {
        self.min_reviews
    }

    /// Final ordering, if one was applied.
    #[must_use]
    pub fn sort(&self) -> Option<SortKey> {
        self.sort
    }
}
