//! Fluent front end over [`RankingPlan`].
//!
//! Checked steps return `CoreResult<Self>` so callers chain them with `?`;
//! a misordered chain surfaces as an error where it is written instead of at
//! execution time.

use shelfrank_core::{CoreResult, ReviewWindow};

use crate::plan::{DerivedColumn, Direction, RankingPlan};

/// Builder for ranking queries over the catalog.
#[derive(Clone, Debug, Default)]
pub struct RankingQuery {
    plan: RankingPlan,
}

impl RankingQuery {
    /// Starts an unrestricted query over every book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to titles containing `needle`, case-insensitively.
    /// Case folding is ASCII-only on every engine, so accented characters
    /// match exactly. An empty needle leaves the query unchanged.
    #[must_use]
    pub fn by_title(mut self, needle: impl Into<String>) -> Self {
        self.plan = self.plan.with_title(needle);
        self
    }

    /// Attaches the review count column over `window`.
    #[must_use]
    pub fn with_review_count(mut self, window: ReviewWindow) -> Self {
        self.plan = self.plan.attach_count(window);
        self
    }

    /// Attaches the average rating column over `window`.
    #[must_use]
    pub fn with_avg_rating(mut self, window: ReviewWindow) -> Self {
        self.plan = self.plan.attach_avg(window);
        self
    }

    /// Keeps only books with at least `min` reviews in the count window.
    ///
    /// # Errors
    ///
    /// Fails unless a count column was attached first.
    pub fn min_reviews(mut self, min: u32) -> CoreResult<Self> {
        self.plan = self.plan.with_min_reviews(min)?;
        Ok(self)
    }

    /// Orders results by descending review count.
    ///
    /// # Errors
    ///
    /// Fails unless a count column was attached first.
    pub fn order_by_popularity(mut self) -> CoreResult<Self> {
        self.plan = self
            .plan
            .sort_by(DerivedColumn::ReviewsCount, Direction::Desc)?;
        Ok(self)
    }

    /// Orders results by descending average rating. Books without a
    /// qualifying review have no average and drop out of the ranking.
    ///
    /// # Errors
    ///
    /// Fails unless an average column was attached first.
    pub fn order_by_rating(mut self) -> CoreResult<Self> {
        self.plan = self
            .plan
            .sort_by(DerivedColumn::ReviewsAvgRating, Direction::Desc)?;
        Ok(self)
    }

    /// Attaches the count column over `window` and orders by it, most
    /// reviewed first.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible for uniform chaining.
    pub fn popular(self, window: ReviewWindow) -> CoreResult<Self> {
        self.with_review_count(window).order_by_popularity()
    }

    /// Attaches the average column over `window` and orders by it, best
    /// rated first.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible for uniform chaining.
    pub fn highest_rated(self, window: ReviewWindow) -> CoreResult<Self> {
        self.with_avg_rating(window).order_by_rating()
    }

    /// Borrows the underlying plan.
    #[must_use]
    pub fn plan(&self) -> &RankingPlan {
        &self.plan
    }

    /// Consumes the builder, yielding the plan to hand to an engine.
    #[must_use]
    pub fn into_plan(self) -> RankingPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shelfrank_core::CoreError;

    use crate::plan::SortKey;

    use super::*;

    fn window() -> ReviewWindow {
        ReviewWindow::since(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    #[test]
    fn popular_attaches_count_and_sorts_by_it() {
        let plan = RankingQuery::new()
            .popular(window())
            .expect("popular")
            .into_plan();

        assert_eq!(plan.count_window(), Some(&window()));
        assert_eq!(
            plan.sort(),
            Some(SortKey {
                column: DerivedColumn::ReviewsCount,
                direction: Direction::Desc,
            })
        );
    }

    #[test]
    fn highest_rated_attaches_avg_and_sorts_by_it() {
        let plan = RankingQuery::new()
            .highest_rated(window())
            .expect("highest rated")
            .into_plan();

        assert_eq!(plan.avg_window(), Some(&window()));
        assert_eq!(
            plan.sort(),
            Some(SortKey {
                column: DerivedColumn::ReviewsAvgRating,
                direction: Direction::Desc,
            })
        );
    }

    #[test]
    fn chained_composites_end_sorted_by_rating() {
        // popular then highest_rated attaches both columns; the rating
        // sort lands last and therefore decides the final order.
        let plan = RankingQuery::new()
            .popular(window())
            .expect("popular")
            .highest_rated(window())
            .expect("highest rated")
            .min_reviews(2)
            .expect("threshold")
            .into_plan();

        assert!(plan.has_aggregate(DerivedColumn::ReviewsCount));
        assert!(plan.has_aggregate(DerivedColumn::ReviewsAvgRating));
        assert_eq!(plan.min_reviews(), Some(2));
        assert_eq!(
            plan.sort().map(|sort| sort.column),
            Some(DerivedColumn::ReviewsAvgRating)
        );
    }

    #[test]
    fn min_reviews_before_count_fails() {
        let err = RankingQuery::new().min_reviews(3).unwrap_err();
        assert!(matches!(err, CoreError::MissingAggregate { .. }));
    }

    #[test]
    fn title_filter_composes_with_rankings() {
        let plan = RankingQuery::new()
            .by_title("hobbit")
            .popular(window())
            .expect("popular")
            .into_plan();

        assert_eq!(plan.title(), Some("hobbit"));
    }
}
