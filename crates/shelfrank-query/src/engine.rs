use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shelfrank_core::{BookId, BookStats, CoreResult, RankedBook};

use crate::plan::RankingPlan;
use crate::presets::RankingPreset;

/// Execution seam for ranking plans.
///
/// Implementations must agree on the result contract: rows carry the derived
/// columns the plan attached, zero-review books keep a count of zero but
/// never receive an average, and rating-ordered rankings contain only books
/// that have an average.
#[async_trait]
pub trait RankingEngine: Send + Sync {
    /// Executes a ranking plan and returns the ordered result rows.
    async fn rank(&self, plan: &RankingPlan) -> CoreResult<Vec<RankedBook>>;

    /// Computes the all-time aggregate snapshot for one book, or `None` when
    /// the book does not exist.
    async fn book_stats(&self, book_id: BookId) -> CoreResult<Option<BookStats>>;

    /// Convenience entry point: executes a named preset anchored at `now`.
    async fn rank_preset(
        &self,
        preset: RankingPreset,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<RankedBook>> {
        let plan = preset.plan(now)?;
        self.rank(&plan).await
    }
}
