pub mod builder;
pub mod cache;
pub mod engine;
pub mod memory;
pub mod plan;
pub mod presets;
pub mod sqlite_engine;

pub use builder::RankingQuery;
pub use cache::{BookStatsCache, CacheStats, StatsReader};
pub use engine::RankingEngine;
pub use memory::MemoryRankingEngine;
pub use plan::{DerivedColumn, Direction, RankingPlan, SortKey};
pub use presets::RankingPreset;
pub use sqlite_engine::SqliteRankingEngine;
