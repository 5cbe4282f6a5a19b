//! Core domain types and traits for the Shelfrank ranking engine.

pub mod book;
pub mod config;
pub mod error;
pub mod ids;
pub mod range;
pub mod review;
pub mod timestamp;
pub mod traits;

pub use book::{Book, BookStats, RankedBook};
pub use config::{CacheConfig, ShelfrankConfig, StorageConfig};
pub use error::{CoreError, CoreResult};
pub use ids::{BookId, ReviewId};
pub use range::ReviewWindow;
pub use review::Review;
pub use traits::{AggregateCache, BookStore, ReviewStore};
