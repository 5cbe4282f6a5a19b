use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shelfrank_core::{Book, BookId, BookStore, RankedBook, Review, ReviewStore, ReviewWindow};
use shelfrank_query::{
    BookStatsCache, MemoryRankingEngine, RankingEngine, RankingPreset, RankingQuery,
    SqliteRankingEngine, StatsReader,
};
use shelfrank_store::{
    create_sqlite_pool, run_migrations, BookMutationService, SqliteBookStore, SqliteReviewStore,
};
use uuid::Uuid;

struct TestContext {
    books: SqliteBookStore,
    reviews: SqliteReviewStore,
    engine: SqliteRankingEngine,
    pool: sqlx::SqlitePool,
}

async fn setup_context() -> TestContext {
    let db_path = temp_db_path();
    let database_url = format!("sqlite://{}", db_path.display());
    let pool = create_sqlite_pool(&database_url, 8)
        .await
        .expect("failed to create pool");
    run_migrations(&pool).await.expect("failed migrations");

    TestContext {
        books: SqliteBookStore::new(pool.clone()),
        reviews: SqliteReviewStore::new(pool.clone()),
        engine: SqliteRankingEngine::new(pool.clone()),
        pool,
    }
}

fn temp_db_path() -> PathBuf {
    let filename = format!("shelfrank-query-test-{}.db", Uuid::now_v7());
    std::env::temp_dir().join(filename)
}

async fn seed_book(ctx: &TestContext, title: &str, reviews: &[(u8, DateTime<Utc>)]) -> Book {
    let book = Book::new(title);
    ctx.books.create(&book).await.expect("failed to create book");
    for &(rating, created_at) in reviews {
        let review = Review::new(book.book_id, rating, "seeded").with_created_at(created_at);
        ctx.reviews
            .create(&review)
            .await
            .expect("failed to create review");
    }
    book
}

fn approx_eq(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() < 1e-9,
        _ => false,
    }
}

fn assert_rating_sorted_desc(rows: &[RankedBook]) {
    for pair in rows.windows(2) {
        let earlier = pair[0]
            .reviews_avg_rating
            .expect("rating-ordered rows carry an average");
        let later = pair[1]
            .reviews_avg_rating
            .expect("rating-ordered rows carry an average");
        assert!(
            earlier >= later - 1e-9,
            "rows out of order: {earlier} before {later}"
        );
    }
}

// ==================== Windowed Aggregate Tests ====================

#[tokio::test]
async fn last_month_preset_reports_windowed_count_and_average() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let book = seed_book(
        &ctx,
        "The Dispossessed",
        &[
            (5, now - Duration::days(8)),
            (4, now - Duration::days(9)),
            (3, now - Duration::days(10)),
            (1, now - Duration::days(213)),
            (1, now - Duration::days(214)),
        ],
    )
    .await;

    let rows = ctx
        .engine
        .rank_preset(RankingPreset::HighestRatedLastMonth, now)
        .await
        .expect("rank");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.book_id, book.book_id);
    assert_eq!(rows[0].reviews_count, Some(3));
    assert_eq!(rows[0].reviews_avg_rating, Some(4.0));
}

#[tokio::test]
async fn six_month_window_excludes_older_reviews_from_the_aggregates() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let book = seed_book(
        &ctx,
        "The Dispossessed",
        &[
            (5, now - Duration::days(8)),
            (4, now - Duration::days(9)),
            (3, now - Duration::days(10)),
            (1, now - Duration::days(213)),
            (1, now - Duration::days(214)),
        ],
    )
    .await;

    // The two seven-month-old reviews fall outside the window, so the
    // aggregates match the one-month values exactly.
    let window = ReviewWindow::last_months(6, now);
    let plan = RankingQuery::new()
        .popular(window)
        .expect("popular")
        .highest_rated(window)
        .expect("highest rated")
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.book_id, book.book_id);
    assert_eq!(rows[0].reviews_count, Some(3));
    assert_eq!(rows[0].reviews_avg_rating, Some(4.0));

    // Three windowed reviews sit below the six-month floor of five.
    let ranked = ctx
        .engine
        .rank_preset(RankingPreset::HighestRatedLast6Months, now)
        .await
        .expect("rank");
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn window_bounds_are_inclusive_at_the_six_month_edge() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let window = ReviewWindow::last_months(6, now);
    let from = window.from.expect("trailing windows have a lower bound");

    seed_book(
        &ctx,
        "Boundary Probe",
        &[
            (5, from + Duration::days(1)),
            (3, from),
            (1, from - Duration::days(1)),
        ],
    )
    .await;

    let plan = RankingQuery::new()
        .with_review_count(window)
        .with_avg_rating(window)
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");

    // The day-too-old review is out; the review on the edge itself counts.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reviews_count, Some(2));
    assert_eq!(rows[0].reviews_avg_rating, Some(4.0));
}

#[tokio::test]
async fn single_review_books_fall_below_the_popular_floor() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let book = seed_book(&ctx, "Quiet Debut", &[(4, now - Duration::days(3))]).await;

    let ranked = ctx
        .engine
        .rank_preset(RankingPreset::PopularLastMonth, now)
        .await
        .expect("rank");
    assert!(ranked.is_empty());

    let unthresholded = RankingQuery::new()
        .with_review_count(ReviewWindow::last_months(1, now))
        .into_plan();
    let rows = ctx.engine.rank(&unthresholded).await.expect("rank");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.book_id, book.book_id);
    assert_eq!(rows[0].reviews_count, Some(1));
    assert_eq!(rows[0].reviews_avg_rating, None);
}

#[tokio::test]
async fn rating_order_excludes_unreviewed_books() {
    let ctx = setup_context().await;
    let now = Utc::now();
    seed_book(&ctx, "Silent Shelf", &[]).await;
    let praised = seed_book(
        &ctx,
        "Praised",
        &[(5, now - Duration::days(1)), (4, now - Duration::days(2))],
    )
    .await;

    let plan = RankingQuery::new()
        .highest_rated(ReviewWindow::unbounded())
        .expect("highest rated")
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.book_id, praised.book_id);
    assert_eq!(rows[0].reviews_avg_rating, Some(4.5));
}

#[tokio::test]
async fn count_order_keeps_unreviewed_books() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let silent = seed_book(&ctx, "Silent Shelf", &[]).await;
    let busy = seed_book(
        &ctx,
        "Busy",
        &[
            (4, now - Duration::days(1)),
            (2, now - Duration::days(2)),
            (5, now - Duration::days(3)),
        ],
    )
    .await;

    let plan = RankingQuery::new()
        .popular(ReviewWindow::unbounded())
        .expect("popular")
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].book.book_id, busy.book_id);
    assert_eq!(rows[0].reviews_count, Some(3));
    assert_eq!(rows[1].book.book_id, silent.book_id);
    assert_eq!(rows[1].reviews_count, Some(0));
}

#[tokio::test]
async fn title_filter_matches_case_insensitively_and_escapes_wildcards() {
    let ctx = setup_context().await;
    seed_book(&ctx, "The HOBBIT", &[]).await;
    seed_book(&ctx, "Dune", &[]).await;
    seed_book(&ctx, "100% Wool", &[]).await;
    seed_book(&ctx, "Fully Woolen", &[]).await;

    let plan = RankingQuery::new().by_title("hobbit").into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.title, "The HOBBIT");

    // A literal percent sign is not a wildcard.
    let plan = RankingQuery::new().by_title("%").into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.title, "100% Wool");
}

#[tokio::test]
async fn aggregates_window_independently_in_one_query() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let book = seed_book(
        &ctx,
        "Split Windows",
        &[(5, now - Duration::days(2)), (1, now - Duration::days(300))],
    )
    .await;

    // All-time count, last-month average.
    let plan = RankingQuery::new()
        .with_review_count(ReviewWindow::unbounded())
        .with_avg_rating(ReviewWindow::last_months(1, now))
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].book.book_id, book.book_id);
    assert_eq!(rows[0].reviews_count, Some(2));
    assert_eq!(rows[0].reviews_avg_rating, Some(5.0));
}

#[tokio::test]
async fn inverted_window_yields_empty_aggregates_not_an_error() {
    let ctx = setup_context().await;
    let now = Utc::now();
    seed_book(&ctx, "Backwards", &[(5, now - Duration::days(5))]).await;

    let inverted = ReviewWindow::between(now, now - Duration::days(30));
    let plan = RankingQuery::new()
        .with_review_count(inverted)
        .with_avg_rating(inverted)
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].reviews_count, Some(0));
    assert_eq!(rows[0].reviews_avg_rating, None);
}

#[tokio::test]
async fn repeating_a_threshold_changes_nothing() {
    let ctx = setup_context().await;
    let now = Utc::now();
    seed_book(
        &ctx,
        "Well Reviewed",
        &[
            (5, now - Duration::days(1)),
            (4, now - Duration::days(2)),
            (4, now - Duration::days(3)),
        ],
    )
    .await;
    seed_book(&ctx, "Barely Reviewed", &[(3, now - Duration::days(1))]).await;

    let window = ReviewWindow::last_months(1, now);
    let once = RankingQuery::new()
        .popular(window)
        .expect("popular")
        .min_reviews(2)
        .expect("threshold")
        .into_plan();
    let twice = RankingQuery::new()
        .popular(window)
        .expect("popular")
        .min_reviews(2)
        .expect("threshold")
        .min_reviews(2)
        .expect("threshold again")
        .into_plan();

    let first = ctx.engine.rank(&once).await.expect("rank");
    let second = ctx.engine.rank(&twice).await.expect("rank");

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].book.title, "Well Reviewed");
}

// ==================== Preset Tests ====================

#[tokio::test]
async fn popular_and_highest_rated_presets_return_identical_rows() {
    let ctx = setup_context().await;
    let now = Utc::now();
    seed_book(
        &ctx,
        "Crowd Favorite",
        &[
            (5, now - Duration::days(1)),
            (5, now - Duration::days(2)),
            (4, now - Duration::days(3)),
        ],
    )
    .await;
    seed_book(
        &ctx,
        "Steady Seller",
        &[(3, now - Duration::days(4)), (3, now - Duration::days(5))],
    )
    .await;

    let popular = ctx
        .engine
        .rank_preset(RankingPreset::PopularLastMonth, now)
        .await
        .expect("rank");
    let highest = ctx
        .engine
        .rank_preset(RankingPreset::HighestRatedLastMonth, now)
        .await
        .expect("rank");

    assert_eq!(popular, highest);
    assert_eq!(popular.len(), 2);
    assert_eq!(popular[0].book.title, "Crowd Favorite");
    assert_rating_sorted_desc(&popular);
}

// ==================== Engine Agreement Tests ====================

#[tokio::test]
async fn engines_agree_on_a_seeded_catalog() {
    let ctx = setup_context().await;
    let memory = MemoryRankingEngine::new();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let now = Utc::now();

    // Three rating tiers, several books each, reviews spread over eight months.
    let tiers: [(&str, std::ops::RangeInclusive<u8>); 3] = [
        ("Acclaimed", 4..=5),
        ("Middling", 2..=4),
        ("Panned", 1..=2),
    ];
    let mut tier_ids: Vec<Vec<BookId>> = Vec::new();
    for (label, band) in &tiers {
        let mut ids = Vec::new();
        for i in 0..4 {
            let book = Book::new(format!("{label} Volume {i}"));
            ctx.books.create(&book).await.expect("create book");
            memory.insert_book(book.clone());
            ids.push(book.book_id);

            let review_count = rng.gen_range(5..=20);
            for _ in 0..review_count {
                let rating: u8 = rng.gen_range(band.clone());
                let age: i64 = rng.gen_range(0..240);
                let review = Review::new(book.book_id, rating, "seeded")
                    .with_created_at(now - Duration::days(age));
                ctx.reviews.create(&review).await.expect("create review");
                memory.insert_review(review);
            }
        }
        tier_ids.push(ids);
    }

    for preset in RankingPreset::ALL {
        let sqlite_rows = ctx
            .engine
            .rank_preset(preset, now)
            .await
            .expect("sqlite rank");
        let memory_rows = memory.rank_preset(preset, now).await.expect("memory rank");

        // Same books with the same aggregate values; only tie order may differ.
        let mut a = summarize(&sqlite_rows);
        let mut b = summarize(&memory_rows);
        a.sort_by(|x, y| x.0.cmp(&y.0));
        b.sort_by(|x, y| x.0.cmp(&y.0));
        assert_eq!(a.len(), b.len(), "row count for {}", preset.as_str());
        for ((id_a, count_a, avg_a), (id_b, count_b, avg_b)) in a.iter().zip(&b) {
            assert_eq!(id_a, id_b, "books for {}", preset.as_str());
            assert_eq!(count_a, count_b, "count of {id_a} for {}", preset.as_str());
            assert!(
                approx_eq(*avg_a, *avg_b),
                "average of {id_a} for {}: {avg_a:?} vs {avg_b:?}",
                preset.as_str()
            );
        }

        assert_rating_sorted_desc(&sqlite_rows);
        assert_rating_sorted_desc(&memory_rows);
    }

    // Over one shared window the average exists exactly when a review counts.
    let window = ReviewWindow::last_months(6, now);
    let plan = RankingQuery::new()
        .with_review_count(window)
        .with_avg_rating(window)
        .into_plan();
    for row in ctx.engine.rank(&plan).await.expect("rank") {
        let count = row.reviews_count.expect("count attached");
        assert_eq!(
            count == 0,
            row.reviews_avg_rating.is_none(),
            "average must be present iff a review qualifies for {}",
            row.book.title
        );
    }

    // Band separation: every acclaimed book averages at least 4.0, every
    // panned one at most 2.0, so rating order puts the first tier ahead.
    let plan = RankingQuery::new()
        .highest_rated(ReviewWindow::unbounded())
        .expect("highest rated")
        .into_plan();
    let rows = ctx.engine.rank(&plan).await.expect("rank");
    let position = |id: BookId| {
        rows.iter()
            .position(|row| row.book.book_id == id)
            .expect("every seeded book has reviews")
    };
    for &acclaimed in &tier_ids[0] {
        for &panned in &tier_ids[2] {
            assert!(position(acclaimed) < position(panned));
        }
    }
}

#[tokio::test]
async fn engines_agree_on_non_ascii_titles() {
    let ctx = setup_context().await;
    let memory = MemoryRankingEngine::new();
    for title in ["Café Society", "CAFÉ SOCIETY", "Cafe Plain"] {
        let book = seed_book(&ctx, title, &[]).await;
        memory.insert_book(book);
    }

    // Case folding is ASCII-only, so the accented needle matches the title
    // with the same accent case and skips the uppercase one on both engines.
    let plan = RankingQuery::new().by_title("café").into_plan();
    let sqlite_rows = ctx.engine.rank(&plan).await.expect("sqlite rank");
    let memory_rows = memory.rank(&plan).await.expect("memory rank");

    let titles = |rows: &[RankedBook]| {
        let mut titles: Vec<String> = rows.iter().map(|row| row.book.title.clone()).collect();
        titles.sort();
        titles
    };
    assert_eq!(titles(&sqlite_rows), vec!["Café Society"]);
    assert_eq!(titles(&sqlite_rows), titles(&memory_rows));
}

fn summarize(rows: &[RankedBook]) -> Vec<(String, Option<u64>, Option<f64>)> {
    rows.iter()
        .map(|row| {
            (
                row.book.book_id.to_string(),
                row.reviews_count,
                row.reviews_avg_rating,
            )
        })
        .collect()
}

// ==================== Cache Coherency Tests ====================

#[tokio::test]
async fn snapshot_stays_stale_until_a_book_mutation_evicts_it() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let book = seed_book(&ctx, "Living Document", &[(4, now - Duration::days(2))]).await;

    let engine: Arc<dyn RankingEngine> = Arc::new(SqliteRankingEngine::new(ctx.pool.clone()));
    let cache = Arc::new(BookStatsCache::new(64));
    let reader = StatsReader::new(engine, cache.clone());
    let mutations = BookMutationService::new(
        Arc::new(SqliteBookStore::new(ctx.pool.clone())),
        cache.clone(),
    );

    let first = reader
        .book_stats(book.book_id)
        .await
        .expect("stats")
        .expect("book present");
    assert_eq!(first.reviews_count, 1);

    // A review landing without a book mutation leaves the snapshot stale.
    let review = Review::new(book.book_id, 2, "late addition");
    ctx.reviews.create(&review).await.expect("create review");
    let stale = reader
        .book_stats(book.book_id)
        .await
        .expect("stats")
        .expect("book present");
    assert_eq!(stale.reviews_count, 1);

    // The next book write evicts; the read after it sees both reviews.
    let mut renamed = book.clone();
    renamed.title = "Living Document (revised)".to_string();
    renamed.touch();
    mutations.update_book(&renamed).await.expect("update");

    let fresh = reader
        .book_stats(book.book_id)
        .await
        .expect("stats")
        .expect("book present");
    assert_eq!(fresh.reviews_count, 2);
    assert_eq!(fresh.reviews_avg_rating, Some(3.0));
}

#[tokio::test]
async fn deleting_a_book_evicts_its_snapshot_and_stats_disappear() {
    let ctx = setup_context().await;
    let now = Utc::now();
    let book = seed_book(&ctx, "Short Lived", &[(5, now - Duration::days(1))]).await;

    let engine: Arc<dyn RankingEngine> = Arc::new(SqliteRankingEngine::new(ctx.pool.clone()));
    let cache = Arc::new(BookStatsCache::new(64));
    let reader = StatsReader::new(engine, cache.clone());
    let mutations = BookMutationService::new(
        Arc::new(SqliteBookStore::new(ctx.pool.clone())),
        cache.clone(),
    );

    let cached = reader
        .book_stats(book.book_id)
        .await
        .expect("stats")
        .expect("book present");
    assert_eq!(cached.reviews_count, 1);

    mutations.delete_book(book.book_id).await.expect("delete");

    // The eviction is visible before the delete returns, so the next read
    // goes to the engine and finds nothing.
    assert!(reader
        .book_stats(book.book_id)
        .await
        .expect("stats")
        .is_none());

    let plan = RankingQuery::new()
        .with_review_count(ReviewWindow::unbounded())
        .into_plan();
    assert!(ctx.engine.rank(&plan).await.expect("rank").is_empty());
}
