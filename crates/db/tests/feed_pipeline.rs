//! Integration tests for the feed aggregation pipeline.
//!
//! Exercises `FeedRepo` against a real database:
//! - derived `likes_count` / `comment_count` match their source collections
//! - every sort mode is non-increasing in its key with a `created_at` tie-break
//! - relevance without a text filter degrades to date order
//! - text search only returns matching rows and ranks better matches first
//! - windowing, counts and the empty page past the end
//! - a missing uploader keeps the video in the feed with null uploader fields

mod common;

use sqlx::PgPool;
use vidfeed_core::feed::{FeedFilter, PageRequest, SortMode};
use vidfeed_db::models::feed::FeedItem;
use vidfeed_db::repositories::{FeedRepo, VideoRepo};

use common::{comment_n, like_by, set_views, user, video_at};

async fn all_items(pool: &PgPool, filter: &FeedFilter, sort: SortMode) -> Vec<FeedItem> {
    FeedRepo::fetch_page(pool, filter, sort, PageRequest::new(Some(1), Some(48)), None)
        .await
        .unwrap()
}

fn ids(items: &[FeedItem]) -> Vec<i64> {
    items.iter().map(|i| i.id).collect()
}

/// Assert `key` is non-increasing and equal keys are ordered newest first.
fn assert_sorted_by(items: &[FeedItem], key: impl Fn(&FeedItem) -> i64) {
    for pair in items.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(key(a) >= key(b), "key not non-increasing: {} then {}", a.id, b.id);
        if key(a) == key(b) {
            assert!(
                a.created_at > b.created_at || (a.created_at == b.created_at && a.id > b.id),
                "tie not broken by created_at desc: {} then {}",
                a.id,
                b.id
            );
        }
    }
}

/// Five videos with distinct ages and deliberately overlapping metrics.
async fn seed_catalog(pool: &PgPool) -> (i64, Vec<i64>) {
    let alice = user(pool, "alice").await;
    let bob = user(pool, "bob").await;
    let carol = user(pool, "carol").await;

    let v1 = video_at(pool, alice.id, "Morning run", "jogging by the river", 50).await;
    let v2 = video_at(pool, alice.id, "Cat tricks", "my cat jumps", 40).await;
    let v3 = video_at(pool, bob.id, "Cat nap", "sleepy cat compilation", 30).await;
    let v4 = video_at(pool, bob.id, "Guitar lesson", "chords for beginners", 20).await;
    let v5 = video_at(pool, carol.id, "Street food", "night market tour", 10).await;

    set_views(pool, v1.id, 100).await;
    set_views(pool, v2.id, 5).await;
    set_views(pool, v3.id, 100).await;
    set_views(pool, v4.id, 7).await;

    like_by(pool, v2.id, &[alice.id, bob.id, carol.id]).await;
    like_by(pool, v4.id, &[alice.id]).await;
    like_by(pool, v5.id, &[bob.id]).await;

    comment_n(pool, v1.id, bob.id, 2).await;
    comment_n(pool, v3.id, alice.id, 2).await;
    comment_n(pool, v4.id, carol.id, 4).await;

    (alice.id, vec![v1.id, v2.id, v3.id, v4.id, v5.id])
}

// ---------------------------------------------------------------------------
// Derived metrics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn likes_count_matches_liker_set(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let items = all_items(&pool, &FeedFilter::All, SortMode::DateDesc).await;

    for item in &items {
        let video = VideoRepo::find_by_id(&pool, item.id).await.unwrap().unwrap();
        assert_eq!(item.likes_count, video.likes_count(), "video {}", item.id);
    }
    // v1 never had its liker set initialised.
    let v1 = items.iter().find(|i| i.id == vids[0]).unwrap();
    assert_eq!(v1.likes_count, 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn comment_count_matches_comment_rows(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let items = all_items(&pool, &FeedFilter::All, SortMode::DateDesc).await;

    let count_of = |id: i64| items.iter().find(|i| i.id == id).unwrap().comment_count;
    assert_eq!(count_of(vids[0]), 2);
    assert_eq!(count_of(vids[1]), 0);
    assert_eq!(count_of(vids[3]), 4);
    assert_eq!(count_of(vids[4]), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn likes_are_read_live_not_cached(pool: PgPool) {
    let (alice, vids) = seed_catalog(&pool).await;

    VideoRepo::toggle_like(&pool, vids[0], alice).await.unwrap();
    let item = FeedRepo::find_item(&pool, vids[0], Some(alice)).await.unwrap().unwrap();
    assert_eq!(item.likes_count, 1);
    assert!(item.is_liked);

    VideoRepo::toggle_like(&pool, vids[0], alice).await.unwrap();
    let item = FeedRepo::find_item(&pool, vids[0], Some(alice)).await.unwrap().unwrap();
    assert_eq!(item.likes_count, 0);
    assert!(!item.is_liked);
}

// ---------------------------------------------------------------------------
// Sort modes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn date_desc_is_newest_first(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let items = all_items(&pool, &FeedFilter::All, SortMode::DateDesc).await;
    let mut expected = vids.clone();
    expected.reverse();
    assert_eq!(ids(&items), expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn views_desc_breaks_ties_by_date(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let items = all_items(&pool, &FeedFilter::All, SortMode::ViewsDesc).await;
    assert_sorted_by(&items, |i| i.view_count);
    // v1 and v3 both have 100 views; v3 is newer.
    assert_eq!(ids(&items)[..2], [vids[2], vids[0]]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn likes_desc_is_non_increasing(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let items = all_items(&pool, &FeedFilter::All, SortMode::LikesDesc).await;
    assert_sorted_by(&items, |i| i.likes_count);
    assert_eq!(items[0].id, vids[1]);
    // v4 and v5 tie on one like; v5 is newer.
    assert_eq!(ids(&items)[1..3], [vids[4], vids[3]]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn comments_desc_is_non_increasing(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let items = all_items(&pool, &FeedFilter::All, SortMode::CommentsDesc).await;
    assert_sorted_by(&items, |i| i.comment_count);
    assert_eq!(ids(&items), vec![vids[3], vids[2], vids[0], vids[4], vids[1]]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn relevance_without_text_filter_is_date_order(pool: PgPool) {
    seed_catalog(&pool).await;
    let by_relevance = all_items(&pool, &FeedFilter::All, SortMode::Relevance).await;
    let by_date = all_items(&pool, &FeedFilter::All, SortMode::DateDesc).await;
    assert_eq!(ids(&by_relevance), ids(&by_date));
    assert!(by_relevance.iter().all(|i| i.relevance_score.is_none()));
}

// ---------------------------------------------------------------------------
// Text search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn text_search_only_returns_matches(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let filter = FeedFilter::text("cat").unwrap();

    let items = all_items(&pool, &filter, SortMode::DateDesc).await;
    assert_eq!(ids(&items), vec![vids[2], vids[1]]);
    assert_eq!(FeedRepo::count(&pool, &filter).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn relevance_ranks_better_matches_first(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    // "sleepy" only matches v3; "cat" matches v2 and v3.
    let filter = FeedFilter::text("sleepy cat").unwrap();

    let items = all_items(&pool, &filter, SortMode::Relevance).await;
    assert_eq!(items[0].id, vids[2]);
    assert!(items.iter().all(|i| i.relevance_score.is_some()));
    let scores: Vec<f32> = items.iter().filter_map(|i| i.relevance_score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn text_search_honours_other_sort_modes(pool: PgPool) {
    let (_, vids) = seed_catalog(&pool).await;
    let filter = FeedFilter::text("cat").unwrap();
    let items = all_items(&pool, &filter, SortMode::LikesDesc).await;
    assert_eq!(ids(&items), vec![vids[1], vids[2]]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unsearchable_query_returns_nothing(pool: PgPool) {
    seed_catalog(&pool).await;
    let filter = FeedFilter::Text("!!!".into());
    assert!(all_items(&pool, &filter, SortMode::Relevance).await.is_empty());
    assert_eq!(FeedRepo::count(&pool, &filter).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Windowing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn pages_concatenate_into_full_order(pool: PgPool) {
    seed_catalog(&pool).await;
    let full = all_items(&pool, &FeedFilter::All, SortMode::ViewsDesc).await;

    let mut stitched = Vec::new();
    for page in 1..=3 {
        let window = PageRequest::new(Some(page), Some(2));
        let items = FeedRepo::fetch_page(&pool, &FeedFilter::All, SortMode::ViewsDesc, window, None)
            .await
            .unwrap();
        assert!(items.len() <= 2);
        stitched.extend(items);
    }
    assert_eq!(ids(&stitched), ids(&full));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn page_past_the_end_is_empty(pool: PgPool) {
    seed_catalog(&pool).await;
    let window = PageRequest::new(Some(10), Some(2));
    let items = FeedRepo::fetch_page(&pool, &FeedFilter::All, SortMode::DateDesc, window, None)
        .await
        .unwrap();
    assert!(items.is_empty());
    assert_eq!(FeedRepo::count(&pool, &FeedFilter::All).await.unwrap(), 5);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_catalog_counts_zero(pool: PgPool) {
    assert_eq!(FeedRepo::count(&pool, &FeedFilter::All).await.unwrap(), 0);
    assert!(all_items(&pool, &FeedFilter::All, SortMode::DateDesc).await.is_empty());
}

// ---------------------------------------------------------------------------
// Scoped filters and uploader join
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn uploader_filter_scopes_feed(pool: PgPool) {
    let (alice, vids) = seed_catalog(&pool).await;
    let filter = FeedFilter::Uploader(alice);
    let items = all_items(&pool, &filter, SortMode::DateDesc).await;
    assert_eq!(ids(&items), vec![vids[1], vids[0]]);
    assert!(items
        .iter()
        .all(|i| i.uploader.username.as_deref() == Some("alice")));
    assert_eq!(FeedRepo::count(&pool, &filter).await.unwrap(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_uploader_keeps_row_with_null_summary(pool: PgPool) {
    let ghost_id = 987_654;
    let video = video_at(&pool, ghost_id, "Orphan", "uploader is gone", 5).await;

    let items = all_items(&pool, &FeedFilter::All, SortMode::DateDesc).await;
    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.id, video.id);
    assert_eq!(item.uploader_id, ghost_id);
    assert_eq!(item.uploader.id, None);
    assert_eq!(item.uploader.username, None);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_item_resolves_viewer_like(pool: PgPool) {
    let (alice, vids) = seed_catalog(&pool).await;

    let liked = FeedRepo::find_item(&pool, vids[1], Some(alice)).await.unwrap().unwrap();
    assert!(liked.is_liked);
    assert_eq!(liked.likes_count, 3);

    let anonymous = FeedRepo::find_item(&pool, vids[1], None).await.unwrap().unwrap();
    assert!(!anonymous.is_liked);

    assert!(FeedRepo::find_item(&pool, 999_999, None).await.unwrap().is_none());
}
