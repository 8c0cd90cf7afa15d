//! Feed aggregation pipeline.
//!
//! Builds the ranked, windowed feed as one CTE chain whose stages run in a
//! fixed order:
//!
//! ```text
//! base           filter rows (+ ts_rank score for text queries)
//! with_likes     likes_count = cardinality(liker_ids), NULL -> 0
//! with_comments  comment_count = joined comment rows, empty join -> 0
//! ordered        sort + tie-break, then OFFSET/LIMIT
//! (final)        outer join uploader summary, project FeedItem
//! ```
//!
//! Likes and comments are always derived from their source collections at
//! read time; nothing is cached on the video row. The uploader join comes
//! after windowing so only one page of rows is widened, and it is an outer
//! join so a missing uploader never hides a video.

use sqlx::PgPool;
use vidfeed_core::feed::{FeedFilter, PageRequest, SortMode};
use vidfeed_core::search::{build_tsquery, TEXT_SEARCH_CONFIG};
use vidfeed_core::types::DbId;

use crate::models::feed::{FeedItem, FeedItemRow};

/// Tie-break appended to every sort so each mode is a total order.
const TIE_BREAK: &str = "created_at DESC, id DESC";

/// Base-row predicate. Each filter kind is null-guarded so one statement
/// serves all of them:
///
/// - `$1` tsquery text (text search)
/// - `$2` uploader id (profile feed)
/// - `$3` video id (single item)
fn filter_predicate() -> String {
    format!(
        "($1::TEXT IS NULL OR v.search_vector @@ to_tsquery('{TEXT_SEARCH_CONFIG}', $1::TEXT)) \
         AND ($2::BIGINT IS NULL OR v.uploader_id = $2::BIGINT) \
         AND ($3::BIGINT IS NULL OR v.id = $3::BIGINT)"
    )
}

/// Bind values for [`filter_predicate`].
#[derive(Debug, Default)]
struct FilterBinds {
    tsquery: Option<String>,
    uploader_id: Option<DbId>,
    video_id: Option<DbId>,
}

impl FilterBinds {
    /// Resolve a filter into bind values.
    ///
    /// Returns `None` for a text filter with no searchable terms; such a
    /// query matches nothing and is never sent to the database.
    fn resolve(filter: &FeedFilter) -> Option<Self> {
        let binds = match filter {
            FeedFilter::All => Self::default(),
            FeedFilter::Text(query) => Self {
                tsquery: Some(build_tsquery(query)?),
                ..Self::default()
            },
            FeedFilter::Uploader(id) => Self {
                uploader_id: Some(*id),
                ..Self::default()
            },
            FeedFilter::Video(id) => Self {
                video_id: Some(*id),
                ..Self::default()
            },
        };
        Some(binds)
    }
}

/// Primary sort key for each mode, in terms of pipeline columns.
fn sort_key(mode: SortMode) -> &'static str {
    match mode {
        SortMode::DateDesc => "created_at DESC",
        SortMode::ViewsDesc => "view_count DESC",
        SortMode::LikesDesc => "likes_count DESC",
        SortMode::CommentsDesc => "comment_count DESC",
        SortMode::Relevance => "relevance_score DESC NULLS LAST",
    }
}

/// Assemble the full pipeline statement for one sort mode.
///
/// Binds: `$1..$3` filter (see [`filter_predicate`]), `$4` viewer id,
/// `$5` limit, `$6` offset.
fn pipeline_sql(mode: SortMode) -> String {
    let order = format!("{}, {TIE_BREAK}", sort_key(mode));
    let predicate = filter_predicate();
    format!(
        "WITH base AS (
            SELECT v.id, v.title, v.description, v.external_file_id, v.thumbnail_url,
                   v.uploader_id, v.view_count, v.liker_ids, v.created_at,
                   CASE WHEN $1::TEXT IS NULL THEN NULL::REAL
                        ELSE ts_rank(v.search_vector, to_tsquery('{TEXT_SEARCH_CONFIG}', $1::TEXT))
                   END AS relevance_score
            FROM videos v
            WHERE {predicate}
         ),
         with_likes AS (
            SELECT b.*,
                   COALESCE(cardinality(b.liker_ids), 0)::BIGINT AS likes_count,
                   COALESCE($4::BIGINT = ANY(b.liker_ids), FALSE) AS is_liked
            FROM base b
         ),
         with_comments AS (
            SELECT w.*, jc.comment_count
            FROM with_likes w
            LEFT JOIN LATERAL (
                SELECT COUNT(c.id)::BIGINT AS comment_count
                FROM comments c
                WHERE c.video_id = w.id
            ) jc ON TRUE
         ),
         ordered AS (
            SELECT wc.*, ROW_NUMBER() OVER (ORDER BY {order}) AS feed_rank
            FROM with_comments wc
            ORDER BY feed_rank
            LIMIT $5 OFFSET $6
         )
         SELECT o.id, o.title, o.description, o.external_file_id, o.thumbnail_url,
                o.uploader_id, o.view_count, o.created_at,
                o.likes_count, o.comment_count, o.is_liked, o.relevance_score,
                u.id AS uploader_ref_id, u.username AS uploader_username
         FROM ordered o
         LEFT JOIN users u ON u.id = o.uploader_id
         ORDER BY o.feed_rank"
    )
}

/// Runs the feed pipeline and its matching count query.
pub struct FeedRepo;

impl FeedRepo {
    /// Fetch one window of the feed.
    ///
    /// `sort` is passed through [`SortMode::effective_for`], so a relevance
    /// sort without a text filter silently becomes a date sort.
    pub async fn fetch_page(
        pool: &PgPool,
        filter: &FeedFilter,
        sort: SortMode,
        window: PageRequest,
        viewer_id: Option<DbId>,
    ) -> Result<Vec<FeedItem>, sqlx::Error> {
        let Some(binds) = FilterBinds::resolve(filter) else {
            return Ok(Vec::new());
        };

        tracing::debug!(
            ?filter,
            sort = sort.as_str(),
            page = window.page,
            page_size = window.page_size,
            "Fetching feed page"
        );

        let sql = pipeline_sql(sort.effective_for(filter));
        let rows = sqlx::query_as::<_, FeedItemRow>(&sql)
            .bind(binds.tsquery)
            .bind(binds.uploader_id)
            .bind(binds.video_id)
            .bind(viewer_id)
            .bind(window.page_size)
            .bind(window.skip())
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(FeedItem::from).collect())
    }

    /// Total rows matching `filter`, independent of any window.
    pub async fn count(pool: &PgPool, filter: &FeedFilter) -> Result<i64, sqlx::Error> {
        let Some(binds) = FilterBinds::resolve(filter) else {
            return Ok(0);
        };

        let sql = format!("SELECT COUNT(*) FROM videos v WHERE {}", filter_predicate());
        sqlx::query_scalar::<_, i64>(&sql)
            .bind(binds.tsquery)
            .bind(binds.uploader_id)
            .bind(binds.video_id)
            .fetch_one(pool)
            .await
    }

    /// A single feed item, with `is_liked` resolved for `viewer_id`.
    pub async fn find_item(
        pool: &PgPool,
        id: DbId,
        viewer_id: Option<DbId>,
    ) -> Result<Option<FeedItem>, sqlx::Error> {
        let items = Self::fetch_page(
            pool,
            &FeedFilter::Video(id),
            SortMode::DateDesc,
            PageRequest::new(Some(1), Some(1)),
            viewer_id,
        )
        .await?;
        Ok(items.into_iter().next())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
