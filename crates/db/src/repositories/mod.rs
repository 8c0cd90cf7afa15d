//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod comment_repo;
pub mod feed_repo;
pub mod user_repo;
pub mod video_repo;

pub use comment_repo::CommentRepo;
pub use feed_repo::FeedRepo;
pub use user_repo::UserRepo;
pub use video_repo::VideoRepo;
