//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use sqlx::PgPool;
use vidfeed_db::models::comment::CreateComment;
use vidfeed_db::models::user::{CreateUser, User};
use vidfeed_db::models::video::{CreateVideo, Video};
use vidfeed_db::repositories::{CommentRepo, UserRepo, VideoRepo};

pub async fn user(pool: &PgPool, username: &str) -> User {
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
        },
    )
    .await
    .unwrap()
}

pub fn new_video(uploader_id: i64, title: &str, description: &str, file_id: &str) -> CreateVideo {
    CreateVideo {
        title: title.to_string(),
        description: description.to_string(),
        external_file_id: file_id.to_string(),
        thumbnail_url: None,
        uploader_id,
    }
}

/// Insert a video and backdate it by `minutes_ago` so ordering is explicit.
pub async fn video_at(
    pool: &PgPool,
    uploader_id: i64,
    title: &str,
    description: &str,
    minutes_ago: i64,
) -> Video {
    let file_id = format!("file-{title}-{minutes_ago}");
    let video = VideoRepo::create(pool, &new_video(uploader_id, title, description, &file_id))
        .await
        .unwrap();
    set_created_minutes_ago(pool, video.id, minutes_ago).await;
    VideoRepo::find_by_id(pool, video.id).await.unwrap().unwrap()
}

pub async fn set_created_minutes_ago(pool: &PgPool, video_id: i64, minutes_ago: i64) {
    sqlx::query("UPDATE videos SET created_at = NOW() - make_interval(mins => $2::INT) WHERE id = $1")
        .bind(video_id)
        .bind(minutes_ago as i32)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn set_views(pool: &PgPool, video_id: i64, views: i64) {
    sqlx::query("UPDATE videos SET view_count = $2 WHERE id = $1")
        .bind(video_id)
        .bind(views)
        .execute(pool)
        .await
        .unwrap();
}

pub async fn like_by(pool: &PgPool, video_id: i64, user_ids: &[i64]) {
    for user_id in user_ids {
        VideoRepo::add_like(pool, video_id, *user_id).await.unwrap();
    }
}

pub async fn comment_n(pool: &PgPool, video_id: i64, author_id: i64, n: usize) {
    for i in 0..n {
        CommentRepo::create(
            pool,
            &CreateComment {
                video_id,
                author_id,
                text: format!("comment {i}"),
            },
        )
        .await
        .unwrap();
    }
}
