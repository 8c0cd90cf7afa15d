pub mod feed;
pub mod uploads;
pub mod users;
pub mod videos;
