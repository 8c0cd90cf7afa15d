//! Row structs and DTOs for each table.

pub mod comment;
pub mod feed;
pub mod user;
pub mod video;
