//! Domain types and pure policy for the video catalog.
//!
//! Everything here is free of I/O so the repository, ingestion and HTTP
//! layers can share one definition of sort modes, page windows, job
//! lifecycle rules and input validation.

pub mod error;
pub mod feed;
pub mod ingestion;
pub mod search;
pub mod types;
pub mod validation;
