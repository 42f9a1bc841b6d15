// Forum Client Library
// Data-synchronization layer for the forum REST API

pub mod api; // Request gateway
pub mod cache; // Query cache engine
pub mod client;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod mutations; // Mutation -> invalidation map
pub mod navigation;
pub mod pagination;
pub mod queries;
pub mod session; // Session boundary

pub use client::ForumClient;
pub use error::{AppError, ErrorKind};
