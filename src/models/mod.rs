//! Core data models for the media catalog service.
//!
//! Owners are catalog entities that can hold media, assets are references
//! produced by the external media service, and the visibility types describe
//! the published/draft/deleted lifecycle shared by seminars and course parts.
//! Row types map to tables via `sqlx::FromRow` and serialize as JSON via `serde`.

pub mod media;
pub mod owner;
pub mod visibility;
