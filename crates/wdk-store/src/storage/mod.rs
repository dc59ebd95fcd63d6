//! Persistence engine for the store database
//!
//! The database is persisted as a single JSON document with atomic
//! write-temp-then-rename saves. The [`DatabaseStorage`] trait is the seam
//! the store talks to.

mod json_file;
mod traits;

pub use json_file::JsonFileStorage;
pub use traits::DatabaseStorage;
