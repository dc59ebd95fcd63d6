//! Storage trait definitions

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::store::Database;

/// Whole-document persistence for the [`Database`]
#[async_trait]
pub trait DatabaseStorage: Send + Sync {
    /// Load the database, creating and persisting an empty one if none exists
    async fn load(&self) -> Result<Database>;

    /// Replace the persisted database with `db`
    async fn save(&self, db: &Database) -> Result<()>;

    /// Where the database lives
    fn location(&self) -> &Path;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
