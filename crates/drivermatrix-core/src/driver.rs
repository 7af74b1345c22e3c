//! Driver and session traits
//!
//! A [`DocumentDriver`] turns a [`HarnessConfig`] into a live
//! [`DocumentSession`]. The session exposes exactly the primitives the
//! checks exercise; each driver crate maps them onto its client library.

use crate::{HarnessConfig, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A document as exchanged with the driver.
///
/// Drivers convert to and from their native representation (BSON for
/// MongoDB); numbers keep the integer/float distinction of `serde_json`.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Result of inserting a single document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOneSummary {
    /// Identifier generated or echoed by the server, if any was reported
    pub inserted_id: Option<String>,
}

/// Result of inserting several documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertManySummary {
    /// Identifiers in input order
    pub inserted_ids: Vec<String>,
}

/// Result of an update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub modified_count: u64,
}

/// Result of a delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted_count: u64,
}

/// A database driver able to open sessions for a compatibility run
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    /// Registry key (e.g., "mongodb")
    fn name(&self) -> &'static str;

    /// Human-readable name
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Open a session bound to `config.database`.
    ///
    /// Implementations apply `config.connect_timeout()` to their own
    /// connection settings. Opening a session does not have to touch the
    /// network; the connection manager probes liveness with
    /// [`DocumentSession::ping`] right after.
    async fn connect(&self, config: &HarnessConfig) -> Result<Arc<dyn DocumentSession>>;
}

/// A live connection to one database, scoped to a single run
#[async_trait]
pub trait DocumentSession: Send + Sync {
    /// Driver name (matches [`DocumentDriver::name`])
    fn driver_name(&self) -> &str;

    /// Name of the database the session is bound to
    fn database(&self) -> &str;

    /// Administrative no-op command
    async fn ping(&self) -> Result<()>;

    /// Create a collection in the bound database
    async fn create_collection(&self, collection: &str) -> Result<()>;

    /// Drop a collection from the bound database
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    /// Names of every collection in the bound database
    async fn list_collection_names(&self) -> Result<Vec<String>>;

    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOneSummary>;

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary>;

    /// First document matching `filter`, if any
    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>>;

    /// Every document matching `filter`, drained from the cursor, capped at `limit`
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: Option<i64>,
    ) -> Result<Vec<Document>>;

    /// Apply `update` (an operator document such as `$set`) to the first match
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateSummary>;

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteSummary>;

    /// Release the underlying client. Calling it again is a no-op.
    async fn close(&self) -> Result<()>;

    fn is_closed(&self) -> bool;
}
