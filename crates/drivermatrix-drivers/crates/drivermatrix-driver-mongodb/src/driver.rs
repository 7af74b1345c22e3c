//! MongoDB driver implementation

use crate::collections;
use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument, doc};
use drivermatrix_core::{
    DeleteSummary, Document, DocumentDriver, DocumentSession, HarnessConfig, HarnessError,
    InsertManySummary, InsertOneSummary, Result, UpdateSummary,
};
use futures::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Application name reported to the server in the connection handshake
pub const APP_NAME: &str = "drivermatrix";

/// MongoDB driver
///
/// Opens sessions through the official async client. Server selection and
/// socket connect are bounded by the configured connect timeout, so an
/// unreachable server fails the liveness probe instead of hanging.
pub struct MongoDbDriver;

impl MongoDbDriver {
    /// Create a new MongoDB driver instance
    pub fn new() -> Self {
        tracing::debug!("MongoDB driver initialized");
        Self
    }
}

impl Default for MongoDbDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentDriver for MongoDbDriver {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    fn display_name(&self) -> &'static str {
        "MongoDB"
    }

    #[tracing::instrument(skip(self, config), fields(database = %config.database))]
    async fn connect(&self, config: &HarnessConfig) -> Result<Arc<dyn DocumentSession>> {
        tracing::debug!("creating MongoDB client");

        let options = client_options(config).await?;
        let client = Client::with_options(options).map_err(|e| {
            HarnessError::Configuration(format!("Failed to create MongoDB client: {}", e))
        })?;

        Ok(Arc::new(MongoDbSession::new(client, config.database.clone())))
    }
}

/// Parse `config.url` and apply the harness timeouts.
///
/// Parsing an `mongodb+srv://` URL resolves DNS records, which is why this
/// is async.
pub async fn client_options(config: &HarnessConfig) -> Result<ClientOptions> {
    let mut options = ClientOptions::parse(&config.url)
        .await
        .map_err(|e| HarnessError::Configuration(format!("Invalid MongoDB URL: {}", e)))?;

    let timeout = config.connect_timeout();
    options.server_selection_timeout = Some(timeout);
    options.connect_timeout = Some(timeout);
    if options.app_name.is_none() {
        options.app_name = Some(APP_NAME.to_string());
    }

    Ok(options)
}

/// A client bound to one database
pub struct MongoDbSession {
    client: Client,
    database: String,
    closed: AtomicBool,
}

impl MongoDbSession {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            closed: AtomicBool::new(false),
        }
    }

    /// Get the bound database object
    pub fn db(&self) -> Database {
        self.client.database(&self.database)
    }

    fn collection(&self, name: &str) -> Collection<BsonDocument> {
        self.db().collection(name)
    }

    pub(crate) fn ensure_not_closed(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HarnessError::Driver("Connection is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentSession for MongoDbSession {
    fn driver_name(&self) -> &str {
        "mongodb"
    }

    fn database(&self) -> &str {
        &self.database
    }

    async fn ping(&self) -> Result<()> {
        self.ensure_not_closed()?;
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| map_error("ping", e))?;
        Ok(())
    }

    async fn create_collection(&self, collection: &str) -> Result<()> {
        collections::create_collection(self, collection).await
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        collections::drop_collection(self, collection).await
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        collections::list_collection_names(self).await
    }

    #[tracing::instrument(skip(self, document))]
    async fn insert_one(&self, collection: &str, document: Document) -> Result<InsertOneSummary> {
        self.ensure_not_closed()?;
        let result = self
            .collection(collection)
            .insert_one(to_bson_document(document)?)
            .await
            .map_err(|e| map_error("insert", e))?;

        Ok(InsertOneSummary {
            inserted_id: id_to_string(&result.inserted_id),
        })
    }

    #[tracing::instrument(skip(self, documents), fields(count = documents.len()))]
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary> {
        self.ensure_not_closed()?;
        let documents = documents
            .into_iter()
            .map(to_bson_document)
            .collect::<Result<Vec<_>>>()?;

        let result = self
            .collection(collection)
            .insert_many(documents)
            .await
            .map_err(|e| map_error("insert", e))?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(InsertManySummary {
            inserted_ids: ids.iter().filter_map(|(_, id)| id_to_string(id)).collect(),
        })
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        self.ensure_not_closed()?;
        let found = self
            .collection(collection)
            .find_one(to_bson_document(filter)?)
            .await
            .map_err(|e| map_error("find", e))?;

        Ok(found.map(from_bson_document))
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: Option<i64>,
    ) -> Result<Vec<Document>> {
        self.ensure_not_closed()?;
        let coll = self.collection(collection);
        let mut action = coll.find(to_bson_document(filter)?);
        if let Some(limit) = limit {
            action = action.limit(limit);
        }

        let cursor = action.await.map_err(|e| map_error("find", e))?;
        let documents: Vec<BsonDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| map_error("cursor", e))?;

        Ok(documents.into_iter().map(from_bson_document).collect())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateSummary> {
        self.ensure_not_closed()?;
        let result = self
            .collection(collection)
            .update_one(to_bson_document(filter)?, to_bson_document(update)?)
            .await
            .map_err(|e| map_error("update", e))?;

        Ok(UpdateSummary {
            modified_count: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteSummary> {
        self.ensure_not_closed()?;
        let result = self
            .collection(collection)
            .delete_one(to_bson_document(filter)?)
            .await
            .map_err(|e| map_error("delete", e))?;

        Ok(DeleteSummary {
            deleted_count: result.deleted_count,
        })
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        tracing::debug!(database = %self.database, "shutting down MongoDB client");
        self.client.clone().shutdown().await;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Map a client error onto the harness error kinds.
///
/// Server selection and I/O failures mean the server could not be reached;
/// everything else is a command-level driver error.
pub(crate) fn map_error(operation: &str, error: mongodb::error::Error) -> HarnessError {
    match *error.kind {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
            HarnessError::Connection(error.to_string())
        }
        _ => HarnessError::Driver(format!("MongoDB {} failed: {}", operation, error)),
    }
}

/// Convert a JSON document to BSON.
///
/// Uses extended JSON rules: integers that fit are stored as Int32, `{"$oid": ..}`
/// becomes an ObjectId.
pub fn to_bson_document(document: Document) -> Result<BsonDocument> {
    match Bson::try_from(serde_json::Value::Object(document)) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(other) => Err(HarnessError::Driver(format!(
            "expected a BSON document, got {:?}",
            other.element_type()
        ))),
        Err(e) => Err(HarnessError::Driver(format!("Invalid document: {}", e))),
    }
}

/// Convert a BSON document to relaxed extended JSON
pub fn from_bson_document(document: BsonDocument) -> Document {
    match Bson::Document(document).into_relaxed_extjson() {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Render an identifier reported by the server. `Null` means none was reported.
pub fn id_to_string(id: &Bson) -> Option<String> {
    match id {
        Bson::Null | Bson::Undefined => None,
        Bson::ObjectId(oid) => Some(oid.to_hex()),
        Bson::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
