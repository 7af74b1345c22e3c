//! In-memory driver for exercising the sequencer without a server
//!
//! [`MemoryDriver`] hands out [`MemorySession`]s backed by a map of
//! collections. Filters match on field equality, updates understand `$set`,
//! and [`Faults`] can make individual operations fail, panic, hang, or
//! return wrong counts.

use crate::{
    DeleteSummary, Document, DocumentDriver, DocumentSession, HarnessConfig, HarnessError,
    InsertManySummary, InsertOneSummary, Result, UpdateSummary,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Session operations that faults can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Ping,
    CreateCollection,
    DropCollection,
    ListCollections,
    InsertOne,
    InsertMany,
    FindOne,
    Find,
    UpdateOne,
    DeleteOne,
}

/// Misbehavior injected into a [`MemorySession`]
#[derive(Debug, Clone, Default)]
pub struct Faults {
    failing: HashSet<Operation>,
    panicking: HashSet<Operation>,
    hanging: HashSet<Operation>,
    insert_many_id_count: Option<usize>,
    omit_insert_id: bool,
}

impl Faults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a driver error from `op`
    pub fn fail(mut self, op: Operation) -> Self {
        self.failing.insert(op);
        self
    }

    /// Panic inside `op`
    pub fn panic(mut self, op: Operation) -> Self {
        self.panicking.insert(op);
        self
    }

    /// Never complete `op`
    pub fn hang(mut self, op: Operation) -> Self {
        self.hanging.insert(op);
        self
    }

    /// Report `count` identifiers from `insert_many`, whatever was inserted
    pub fn insert_many_ids(mut self, count: usize) -> Self {
        self.insert_many_id_count = Some(count);
        self
    }

    /// Report no identifier from `insert_one`
    pub fn omit_insert_id(mut self) -> Self {
        self.omit_insert_id = true;
        self
    }
}

#[derive(Debug, Default)]
struct Store {
    collections: BTreeMap<String, Vec<Document>>,
    next_id: u64,
}

impl Store {
    fn assign_id(&mut self, document: &mut Document) -> String {
        if let Some(existing) = document.get("_id") {
            return match existing {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
        }
        self.next_id += 1;
        let id = format!("{:024x}", self.next_id);
        document.insert("_id".to_string(), Value::String(id.clone()));
        id
    }
}

fn matches(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, expected)| document.get(key) == Some(expected))
}

/// Session over an in-memory store
pub struct MemorySession {
    database: String,
    store: Mutex<Store>,
    faults: Faults,
    closed: AtomicBool,
    close_calls: AtomicUsize,
}

impl MemorySession {
    pub fn new(database: impl Into<String>, faults: Faults) -> Self {
        Self {
            database: database.into(),
            store: Mutex::new(Store::default()),
            faults,
            closed: AtomicBool::new(false),
            close_calls: AtomicUsize::new(0),
        }
    }

    /// Number of times `close` was called
    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Create `collection` holding `documents` without going through the checks
    pub fn seed(&self, collection: &str, documents: Vec<Document>) {
        let mut store = self.store.lock();
        let mut seeded = Vec::with_capacity(documents.len());
        for mut document in documents {
            store.assign_id(&mut document);
            seeded.push(document);
        }
        store.collections.insert(collection.to_string(), seeded);
    }

    /// Snapshot of a collection's documents
    pub fn documents(&self, collection: &str) -> Option<Vec<Document>> {
        self.store.lock().collections.get(collection).cloned()
    }

    async fn enter(&self, op: Operation) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(HarnessError::Driver("Connection is closed".to_string()));
        }
        if self.faults.hanging.contains(&op) {
            std::future::pending::<()>().await;
        }
        if self.faults.panicking.contains(&op) {
            panic!("injected panic in {:?}", op);
        }
        if self.faults.failing.contains(&op) {
            return Err(HarnessError::Driver(format!("injected failure in {:?}", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentSession for MemorySession {
    fn driver_name(&self) -> &str {
        "memory"
    }

    fn database(&self) -> &str {
        &self.database
    }

    async fn ping(&self) -> Result<()> {
        self.enter(Operation::Ping).await
    }

    async fn create_collection(&self, collection: &str) -> Result<()> {
        self.enter(Operation::CreateCollection).await?;
        let mut store = self.store.lock();
        if store.collections.contains_key(collection) {
            return Err(HarnessError::Driver(format!(
                "Collection {}.{} already exists",
                self.database, collection
            )));
        }
        store.collections.insert(collection.to_string(), Vec::new());
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.enter(Operation::DropCollection).await?;
        self.store.lock().collections.remove(collection);
        Ok(())
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        self.enter(Operation::ListCollections).await?;
        Ok(self.store.lock().collections.keys().cloned().collect())
    }

    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<InsertOneSummary> {
        self.enter(Operation::InsertOne).await?;
        let mut store = self.store.lock();
        let id = store.assign_id(&mut document);
        store
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(InsertOneSummary {
            inserted_id: (!self.faults.omit_insert_id).then_some(id),
        })
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
    ) -> Result<InsertManySummary> {
        self.enter(Operation::InsertMany).await?;
        let mut store = self.store.lock();
        let mut ids = Vec::with_capacity(documents.len());
        let mut inserted = Vec::with_capacity(documents.len());
        for mut document in documents {
            ids.push(store.assign_id(&mut document));
            inserted.push(document);
        }
        store
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(inserted);

        if let Some(count) = self.faults.insert_many_id_count {
            ids.resize_with(count, || "000000000000000000000000".to_string());
        }
        Ok(InsertManySummary { inserted_ids: ids })
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>> {
        self.enter(Operation::FindOne).await?;
        let store = self.store.lock();
        Ok(store
            .collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)).cloned()))
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        limit: Option<i64>,
    ) -> Result<Vec<Document>> {
        self.enter(Operation::Find).await?;
        let store = self.store.lock();
        let cap = match limit {
            Some(n) if n > 0 => n as usize,
            _ => usize::MAX,
        };
        Ok(store
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| matches(d, &filter))
                    .take(cap)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateSummary> {
        self.enter(Operation::UpdateOne).await?;
        let set = match update.get("$set") {
            Some(Value::Object(fields)) => fields.clone(),
            _ => {
                return Err(HarnessError::Driver(
                    "update document must contain $set".to_string(),
                ));
            }
        };

        let mut store = self.store.lock();
        let target = store
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| matches(d, &filter)));

        let Some(document) = target else {
            return Ok(UpdateSummary {
                modified_count: 0,
            });
        };

        let mut changed = false;
        for (key, value) in set {
            if document.get(&key) != Some(&value) {
                document.insert(key, value);
                changed = true;
            }
        }
        Ok(UpdateSummary {
            modified_count: u64::from(changed),
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<DeleteSummary> {
        self.enter(Operation::DeleteOne).await?;
        let mut store = self.store.lock();
        let deleted = match store.collections.get_mut(collection) {
            Some(docs) => match docs.iter().position(|d| matches(d, &filter)) {
                Some(index) => {
                    docs.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };
        Ok(DeleteSummary {
            deleted_count: deleted,
        })
    }

    async fn close(&self) -> Result<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

type SessionSetup = Box<dyn Fn(&MemorySession) + Send + Sync>;

/// Driver producing [`MemorySession`]s
pub struct MemoryDriver {
    faults: Faults,
    refuse: Option<String>,
    hang_on_connect: bool,
    setup: Option<SessionSetup>,
    sessions: Mutex<Vec<Arc<MemorySession>>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self {
            faults: Faults::default(),
            refuse: None,
            hang_on_connect: false,
            setup: None,
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_faults(mut self, faults: Faults) -> Self {
        self.faults = faults;
        self
    }

    /// Fail every `connect` with a connection error carrying `reason`
    pub fn refusing(mut self, reason: impl Into<String>) -> Self {
        self.refuse = Some(reason.into());
        self
    }

    /// Never complete `connect`
    pub fn hanging(mut self) -> Self {
        self.hang_on_connect = true;
        self
    }

    /// Run `setup` on every new session before it is handed out
    pub fn with_setup(mut self, setup: impl Fn(&MemorySession) + Send + Sync + 'static) -> Self {
        self.setup = Some(Box::new(setup));
        self
    }

    /// Sessions opened so far
    pub fn sessions(&self) -> Vec<Arc<MemorySession>> {
        self.sessions.lock().clone()
    }

    pub fn last_session(&self) -> Option<Arc<MemorySession>> {
        self.sessions.lock().last().cloned()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentDriver for MemoryDriver {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn display_name(&self) -> &'static str {
        "In-memory"
    }

    async fn connect(&self, config: &HarnessConfig) -> Result<Arc<dyn DocumentSession>> {
        if self.hang_on_connect {
            std::future::pending::<()>().await;
        }
        if let Some(reason) = &self.refuse {
            return Err(HarnessError::Connection(reason.clone()));
        }

        let session = Arc::new(MemorySession::new(&config.database, self.faults.clone()));
        if let Some(setup) = &self.setup {
            setup(&session);
        }
        self.sessions.lock().push(Arc::clone(&session));
        Ok(session)
    }
}
