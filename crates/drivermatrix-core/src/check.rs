//! The fixed list of compatibility checks
//!
//! Running a check is split in two steps:
//!
//! - [`Check::execute`] talks to the session and captures what the driver
//!   returned as an [`Observation`] (or the driver error).
//! - [`Check::evaluate`] is a pure function from that result to an
//!   [`Outcome`]. All success predicates live there, so they can be tested
//!   without a database.
//!
//! Checks share state through the test collection: later checks rely on the
//! documents written by earlier ones, which is why [`Check::ALL`] is ordered.

use crate::{
    CheckError, DeleteSummary, Document, DocumentSession, InsertManySummary, InsertOneSummary,
    Outcome, Result, UpdateSummary,
};
use serde_json::{Value, json};

/// Age written for the first fixture document
pub const ALICE_AGE: i64 = 30;
/// Age set by the update check
pub const UPDATED_AGE: i64 = 31;
/// Cursor limit used by the bounded read
pub const FIND_LIMIT: i64 = 3;

/// One named compatibility check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    Ping,
    CreateCollection,
    InsertOne,
    FindOne,
    InsertMany,
    FindWithLimit,
    UpdateOne,
    DeleteOne,
    ListCollections,
    DropCollection,
}

impl Check {
    /// Every check in execution order
    pub const ALL: [Check; 10] = [
        Check::Ping,
        Check::CreateCollection,
        Check::InsertOne,
        Check::FindOne,
        Check::InsertMany,
        Check::FindWithLimit,
        Check::UpdateOne,
        Check::DeleteOne,
        Check::ListCollections,
        Check::DropCollection,
    ];

    /// Name used in the transcript and the report
    pub fn name(&self) -> &'static str {
        match self {
            Check::Ping => "ping",
            Check::CreateCollection => "create-collection",
            Check::InsertOne => "insert-one",
            Check::FindOne => "find-one",
            Check::InsertMany => "insert-many",
            Check::FindWithLimit => "find-with-limit",
            Check::UpdateOne => "update-one",
            Check::DeleteOne => "delete-one",
            Check::ListCollections => "list-collections",
            Check::DropCollection => "drop-collection",
        }
    }

    /// Look a check up by its report name
    pub fn from_name(name: &str) -> Option<Check> {
        Check::ALL.into_iter().find(|check| check.name() == name)
    }

    /// Run the driver side of the check against `collection`
    pub async fn execute(self, session: &dyn DocumentSession, collection: &str) -> Result<Observation> {
        match self {
            Check::Ping => {
                session.ping().await?;
                Ok(Observation::Acknowledged)
            }
            Check::CreateCollection => {
                // Leftovers from an aborted run must not fail creation.
                if let Err(e) = session.drop_collection(collection).await {
                    tracing::debug!(collection, error = %e, "ignoring pre-drop failure");
                }
                session.create_collection(collection).await?;
                Ok(Observation::Acknowledged)
            }
            Check::InsertOne => {
                let summary = session
                    .insert_one(collection, person("Alice", ALICE_AGE))
                    .await?;
                Ok(Observation::InsertedOne(summary))
            }
            Check::FindOne => {
                let found = session.find_one(collection, name_filter("Alice")).await?;
                Ok(Observation::FoundOne(found))
            }
            Check::InsertMany => {
                let summary = session
                    .insert_many(collection, vec![person("Bob", 25), person("Charlie", 35)])
                    .await?;
                Ok(Observation::InsertedMany(summary))
            }
            Check::FindWithLimit => {
                let documents = session
                    .find(collection, Document::new(), Some(FIND_LIMIT))
                    .await?;
                Ok(Observation::Found(documents))
            }
            Check::UpdateOne => {
                let summary = session
                    .update_one(collection, name_filter("Alice"), set_age(UPDATED_AGE))
                    .await?;
                Ok(Observation::Updated(summary))
            }
            Check::DeleteOne => {
                let summary = session.delete_one(collection, name_filter("Bob")).await?;
                Ok(Observation::Deleted(summary))
            }
            Check::ListCollections => {
                let names = session.list_collection_names().await?;
                Ok(Observation::CollectionNames(names))
            }
            Check::DropCollection => {
                session.drop_collection(collection).await?;
                Ok(Observation::Acknowledged)
            }
        }
    }

    /// Decide pass or fail from what [`Check::execute`] produced
    pub fn evaluate(self, observed: Result<Observation>, collection: &str) -> Outcome {
        match self.judge(observed, collection) {
            Ok(()) => Outcome::Pass,
            Err(e) => Outcome::Fail(e.to_string()),
        }
    }

    fn judge(
        self,
        observed: Result<Observation>,
        collection: &str,
    ) -> std::result::Result<(), CheckError> {
        match (self, observed?) {
            (Check::Ping | Check::CreateCollection | Check::DropCollection, Observation::Acknowledged) => {
                Ok(())
            }
            (Check::InsertOne, Observation::InsertedOne(summary)) => match summary.inserted_id {
                Some(_) => Ok(()),
                None => Err(CheckError::mismatch("No inserted_id returned")),
            },
            (Check::FindOne, Observation::FoundOne(None)) => {
                Err(CheckError::mismatch("Document not found"))
            }
            (Check::FindOne, Observation::FoundOne(Some(document))) => {
                let name_ok = document.get("name").and_then(Value::as_str) == Some("Alice");
                if name_ok && number_equals(document.get("age"), ALICE_AGE) {
                    Ok(())
                } else {
                    Err(CheckError::mismatch("Document not found or incorrect"))
                }
            }
            (Check::InsertMany, Observation::InsertedMany(summary)) => {
                expect_count("inserted documents", 2, summary.inserted_ids.len() as u64)
            }
            (Check::FindWithLimit, Observation::Found(documents)) => {
                expect_count("documents", FIND_LIMIT as u64, documents.len() as u64)
            }
            (Check::UpdateOne, Observation::Updated(summary)) => {
                expect_count("modified document", 1, summary.modified_count)
            }
            (Check::DeleteOne, Observation::Deleted(summary)) => {
                expect_count("deleted document", 1, summary.deleted_count)
            }
            (Check::ListCollections, Observation::CollectionNames(names)) => {
                if names.iter().any(|name| name == collection) {
                    Ok(())
                } else {
                    Err(CheckError::mismatch(format!("{} not found", collection)))
                }
            }
            (check, other) => Err(CheckError::mismatch(format!(
                "{} got an unexpected driver response ({})",
                check.name(),
                other.kind()
            ))),
        }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the driver returned for one check
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The command completed without returning data the check inspects
    Acknowledged,
    InsertedOne(InsertOneSummary),
    FoundOne(Option<Document>),
    InsertedMany(InsertManySummary),
    Found(Vec<Document>),
    Updated(UpdateSummary),
    Deleted(DeleteSummary),
    CollectionNames(Vec<String>),
}

impl Observation {
    fn kind(&self) -> &'static str {
        match self {
            Observation::Acknowledged => "acknowledged",
            Observation::InsertedOne(_) => "insert-one result",
            Observation::FoundOne(_) => "single document",
            Observation::InsertedMany(_) => "insert-many result",
            Observation::Found(_) => "document list",
            Observation::Updated(_) => "update result",
            Observation::Deleted(_) => "delete result",
            Observation::CollectionNames(_) => "collection names",
        }
    }
}

fn expect_count(what: &str, expected: u64, actual: u64) -> std::result::Result<(), CheckError> {
    if actual == expected {
        Ok(())
    } else {
        Err(CheckError::mismatch(format!(
            "Expected {} {}, got {}",
            expected, what, actual
        )))
    }
}

/// Integer comparison that also accepts drivers returning whole doubles
fn number_equals(value: Option<&Value>, expected: i64) -> bool {
    match value {
        Some(Value::Number(n)) => n.as_i64() == Some(expected) || n.as_f64() == Some(expected as f64),
        _ => false,
    }
}

fn person(name: &str, age: i64) -> Document {
    let mut document = Document::new();
    document.insert("name".to_string(), json!(name));
    document.insert("age".to_string(), json!(age));
    document
}

fn name_filter(name: &str) -> Document {
    let mut filter = Document::new();
    filter.insert("name".to_string(), json!(name));
    filter
}

fn set_age(age: i64) -> Document {
    let mut update = Document::new();
    update.insert("$set".to_string(), json!({ "age": age }));
    update
}
