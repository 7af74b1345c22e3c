//! Collection management for MongoDB sessions
//!
//! Create, drop and list the collections of the bound database.

use crate::driver::map_error;
use crate::MongoDbSession;
use drivermatrix_core::Result;

/// List user collection names in the bound database, sorted
#[tracing::instrument(skip(session), fields(database = %session.db().name()))]
pub async fn list_collection_names(session: &MongoDbSession) -> Result<Vec<String>> {
    session.ensure_not_closed()?;
    let names = session
        .db()
        .list_collection_names()
        .await
        .map_err(|e| map_error("listCollections", e))?;

    Ok(retain_listed(names))
}

pub(crate) fn retain_listed(mut names: Vec<String>) -> Vec<String> {
    names.retain(|name| !is_system_collection(name));
    names.sort();
    names
}

/// `system.*` collections are server-managed
pub fn is_system_collection(name: &str) -> bool {
    name.starts_with("system.")
}

/// Create a collection. Fails if it already exists.
pub async fn create_collection(session: &MongoDbSession, name: &str) -> Result<()> {
    session.ensure_not_closed()?;
    session
        .db()
        .create_collection(name)
        .await
        .map_err(|e| map_error("create", e))
}

/// Drop a collection. Dropping a missing collection succeeds.
pub async fn drop_collection(session: &MongoDbSession, name: &str) -> Result<()> {
    session.ensure_not_closed()?;
    session
        .db()
        .collection::<bson::Document>(name)
        .drop()
        .await
        .map_err(|e| map_error("drop", e))
}
