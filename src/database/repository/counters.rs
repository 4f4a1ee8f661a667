//! Integer id sequences stored in the `counters` collection.

use anyhow::{Context, Result};
use mongodb::Collection;
use mongodb::bson::{Document, doc};
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};

use crate::database::Database;

#[derive(Clone)]
pub struct Counters {
    collection: Collection<Document>,
}

impl Counters {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("counters"),
        }
    }

    /// Atomically increment and return the sequence `name`, starting at 1.
    pub async fn next(&self, name: &str) -> Result<i64> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .collection
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "seq": 1_i64 } })
            .with_options(options)
            .await?
            .with_context(|| format!("counter '{}' was not returned", name))?;

        counter
            .get_i64("seq")
            .with_context(|| format!("counter '{}' has no integer seq", name))
    }
}
