//! MongoDB Collection Module
//!
//! Document collection driver over a live MongoDB deployment.

use mongodb::bson::{doc, spec::BinarySubtype, Binary, Bson, Document};
use mongodb::options::IndexOptions;
use mongodb::sync::{Client, Collection};
use mongodb::IndexModel;
use tracing::debug;

use crate::backend::document::{DocumentCollection, DocumentUrl, StoredDocument};
use crate::config::SecretUrl;
use crate::error::{CacheError, Result};

fn mongo_error(err: mongodb::error::Error) -> CacheError {
    CacheError::backend("mongodb", err)
}

// == Mongo Collection ==
pub struct MongoCollection {
    collection: Collection<Document>,
}

impl MongoCollection {
    /// Creates the driver client for `url` and selects the target collection.
    pub fn connect(url: &SecretUrl, target: &DocumentUrl) -> Result<Self> {
        let client = Client::with_uri_str(url.expose_secret()).map_err(|e| {
            CacheError::Configuration(format!("invalid mongodb url {}: {e}", url.redacted()))
        })?;
        debug!(
            "Initializing document cache {}.{} from {}",
            target.database,
            target.collection,
            url.redacted()
        );

        Ok(Self {
            collection: client
                .database(&target.database)
                .collection(&target.collection),
        })
    }
}

impl DocumentCollection for MongoCollection {
    fn ensure_unique_index(&self, field: &str) -> Result<()> {
        let mut keys = Document::new();
        keys.insert(field, 1);
        let index = IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index)
            .run()
            .map(|_| ())
            .map_err(mongo_error)
    }

    fn find_one(&self, name: &str) -> Result<Option<StoredDocument>> {
        let Some(found) = self
            .collection
            .find_one(doc! { "name": name })
            .run()
            .map_err(mongo_error)?
        else {
            return Ok(None);
        };

        let value = found
            .get_binary_generic("value")
            .map_err(|e| CacheError::backend("mongodb", format!("document '{name}': {e}")))?
            .clone();
        let ex = match found.get("ex") {
            Some(Bson::Int64(ex)) => Some(*ex),
            Some(Bson::Int32(ex)) => Some(i64::from(*ex)),
            Some(Bson::Double(ex)) => Some(*ex as i64),
            _ => None,
        };

        Ok(Some(StoredDocument {
            name: name.to_string(),
            value,
            ex,
        }))
    }

    fn upsert(&self, document: StoredDocument) -> Result<()> {
        let filter = doc! { "name": document.name.as_str() };
        let value = Binary {
            subtype: BinarySubtype::Generic,
            bytes: document.value,
        };

        self.collection
            .update_one(filter, doc! { "$set": { "value": value, "ex": document.ex } })
            .upsert(true)
            .run()
            .map(|_| ())
            .map_err(mongo_error)
    }

    fn delete_one(&self, name: &str) -> Result<()> {
        self.collection
            .delete_one(doc! { "name": name })
            .run()
            .map(|_| ())
            .map_err(mongo_error)
    }
}
