//! Options records for root and feature registrations.

use mongodb::bson::Document;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use serde::{Deserialize, Serialize};

fn default_connect_timeout_ms() -> u64 {
    15_000
}

/// Connection parameters for the single root registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionOptions {
    pub url: String,
    /// Database the default token resolves to. Falls back to the database
    /// named in the connection string, then to `test`.
    #[serde(default)]
    pub db_name: Option<String>,
    /// Upper bound on the connect race, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl ConnectionOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            db_name: None,
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn with_connect_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.connect_timeout_ms = timeout_ms;
        self
    }
}

/// Collection requested by a feature registration, with the indexes that
/// should exist on it once the registry is ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionOptions {
    pub collection_name: String,
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl CollectionOptions {
    pub fn new(collection_name: impl Into<String>) -> Self {
        Self {
            collection_name: collection_name.into(),
            db_name: None,
            indexes: Vec::new(),
        }
    }

    pub fn in_database(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    pub fn with_index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }
}

/// One index to create during deferred setup.
///
/// Without an explicit name the server derives one from the keys,
/// e.g. `{ name: 1 }` becomes `name_1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexSpec {
    pub keys: Document,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexSpec {
    pub fn new(keys: Document) -> Self {
        Self {
            keys,
            name: None,
            unique: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub(crate) fn to_index_model(&self) -> IndexModel {
        let mut options = IndexOptions::default();
        options.name = self.name.clone();
        if self.unique {
            options.unique = Some(true);
        }

        IndexModel::builder()
            .keys(self.keys.clone())
            .options(options)
            .build()
    }
}
