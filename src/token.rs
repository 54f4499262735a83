//! Resource tokens
//!
//! Deterministic, case-normalized keys for databases, collections and the raw
//! collection-options records. Tokens are structured values rather than
//! concatenated strings, so two registrations can only collide when they name
//! the same resource; `Display` renders the flat legacy key for logs.

use std::fmt;

/// Database name used when a registration omits one.
pub const DEFAULT_DATABASE: &str = "default";

const TOKEN_PREFIX: &str = "MONGODB";

/// Key addressing a registered resource.
///
/// Names are upper-cased at construction, so `"Users"` and `"users"` address
/// the same resource. Construction is total: empty names are accepted and
/// yield a degenerate but stable token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceToken {
    Database {
        db: String,
    },
    Collection {
        db: String,
        collection: String,
    },
    /// Addresses the raw options record of a feature registration,
    /// never the collection itself.
    CollectionOptions {
        db: String,
        collection: String,
    },
}

impl ResourceToken {
    pub fn database(name: Option<&str>) -> Self {
        Self::Database {
            db: normalize(name.unwrap_or(DEFAULT_DATABASE)),
        }
    }

    pub fn collection(name: &str, db: Option<&str>) -> Self {
        Self::Collection {
            db: normalize(db.unwrap_or(DEFAULT_DATABASE)),
            collection: normalize(name),
        }
    }

    pub fn collection_options(name: &str, db: Option<&str>) -> Self {
        Self::CollectionOptions {
            db: normalize(db.unwrap_or(DEFAULT_DATABASE)),
            collection: normalize(name),
        }
    }
}

fn normalize(name: &str) -> String {
    name.to_uppercase()
}

impl fmt::Display for ResourceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database { db } => write!(f, "{}_DATABASE_{}", TOKEN_PREFIX, db),
            Self::Collection { db, collection } => {
                write!(f, "{}_DATABASE_{}_COLLECTION_{}", TOKEN_PREFIX, db, collection)
            }
            Self::CollectionOptions { db, collection } => {
                write!(
                    f,
                    "{}_DATABASE_{}_COLLECTION_{}_OPTIONS",
                    TOKEN_PREFIX, db, collection
                )
            }
        }
    }
}
