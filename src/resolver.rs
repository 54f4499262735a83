//! Resource Resolver
//!
//! Pure derivations of database and collection handles from a live client.
//! Sequencing (client-before-handles) is the caller's contract; nothing here
//! performs I/O.

use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};

/// Database the driver falls back to when neither the registration nor the
/// connection string names one.
const FALLBACK_DATABASE: &str = "test";

pub fn resolve_database(client: &Client, name: Option<&str>) -> Database {
    match name {
        Some(name) => client.database(name),
        None => client
            .default_database()
            .unwrap_or_else(|| client.database(FALLBACK_DATABASE)),
    }
}

pub fn resolve_collection(
    client: &Client,
    collection_name: &str,
    db_name: Option<&str>,
) -> Collection<Document> {
    resolve_database(client, db_name).collection(collection_name)
}
