//! Integration tests against a running MongoDB deployment.
//!
//! Ignored by default; run with a mongod on `MONGODB_URL` (defaults to
//! `mongodb://localhost:27017`):
//!
//! ```sh
//! cargo test --test live_mongodb -- --ignored
//! ```

use mongo_registry::{
    CollectionOptions, ConnectionOptions, Error, IndexSpec, MongoRegistry, Phase,
};
use mongodb::bson::doc;

fn mongodb_url() -> String {
    std::env::var("MONGODB_URL").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

fn test_db(suffix: &str) -> String {
    format!("mongo_registry_{}_{}", std::process::id(), suffix)
}

async fn registry_with_root(db_name: &str) -> MongoRegistry {
    mongo_registry::observability::init_tracing();

    let registry = MongoRegistry::new();
    registry
        .register_root(ConnectionOptions::new(mongodb_url()).with_db_name(db_name))
        .await
        .expect("root registration should succeed");
    registry
}

async fn drop_and_destroy(registry: &MongoRegistry, db_names: &[&str]) {
    if let Ok(client) = registry.client().await {
        for db_name in db_names {
            let _ = client.database(db_name).drop().await;
        }
    }
    registry.on_destroy().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn feature_indexes_exist_after_on_ready() {
    let db = test_db("indexes");
    let registry = registry_with_root(&db).await;

    registry
        .register_feature(
            CollectionOptions::new("users")
                .in_database(db.as_str())
                .with_index(IndexSpec::new(doc! { "name": 1 })),
        )
        .await
        .expect("feature registration should succeed");

    registry.on_ready().await.expect("setup should succeed");
    assert_eq!(registry.phase().await, Phase::Ready);

    let users = registry
        .collection("users", Some(&db))
        .await
        .expect("collection should be registered");

    let mut names = users
        .list_index_names()
        .await
        .expect("index listing should succeed");
    names.sort();
    assert_eq!(names, vec!["_id_".to_string(), "name_1".to_string()]);

    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn same_collection_name_in_different_databases_does_not_cross_contaminate() {
    let db_a = test_db("split_a");
    let db_b = test_db("split_b");
    let registry = registry_with_root(&db_a).await;

    for db in [&db_a, &db_b] {
        registry
            .register_feature(CollectionOptions::new("users").in_database(db.as_str()))
            .await
            .expect("feature registration should succeed");
    }
    registry.on_ready().await.expect("setup should succeed");

    let users_a = registry.collection("users", Some(&db_a)).await.unwrap();
    let users_b = registry.collection("users", Some(&db_b)).await.unwrap();

    users_a.insert_one(doc! { "name": "alice" }).await.unwrap();
    users_b.insert_one(doc! { "name": "bob" }).await.unwrap();

    assert_eq!(users_a.count_documents(doc! {}).await.unwrap(), 1);
    assert_eq!(users_b.count_documents(doc! {}).await.unwrap(), 1);

    drop_and_destroy(&registry, &[db_a.as_str(), db_b.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn insert_and_delete_round_trip() {
    let db = test_db("roundtrip");
    let registry = registry_with_root(&db).await;

    registry
        .register_feature(CollectionOptions::new("users").in_database(db.as_str()))
        .await
        .unwrap();
    registry.on_ready().await.unwrap();

    let users = registry.collection("users", Some(&db)).await.unwrap();

    let before = users.count_documents(doc! {}).await.unwrap();
    let inserted = users.insert_one(doc! { "name": "carol" }).await.unwrap();
    assert_eq!(users.count_documents(doc! {}).await.unwrap(), before + 1);

    users
        .delete_one(doc! { "_id": inserted.inserted_id })
        .await
        .unwrap();
    assert_eq!(users.count_documents(doc! {}).await.unwrap(), before);

    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn unique_index_rejects_duplicate_inserts() {
    let db = test_db("unique");
    let registry = registry_with_root(&db).await;

    registry
        .register_feature(
            CollectionOptions::new("users")
                .in_database(db.as_str())
                .with_index(IndexSpec::new(doc! { "name": 1 }).unique()),
        )
        .await
        .unwrap();
    registry.on_ready().await.unwrap();

    let users = registry.collection("users", Some(&db)).await.unwrap();
    users.insert_one(doc! { "name": "dave" }).await.unwrap();

    let err = users.insert_one(doc! { "name": "dave" }).await;
    assert!(err.is_err(), "duplicate insert should be rejected");

    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn second_root_registration_is_rejected() {
    let db = test_db("double_root");
    let registry = registry_with_root(&db).await;

    let err = registry
        .register_root(ConnectionOptions::new(mongodb_url()))
        .await
        .expect_err("second root should be rejected");
    assert!(matches!(err, Error::AlreadyConnected));

    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn repeated_feature_registration_resolves_the_same_handle() {
    let db = test_db("same_handle");
    let registry = registry_with_root(&db).await;

    registry
        .register_feature(CollectionOptions::new("Users").in_database(db.as_str()))
        .await
        .unwrap();
    registry
        .register_feature(CollectionOptions::new("users").in_database(db.as_str()))
        .await
        .unwrap();
    registry.on_ready().await.unwrap();

    let a = registry.collection("users", Some(&db)).await.unwrap();
    let b = registry.collection("USERS", Some(&db)).await.unwrap();
    assert_eq!(a.namespace(), b.namespace());

    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn on_ready_runs_the_batch_exactly_once() {
    let db = test_db("once");
    let registry = registry_with_root(&db).await;

    registry
        .register_feature(
            CollectionOptions::new("users")
                .in_database(db.as_str())
                .with_index(IndexSpec::new(doc! { "name": 1 })),
        )
        .await
        .unwrap();

    registry.on_ready().await.unwrap();
    assert_eq!(registry.pending_setup().await, 0);

    // Second invocation is a tolerated no-op.
    registry.on_ready().await.unwrap();
    assert_eq!(registry.phase().await, Phase::Ready);

    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn deferred_options_root_registration_connects() {
    let db = test_db("deferred_options");
    mongo_registry::observability::init_tracing();

    let registry = MongoRegistry::new();
    let db_for_factory = db.clone();
    registry
        .register_root_with(async move {
            // Stands in for options resolved from an async config source.
            Ok(ConnectionOptions::new(mongodb_url()).with_db_name(db_for_factory))
        })
        .await
        .expect("deferred-options root should connect");

    assert_eq!(registry.phase().await, Phase::Connected);
    drop_and_destroy(&registry, &[db.as_str()]).await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn failing_setup_action_aborts_startup() {
    let db = test_db("fatal_setup");
    let registry = registry_with_root(&db).await;

    registry
        .register_feature(CollectionOptions::new("users").in_database(db.as_str()))
        .await
        .unwrap();
    registry
        .defer(|| async { Err(Error::setup_failed("seed data missing")) })
        .await;

    let err = registry.on_ready().await.expect_err("startup should fail");
    assert!(matches!(err, Error::SetupFailed { .. }));
    assert_ne!(registry.phase().await, Phase::Ready);

    drop_and_destroy(&registry, &[db.as_str()]).await;
}
