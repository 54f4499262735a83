//! mongo-registry
//!
//! Named, reusable handles to a process's single MongoDB connection and its
//! databases and collections, plus a deferred-setup coordinator that batches
//! index creation behind the connection's readiness point.
//!
//! The host creates one [`MongoRegistry`], processes its root registration
//! (connection URL, optional default database), then any number of feature
//! registrations (collection name, optional database, indexes). Once every
//! registration is known the host invokes [`MongoRegistry::on_ready`], which
//! runs all deferred index creation concurrently, exactly once. At shutdown
//! [`MongoRegistry::on_destroy`] closes the connection and clears all state.
//!
//! ```rust,no_run
//! use mongo_registry::{CollectionOptions, ConnectionOptions, IndexSpec, MongoRegistry};
//! use mongodb::bson::doc;
//!
//! # async fn example() -> mongo_registry::Result<()> {
//! let registry = MongoRegistry::new();
//!
//! registry
//!     .register_root(ConnectionOptions::new("mongodb://localhost:27017"))
//!     .await?;
//!
//! registry
//!     .register_feature(
//!         CollectionOptions::new("users").with_index(IndexSpec::new(doc! { "name": 1 })),
//!     )
//!     .await?;
//!
//! registry.on_ready().await?;
//!
//! let users = registry.collection("users", None).await?;
//! users.insert_one(doc! { "name": "alice" }).await.ok();
//!
//! registry.on_destroy().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod observability;
pub mod registry;
pub mod resolver;
pub mod setup;
pub mod token;
pub mod types;

pub use error::{Error, Result};
pub use registry::{MongoRegistry, Phase};
pub use setup::SetupRegistry;
pub use token::ResourceToken;
pub use types::{CollectionOptions, ConnectionOptions, IndexSpec};
