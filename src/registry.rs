//! Connection/collection registry and lifecycle coordinator
//!
//! One [`MongoRegistry`] per process, created by the host and shared by
//! explicit `Arc` reference. The root registration produces the single live
//! client; feature registrations resolve token-keyed database and collection
//! handles and contribute deferred index-creation work. The host's on-ready
//! hook runs the deferred batch exactly once; the on-destroy hook closes the
//! client and clears all deferred state.

use std::collections::HashMap;
use std::future::Future;

use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::client;
use crate::error::{Error, Result};
use crate::resolver;
use crate::setup::SetupRegistry;
use crate::token::ResourceToken;
use crate::types::{CollectionOptions, ConnectionOptions};

/// Lifecycle phase of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Connecting,
    Connected,
    Ready,
    Closed,
}

struct Inner {
    phase: Phase,
    client: Option<Client>,
    databases: HashMap<ResourceToken, Database>,
    collections: HashMap<ResourceToken, Collection<Document>>,
    collection_options: HashMap<ResourceToken, CollectionOptions>,
}

/// Process-wide registry of the client, its derived handles, and the
/// deferred setup batch. This is the single source of truth for connection
/// state; handles are stored here, keyed by [`ResourceToken`].
pub struct MongoRegistry {
    inner: RwLock<Inner>,
    setup: SetupRegistry,
}

impl MongoRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                phase: Phase::Uninitialized,
                client: None,
                databases: HashMap::new(),
                collections: HashMap::new(),
                collection_options: HashMap::new(),
            }),
            setup: SetupRegistry::new(),
        }
    }

    /// Processes the root registration: connects, stores the client and the
    /// default database handle. A registry accepts exactly one root; a second
    /// attempt is rejected with [`Error::AlreadyConnected`].
    #[instrument(skip(self, options), fields(db = ?options.db_name))]
    pub async fn register_root(&self, options: ConnectionOptions) -> Result<()> {
        {
            let mut inner = self.inner.write().await;
            match inner.phase {
                Phase::Uninitialized => inner.phase = Phase::Connecting,
                Phase::Closed => return Err(Error::not_ready("registry is closed")),
                _ => return Err(Error::AlreadyConnected),
            }
        }

        match client::connect(&options).await {
            Ok(client) => {
                let default_db = resolver::resolve_database(&client, options.db_name.as_deref());

                let mut inner = self.inner.write().await;
                inner
                    .databases
                    .insert(ResourceToken::database(None), default_db);
                inner.client = Some(client);
                inner.phase = Phase::Connected;
                tracing::info!("root connection established");
                Ok(())
            }
            Err(err) => {
                let mut inner = self.inner.write().await;
                inner.phase = Phase::Uninitialized;
                Err(err)
            }
        }
    }

    /// Root registration whose options are produced asynchronously. Identical
    /// contract to [`register_root`](Self::register_root) once they resolve.
    pub async fn register_root_with<F>(&self, options: F) -> Result<()>
    where
        F: Future<Output = Result<ConnectionOptions>>,
    {
        let options = options.await?;
        self.register_root(options).await
    }

    /// Processes a feature registration: resolves the database and collection
    /// handles, stores them under their tokens, and defers one index-creation
    /// action per declared index.
    ///
    /// Registering the same (database, collection) pair again reuses the
    /// stored handles; pairs differing only in database name never collide.
    #[instrument(
        skip(self, options),
        fields(
            collection = %options.collection_name,
            db = ?options.db_name,
            indexes = options.indexes.len()
        )
    )]
    pub async fn register_feature(&self, options: CollectionOptions) -> Result<()> {
        let db_token = ResourceToken::database(options.db_name.as_deref());
        let coll_token =
            ResourceToken::collection(&options.collection_name, options.db_name.as_deref());
        let opts_token =
            ResourceToken::collection_options(&options.collection_name, options.db_name.as_deref());

        let collection = {
            let mut inner = self.inner.write().await;
            let client = match (&inner.phase, &inner.client) {
                (Phase::Connected, Some(client)) => client.clone(),
                (Phase::Closed, _) => return Err(Error::not_ready("registry is closed")),
                (Phase::Ready, _) => {
                    return Err(Error::not_ready(
                        "feature registrations must be processed before the registry is ready",
                    ))
                }
                _ => {
                    return Err(Error::not_ready(
                        "root connection has not been established",
                    ))
                }
            };

            let db = inner
                .databases
                .entry(db_token)
                .or_insert_with(|| resolver::resolve_database(&client, options.db_name.as_deref()))
                .clone();

            let collection = inner
                .collections
                .entry(coll_token)
                .or_insert_with(|| db.collection::<Document>(&options.collection_name))
                .clone();

            inner.collection_options.insert(opts_token, options.clone());
            collection
        };

        for index in &options.indexes {
            let collection = collection.clone();
            let model = index.to_index_model();
            self.setup
                .register(move || async move {
                    collection
                        .create_index(model)
                        .await
                        .map(|_| ())
                        .map_err(|e| Error::setup_failed(e.to_string()))
                })
                .await;
        }

        Ok(())
    }

    /// Defers a caller-supplied setup action to the on-ready batch.
    pub async fn defer<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.setup.register(action).await;
    }

    /// On-ready hook: runs the deferred setup batch and transitions to
    /// [`Phase::Ready`]. A batch failure is fatal to startup and propagates;
    /// calling this again once ready is a no-op (the batch is already
    /// drained).
    #[instrument(skip(self))]
    pub async fn on_ready(&self) -> Result<()> {
        {
            let inner = self.inner.read().await;
            match inner.phase {
                Phase::Connected => {}
                Phase::Ready => return Ok(()),
                Phase::Closed => return Err(Error::not_ready("registry is closed")),
                _ => {
                    return Err(Error::not_ready(
                        "root connection has not been established",
                    ))
                }
            }
        }

        self.setup.run_all().await?;

        let mut inner = self.inner.write().await;
        inner.phase = Phase::Ready;
        tracing::info!("deferred setup complete, registry ready");
        Ok(())
    }

    /// On-destroy hook: closes the client and clears every handle and pending
    /// setup action. Idempotent; destroying a registry that never connected,
    /// or destroying twice, is a no-op.
    #[instrument(skip(self))]
    pub async fn on_destroy(&self) {
        self.setup.clear().await;

        let client = {
            let mut inner = self.inner.write().await;
            inner.databases.clear();
            inner.collections.clear();
            inner.collection_options.clear();
            inner.phase = Phase::Closed;
            inner.client.take()
        };

        if let Some(client) = client {
            client.shutdown().await;
            tracing::info!("root connection closed");
        }
    }

    /// The single live client.
    pub async fn client(&self) -> Result<Client> {
        let inner = self.inner.read().await;
        inner
            .client
            .clone()
            .ok_or_else(|| Error::not_ready("root connection has not been established"))
    }

    /// Looks up a registered database handle by name.
    pub async fn database(&self, name: Option<&str>) -> Result<Database> {
        let token = ResourceToken::database(name);
        let inner = self.inner.read().await;
        if inner.client.is_none() {
            return Err(Error::not_ready("root connection has not been established"));
        }
        inner
            .databases
            .get(&token)
            .cloned()
            .ok_or_else(|| Error::not_registered(token))
    }

    /// Looks up a registered collection handle. Two registrations naming the
    /// same (database, collection) pair resolve to the same stored handle.
    pub async fn collection(
        &self,
        collection_name: &str,
        db_name: Option<&str>,
    ) -> Result<Collection<Document>> {
        let token = ResourceToken::collection(collection_name, db_name);
        let inner = self.inner.read().await;
        if inner.client.is_none() {
            return Err(Error::not_ready("root connection has not been established"));
        }
        inner
            .collections
            .get(&token)
            .cloned()
            .ok_or_else(|| Error::not_registered(token))
    }

    /// The raw options record a feature registration supplied, if any.
    pub async fn collection_options(
        &self,
        collection_name: &str,
        db_name: Option<&str>,
    ) -> Option<CollectionOptions> {
        let token = ResourceToken::collection_options(collection_name, db_name);
        let inner = self.inner.read().await;
        inner.collection_options.get(&token).cloned()
    }

    pub async fn phase(&self) -> Phase {
        let inner = self.inner.read().await;
        inner.phase
    }

    /// Number of setup actions still pending.
    pub async fn pending_setup(&self) -> usize {
        self.setup.len().await
    }
}

impl Default for MongoRegistry {
    fn default() -> Self {
        Self::new()
    }
}
