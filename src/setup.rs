//! Deferred Setup Registry
//!
//! Append-only collection of zero-argument async setup actions (index
//! creation and friends), accumulated at registration time and executed as a
//! single concurrent batch once the connection is known to be live.

use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::future::Future;
use tokio::sync::Mutex;
use tracing::instrument;

use crate::error::{Error, Result};

type SetupAction = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

/// Holds setup actions until [`run_all`](SetupRegistry::run_all) drains them.
///
/// Registration may happen before or after the connection exists; nothing is
/// executed until the batch runs. Insertion order carries no meaning since the
/// batch is concurrent.
pub struct SetupRegistry {
    actions: Mutex<Vec<SetupAction>>,
}

impl SetupRegistry {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Appends one action. Callable any number of times, from any
    /// registration, in any phase.
    pub async fn register<F, Fut>(&self, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let mut actions = self.actions.lock().await;
        actions.push(Box::new(move || action().boxed()));
    }

    /// Drains the registry and runs every action concurrently.
    ///
    /// The first observed failure decides the aggregate outcome; sibling
    /// actions already in flight keep running detached and their individual
    /// outcomes are not reported. Partial setup on failure is therefore
    /// possible. With no pending actions this is a no-op, so a second call
    /// without new registrations succeeds trivially.
    #[instrument(skip(self))]
    pub async fn run_all(&self) -> Result<()> {
        let actions: Vec<SetupAction> = {
            let mut guard = self.actions.lock().await;
            std::mem::take(&mut *guard)
        };

        if actions.is_empty() {
            return Ok(());
        }

        tracing::debug!(actions = actions.len(), "running deferred setup batch");

        let mut tasks: FuturesUnordered<_> = actions
            .into_iter()
            .map(|action| tokio::spawn(action()))
            .collect();

        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(err),
                Err(err) => {
                    return Err(Error::setup_failed(format!("setup task panicked: {err}")))
                }
            }
        }

        Ok(())
    }

    /// Drops all pending actions without executing them.
    pub async fn clear(&self) {
        let mut actions = self.actions.lock().await;
        actions.clear();
    }

    pub async fn len(&self) -> usize {
        let actions = self.actions.lock().await;
        actions.len()
    }

    pub async fn is_empty(&self) -> bool {
        let actions = self.actions.lock().await;
        actions.is_empty()
    }
}

impl Default for SetupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
