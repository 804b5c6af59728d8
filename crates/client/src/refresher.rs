use std::sync::Arc;

use oxn_core::{paths, Experiment, ExperimentCollection, StatusUpdate};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::ClientError;
use crate::request::RequestClient;
use crate::transport::Transport;

/// Shared experiment list refreshed one id at a time.
///
/// The lock is held only while swapping in a new collection, never across a
/// request, so refreshes of distinct ids run concurrently.
#[derive(Debug, Clone)]
pub struct StatusRefresher<T> {
    transport: T,
    collection: Arc<Mutex<ExperimentCollection>>,
}

impl<T: Transport> StatusRefresher<T> {
    pub fn new(transport: T) -> Self {
        Self::with_collection(transport, ExperimentCollection::default())
    }

    pub fn with_collection(transport: T, collection: ExperimentCollection) -> Self {
        Self {
            transport,
            collection: Arc::new(Mutex::new(collection)),
        }
    }

    /// Replaces the collection with `GET /experiments`.
    pub async fn load(&self) -> Result<ExperimentCollection, ClientError> {
        let experiments: Vec<Experiment> = RequestClient::get(self.transport.clone(), paths::EXPERIMENTS)
            .manual()
            .quiet()
            .fetch()
            .await?;
        let collection: ExperimentCollection = experiments.into_iter().collect();
        info!(experiments = collection.len(), "experiments loaded");
        *self.collection.lock().await = collection.clone();
        Ok(collection)
    }

    pub async fn snapshot(&self) -> ExperimentCollection {
        self.collection.lock().await.clone()
    }

    /// Fetches the status of `id` and merges it into the matching entry.
    ///
    /// Returns the refreshed entry, or `None` when no entry has that id.
    /// On failure the collection is left as it was.
    pub async fn refresh(&self, id: &str) -> Result<Option<Arc<Experiment>>, ClientError> {
        let update: StatusUpdate = RequestClient::get(self.transport.clone(), paths::status(id))
            .manual()
            .fetch_object()
            .await?;
        debug!(id, status = ?update.status, "status received");

        let mut collection = self.collection.lock().await;
        let next = collection.with_status(id, &update);
        let refreshed = next.get(id).cloned();
        *collection = next;
        Ok(refreshed)
    }
}
