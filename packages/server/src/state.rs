use std::sync::Arc;

use common::storage::BlobStore;

use crate::broadcast::{Broadcaster, ViewerRegistry};
use crate::config::AppConfig;
use crate::mutation::MutationService;
use crate::store::CollectionStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub collections: Arc<dyn CollectionStore>,
    pub viewers: ViewerRegistry,
    pub broadcaster: Arc<Broadcaster>,
    pub mutations: Arc<MutationService>,
}

impl AppState {
    /// Wire the services together. The viewer registry lives as long as the
    /// state; `main` clears it on shutdown.
    pub fn new(
        config: AppConfig,
        collections: Arc<dyn CollectionStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Self {
        let viewers = ViewerRegistry::new();
        let broadcaster = Arc::new(Broadcaster::new(collections.clone(), viewers.clone()));
        let mutations = Arc::new(MutationService::new(
            collections.clone(),
            blobs,
            broadcaster.clone(),
        ));
        Self {
            config: Arc::new(config),
            collections,
            viewers,
            broadcaster,
            mutations,
        }
    }
}
