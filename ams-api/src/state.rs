use std::sync::Arc;

use ams_core::storage::Storage;

use crate::app::{ArtisanDirectory, UpgradeWorkflow};

#[derive(Clone)]
pub struct AppState {
    pub workflow: UpgradeWorkflow,
    pub directory: ArtisanDirectory,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            workflow: UpgradeWorkflow::new(storage.clone()),
            directory: ArtisanDirectory::new(storage),
        }
    }
}
