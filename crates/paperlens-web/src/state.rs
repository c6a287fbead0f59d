use std::sync::Arc;

use paperlens_core::{CorpusStore, PdfBackend, Pipeline};

use crate::storage::Storage;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pipeline: Pipeline,
    pub backend: Arc<dyn PdfBackend>,
    pub corpus: CorpusStore,
    pub storage: Storage,
}
