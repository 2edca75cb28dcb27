//! Persistence collaborators
//!
//! The service talks to storage only through the traits in [`repository`].
//! Two backends ship with the crate: [`MemoryStorage`] and the durable
//! [`FileStorage`].

mod file;
mod memory;
mod repository;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use repository::{
    HistoryRepository, NotificationRepository, Storage, TicketRepository, UserRepository,
};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::Result;
use std::sync::Arc;

/// Opens the backend selected in the configuration
pub fn open(config: &StorageConfig) -> Result<Arc<dyn Storage>> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageBackend::File => {
            tracing::info!("Using file storage at {}", config.path.display());
            Ok(Arc::new(FileStorage::open(&config.path)?))
        },
    }
}
