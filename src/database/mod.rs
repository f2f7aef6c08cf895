pub mod manager;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::PgRepository;
pub use store::CourseStore;

use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseConfig, StorageBackend};

/// Build the store selected by configuration, running migrations first when enabled
pub async fn connect_store(config: &DatabaseConfig) -> Result<Arc<dyn CourseStore>, DatabaseError> {
    match config.backend {
        StorageBackend::Memory => {
            info!("Using in-memory course store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let manager = DatabaseManager::connect(config).await?;
            if config.run_migrations {
                let ran = migrations::run(manager.pool()).await?;
                info!("Schema up to date ({} migrations applied)", ran.len());
            }
            Ok(Arc::new(PgRepository::new(manager.pool().clone())))
        }
    }
}
