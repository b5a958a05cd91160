pub mod config;
pub mod http;
pub mod storage;
pub mod tasks;

use std::sync::Arc;

use config::ServerConfig;
use storage::Storage;
use tasks::TaskService;

/// Shared application state passed to every request handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<Storage>,
    pub tasks: TaskService,
}

impl AppContext {
    pub fn new(config: Arc<ServerConfig>, storage: Arc<Storage>) -> Self {
        let tasks = TaskService::new(storage.clone());
        Self {
            config,
            storage,
            tasks,
        }
    }
}
