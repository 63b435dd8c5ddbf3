use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::QueueTransport;
use crate::store::JobStore;

/// Estado compartido del master: el store autoritativo de jobs y la cola
/// de tareas que los workers drenan.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<JobStore>,
    pub transport: Arc<QueueTransport>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let transport = Arc::new(QueueTransport::new(config.queue_capacity));
        Self {
            store: Arc::new(JobStore::new()),
            transport,
            config,
        }
    }
}
