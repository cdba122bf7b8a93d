//! Shared state handed to the notification loop and the command dispatcher.

use std::sync::Arc;

use crate::models::Config;
use crate::services::SubscriberRegistry;
use crate::telegram::ChatTransport;

/// Explicitly constructed process context.
pub struct AppContext {
    pub config: Arc<Config>,
    pub registry: Arc<SubscriberRegistry>,
    pub transport: Arc<dyn ChatTransport>,
}

impl AppContext {
    pub fn new(
        config: Arc<Config>,
        registry: Arc<SubscriberRegistry>,
        transport: Arc<dyn ChatTransport>,
    ) -> Self {
        Self {
            config,
            registry,
            transport,
        }
    }
}
