use std::sync::Arc;

use twilight_model::id::{Id, marker::ChannelMarker};

use rusty_widgets::{Paginator, Transport};

pub mod config;

pub use config::{Config, PaginatorConfig, ReadEnv, SystemEnv};

/// Shared application context passed into command handlers.
///
/// Cheap to clone because it only stores reference-counted shared state.
#[derive(Clone)]
pub struct Context {
    pub transport: Arc<dyn Transport>,
    pub config: Arc<Config>,
}

impl Context {
    /// Create a new application context.
    pub fn new(transport: Arc<dyn Transport>, config: Config) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    /// A paginator in `channel_id` with the configured timeout and done behavior.
    pub fn paginator(&self, channel_id: Id<ChannelMarker>) -> Arc<Paginator> {
        let paginator = Paginator::new(Arc::clone(&self.transport), channel_id);
        paginator.set_timeout(self.config.paginator.timeout);
        paginator.set_done_behavior(self.config.paginator.done);
        paginator
    }
}
