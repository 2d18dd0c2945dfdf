//! Emoji → callback table with stable button ordering.

use std::{collections::HashMap, future::Future, sync::Arc};

use futures::{FutureExt as _, future::BoxFuture};

use crate::transport::ReactionEvent;
use crate::widget::Widget;

/// Callback invoked when a user reacts to a widget's message.
pub type WidgetHandler =
    Arc<dyn Fn(Arc<Widget>, ReactionEvent) -> BoxFuture<'static, ()> + Send + Sync>;

/// Box an async closure into a [`WidgetHandler`].
pub fn handler<F, Fut>(f: F) -> WidgetHandler
where
    F: Fn(Arc<Widget>, ReactionEvent) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |widget, reaction| f(widget, reaction).boxed())
}

/// Handlers keyed by emoji.
///
/// `keys` keeps first-registration order, which is the order reaction
/// buttons are attached in. Dispatch is by exact key only.
#[derive(Default)]
pub struct HandlerTable {
    keys: Vec<String>,
    handlers: HashMap<String, WidgetHandler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `emoji` unless the emoji is already taken.
    ///
    /// Returns `true` when the emoji was newly registered.
    pub fn insert(&mut self, emoji: &str, handler: WidgetHandler) -> bool {
        if self.handlers.contains_key(emoji) {
            return false;
        }

        self.keys.push(emoji.to_owned());
        self.handlers.insert(emoji.to_owned(), handler);
        true
    }

    /// Clone out the handler for `emoji` so it can run without the table locked.
    pub fn get(&self, emoji: &str) -> Option<WidgetHandler> {
        self.handlers.get(emoji).cloned()
    }

    pub fn contains(&self, emoji: &str) -> bool {
        self.handlers.contains_key(emoji)
    }

    /// Registered emoji in registration order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
