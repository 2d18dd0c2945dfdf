//! Transport port consumed by widgets, plus the event fan-out used to feed it.

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, MessageMarker, UserMarker},
    },
};

/// Default per-subscriber buffer for gateway events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Location of a message sent through a transport.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageHandle {
    pub channel_id: Id<ChannelMarker>,
    pub id: Id<MessageMarker>,
}

/// A reaction added to any message the bot can see.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReactionEvent {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
    pub user_id: Id<UserMarker>,
    /// Unicode emoji, or `name:id` for custom guild emoji.
    pub emoji: String,
}

/// A message created in any channel the bot can see.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageEvent {
    pub channel_id: Id<ChannelMarker>,
    pub message_id: Id<MessageMarker>,
    pub author_id: Id<UserMarker>,
    pub content: String,
}

/// Chat operations a widget needs from the underlying session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a new message carrying a single embed.
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: &Embed,
    ) -> anyhow::Result<MessageHandle>;

    /// Send a plain text message.
    async fn send_text(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
    ) -> anyhow::Result<MessageHandle>;

    /// Replace the embed of an existing message.
    async fn edit_message(
        &self,
        message: MessageHandle,
        embed: &Embed,
    ) -> anyhow::Result<MessageHandle>;

    async fn delete_message(&self, message: MessageHandle) -> anyhow::Result<()>;

    async fn add_reaction(&self, message: MessageHandle, emoji: &str) -> anyhow::Result<()>;

    async fn remove_reaction(
        &self,
        message: MessageHandle,
        emoji: &str,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()>;

    async fn remove_all_reactions(&self, message: MessageHandle) -> anyhow::Result<()>;

    /// Subscribe to every reaction-add event seen after this call.
    fn subscribe_reaction_added(&self) -> Subscription<ReactionEvent>;

    /// Subscribe to every message-create event seen after this call.
    fn subscribe_message_created(&self) -> Subscription<MessageEvent>;

    /// User id the transport acts as.
    fn current_user_id(&self) -> Id<UserMarker>;
}

/// Owned handle on an event stream. Dropping it unsubscribes.
pub struct Subscription<T> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub fn new(rx: broadcast::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Wait for the next event.
    ///
    /// Returns `None` once the publishing side is gone. Events missed while
    /// lagging are skipped. Cancel safe.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscription lagged, skipping missed events");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// Broadcast fan-out of gateway events to any number of subscriptions.
#[derive(Clone)]
pub struct EventHub {
    reactions: broadcast::Sender<ReactionEvent>,
    messages: broadcast::Sender<MessageEvent>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (reactions, _) = broadcast::channel(capacity);
        let (messages, _) = broadcast::channel(capacity);
        Self {
            reactions,
            messages,
        }
    }

    pub fn publish_reaction(&self, event: ReactionEvent) {
        // No subscribers is the common case between widget runs.
        let _ = self.reactions.send(event);
    }

    pub fn publish_message(&self, event: MessageEvent) {
        let _ = self.messages.send(event);
    }

    pub fn subscribe_reactions(&self) -> Subscription<ReactionEvent> {
        Subscription::new(self.reactions.subscribe())
    }

    pub fn subscribe_messages(&self) -> Subscription<MessageEvent> {
        Subscription::new(self.messages.subscribe())
    }

    /// Number of live reaction subscriptions.
    pub fn reaction_subscribers(&self) -> usize {
        self.reactions.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}
