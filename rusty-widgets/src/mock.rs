//! In-memory transport for unit testing widgets without a Discord connection.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use async_trait::async_trait;
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, UserMarker},
    },
};

use crate::transport::{
    EventHub, MessageEvent, MessageHandle, ReactionEvent, Subscription, Transport,
};

const FIRST_MESSAGE_ID: u64 = 1_000;

/// One recorded transport call.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportCall {
    SendMessage {
        message: MessageHandle,
        embed: Embed,
    },
    SendText {
        message: MessageHandle,
        content: String,
    },
    EditMessage {
        message: MessageHandle,
        embed: Embed,
    },
    DeleteMessage {
        message: MessageHandle,
    },
    AddReaction {
        message: MessageHandle,
        emoji: String,
    },
    RemoveReaction {
        message: MessageHandle,
        emoji: String,
        user_id: Id<UserMarker>,
    },
    RemoveAllReactions {
        message: MessageHandle,
    },
}

/// Transport that records every call and lets tests inject gateway events.
///
/// # Example
/// ```rust,ignore
/// let transport = Arc::new(MockTransport::new(1));
/// let widget = Widget::new(transport.clone(), Id::new(10), Some(embed));
/// transport.react(message, 42, "➡");
/// assert_eq!(transport.edited_embeds().len(), 1);
/// ```
pub struct MockTransport {
    user_id: Id<UserMarker>,
    hub: EventHub,
    calls: Mutex<Vec<TransportCall>>,
    next_message_id: AtomicU64,
    fail_sends: AtomicBool,
    fail_edits: AtomicBool,
    fail_deletes: AtomicBool,
    fail_reactions: AtomicBool,
}

impl MockTransport {
    /// Create a transport acting as `user_id`.
    pub fn new(user_id: u64) -> Self {
        Self {
            user_id: Id::new(user_id),
            hub: EventHub::default(),
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicU64::new(FIRST_MESSAGE_ID),
            fail_sends: AtomicBool::new(false),
            fail_edits: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_reactions: AtomicBool::new(false),
        }
    }

    /// Convenience for `Arc::new(MockTransport::new(user_id))`.
    pub fn shared(user_id: u64) -> Arc<Self> {
        Arc::new(Self::new(user_id))
    }

    /// Publish a reaction-add event from `user_id` on `message`.
    pub fn react(&self, message: MessageHandle, user_id: u64, emoji: &str) {
        self.hub.publish_reaction(ReactionEvent {
            channel_id: message.channel_id,
            message_id: message.id,
            user_id: Id::new(user_id),
            emoji: emoji.to_owned(),
        });
    }

    /// Publish a message-create event from `author_id` in `channel_id`.
    pub fn say(
        &self,
        channel_id: Id<ChannelMarker>,
        author_id: u64,
        content: &str,
    ) -> MessageHandle {
        let message = self.next_handle(channel_id);
        self.hub.publish_message(MessageEvent {
            channel_id,
            message_id: message.id,
            author_id: Id::new(author_id),
            content: content.to_owned(),
        });
        message
    }

    /// Snapshot of all recorded calls in call order.
    pub fn calls(&self) -> Vec<TransportCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Handles of every embed message sent, in order.
    pub fn sent_messages(&self) -> Vec<MessageHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::SendMessage { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    /// Handle of the most recent text message sent, if any.
    pub fn last_text(&self) -> Option<(MessageHandle, String)> {
        self.calls().into_iter().rev().find_map(|call| match call {
            TransportCall::SendText { message, content } => Some((message, content)),
            _ => None,
        })
    }

    /// Embeds passed to `edit_message`, in order.
    pub fn edited_embeds(&self) -> Vec<Embed> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::EditMessage { embed, .. } => Some(embed),
                _ => None,
            })
            .collect()
    }

    /// Emoji passed to `add_reaction`, in order.
    pub fn added_reactions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::AddReaction { emoji, .. } => Some(emoji),
                _ => None,
            })
            .collect()
    }

    /// Count calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&TransportCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_edits(&self, fail: bool) {
        self.fail_edits.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reactions(&self, fail: bool) {
        self.fail_reactions.store(fail, Ordering::SeqCst);
    }

    /// Number of live reaction subscriptions.
    pub fn reaction_subscribers(&self) -> usize {
        self.hub.reaction_subscribers()
    }

    fn record(&self, call: TransportCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_handle(&self, channel_id: Id<ChannelMarker>) -> MessageHandle {
        let id = self.next_message_id.fetch_add(1, Ordering::SeqCst);
        MessageHandle {
            channel_id,
            id: Id::new(id),
        }
    }

    fn check(&self, flag: &AtomicBool, action: &str) -> anyhow::Result<()> {
        if flag.load(Ordering::SeqCst) {
            anyhow::bail!("mock {action} failure");
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: &Embed,
    ) -> anyhow::Result<MessageHandle> {
        self.check(&self.fail_sends, "send")?;
        let message = self.next_handle(channel_id);
        self.record(TransportCall::SendMessage {
            message,
            embed: embed.clone(),
        });
        Ok(message)
    }

    async fn send_text(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
    ) -> anyhow::Result<MessageHandle> {
        self.check(&self.fail_sends, "send")?;
        let message = self.next_handle(channel_id);
        self.record(TransportCall::SendText {
            message,
            content: content.to_owned(),
        });
        Ok(message)
    }

    async fn edit_message(
        &self,
        message: MessageHandle,
        embed: &Embed,
    ) -> anyhow::Result<MessageHandle> {
        self.check(&self.fail_edits, "edit")?;
        self.record(TransportCall::EditMessage {
            message,
            embed: embed.clone(),
        });
        Ok(message)
    }

    async fn delete_message(&self, message: MessageHandle) -> anyhow::Result<()> {
        self.check(&self.fail_deletes, "delete")?;
        self.record(TransportCall::DeleteMessage { message });
        Ok(())
    }

    async fn add_reaction(&self, message: MessageHandle, emoji: &str) -> anyhow::Result<()> {
        self.check(&self.fail_reactions, "reaction")?;
        self.record(TransportCall::AddReaction {
            message,
            emoji: emoji.to_owned(),
        });
        Ok(())
    }

    async fn remove_reaction(
        &self,
        message: MessageHandle,
        emoji: &str,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()> {
        self.check(&self.fail_reactions, "reaction")?;
        self.record(TransportCall::RemoveReaction {
            message,
            emoji: emoji.to_owned(),
            user_id,
        });
        Ok(())
    }

    async fn remove_all_reactions(&self, message: MessageHandle) -> anyhow::Result<()> {
        self.check(&self.fail_reactions, "reaction")?;
        self.record(TransportCall::RemoveAllReactions { message });
        Ok(())
    }

    fn subscribe_reaction_added(&self) -> Subscription<ReactionEvent> {
        self.hub.subscribe_reactions()
    }

    fn subscribe_message_created(&self) -> Subscription<MessageEvent> {
        self.hub.subscribe_messages()
    }

    fn current_user_id(&self) -> Id<UserMarker> {
        self.user_id
    }
}
