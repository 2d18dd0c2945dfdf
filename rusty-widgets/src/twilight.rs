//! [`Transport`] backed by the Twilight HTTP client and gateway events.

use std::{slice, sync::Arc};

use async_trait::async_trait;
use tracing::info;
use twilight_http::{Client, request::channel::reaction::RequestReactionType};
use twilight_model::{
    channel::message::{EmojiReactionType, embed::Embed},
    gateway::event::Event,
    id::{
        Id,
        marker::{ChannelMarker, EmojiMarker, UserMarker},
    },
};

use crate::transport::{
    EventHub, MessageEvent, MessageHandle, ReactionEvent, Subscription, Transport,
};

/// Discord transport. Feed it gateway events with [`TwilightTransport::dispatch`].
#[derive(Clone)]
pub struct TwilightTransport {
    http: Arc<Client>,
    hub: EventHub,
    user_id: Id<UserMarker>,
}

impl TwilightTransport {
    /// Build a transport, fetching the bot's own user id once.
    pub async fn new(http: Arc<Client>) -> anyhow::Result<Self> {
        let current_user = http.current_user().await?.model().await?;
        info!(user_id = current_user.id.get(), "widget transport ready");

        Ok(Self::with_user_id(http, current_user.id))
    }

    pub fn with_user_id(http: Arc<Client>, user_id: Id<UserMarker>) -> Self {
        Self {
            http,
            hub: EventHub::default(),
            user_id,
        }
    }

    /// Publish the gateway events widgets listen for. Anything else is ignored.
    pub fn dispatch(&self, event: &Event) {
        match event {
            Event::ReactionAdd(reaction) => self.hub.publish_reaction(ReactionEvent {
                channel_id: reaction.channel_id,
                message_id: reaction.message_id,
                user_id: reaction.user_id,
                emoji: emoji_key(&reaction.emoji),
            }),
            Event::MessageCreate(msg) => self.hub.publish_message(MessageEvent {
                channel_id: msg.channel_id,
                message_id: msg.id,
                author_id: msg.author.id,
                content: msg.content.clone(),
            }),
            _ => {}
        }
    }

    pub fn http(&self) -> &Arc<Client> {
        &self.http
    }
}

#[async_trait]
impl Transport for TwilightTransport {
    async fn send_message(
        &self,
        channel_id: Id<ChannelMarker>,
        embed: &Embed,
    ) -> anyhow::Result<MessageHandle> {
        let message = self
            .http
            .create_message(channel_id)
            .embeds(slice::from_ref(embed))
            .await?
            .model()
            .await?;

        Ok(MessageHandle {
            channel_id: message.channel_id,
            id: message.id,
        })
    }

    async fn send_text(
        &self,
        channel_id: Id<ChannelMarker>,
        content: &str,
    ) -> anyhow::Result<MessageHandle> {
        let message = self
            .http
            .create_message(channel_id)
            .content(content)
            .await?
            .model()
            .await?;

        Ok(MessageHandle {
            channel_id: message.channel_id,
            id: message.id,
        })
    }

    async fn edit_message(
        &self,
        message: MessageHandle,
        embed: &Embed,
    ) -> anyhow::Result<MessageHandle> {
        let edited = self
            .http
            .update_message(message.channel_id, message.id)
            .embeds(Some(slice::from_ref(embed)))
            .await?
            .model()
            .await?;

        Ok(MessageHandle {
            channel_id: edited.channel_id,
            id: edited.id,
        })
    }

    async fn delete_message(&self, message: MessageHandle) -> anyhow::Result<()> {
        self.http
            .delete_message(message.channel_id, message.id)
            .await?;
        Ok(())
    }

    async fn add_reaction(&self, message: MessageHandle, emoji: &str) -> anyhow::Result<()> {
        self.http
            .create_reaction(message.channel_id, message.id, &request_emoji(emoji))
            .await?;
        Ok(())
    }

    async fn remove_reaction(
        &self,
        message: MessageHandle,
        emoji: &str,
        user_id: Id<UserMarker>,
    ) -> anyhow::Result<()> {
        self.http
            .delete_reaction(message.channel_id, message.id, &request_emoji(emoji), user_id)
            .await?;
        Ok(())
    }

    async fn remove_all_reactions(&self, message: MessageHandle) -> anyhow::Result<()> {
        self.http
            .delete_all_reactions(message.channel_id, message.id)
            .await?;
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

/// Handler-table key for a gateway emoji: the unicode itself, or `name:id`.
fn emoji_key(emoji: &EmojiReactionType) -> String {
    match emoji {
        EmojiReactionType::Unicode { name } => name.clone(),
        EmojiReactionType::Custom { id, name, .. } => {
            format!("{}:{id}", name.as_deref().unwrap_or_default())
        }
    }
}

/// Split a `name:id` custom emoji key.
fn parse_custom_emoji(key: &str) -> Option<(&str, Id<EmojiMarker>)> {
    let (name, raw_id) = key.rsplit_once(':')?;
    let id = raw_id.parse::<u64>().ok().and_then(Id::new_checked)?;
    Some((name, id))
}

fn request_emoji(key: &str) -> RequestReactionType<'_> {
    if let Some((name, id)) = parse_custom_emoji(key)
        && !name.is_empty()
    {
        return RequestReactionType::Custom {
            id,
            name: Some(name),
        };
    }

    RequestReactionType::Unicode { name: key }
}
