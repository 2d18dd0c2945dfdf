//! Reaction-driven widget bound to a single message.
//!
//! A [`Widget`] sends one embed, attaches a reaction button per registered
//! handler, then runs an event loop that dispatches reactions on that message
//! to their handlers until it is closed or its deadline passes.

#[path = "widget_tests.rs"]
mod widget_tests;

use std::{
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio::{
    sync::watch,
    time::{Duration, Instant, sleep, sleep_until, timeout},
};
use tracing::{debug, info, warn};
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, UserMarker},
    },
};

use crate::error::{Result, WidgetError};
use crate::handlers::{HandlerTable, WidgetHandler, handler};
use crate::transport::{MessageHandle, ReactionEvent, Transport};

/// Delay before a user's reaction is removed after it was handled.
pub const REACTION_CLEANUP_DELAY: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Idle,
    Running,
}

struct WidgetState {
    phase: Phase,
    message: Option<MessageHandle>,
    content: Option<Embed>,
    timeout: Option<Duration>,
    locked_user: Option<Id<UserMarker>>,
}

/// A message embed with reactions for buttons.
pub struct Widget {
    transport: Arc<dyn Transport>,
    channel_id: Id<ChannelMarker>,
    state: Mutex<WidgetState>,
    handlers: Mutex<HandlerTable>,
    close_tx: watch::Sender<bool>,
}

impl Widget {
    /// Create an idle widget that will render `content` in `channel_id`.
    pub fn new(
        transport: Arc<dyn Transport>,
        channel_id: Id<ChannelMarker>,
        content: Option<Embed>,
    ) -> Arc<Self> {
        let (close_tx, _) = watch::channel(false);

        Arc::new(Self {
            transport,
            channel_id,
            state: Mutex::new(WidgetState {
                phase: Phase::Idle,
                message: None,
                content,
                timeout: None,
                locked_user: None,
            }),
            handlers: Mutex::new(HandlerTable::new()),
            close_tx,
        })
    }

    /// Send the widget's message and run its event loop.
    ///
    /// Resolves once the widget is closed, its timeout elapses, or the
    /// transport's reaction stream ends.
    pub async fn spawn(self: &Arc<Self>) -> Result<()> {
        let (content, run_timeout) = {
            let mut state = self.state();
            if state.phase == Phase::Running {
                return Err(WidgetError::AlreadyRunning);
            }
            let Some(content) = state.content.clone() else {
                return Err(WidgetError::NilContent);
            };

            state.phase = Phase::Running;
            state.message = None;
            (content, state.timeout)
        };
        let _running = RunningGuard {
            widget: self.as_ref(),
        };

        // Subscribe before sending so no reaction on the new message is missed.
        let mut reactions = self.transport.subscribe_reaction_added();
        let mut close_rx = self.close_tx.subscribe();
        let started_at = Instant::now();

        let message = self.transport.send_message(self.channel_id, &content).await?;
        self.state().message = Some(message);
        info!(
            channel_id = message.channel_id.get(),
            message_id = message.id.get(),
            "widget spawned"
        );

        let buttons = self.handlers().keys().to_vec();
        for emoji in buttons {
            if let Err(source) = self.transport.add_reaction(message, &emoji).await {
                warn!(?source, emoji = %emoji, "failed to add reaction button");
            }
        }

        // Too far out to represent is the same as no deadline.
        let deadline = run_timeout
            .filter(|duration| !duration.is_zero())
            .and_then(|duration| started_at.checked_add(duration));
        let self_id = self.transport.current_user_id();

        loop {
            let reaction = tokio::select! {
                biased;
                () = wait_closed(&mut close_rx) => break,
                () = wait_until(deadline) => {
                    debug!(message_id = message.id.get(), "widget timed out");
                    break;
                }
                event = reactions.next() => match event {
                    Some(event) => event,
                    None => {
                        warn!(message_id = message.id.get(), "reaction stream closed");
                        break;
                    }
                },
            };

            if reaction.message_id != message.id || reaction.user_id == self_id {
                continue;
            }
            if self
                .state()
                .locked_user
                .is_some_and(|user_id| user_id != reaction.user_id)
            {
                continue;
            }

            let bound = self.handlers().get(&reaction.emoji);
            if let Some(bound) = bound {
                debug!(
                    message_id = message.id.get(),
                    emoji = %reaction.emoji,
                    user_id = reaction.user_id.get(),
                    "dispatching reaction"
                );
                bound(Arc::clone(self), reaction.clone()).await;
            }

            self.schedule_reaction_cleanup(message, reaction);
        }

        info!(message_id = message.id.get(), "widget stopped");
        Ok(())
    }

    /// Register `f` for `emoji`.
    ///
    /// Existing registrations are kept. When the widget is live, a newly
    /// registered emoji is added to the message straight away.
    pub async fn handle<F, Fut>(&self, emoji: &str, f: F) -> Result<()>
    where
        F: Fn(Arc<Widget>, ReactionEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handle_boxed(emoji, handler(f)).await
    }

    /// [`Widget::handle`] for an already boxed handler.
    pub async fn handle_boxed(&self, emoji: &str, handler: WidgetHandler) -> Result<()> {
        if !self.insert_handler(emoji, handler) {
            return Ok(());
        }

        let live_message = {
            let state = self.state();
            match state.phase {
                Phase::Running => state.message,
                Phase::Idle => None,
            }
        };

        if let Some(message) = live_message {
            self.transport.add_reaction(message, emoji).await?;
        }
        Ok(())
    }

    pub(crate) fn insert_handler(&self, emoji: &str, handler: WidgetHandler) -> bool {
        self.handlers().insert(emoji, handler)
    }

    /// Whether the event loop is currently executing.
    pub fn running(&self) -> bool {
        self.state().phase == Phase::Running
    }

    /// Replace the embed and edit the live message to show it.
    pub async fn update_content(&self, embed: Embed) -> Result<MessageHandle> {
        let message = {
            let state = self.state();
            if state.phase != Phase::Running {
                return Err(WidgetError::NotRunning);
            }
            state.message.ok_or(WidgetError::NilMessage)?
        };

        let edited = self.transport.edit_message(message, &embed).await?;
        self.state().content = Some(embed);
        Ok(edited)
    }

    /// Stop the event loop. Safe to call any number of times.
    ///
    /// Applies to the current run, or to the next one when issued before
    /// `spawn` gets going. It is cleared once that run ends.
    pub fn close(&self) {
        self.close_tx.send_replace(true);
    }

    /// Prompt `user_id` in the widget's channel and wait for their reply.
    ///
    /// The prompt and the reply are deleted afterwards. Fails with `Timeout`
    /// when nothing arrives within `wait`, and `NotRunning` when the widget
    /// is idle or closed, in which case nothing is sent.
    pub async fn query_input(
        &self,
        prompt: &str,
        user_id: Id<UserMarker>,
        wait: Duration,
    ) -> Result<String> {
        let mut replies = self.transport.subscribe_message_created();
        let mut close_rx = self.close_tx.subscribe();
        if !self.running() || *close_rx.borrow_and_update() {
            return Err(WidgetError::NotRunning);
        }
        let prompt_message = self
            .transport
            .send_text(self.channel_id, &format!("<@{user_id}>, {prompt}"))
            .await?;

        let channel_id = self.channel_id;
        let next_reply = async {
            while let Some(event) = replies.next().await {
                if event.author_id == user_id && event.channel_id == channel_id {
                    return Some(event);
                }
            }
            None
        };

        let outcome = tokio::select! {
            biased;
            () = wait_closed(&mut close_rx) => Err(WidgetError::NotRunning),
            reply = timeout(wait, next_reply) => match reply {
                Ok(Some(reply)) => Ok(reply),
                Ok(None) | Err(_) => Err(WidgetError::Timeout),
            },
        };

        if let Err(source) = self.transport.delete_message(prompt_message).await {
            debug!(?source, "failed to delete input prompt");
        }

        let reply = outcome?;
        let reply_handle = MessageHandle {
            channel_id: reply.channel_id,
            id: reply.message_id,
        };
        if let Err(source) = self.transport.delete_message(reply_handle).await {
            debug!(?source, "failed to delete input reply");
        }

        Ok(reply.content)
    }

    /// The message sent by the most recent run, if any.
    pub fn message(&self) -> Option<MessageHandle> {
        self.state().message
    }

    pub fn content(&self) -> Option<Embed> {
        self.state().content.clone()
    }

    /// Set the embed used by the next `spawn`.
    ///
    /// Does not edit a live message; use [`Widget::update_content`] for that.
    pub fn set_content(&self, embed: Embed) {
        self.state().content = Some(embed);
    }

    pub fn channel_id(&self) -> Id<ChannelMarker> {
        self.channel_id
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.state().timeout
    }

    /// Bound the lifetime of the next run. `None` or zero means no deadline.
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.state().timeout = timeout;
    }

    /// Only dispatch reactions from `user_id`, or from anyone with `None`.
    pub fn set_locked_user(&self, user_id: Option<Id<UserMarker>>) {
        self.state().locked_user = user_id;
    }

    pub fn locked_user(&self) -> Option<Id<UserMarker>> {
        self.state().locked_user
    }

    /// Emoji with registered handlers, in button order.
    pub fn handler_keys(&self) -> Vec<String> {
        self.handlers().keys().to_vec()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    fn schedule_reaction_cleanup(&self, message: MessageHandle, reaction: ReactionEvent) {
        let transport = Arc::clone(&self.transport);
        tokio::spawn(async move {
            sleep(REACTION_CLEANUP_DELAY).await;
            if let Err(source) = transport
                .remove_reaction(message, &reaction.emoji, reaction.user_id)
                .await
            {
                debug!(?source, emoji = %reaction.emoji, "failed to remove user reaction");
            }
        });
    }

    fn state(&self) -> MutexGuard<'_, WidgetState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handlers(&self) -> MutexGuard<'_, HandlerTable> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Returns the widget to `Idle` however `spawn` exits, including cancellation.
///
/// A close aimed at the finished run is discarded with it.
struct RunningGuard<'a> {
    widget: &'a Widget,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.widget.state();
        state.phase = Phase::Idle;
        self.widget.close_tx.send_replace(false);
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn wait_closed(close_rx: &mut watch::Receiver<bool>) {
    loop {
        let closed = *close_rx.borrow_and_update();
        if closed || close_rx.changed().await.is_err() {
            return;
        }
    }
}
