//! Unit tests for the widget event loop

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use tokio::task::JoinHandle;
    use tokio::time::{Duration, Instant, sleep};
    use twilight_model::{channel::message::embed::Embed, id::Id};
    use twilight_util::builder::embed::EmbedBuilder;

    use crate::error::{Result, WidgetError};
    use crate::mock::{MockTransport, TransportCall};
    use crate::transport::{MessageHandle, ReactionEvent};
    use crate::widget::Widget;

    const BOT_ID: u64 = 1;
    const CHANNEL_ID: u64 = 10;
    const USER_ID: u64 = 42;
    const OTHER_USER_ID: u64 = 77;

    type Seen = Arc<Mutex<Vec<ReactionEvent>>>;

    fn embed(title: &str) -> Embed {
        EmbedBuilder::new().title(title).build()
    }

    fn widget(transport: &Arc<MockTransport>) -> Arc<Widget> {
        Widget::new(transport.clone(), Id::new(CHANNEL_ID), Some(embed("menu")))
    }

    /// Poll until `condition` holds, panicking after one second of (virtual) time.
    async fn eventually(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met in time");
    }

    /// Run `spawn` on its own task and wait until the widget's message is live.
    async fn start(widget: &Arc<Widget>) -> (JoinHandle<Result<()>>, MessageHandle) {
        let task = tokio::spawn({
            let widget = Arc::clone(widget);
            async move { widget.spawn().await }
        });
        eventually(|| widget.running() && widget.message().is_some()).await;
        let message = widget.message().unwrap();
        (task, message)
    }

    async fn record(widget: &Widget, emoji: &str) -> Seen {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        widget
            .handle(emoji, move |_widget, reaction| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(reaction);
                }
            })
            .await
            .unwrap();
        seen
    }

    fn removals(transport: &MockTransport, emoji: &str, user_id: u64) -> usize {
        transport.count(|call| {
            matches!(
                call,
                TransportCall::RemoveReaction { emoji: e, user_id: u, .. }
                    if e == emoji && u.get() == user_id
            )
        })
    }

    // ── spawn ────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_spawn_without_content_fails() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = Widget::new(transport.clone(), Id::new(CHANNEL_ID), None);

        let err = widget.spawn().await.unwrap_err();

        assert!(matches!(err, WidgetError::NilContent));
        assert!(!widget.running());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_sends_message_and_buttons_in_order() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        record(&widget, "⬅").await;
        record(&widget, "➡").await;
        record(&widget, "⬅").await;

        let (task, message) = start(&widget).await;
        eventually(|| transport.added_reactions().len() == 2).await;

        assert!(widget.running());
        assert_eq!(transport.sent_messages(), vec![message]);
        assert_eq!(transport.added_reactions(), vec!["⬅", "➡"]);
        assert_eq!(message.channel_id, Id::new(CHANNEL_ID));

        widget.close();
        task.await.unwrap().unwrap();
        assert!(!widget.running());
        assert_eq!(transport.reaction_subscribers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_while_running_fails() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, message) = start(&widget).await;

        let err = widget.spawn().await.unwrap_err();

        assert!(matches!(err, WidgetError::AlreadyRunning));
        assert!(widget.running());
        assert_eq!(widget.message(), Some(message));
        assert_eq!(transport.sent_messages().len(), 1);

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_initial_send_failure_returns_to_idle() {
        let transport = MockTransport::shared(BOT_ID);
        transport.fail_sends(true);
        let widget = widget(&transport);

        let err = widget.spawn().await.unwrap_err();

        assert!(matches!(err, WidgetError::Transport(_)));
        assert!(!widget.running());
        assert!(widget.message().is_none());
        assert_eq!(transport.reaction_subscribers(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_button_failures_are_not_fatal() {
        let transport = MockTransport::shared(BOT_ID);
        transport.fail_reactions(true);
        let widget = widget(&transport);
        let seen = record(&widget, "➡").await;

        let (task, message) = start(&widget).await;
        transport.react(message, USER_ID, "➡");
        eventually(|| seen.lock().unwrap().len() == 1).await;

        assert!(widget.running());
        widget.close();
        task.await.unwrap().unwrap();
    }

    // ── dispatch ─────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_matching_reaction_and_cleans_up() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let seen = record(&widget, "➡").await;
        let (task, message) = start(&widget).await;

        transport.react(message, USER_ID, "➡");
        eventually(|| seen.lock().unwrap().len() == 1).await;

        let event = seen.lock().unwrap()[0].clone();
        assert_eq!(event.message_id, message.id);
        assert_eq!(event.user_id, Id::new(USER_ID));
        assert_eq!(event.emoji, "➡");

        eventually(|| removals(&transport, "➡", USER_ID) == 1).await;

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ignores_foreign_and_self_reactions() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let seen = record(&widget, "➡").await;
        let (task, message) = start(&widget).await;

        let elsewhere = MessageHandle {
            channel_id: message.channel_id,
            id: Id::new(999_999),
        };
        transport.react(elsewhere, USER_ID, "➡");
        transport.react(message, BOT_ID, "➡");
        transport.react(message, USER_ID, "⏹");
        transport.react(message, OTHER_USER_ID, "➡");

        eventually(|| seen.lock().unwrap().len() == 1).await;
        assert_eq!(seen.lock().unwrap()[0].user_id, Id::new(OTHER_USER_ID));

        // Unhandled emoji are still cleaned up; foreign and self reactions are not.
        eventually(|| removals(&transport, "⏹", USER_ID) == 1).await;
        eventually(|| removals(&transport, "➡", OTHER_USER_ID) == 1).await;
        assert_eq!(removals(&transport, "➡", BOT_ID), 0);
        assert_eq!(removals(&transport, "➡", USER_ID), 0);

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_locked_user_filters_reactions() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget.set_locked_user(Some(Id::new(USER_ID)));
        let seen = record(&widget, "➡").await;
        let (task, message) = start(&widget).await;

        transport.react(message, OTHER_USER_ID, "➡");
        transport.react(message, USER_ID, "➡");
        eventually(|| seen.lock().unwrap().len() == 1).await;
        sleep(Duration::from_millis(100)).await;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].user_id, Id::new(USER_ID));

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_handlers_run_sequentially_in_delivery_order() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let order = Arc::new(Mutex::new(Vec::new()));
        for emoji in ["1️⃣", "2️⃣"] {
            let order = Arc::clone(&order);
            widget
                .handle(emoji, move |_widget, reaction| {
                    let order = Arc::clone(&order);
                    async move {
                        order.lock().unwrap().push(format!("start {}", reaction.emoji));
                        sleep(Duration::from_millis(50)).await;
                        order.lock().unwrap().push(format!("end {}", reaction.emoji));
                    }
                })
                .await
                .unwrap();
        }
        let (task, message) = start(&widget).await;

        transport.react(message, USER_ID, "2️⃣");
        transport.react(message, USER_ID, "1️⃣");
        eventually(|| order.lock().unwrap().len() == 4).await;

        assert_eq!(
            *order.lock().unwrap(),
            vec!["start 2️⃣", "end 2️⃣", "start 1️⃣", "end 1️⃣"]
        );

        widget.close();
        task.await.unwrap().unwrap();
    }

    // ── handle / update_content ──────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_handle_while_running_adds_button() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, _message) = start(&widget).await;
        assert!(transport.added_reactions().is_empty());

        record(&widget, "➡").await;
        record(&widget, "➡").await;
        assert_eq!(transport.added_reactions(), vec!["➡"]);

        transport.fail_reactions(true);
        let err = widget
            .handle("⬅", |_widget, _reaction| async {})
            .await
            .unwrap_err();
        assert!(matches!(err, WidgetError::Transport(_)));
        assert_eq!(widget.handler_keys(), vec!["➡", "⬅"]);

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_content_requires_running_widget() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);

        let err = widget.update_content(embed("early")).await.unwrap_err();
        assert!(matches!(err, WidgetError::NotRunning));

        let (task, message) = start(&widget).await;
        let edited = widget.update_content(embed("page 2")).await.unwrap();

        assert_eq!(edited, message);
        assert_eq!(transport.edited_embeds(), vec![embed("page 2")]);
        assert_eq!(widget.content(), Some(embed("page 2")));

        widget.close();
        task.await.unwrap().unwrap();

        let err = widget.update_content(embed("late")).await.unwrap_err();
        assert!(matches!(err, WidgetError::NotRunning));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_content_propagates_edit_failure() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, _message) = start(&widget).await;
        transport.fail_edits(true);

        let err = widget.update_content(embed("page 2")).await.unwrap_err();

        assert!(matches!(err, WidgetError::Transport(_)));
        assert_eq!(widget.content(), Some(embed("menu")));

        widget.close();
        task.await.unwrap().unwrap();
    }

    // ── close / timeout ──────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_close_is_idempotent() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let seen = record(&widget, "➡").await;
        let (task, message) = start(&widget).await;

        widget.close();
        widget.close();
        task.await.unwrap().unwrap();

        transport.react(message, USER_ID, "➡");
        sleep(Duration::from_millis(100)).await;
        assert!(seen.lock().unwrap().is_empty());
        assert!(!widget.running());

        // Closes aimed at the finished run do not stop the next one.
        let (task, _message) = start(&widget).await;
        sleep(Duration::from_millis(100)).await;
        assert!(widget.running());
        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_right_after_spawning_stops_the_run() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget.set_timeout(Some(Duration::from_secs(3_600)));
        let started = Instant::now();

        let task = tokio::spawn({
            let widget = Arc::clone(&widget);
            async move { widget.spawn().await }
        });
        widget.close();

        task.await.unwrap().unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!widget.running());

        // The close was consumed by that run.
        let (task, _message) = start(&widget).await;
        sleep(Duration::from_millis(100)).await;
        assert!(widget.running());
        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_from_handler_skips_queued_reactions() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget
            .handle("⏹", |widget, _reaction| async move { widget.close() })
            .await
            .unwrap();
        let seen = record(&widget, "➡").await;
        let (task, message) = start(&widget).await;

        transport.react(message, USER_ID, "⏹");
        transport.react(message, USER_ID, "➡");
        task.await.unwrap().unwrap();

        assert!(!widget.running());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_before_first_event() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget.set_timeout(Some(Duration::from_secs(3_600)));
        let started = Instant::now();
        let (task, _message) = start(&widget).await;

        widget.close();
        task.await.unwrap().unwrap();

        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_an_absolute_deadline() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget.set_timeout(Some(Duration::from_secs(100)));
        let seen = record(&widget, "➡").await;

        let started = Instant::now();
        let (task, message) = start(&widget).await;
        let feeder = tokio::spawn({
            let transport = Arc::clone(&transport);
            async move {
                loop {
                    sleep(Duration::from_secs(30)).await;
                    transport.react(message, USER_ID, "➡");
                }
            }
        });

        task.await.unwrap().unwrap();
        feeder.abort();

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(100), "ended early: {elapsed:?}");
        assert!(elapsed < Duration::from_secs(120), "deadline slid: {elapsed:?}");
        assert_eq!(seen.lock().unwrap().len(), 3);
        assert!(!widget.running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unrepresentable_timeout_means_no_deadline() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget.set_timeout(Some(Duration::from_secs(u64::MAX)));
        let (task, _message) = start(&widget).await;

        sleep(Duration::from_secs(86_400)).await;
        assert!(widget.running());

        widget.close();
        task.await.unwrap().unwrap();
        assert!(!widget.running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_means_no_deadline() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        widget.set_timeout(Some(Duration::ZERO));
        let (task, _message) = start(&widget).await;

        sleep(Duration::from_secs(86_400)).await;
        assert!(widget.running());

        widget.close();
        task.await.unwrap().unwrap();
    }

    // ── query_input ──────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_query_input_returns_reply_from_user() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, _message) = start(&widget).await;
        let query = tokio::spawn({
            let widget = Arc::clone(&widget);
            async move {
                widget
                    .query_input("enter a page", Id::new(USER_ID), Duration::from_secs(10))
                    .await
            }
        });

        eventually(|| transport.last_text().is_some()).await;
        let (prompt, prompt_text) = transport.last_text().unwrap();
        assert_eq!(prompt_text, "<@42>, enter a page");

        transport.say(Id::new(CHANNEL_ID), OTHER_USER_ID, "9");
        transport.say(Id::new(999), USER_ID, "8");
        let reply = transport.say(Id::new(CHANNEL_ID), USER_ID, "3");

        assert_eq!(query.await.unwrap().unwrap(), "3");
        let deleted: Vec<_> = transport
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                TransportCall::DeleteMessage { message } => Some(message),
                _ => None,
            })
            .collect();
        assert_eq!(deleted, vec![prompt, reply]);

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_input_survives_failed_deletes() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, _message) = start(&widget).await;
        transport.fail_deletes(true);
        let query = tokio::spawn({
            let widget = Arc::clone(&widget);
            async move {
                widget
                    .query_input("enter a page", Id::new(USER_ID), Duration::from_secs(10))
                    .await
            }
        });

        eventually(|| transport.last_text().is_some()).await;
        transport.say(Id::new(CHANNEL_ID), USER_ID, "2");

        assert_eq!(query.await.unwrap().unwrap(), "2");
        assert_eq!(
            transport.count(|call| matches!(call, TransportCall::DeleteMessage { .. })),
            0
        );

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_input_on_idle_widget_sends_nothing() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);

        let err = widget
            .query_input("enter a page", Id::new(USER_ID), Duration::from_secs(10))
            .await
            .unwrap_err();

        assert!(matches!(err, WidgetError::NotRunning));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_input_times_out() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, _message) = start(&widget).await;

        let err = widget
            .query_input("enter a page", Id::new(USER_ID), Duration::from_secs(10))
            .await
            .unwrap_err();

        assert!(matches!(err, WidgetError::Timeout));
        let (prompt, _) = transport.last_text().unwrap();
        assert_eq!(
            transport.calls().last(),
            Some(&TransportCall::DeleteMessage { message: prompt })
        );

        widget.close();
        task.await.unwrap().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_input_aborts_when_closed() {
        let transport = MockTransport::shared(BOT_ID);
        let widget = widget(&transport);
        let (task, _message) = start(&widget).await;
        let query = tokio::spawn({
            let widget = Arc::clone(&widget);
            async move {
                widget
                    .query_input("enter a page", Id::new(USER_ID), Duration::from_secs(10))
                    .await
            }
        });
        eventually(|| transport.last_text().is_some()).await;

        widget.close();

        let err = query.await.unwrap().unwrap_err();
        assert!(matches!(err, WidgetError::NotRunning));
        task.await.unwrap().unwrap();
    }
}
