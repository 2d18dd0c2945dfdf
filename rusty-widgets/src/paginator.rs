//! Navigable multi-page embed built on [`Widget`].

#[path = "paginator_tests.rs"]
mod paginator_tests;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::{runtime::Handle, time::Duration};
use tracing::{debug, warn};
use twilight_model::{
    channel::message::embed::Embed,
    id::{
        Id,
        marker::{ChannelMarker, UserMarker},
    },
};

use crate::embed::page_footer;
use crate::error::{Result, WidgetError};
use crate::handlers::{WidgetHandler, handler};
use crate::parse::{parse_one_based_page, parse_user_id};
use crate::transport::{MessageHandle, Transport};
use crate::widget::Widget;

pub const NAV_BEGINNING: &str = "⏪";
pub const NAV_LEFT: &str = "⬅";
pub const NAV_RIGHT: &str = "➡";
pub const NAV_END: &str = "⏩";
pub const NAV_NUMBERS: &str = "🔢";

/// How long the jump button waits for a typed page number.
pub const JUMP_INPUT_TIMEOUT: Duration = Duration::from_secs(10);
const JUMP_PROMPT: &str = "enter the page number you would like to open";

/// Cleanup applied to the message once a paginator stops.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DoneBehavior {
    /// Delete the message. Takes precedence over `color`.
    pub delete_message: bool,
    /// Recolor the final page and re-render it.
    pub color: Option<u32>,
    /// Strip every reaction from the message.
    pub remove_reactions: bool,
}

#[derive(Default)]
struct PaginatorState {
    pages: Vec<Embed>,
    index: usize,
    looping: bool,
    running: bool,
    done: DoneBehavior,
}

impl PaginatorState {
    fn current(&self) -> Result<&Embed> {
        self.pages.get(self.index).ok_or(WidgetError::IndexOutOfBounds)
    }

    fn goto(&mut self, index: usize) -> Result<()> {
        if index >= self.pages.len() {
            return Err(WidgetError::IndexOutOfBounds);
        }
        self.index = index;
        Ok(())
    }
}

/// Ordered pages shown one at a time on a single message, navigated with
/// reaction buttons.
pub struct Paginator {
    widget: Arc<Widget>,
    state: Mutex<PaginatorState>,
}

impl Paginator {
    /// Create an empty paginator for `channel_id` with the standard
    /// navigation buttons registered.
    pub fn new(transport: Arc<dyn Transport>, channel_id: Id<ChannelMarker>) -> Arc<Self> {
        Arc::new_cyclic(|paginator| {
            let widget = Widget::new(transport, channel_id, None);
            register_navigation(&widget, paginator);

            Self {
                widget,
                state: Mutex::new(PaginatorState::default()),
            }
        })
    }

    /// Show the current page and run until the widget stops, then apply the
    /// configured [`DoneBehavior`].
    ///
    /// The done behavior also runs, on a background task, when the task
    /// driving this future is aborted mid-run.
    pub async fn spawn(self: &Arc<Self>) -> Result<()> {
        let widget_running = self.widget.running();
        let page = {
            let mut state = self.state();
            if state.running || widget_running {
                return Err(WidgetError::AlreadyRunning);
            }
            let page = state.current()?.clone();
            state.running = true;
            page
        };
        let teardown = Teardown {
            paginator: Some(Arc::clone(self)),
        };

        self.widget.set_content(page);
        let outcome = self.widget.spawn().await;

        if matches!(outcome, Err(WidgetError::AlreadyRunning)) {
            teardown.release();
        } else {
            teardown.run().await;
        }
        outcome
    }

    /// Apply the done behavior to the message of the run that just ended.
    async fn finish(&self) {
        let Some(message) = self.widget.message() else {
            return;
        };
        let transport = self.widget.transport();
        let done = self.state().done;

        if done.delete_message {
            if let Err(source) = transport.delete_message(message).await {
                warn!(?source, message_id = message.id.get(), "failed to delete paginator");
            }
        } else if let Some(color) = done.color {
            let recolored = {
                let mut state = self.state();
                let index = state.index;
                state.pages.get_mut(index).map(|page| {
                    page.color = Some(color);
                    page.clone()
                })
            };
            if let Some(page) = recolored
                && let Err(source) = transport.edit_message(message, &page).await
            {
                warn!(?source, message_id = message.id.get(), "failed to recolor paginator");
            }
        }

        if done.remove_reactions
            && let Err(source) = transport.remove_all_reactions(message).await
        {
            warn!(?source, message_id = message.id.get(), "failed to clear reactions");
        }
    }

    /// Append pages.
    pub fn add(&self, pages: impl IntoIterator<Item = Embed>) {
        self.state().pages.extend(pages);
    }

    /// The page at the current index.
    pub fn page(&self) -> Result<Embed> {
        self.state().current().cloned()
    }

    /// Jump to the zero-based `index`.
    pub fn goto(&self, index: usize) -> Result<()> {
        self.state().goto(index)
    }

    /// Jump to the final page.
    pub fn last_page(&self) -> Result<()> {
        let mut state = self.state();
        let last = state
            .pages
            .len()
            .checked_sub(1)
            .ok_or(WidgetError::IndexOutOfBounds)?;
        state.goto(last)
    }

    /// Advance one page, wrapping to the first when looping.
    pub fn next_page(&self) -> Result<()> {
        let mut state = self.state();
        let next = state.index + 1;
        if next < state.pages.len() {
            state.index = next;
            return Ok(());
        }

        if state.looping && !state.pages.is_empty() {
            state.index = 0;
            return Ok(());
        }

        Err(WidgetError::IndexOutOfBounds)
    }

    /// Go back one page, wrapping to the last when looping.
    pub fn previous_page(&self) -> Result<()> {
        let mut state = self.state();
        if let Some(previous) = state.index.checked_sub(1)
            && previous < state.pages.len()
        {
            state.index = previous;
            return Ok(());
        }

        if state.looping && !state.pages.is_empty() {
            state.index = state.pages.len() - 1;
            return Ok(());
        }

        Err(WidgetError::IndexOutOfBounds)
    }

    /// Re-render the live message with the current page.
    pub async fn update(&self) -> Result<MessageHandle> {
        if self.widget.message().is_none() {
            return Err(WidgetError::NilMessage);
        }

        let page = self.page()?;
        self.widget.update_content(page).await
    }

    /// Stamp every page's footer with its `#[n / total]` position.
    pub fn set_page_footers(&self) {
        let mut state = self.state();
        let total = state.pages.len();
        for (index, page) in state.pages.iter_mut().enumerate() {
            page.footer = Some(page_footer(index + 1, total));
        }
    }

    /// Ignore reactions from anyone but `raw_id`.
    ///
    /// Accepts a bare snowflake or a user mention.
    pub fn lock_to_user(&self, raw_id: &str) -> Result<()> {
        let user_id = parse_user_id(raw_id).ok_or(WidgetError::InvalidId)?;
        self.lock_to_user_id(user_id);
        Ok(())
    }

    pub fn lock_to_user_id(&self, user_id: Id<UserMarker>) {
        self.widget.set_locked_user(Some(user_id));
    }

    /// Accept reactions from everyone again.
    pub fn unlock_from_user(&self) {
        self.widget.set_locked_user(None);
    }

    pub fn running(&self) -> bool {
        self.state().running
    }

    pub fn index(&self) -> usize {
        self.state().index
    }

    pub fn len(&self) -> usize {
        self.state().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().pages.is_empty()
    }

    /// Snapshot of every page.
    pub fn pages(&self) -> Vec<Embed> {
        self.state().pages.clone()
    }

    /// Wrap around at either end instead of failing.
    pub fn set_loop(&self, looping: bool) {
        self.state().looping = looping;
    }

    pub fn looping(&self) -> bool {
        self.state().looping
    }

    pub fn set_done_behavior(&self, done: DoneBehavior) {
        self.state().done = done;
    }

    pub fn done_behavior(&self) -> DoneBehavior {
        self.state().done
    }

    /// Bound how long the paginator stays interactive. `None` means forever.
    pub fn set_timeout(&self, timeout: Option<Duration>) {
        self.widget.set_timeout(timeout);
    }

    /// The underlying widget, for custom buttons or closing early.
    pub fn widget(&self) -> &Arc<Widget> {
        &self.widget
    }

    fn state(&self) -> MutexGuard<'_, PaginatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Finishes a run: applies the done behavior and clears the running flag.
///
/// Dropped while still armed, it hands the same work to a background task.
struct Teardown {
    paginator: Option<Arc<Paginator>>,
}

impl Teardown {
    async fn run(mut self) {
        if let Some(paginator) = &self.paginator {
            paginator.finish().await;
            paginator.state().running = false;
        }
        self.paginator = None;
    }

    /// Clear the running flag without touching the message.
    fn release(mut self) {
        if let Some(paginator) = self.paginator.take() {
            paginator.state().running = false;
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        let Some(paginator) = self.paginator.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(runtime) => {
                debug!("paginator run aborted, finishing in background");
                runtime.spawn(async move {
                    paginator.finish().await;
                    paginator.state().running = false;
                });
            }
            Err(_) => paginator.state().running = false,
        }
    }
}

fn register_navigation(widget: &Widget, paginator: &Weak<Paginator>) {
    widget.insert_handler(NAV_BEGINNING, navigate(paginator, |p| p.goto(0)));
    widget.insert_handler(NAV_LEFT, navigate(paginator, Paginator::previous_page));
    widget.insert_handler(NAV_RIGHT, navigate(paginator, Paginator::next_page));
    widget.insert_handler(NAV_END, navigate(paginator, Paginator::last_page));
    widget.insert_handler(NAV_NUMBERS, jump(paginator));
}

/// Button that applies `step` and re-renders only when it succeeded.
fn navigate(paginator: &Weak<Paginator>, step: fn(&Paginator) -> Result<()>) -> WidgetHandler {
    let paginator = Weak::clone(paginator);
    handler(move |_widget, _reaction| {
        let paginator = paginator.upgrade();
        async move {
            let Some(paginator) = paginator else {
                return;
            };
            if step(&paginator).is_ok() {
                render(&paginator).await;
            }
        }
    })
}

/// Button that asks the reacting user for a page number.
fn jump(paginator: &Weak<Paginator>) -> WidgetHandler {
    let paginator = Weak::clone(paginator);
    handler(move |widget, reaction| {
        let paginator = paginator.upgrade();
        async move {
            let Some(paginator) = paginator else {
                return;
            };
            let reply = match widget
                .query_input(JUMP_PROMPT, reaction.user_id, JUMP_INPUT_TIMEOUT)
                .await
            {
                Ok(reply) => reply,
                Err(source) => {
                    debug!(%source, "no page number received");
                    return;
                }
            };

            let Some(page) = parse_one_based_page(&reply) else {
                return;
            };
            if paginator.goto(page - 1).is_ok() {
                render(&paginator).await;
            }
        }
    })
}

async fn render(paginator: &Paginator) {
    if let Err(source) = paginator.update().await {
        warn!(%source, "failed to render page");
    }
}
