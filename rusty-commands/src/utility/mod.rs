pub mod help;
pub mod pagetest;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::Invocation;
use rusty_widgets::Paginator;

/// Lock `paginator` to the invoking user and run it in the background.
pub(crate) fn launch(paginator: Arc<Paginator>, invocation: Invocation) {
    paginator.lock_to_user_id(invocation.author_id);

    tokio::spawn(async move {
        match paginator.spawn().await {
            Ok(()) => debug!(
                channel_id = invocation.channel_id.get(),
                "paginator finished"
            ),
            Err(source) => warn!(
                %source,
                channel_id = invocation.channel_id.get(),
                "paginator failed"
            ),
        }
    });
}
