//! Shared fixtures for command tests.

use std::sync::Arc;

use tokio::time::{Duration, sleep};
use twilight_model::id::Id;

use crate::Invocation;
use rusty_core::{Config, Context, PaginatorConfig};
use rusty_widgets::mock::MockTransport;

pub const BOT_ID: u64 = 1;
pub const CHANNEL_ID: u64 = 10;
pub const AUTHOR_ID: u64 = 42;
pub const OTHER_USER_ID: u64 = 77;

pub fn context() -> (Context, Arc<MockTransport>) {
    let transport = MockTransport::shared(BOT_ID);
    let config = Config {
        discord_token: "TOK".to_owned(),
        paginator: PaginatorConfig::default(),
    };
    (Context::new(transport.clone(), config), transport)
}

pub fn invocation() -> Invocation {
    Invocation {
        channel_id: Id::new(CHANNEL_ID),
        author_id: Id::new(AUTHOR_ID),
    }
}

pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}
