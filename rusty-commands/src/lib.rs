pub mod utility;

use twilight_model::{
    gateway::payload::incoming::MessageCreate,
    id::{
        Id,
        marker::{ChannelMarker, UserMarker},
    },
};

use rusty_core::Context;
use rusty_widgets::COMMAND_PREFIX;

// Global command meta data
pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::help::META,
    utility::pagetest::META,
    // Add new commands here
];

/// Where a command was issued and by whom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub channel_id: Id<ChannelMarker>,
    pub author_id: Id<UserMarker>,
}

pub async fn handle_message(ctx: Context, msg: Box<MessageCreate>) -> anyhow::Result<()> {
    if msg.author.bot {
        return Ok(());
    }

    let Some((cmd, arg1)) = parse_command(&msg.content) else {
        return Ok(());
    };

    let invocation = Invocation {
        channel_id: msg.channel_id,
        author_id: msg.author.id,
    };
    run_command(ctx, invocation, &cmd, arg1).await
}

/// Route an already parsed command. Unknown commands are ignored.
pub async fn run_command(
    ctx: Context,
    invocation: Invocation,
    cmd: &str,
    arg1: Option<&str>,
) -> anyhow::Result<()> {
    match cmd {
        "help" => utility::help::run(ctx, invocation, arg1).await?,
        "pagetest" => utility::pagetest::run(ctx, invocation, arg1).await?,
        // Add new commands here
        _ => {}
    }

    Ok(())
}

/// Split `!cmd arg1 ...` into the lowercased command and its first argument.
fn parse_command(content: &str) -> Option<(String, Option<&str>)> {
    let content = content.trim().strip_prefix(COMMAND_PREFIX)?.trim();
    let mut parts = content.split_whitespace();
    let cmd = parts.next()?.to_ascii_lowercase();
    let arg1 = parts.next();

    Some((cmd, arg1))
}
