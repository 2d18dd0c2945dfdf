use twilight_model::channel::message::embed::Embed;

use crate::utility::launch;
use crate::{COMMANDS, CommandMeta, Invocation};
use rusty_core::Context;
use rusty_widgets::embed::build_page_embed;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category]",
};

/// Open the command catalog, one page per category.
///
/// With a category argument the paginator starts on that category's page.
pub async fn run(ctx: Context, invocation: Invocation, arg1: Option<&str>) -> anyhow::Result<()> {
    let categories = categories();

    let start_page = match arg1 {
        Some(raw) => {
            let wanted = raw.to_ascii_lowercase();
            let Some(index) = categories.iter().position(|category| *category == wanted) else {
                let out = unknown_category_message(raw, &categories);
                ctx.transport.send_text(invocation.channel_id, &out).await?;
                return Ok(());
            };
            index
        }
        None => 0,
    };

    let paginator = ctx.paginator(invocation.channel_id);
    paginator.add(help_pages(&categories)?);
    paginator.set_page_footers();
    paginator.goto(start_page)?;

    launch(paginator, invocation);
    Ok(())
}

fn categories() -> Vec<&'static str> {
    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

fn help_pages(categories: &[&str]) -> anyhow::Result<Vec<Embed>> {
    categories
        .iter()
        .map(|category| {
            let title = format!("Available Commands: {category}");
            build_page_embed(&title, category_description(category))
        })
        .collect()
}

fn category_description(category: &str) -> String {
    let mut commands: Vec<&CommandMeta> = COMMANDS
        .iter()
        .filter(|cmd| cmd.category == category)
        .collect();
    commands.sort_unstable_by_key(|cmd| cmd.name);

    commands
        .iter()
        .map(|cmd| format!("`{}` - {}", cmd.usage, cmd.desc))
        .collect::<Vec<_>>()
        .join("\n")
}

fn unknown_category_message(wanted: &str, categories: &[&str]) -> String {
    format!(
        "Unknown category `{wanted}`. Available categories: {}",
        categories.join(", ")
    )
}
