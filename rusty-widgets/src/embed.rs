use twilight_model::channel::message::embed::{Embed, EmbedFooter};
use twilight_util::builder::embed::{EmbedBuilder, EmbedFooterBuilder};

/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_54_30;

/// Build a standard page embed with consistent styling.
pub fn build_page_embed(title: &str, description: impl Into<String>) -> anyhow::Result<Embed> {
    let embed = EmbedBuilder::new()
        .title(title)
        .color(DEFAULT_EMBED_COLOR)
        .description(description)
        .validate()?
        .build();

    Ok(embed)
}

/// Render items as a markdown bullet list.
pub fn bulleted_description(items: &[String]) -> String {
    format!("- {}", items.join("\n- "))
}

/// Split `items` into page embeds of at most `per_page` bullets each.
pub fn build_list_pages(
    title: &str,
    items: &[String],
    per_page: usize,
) -> anyhow::Result<Vec<Embed>> {
    items
        .chunks(per_page.max(1))
        .map(|chunk| build_page_embed(title, bulleted_description(chunk)))
        .collect()
}

/// Position marker shown in a paginated embed's footer, e.g. `#[2 / 5]`.
pub fn page_position(page: usize, total_pages: usize) -> String {
    format!("#[{page} / {total_pages}]")
}

/// Footer carrying the page position marker.
pub fn page_footer(page: usize, total_pages: usize) -> EmbedFooter {
    EmbedFooterBuilder::new(page_position(page, total_pages)).build()
}
