use crate::utility::launch;
use crate::{CommandMeta, Invocation};
use rusty_core::Context;
use rusty_widgets::embed::build_list_pages;
use rusty_widgets::parse::parse_one_based_page;

pub const META: CommandMeta = CommandMeta {
    name: "pagetest",
    desc: "Test reaction pagination behavior.",
    category: "debug",
    usage: "!pagetest [page]",
};

const ITEMS_PER_PAGE: usize = 5;

/// Pagination smoke test.
///
/// Inputs:
/// - optional page number: `!pagetest [page]`.
///
/// Error behavior:
/// - returns usage text on invalid page input.
/// - returns bounds text when the requested page is out of range.
pub async fn run(ctx: Context, invocation: Invocation, arg1: Option<&str>) -> anyhow::Result<()> {
    let items = build_test_items();
    let pages = build_list_pages("Pagination Test", &items, ITEMS_PER_PAGE)?;
    let total = pages.len();

    let requested_page = match arg1 {
        Some(raw) => parse_one_based_page(raw),
        None => Some(1),
    };
    let Some(requested_page) = requested_page else {
        let usage = format!("Usage: `{}` (page starts at 1)", META.usage);
        ctx.transport.send_text(invocation.channel_id, &usage).await?;
        return Ok(());
    };

    if requested_page > total {
        let out = format!("Page {requested_page} does not exist. Available pages: 1-{total}.");
        ctx.transport.send_text(invocation.channel_id, &out).await?;
        return Ok(());
    }

    let paginator = ctx.paginator(invocation.channel_id);
    paginator.add(pages);
    paginator.set_page_footers();
    paginator.goto(requested_page - 1)?;

    launch(paginator, invocation);
    Ok(())
}

fn build_test_items() -> Vec<String> {
    (1..=24)
        .map(|index| format!("Sample pagination item #{index}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utility::test_support::{AUTHOR_ID, context, eventually, invocation};
    use rusty_widgets::mock::TransportCall;
    use rusty_widgets::paginator::{NAV_END, NAV_LEFT};

    fn sent_footer(call: &TransportCall) -> Option<&str> {
        match call {
            TransportCall::SendMessage { embed, .. } | TransportCall::EditMessage { embed, .. } => {
                embed.footer.as_ref().map(|footer| footer.text.as_str())
            }
            _ => None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagetest_opens_requested_page() {
        let (ctx, transport) = context();

        run(ctx, invocation(), Some("3")).await.unwrap();
        eventually(|| transport.sent_messages().len() == 1).await;

        let calls = transport.calls();
        assert_eq!(sent_footer(&calls[0]), Some("#[3 / 5]"));
        let TransportCall::SendMessage { embed, .. } = &calls[0] else {
            unreachable!();
        };
        assert!(
            embed
                .description
                .as_deref()
                .unwrap()
                .starts_with("- Sample pagination item #11")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pagetest_navigates_with_reactions() {
        let (ctx, transport) = context();
        run(ctx, invocation(), None).await.unwrap();
        eventually(|| transport.added_reactions().len() == 5).await;
        let message = transport.sent_messages()[0];

        transport.react(message, AUTHOR_ID, NAV_END);
        transport.react(message, AUTHOR_ID, NAV_LEFT);
        eventually(|| transport.edited_embeds().len() == 2).await;

        let footers: Vec<_> = transport
            .edited_embeds()
            .into_iter()
            .map(|embed| embed.footer.unwrap().text)
            .collect();
        assert_eq!(footers, ["#[5 / 5]", "#[4 / 5]"]);
    }

    #[tokio::test]
    async fn test_pagetest_rejects_bad_pages() {
        for (raw, expected) in [
            ("0", "Usage: `!pagetest [page]` (page starts at 1)"),
            ("abc", "Usage: `!pagetest [page]` (page starts at 1)"),
            ("6", "Page 6 does not exist. Available pages: 1-5."),
        ] {
            let (ctx, transport) = context();

            run(ctx, invocation(), Some(raw)).await.unwrap();

            assert_eq!(transport.last_text().unwrap().1, expected);
            assert!(transport.sent_messages().is_empty());
        }
    }
}
