use twilight_model::id::{Id, marker::UserMarker};

/// Longest decimal representation of a `u64` snowflake.
const MAX_SNOWFLAKE_DIGITS: usize = 20;

/// Parse a user from a raw argument (`<@id>`, `<@!id>`, or a bare snowflake).
///
/// Only ASCII digits are accepted inside the wrapper, and zero is rejected.
pub fn parse_user_id(raw: &str) -> Option<Id<UserMarker>> {
    let trimmed = raw.trim();

    let numeric = if trimmed.starts_with("<@") && trimmed.ends_with('>') {
        let without_wrappers = trimmed.strip_prefix("<@")?.strip_suffix('>')?;
        without_wrappers
            .strip_prefix('!')
            .unwrap_or(without_wrappers)
    } else {
        trimmed
    };

    if numeric.is_empty()
        || numeric.len() > MAX_SNOWFLAKE_DIGITS
        || !numeric.bytes().all(|byte| byte.is_ascii_digit())
    {
        return None;
    }

    Id::new_checked(numeric.parse::<u64>().ok()?)
}

/// Parse a one-based page number typed by a user.
///
/// Returns `Some(page)` when the value is valid (`>= 1`), otherwise `None`.
pub fn parse_one_based_page(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|page| *page >= 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_id_accepts_snowflake_and_mentions() {
        let expected = Some(Id::new(80351110224678912));
        assert_eq!(parse_user_id("80351110224678912"), expected);
        assert_eq!(parse_user_id(" <@80351110224678912> "), expected);
        assert_eq!(parse_user_id("<@!80351110224678912>"), expected);
    }

    #[test]
    fn test_parse_user_id_rejects_malformed_ids() {
        for raw in [
            "", "U1", "+123", "-5", "0", "<@>", "<@abc>", "12 34", "184467440737095516160",
        ] {
            assert_eq!(parse_user_id(raw), None, "accepted {raw:?}");
        }
    }

    #[test]
    fn test_parse_one_based_page() {
        assert_eq!(parse_one_based_page("3"), Some(3));
        assert_eq!(parse_one_based_page(" 12\n"), Some(12));
        assert_eq!(parse_one_based_page("0"), None);
        assert_eq!(parse_one_based_page("-1"), None);
        assert_eq!(parse_one_based_page("three"), None);
    }
}
