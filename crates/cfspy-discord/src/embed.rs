//! Card → Discord embed conversion.
//!
//! Discord rejects a whole message when any embed part is over its limit, so
//! every part is cut down here before the request is built. Limits are in
//! characters, see https://discord.com/developers/docs/resources/message#embed-object-embed-limits

use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter};

use cfspy_widget::{Card, CardField};

pub const CONTENT_CHAR_LIMIT: usize = 2000;
pub const TITLE_CHAR_LIMIT: usize = 256;
pub const DESCRIPTION_CHAR_LIMIT: usize = 2048;
pub const FIELD_COUNT_LIMIT: usize = 25;
pub const FIELD_NAME_CHAR_LIMIT: usize = 256;
pub const FIELD_VALUE_CHAR_LIMIT: usize = 1024;
pub const FOOTER_TEXT_CHAR_LIMIT: usize = 2048;
pub const AUTHOR_NAME_CHAR_LIMIT: usize = 256;
/// Sum of title, description, field names and values, footer and author name.
pub const EMBED_TOTAL_CHAR_LIMIT: usize = 6000;

const ELLIPSIS: char = '…';

/// Cut `s` to at most `limit` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    let mut out: String = s.chars().take(limit.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}

pub fn fit_content(text: &str) -> String {
    truncate(text, CONTENT_CHAR_LIMIT)
}

/// A copy of `card` with every part inside Discord's limits.
///
/// When the parts together are still over the total limit, trailing fields
/// are dropped until the card fits.
pub fn fit_card(card: &Card) -> Card {
    let cut = |s: &Option<String>, limit| s.as_deref().map(|s| truncate(s, limit));
    let mut fitted = Card {
        title: cut(&card.title, TITLE_CHAR_LIMIT),
        url: card.url.clone(),
        author: cut(&card.author, AUTHOR_NAME_CHAR_LIMIT),
        description: cut(&card.description, DESCRIPTION_CHAR_LIMIT),
        colour: card.colour,
        fields: card
            .fields
            .iter()
            .take(FIELD_COUNT_LIMIT)
            .map(|f| CardField {
                name: truncate(&f.name, FIELD_NAME_CHAR_LIMIT),
                value: truncate(&f.value, FIELD_VALUE_CHAR_LIMIT),
                inline: f.inline,
            })
            .collect(),
        footer: cut(&card.footer, FOOTER_TEXT_CHAR_LIMIT),
    };

    // Without fields the capped parts total 4608, so this always fits.
    while total_chars(&fitted) > EMBED_TOTAL_CHAR_LIMIT && fitted.fields.pop().is_some() {}
    fitted
}

fn total_chars(card: &Card) -> usize {
    let len = |s: &Option<String>| s.as_deref().map_or(0, |s| s.chars().count());
    let fields: usize = card
        .fields
        .iter()
        .map(|f| f.name.chars().count() + f.value.chars().count())
        .sum();
    len(&card.title) + len(&card.author) + len(&card.description) + len(&card.footer) + fields
}

/// Convert to a serenity `CreateEmbed` builder.
pub fn to_create_embed(card: &Card) -> CreateEmbed {
    let card = fit_card(card);
    let mut e = CreateEmbed::new();
    if let Some(ref t) = card.title {
        e = e.title(t);
    }
    if let Some(ref u) = card.url {
        e = e.url(u);
    }
    if let Some(ref a) = card.author {
        e = e.author(CreateEmbedAuthor::new(a));
    }
    if let Some(ref d) = card.description {
        e = e.description(d);
    }
    if let Some(c) = card.colour {
        e = e.colour(c);
    }
    for f in &card.fields {
        e = e.field(&f.name, &f.value, f.inline);
    }
    if let Some(ref f) = card.footer {
        e = e.footer(CreateEmbedFooter::new(f));
    }
    e
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_strings_are_untouched() {
        assert_eq!(truncate("hello", 5), "hello");
        assert_eq!(truncate("", 0), "");
    }

    #[test]
    fn long_strings_end_in_ellipsis_within_limit() {
        let cut = truncate(&"x".repeat(300), TITLE_CHAR_LIMIT);
        assert_eq!(cut.chars().count(), TITLE_CHAR_LIMIT);
        assert!(cut.ends_with(ELLIPSIS));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let s = "é".repeat(10);
        assert_eq!(truncate(&s, 10), s);
        assert_eq!(truncate(&s, 4), "ééé…");
    }

    #[test]
    fn content_limit() {
        assert_eq!(fit_content(&"a".repeat(2500)).chars().count(), CONTENT_CHAR_LIMIT);
    }

    #[test]
    fn card_parts_are_fitted() {
        let mut card = Card::new()
            .title("t".repeat(400))
            .author("a".repeat(400))
            .description("d".repeat(5000))
            .footer("f".repeat(3000))
            .colour(0xFFBF00);
        for i in 0..30 {
            card = card.field(format!("n{i}"), "v", i % 2 == 0);
        }

        let fitted = fit_card(&card);
        assert_eq!(fitted.title.unwrap().chars().count(), TITLE_CHAR_LIMIT);
        assert_eq!(fitted.author.unwrap().chars().count(), AUTHOR_NAME_CHAR_LIMIT);
        assert_eq!(
            fitted.description.unwrap().chars().count(),
            DESCRIPTION_CHAR_LIMIT
        );
        assert_eq!(fitted.footer.unwrap().chars().count(), FOOTER_TEXT_CHAR_LIMIT);
        assert_eq!(fitted.colour, Some(0xFFBF00));
        assert_eq!(fitted.fields.len(), FIELD_COUNT_LIMIT);
        assert!(fitted.fields[0].inline && !fitted.fields[1].inline);
    }

    #[test]
    fn field_parts_are_fitted() {
        let card = Card::new().field("n".repeat(300), "v".repeat(2000), false);
        let fitted = fit_card(&card);
        assert_eq!(fitted.fields[0].name.chars().count(), FIELD_NAME_CHAR_LIMIT);
        assert_eq!(fitted.fields[0].value.chars().count(), FIELD_VALUE_CHAR_LIMIT);
    }

    #[test]
    fn full_card_fits_the_total_limit() {
        let mut card = Card::new()
            .title("t".repeat(400))
            .author("a".repeat(400))
            .description("d".repeat(5000))
            .footer("f".repeat(3000));
        for i in 0..25 {
            card = card.field(format!("{i}").repeat(300), "v".repeat(2000), true);
        }

        let fitted = fit_card(&card);
        assert!(total_chars(&fitted) <= EMBED_TOTAL_CHAR_LIMIT);
        // 4608 chars outside fields leaves room for one full field only.
        assert_eq!(fitted.fields.len(), 1);
        assert_eq!(fitted.fields[0].name, truncate(&"0".repeat(300), FIELD_NAME_CHAR_LIMIT));
        assert_eq!(
            fitted.description.unwrap().chars().count(),
            DESCRIPTION_CHAR_LIMIT
        );
    }

    #[test]
    fn small_card_is_unchanged() {
        let card = Card::new()
            .title("Problem 1500A")
            .url("https://codeforces.com/problemset/problem/1500/A")
            .field("Rating", "2400", true);
        assert_eq!(fit_card(&card), card);
    }
}
