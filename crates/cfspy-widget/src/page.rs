//! Page model: what a widget shows on each page.
//!
//! Pages are immutable once built. The platform layer converts a [`Card`] into
//! its native rich-embed type when sending or editing.

use std::sync::Arc;

/// One field of a [`Card`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// A platform-neutral structured card (a Discord embed).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Card {
    pub title: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub colour: Option<u32>,
    pub fields: Vec<CardField>,
    pub footer: Option<String>,
}

impl Card {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn colour(mut self, colour: u32) -> Self {
        self.colour = Some(colour);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(CardField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Text plus at most one card; an edit replaces both at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedMessage {
    pub text: String,
    pub card: Option<Card>,
}

impl RenderedMessage {
    pub fn new(text: impl Into<String>, card: Option<Card>) -> Self {
        Self {
            text: text.into(),
            card,
        }
    }
}

/// A single widget page with an optional expanded rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub default: RenderedMessage,
    pub expanded: Option<RenderedMessage>,
}

impl Page {
    /// A page with no expanded rendering.
    pub fn new(text: impl Into<String>, card: Option<Card>) -> Self {
        Self {
            default: RenderedMessage::new(text, card),
            expanded: None,
        }
    }

    /// A page that can be toggled between a default and an expanded rendering.
    pub fn with_expansion(
        text: impl Into<String>,
        card: Option<Card>,
        expanded_text: impl Into<String>,
        expanded_card: Option<Card>,
    ) -> Self {
        Self {
            default: RenderedMessage::new(text, card),
            expanded: Some(RenderedMessage::new(expanded_text, expanded_card)),
        }
    }

    pub fn has_expansion(&self) -> bool {
        self.expanded.is_some()
    }
}

/// Returns the page for a 1-based page number.
pub type PageLookup = Arc<dyn Fn(usize) -> Page + Send + Sync>;

/// Build a [`PageLookup`] over a fixed list of pages (page `n` is `pages[n - 1]`).
///
/// Only called with numbers in `1..=pages.len()`; the widget validates bounds
/// before looking a page up.
pub fn lookup_from_vec(pages: Vec<Page>) -> PageLookup {
    let pages = Arc::new(pages);
    Arc::new(move |n: usize| pages[n - 1].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn card_builder_collects_fields_in_order() {
        let card = Card::new()
            .title("Problem 1500A")
            .colour(0x3498db)
            .field("Rating", "1500", true)
            .field("Tags", "greedy", false);
        assert_eq!(card.title.as_deref(), Some("Problem 1500A"));
        assert_eq!(card.colour, Some(0x3498db));
        assert_eq!(card.fields.len(), 2);
        assert_eq!(card.fields[1].name, "Tags");
        assert!(!card.fields[1].inline);
    }

    #[test]
    fn plain_page_has_no_expansion() {
        let page = Page::new("hello", None);
        assert!(!page.has_expansion());
        assert_eq!(page.default.text, "hello");
    }

    #[test]
    fn expanded_page_keeps_both_renderings() {
        let page = Page::with_expansion(
            "short",
            Some(Card::new().title("a")),
            "long",
            Some(Card::new().title("b")),
        );
        assert!(page.has_expansion());
        assert_eq!(page.default.text, "short");
        assert_eq!(page.expanded.unwrap().card.unwrap().title.as_deref(), Some("b"));
    }

    #[test]
    fn vec_lookup_is_one_based() {
        let lookup = lookup_from_vec(vec![Page::new("one", None), Page::new("two", None)]);
        assert_eq!(lookup(1).default.text, "one");
        assert_eq!(lookup(2).default.text, "two");
    }
}
