//! The widget's control alphabet.
//!
//! Five fixed Unicode reactions, each with exactly one meaning:
//! 🗑 delete · ◀ previous · ▶ next · 🔽 expand · 🔼 collapse
//!
//! Anything else a user reacts with is not a control and is ignored.

use std::fmt;

use crate::types::ReactionEmoji;

const DELETE: &str = "\u{1f5d1}"; // 🗑
const PREVIOUS: &str = "\u{25c0}"; // ◀
const NEXT: &str = "\u{25b6}"; // ▶
const EXPAND: &str = "\u{1f53d}"; // 🔽
const COLLAPSE: &str = "\u{1f53c}"; // 🔼

/// A widget control reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Glyph {
    Delete,
    Previous,
    Next,
    Expand,
    Collapse,
}

impl Glyph {
    pub const ALL: [Glyph; 5] = [
        Glyph::Delete,
        Glyph::Previous,
        Glyph::Next,
        Glyph::Expand,
        Glyph::Collapse,
    ];

    /// The Unicode symbol sent to and received from the platform.
    pub fn symbol(self) -> &'static str {
        match self {
            Glyph::Delete => DELETE,
            Glyph::Previous => PREVIOUS,
            Glyph::Next => NEXT,
            Glyph::Expand => EXPAND,
            Glyph::Collapse => COLLAPSE,
        }
    }

    /// Parse a raw emoji string. Discord sometimes appends the emoji
    /// presentation selector (U+FE0F) to ◀ and ▶, so it is stripped first.
    pub fn from_symbol(symbol: &str) -> Option<Glyph> {
        match symbol.trim_end_matches('\u{fe0f}') {
            DELETE => Some(Glyph::Delete),
            PREVIOUS => Some(Glyph::Previous),
            NEXT => Some(Glyph::Next),
            EXPAND => Some(Glyph::Expand),
            COLLAPSE => Some(Glyph::Collapse),
            _ => None,
        }
    }

    pub fn from_emoji(emoji: &ReactionEmoji) -> Option<Glyph> {
        match emoji {
            ReactionEmoji::Unicode(s) => Glyph::from_symbol(s),
            ReactionEmoji::Custom { .. } => None,
        }
    }
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_glyph_round_trips_through_its_symbol() {
        for glyph in Glyph::ALL {
            assert_eq!(Glyph::from_symbol(glyph.symbol()), Some(glyph));
        }
    }

    #[test]
    fn symbols_are_distinct() {
        let mut symbols: Vec<_> = Glyph::ALL.iter().map(|g| g.symbol()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), Glyph::ALL.len());
    }

    #[test]
    fn variation_selector_is_ignored() {
        assert_eq!(Glyph::from_symbol("\u{25b6}\u{fe0f}"), Some(Glyph::Next));
        assert_eq!(Glyph::from_symbol("\u{25c0}\u{fe0f}"), Some(Glyph::Previous));
    }

    #[test]
    fn unknown_emoji_is_not_a_glyph() {
        assert_eq!(Glyph::from_symbol("\u{1f44d}"), None); // 👍
        assert_eq!(Glyph::from_symbol(""), None);
    }

    #[test]
    fn custom_emoji_is_never_a_glyph() {
        let emoji = ReactionEmoji::Custom {
            id: 42,
            name: Some("\u{25b6}".to_string()),
        };
        assert_eq!(Glyph::from_emoji(&emoji), None);
    }
}
