//! Conversions between serenity's model and the widget engine's types.

use std::time::Duration;

use serenity::http::HttpError;
use serenity::model::channel::{Reaction as SerenityReaction, ReactionType};
use serenity::model::id as sid;

use cfspy_widget::{ChannelId, Glyph, MessageId, Reaction, ReactionEmoji, TransportError, UserId};

const TOO_MANY_REQUESTS: u16 = 429;

pub fn channel_id(id: ChannelId) -> sid::ChannelId {
    sid::ChannelId::new(id.get())
}

pub fn message_id(id: MessageId) -> sid::MessageId {
    sid::MessageId::new(id.get())
}

pub fn user_id(id: UserId) -> sid::UserId {
    sid::UserId::new(id.get())
}

pub fn glyph_reaction(glyph: Glyph) -> ReactionType {
    ReactionType::Unicode(glyph.symbol().to_string())
}

pub fn emoji(reaction_type: &ReactionType) -> ReactionEmoji {
    match reaction_type {
        ReactionType::Unicode(s) => ReactionEmoji::Unicode(s.clone()),
        ReactionType::Custom { id, name, .. } => ReactionEmoji::Custom {
            id: id.get(),
            name: name.clone(),
        },
        _ => ReactionEmoji::Custom { id: 0, name: None },
    }
}

/// `None` when the gateway left out the reacting user.
pub fn reaction(r: &SerenityReaction) -> Option<Reaction> {
    let user = r.user_id?;
    Some(Reaction {
        channel_id: ChannelId(r.channel_id.get()),
        message_id: MessageId(r.message_id.get()),
        user_id: UserId(user.get()),
        emoji: emoji(&r.emoji),
    })
}

/// Classify a serenity failure for the widget engine.
pub fn transport_error(e: serenity::Error) -> TransportError {
    match e {
        serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)) => {
            from_status(resp.status_code.as_u16(), resp.error.message)
        }
        other => TransportError::Gateway(other.to_string()),
    }
}

fn from_status(status: u16, message: String) -> TransportError {
    if status == TOO_MANY_REQUESTS {
        // serenity's own ratelimiter consumed the Retry-After header.
        TransportError::RateLimited {
            retry_after: Duration::ZERO,
        }
    } else {
        TransportError::Http { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_emoji_maps_to_glyph() {
        let e = emoji(&glyph_reaction(Glyph::Next));
        assert_eq!(Glyph::from_emoji(&e), Some(Glyph::Next));
    }

    #[test]
    fn custom_emoji_is_never_a_glyph() {
        let rt = ReactionType::Custom {
            animated: false,
            id: sid::EmojiId::new(77),
            name: Some("next".to_string()),
        };
        let e = emoji(&rt);
        assert_eq!(
            e,
            ReactionEmoji::Custom {
                id: 77,
                name: Some("next".to_string())
            }
        );
        assert_eq!(Glyph::from_emoji(&e), None);
    }

    #[test]
    fn ids_round_trip() {
        assert_eq!(channel_id(ChannelId(42)).get(), 42);
        assert_eq!(message_id(MessageId(43)).get(), 43);
        assert_eq!(user_id(UserId(44)).get(), 44);
    }

    #[test]
    fn status_429_is_rate_limited() {
        assert!(from_status(429, "You are being rate limited.".into()).is_rate_limited());
        assert_eq!(
            from_status(403, "Missing Permissions".into()),
            TransportError::Http {
                status: 403,
                message: "Missing Permissions".into()
            }
        );
    }

    #[test]
    fn non_http_errors_are_gateway_errors() {
        let e = transport_error(serenity::Error::Other("shard gone"));
        assert!(matches!(e, TransportError::Gateway(m) if m.contains("shard gone")));
    }
}
