use std::fmt;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// Platform identifier of a channel (guild text channel, thread or DM).
    ChannelId
);
snowflake!(
    /// Platform identifier of a single message.
    MessageId
);
snowflake!(
    /// Platform identifier of a user.
    UserId
);

/// A message the bot has posted and may later edit, react on or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
}

/// The emoji carried by a reaction event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionEmoji {
    /// A standard Unicode emoji, e.g. `"▶"`.
    Unicode(String),
    /// A guild custom emoji. Never a widget control.
    Custom { id: u64, name: Option<String> },
}

/// A single reaction add/remove as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub user_id: UserId,
    pub emoji: ReactionEmoji,
}

/// Gateway events the engine knows how to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    ReactionAdd(Reaction),
    ReactionRemove(Reaction),
    MessageDelete {
        channel_id: ChannelId,
        message_id: MessageId,
    },
}
