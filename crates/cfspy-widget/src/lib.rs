//! Interactive reaction widgets.
//!
//! A widget is one bot message that users drive by clicking reactions:
//! page back and forth, expand or collapse the current page, or delete it.
//! The engine is platform-neutral; a [`Messager`] implementation does the
//! actual talking, and a [`ReactionHub`] routes gateway events to widgets.

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod glyph;
pub mod messager;
pub mod page;
pub mod types;

pub use config::{WidgetConfig, DEFAULT_LIFETIME};
pub use controller::{send_paginated, send_with_delete_button, Widget};
pub use dispatch::{ReactionHub, ReactionSubscription, SubscriptionHandle};
pub use error::{ConfigError, DispatchError, TransportError, WidgetError};
pub use glyph::Glyph;
pub use messager::{retry_on_rate_limit, Messager};
pub use page::{lookup_from_vec, Card, CardField, Page, PageLookup, RenderedMessage};
pub use types::{ChannelId, GatewayEvent, MessageId, Reaction, ReactionEmoji, SentMessage, UserId};
