use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::dispatch::ReactionSubscription;
use crate::error::{DispatchError, TransportError};
use crate::glyph::Glyph;
use crate::page::RenderedMessage;
use crate::types::{ChannelId, MessageId, SentMessage, UserId};

/// Backoff used when the platform rate-limits without saying for how long.
pub const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(1);
/// Upper bound on a single server-specified backoff.
pub const MAX_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(10);

/// Message operations the widget needs from the chat platform.
///
/// Implementations must be `Send + Sync`: one messager is shared by every
/// widget and called concurrently from their event-handler tasks.
#[async_trait]
pub trait Messager: Send + Sync {
    /// Post a new message to `channel_id`.
    async fn send(
        &self,
        channel_id: ChannelId,
        content: &RenderedMessage,
    ) -> Result<SentMessage, TransportError>;

    /// Replace text and card of `message` in one call.
    async fn edit(
        &self,
        message: &SentMessage,
        content: &RenderedMessage,
    ) -> Result<(), TransportError>;

    /// Add the bot's own `glyph` reaction.
    async fn react(&self, message: &SentMessage, glyph: Glyph) -> Result<(), TransportError>;

    /// Remove the bot's own `glyph` reaction.
    async fn unreact(&self, message: &SentMessage, glyph: Glyph) -> Result<(), TransportError>;

    /// Remove `user_id`'s `glyph` reaction.
    async fn unreact_user(
        &self,
        message: &SentMessage,
        glyph: Glyph,
        user_id: UserId,
    ) -> Result<(), TransportError>;

    async fn delete(&self, message: &SentMessage) -> Result<(), TransportError>;

    /// Reaction-add events on `message_id` only, until unsubscribed.
    fn subscribe_to_reactions_on(
        &self,
        message_id: MessageId,
    ) -> Result<ReactionSubscription, DispatchError>;
}

/// Run `op`, and if it is rejected by a rate limit, wait the server-specified
/// backoff and run it exactly once more.
///
/// React and unreact share one rate-limit bucket on Discord, but the HTTP
/// client only learns that from the headers of the first response, so the
/// very first call in a burst can be rejected instead of queued.
pub async fn retry_on_rate_limit<T, F, Fut>(mut op: F) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    match op().await {
        Err(TransportError::RateLimited { retry_after }) => {
            let backoff = backoff_for(retry_after);
            warn!(
                retry_after_ms = backoff.as_millis() as u64,
                "rate limited, retrying once"
            );
            tokio::time::sleep(backoff).await;
            op().await
        }
        other => other,
    }
}

fn backoff_for(retry_after: Duration) -> Duration {
    if retry_after.is_zero() {
        DEFAULT_RATE_LIMIT_BACKOFF
    } else {
        retry_after.min(MAX_RATE_LIMIT_BACKOFF)
    }
}
