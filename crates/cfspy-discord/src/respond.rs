//! Replies to a triggering user message: previews, plain text and errors.

use std::sync::Arc;
use std::time::Duration;

use serenity::builder::{CreateMessage, EditMessage};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id as sid;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cfspy_core::CfspyConfig;
use cfspy_widget::{
    send_with_delete_button, Card, ChannelId, Messager, Page, Reaction, UserId, WidgetConfig,
    WidgetError,
};

use crate::embed::{fit_content, to_create_embed};
use crate::error::DiscordError;
use crate::messager::SerenityMessager;

pub const ALERT_AMBER: u32 = 0xFFBF00;

/// Everything needed to answer one user message.
#[derive(Clone)]
pub struct Responder {
    messager: SerenityMessager,
    channel_id: sid::ChannelId,
    message_id: sid::MessageId,
    author_id: sid::UserId,
    lifetime: Duration,
    error_ttl: Duration,
    support_url: Option<String>,
    shutdown: CancellationToken,
}

impl Responder {
    pub fn new(
        messager: SerenityMessager,
        trigger: &Message,
        config: &CfspyConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            messager,
            channel_id: trigger.channel_id,
            message_id: trigger.id,
            author_id: trigger.author.id,
            lifetime: config.widget.lifetime(),
            error_ttl: config.widget.error_message_ttl(),
            support_url: config.discord.support_url.clone(),
            shutdown,
        }
    }

    fn http(&self) -> &Arc<Http> {
        self.messager.http()
    }

    /// Preview wiring shared by every widget answering this message.
    ///
    /// Embeds on the user's message are hidden while the preview is shown and
    /// restored if it is deleted. Only the author may operate the preview.
    pub fn preview_config(&self, config: WidgetConfig) -> WidgetConfig {
        let author = UserId(self.author_id.get());
        let (on_sent, on_deleted) = (self.clone(), self.clone());
        config
            .lifetime(self.lifetime)
            .on_message_sent(move |_| on_sent.set_embeds_suppressed(true))
            .on_deleted(move |_| on_deleted.set_embeds_suppressed(false))
            .permission_check(move |r: &Reaction| r.user_id == author)
    }

    pub async fn respond_with_one_page_preview(&self, page: Page) -> Result<(), WidgetError> {
        send_with_delete_button(
            page,
            |config| self.preview_config(config),
            self.widget_messager(),
            ChannelId(self.channel_id.get()),
            self.shutdown.child_token(),
        )
        .await
    }

    pub async fn send_text(&self, text: &str) -> Result<Message, DiscordError> {
        let msg = self
            .channel_id
            .say(self.http(), fit_content(text))
            .await?;
        Ok(msg)
    }

    pub async fn send_card(&self, card: &Card) -> Result<Message, DiscordError> {
        let msg = self
            .channel_id
            .send_message(self.http(), CreateMessage::new().embed(to_create_embed(card)))
            .await?;
        Ok(msg)
    }

    pub async fn edit_text(&self, msg: &Message, text: &str) -> Result<(), DiscordError> {
        self.channel_id
            .edit_message(self.http(), msg.id, EditMessage::new().content(fit_content(text)))
            .await?;
        Ok(())
    }

    /// Send `card` and delete it after `ttl`. A failed delete is ignored.
    pub async fn send_timed(&self, card: &Card, ttl: Duration) -> Result<(), DiscordError> {
        let msg = self.send_card(card).await?;
        let http = Arc::clone(self.http());
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(ttl) => {
                    if let Err(e) = msg.delete(&http).await {
                        debug!(message_id = %msg.id, error = %e, "timed message delete failed");
                    }
                }
            }
        });
        Ok(())
    }

    /// Short-lived error reply, gone after the configured error TTL.
    pub async fn respond_with_error(&self, message: &str) -> Result<(), DiscordError> {
        self.send_timed(&error_card(message), self.error_ttl).await
    }

    pub async fn respond_with_internal_error(&self) -> Result<(), DiscordError> {
        let card = internal_error_card(self.support_url.as_deref());
        self.send_timed(&card, self.error_ttl).await
    }

    fn widget_messager(&self) -> Arc<dyn Messager> {
        Arc::new(self.messager.clone())
    }

    /// Fails without the manage-messages permission, which is fine.
    fn set_embeds_suppressed(&self, suppress: bool) {
        let http = Arc::clone(self.http());
        let (channel_id, message_id) = (self.channel_id, self.message_id);
        tokio::spawn(async move {
            let edit = EditMessage::new().suppress_embeds(suppress);
            if let Err(e) = channel_id.edit_message(&http, message_id, edit).await {
                debug!(%message_id, suppress, error = %e, "embed suppression failed");
            }
        });
    }
}

pub fn error_card(message: &str) -> Card {
    Card::new()
        .author("Error")
        .description(message)
        .colour(ALERT_AMBER)
}

pub fn internal_error_card(support_url: Option<&str>) -> Card {
    let card = Card::new().author("Internal error :(").colour(ALERT_AMBER);
    match support_url {
        Some(url) => card.description(format!(
            "If this issue is reproducible, please report it [here]({url})"
        )),
        None => card,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfspy_widget::{MessageId, ReactionEmoji, ReactionHub};

    fn responder(author: u64) -> Responder {
        let messager = SerenityMessager::new(Arc::new(Http::new("")), Arc::new(ReactionHub::new()));
        Responder {
            messager,
            channel_id: sid::ChannelId::new(1),
            message_id: sid::MessageId::new(2),
            author_id: sid::UserId::new(author),
            lifetime: Duration::from_secs(60),
            error_ttl: Duration::from_secs(30),
            support_url: None,
            shutdown: CancellationToken::new(),
        }
    }

    fn click_by(user: u64) -> Reaction {
        Reaction {
            channel_id: ChannelId(1),
            message_id: MessageId(3),
            user_id: UserId(user),
            emoji: ReactionEmoji::Unicode("\u{25b6}".into()),
        }
    }

    #[test]
    fn only_the_author_may_operate_a_preview() {
        let config = responder(7).preview_config(WidgetConfig::single_page(Page::new("x", None)));
        assert!(config.permits(&click_by(7)));
        assert!(!config.permits(&click_by(8)));
    }

    #[test]
    fn error_cards() {
        let card = error_card("Problem not found");
        assert_eq!(card.author.as_deref(), Some("Error"));
        assert_eq!(card.colour, Some(ALERT_AMBER));

        let plain = internal_error_card(None);
        assert!(plain.description.is_none());
        let linked = internal_error_card(Some("https://example.com/issues"));
        assert!(linked
            .description
            .unwrap()
            .contains("[here](https://example.com/issues)"));
    }
}
