use std::sync::Arc;

use async_trait::async_trait;
use serenity::builder::{CreateMessage, EditMessage};
use serenity::http::Http;

use cfspy_widget::{
    retry_on_rate_limit, ChannelId, DispatchError, Glyph, MessageId, Messager, ReactionHub,
    ReactionSubscription, RenderedMessage, SentMessage, TransportError, UserId,
};

use crate::convert::{self, transport_error};
use crate::embed::{fit_content, to_create_embed};

/// [`Messager`] over serenity's REST client.
///
/// `Arc<Http>` outlives gateway reconnects, and the hub is shared with the
/// event handler, so one messager keeps working for the life of the process.
#[derive(Clone)]
pub struct SerenityMessager {
    http: Arc<Http>,
    hub: Arc<ReactionHub>,
}

impl SerenityMessager {
    pub fn new(http: Arc<Http>, hub: Arc<ReactionHub>) -> Self {
        Self { http, hub }
    }

    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }
}

#[async_trait]
impl Messager for SerenityMessager {
    async fn send(
        &self,
        channel_id: ChannelId,
        content: &RenderedMessage,
    ) -> Result<SentMessage, TransportError> {
        let mut builder = CreateMessage::new().content(fit_content(&content.text));
        if let Some(card) = &content.card {
            builder = builder.embed(to_create_embed(card));
        }
        let msg = convert::channel_id(channel_id)
            .send_message(&self.http, builder)
            .await
            .map_err(transport_error)?;
        Ok(SentMessage {
            id: MessageId(msg.id.get()),
            channel_id,
        })
    }

    async fn edit(
        &self,
        message: &SentMessage,
        content: &RenderedMessage,
    ) -> Result<(), TransportError> {
        // An empty embed list clears the old card in the same request.
        let embeds = content.card.iter().map(to_create_embed).collect();
        let builder = EditMessage::new()
            .content(fit_content(&content.text))
            .embeds(embeds);
        convert::channel_id(message.channel_id)
            .edit_message(&self.http, convert::message_id(message.id), builder)
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn react(&self, message: &SentMessage, glyph: Glyph) -> Result<(), TransportError> {
        let http = &self.http;
        let reaction = &convert::glyph_reaction(glyph);
        let (channel, msg) = (
            convert::channel_id(message.channel_id),
            convert::message_id(message.id),
        );
        retry_on_rate_limit(move || async move {
            http.create_reaction(channel, msg, reaction)
                .await
                .map_err(transport_error)
        })
        .await
    }

    async fn unreact(&self, message: &SentMessage, glyph: Glyph) -> Result<(), TransportError> {
        let http = &self.http;
        let reaction = &convert::glyph_reaction(glyph);
        let (channel, msg) = (
            convert::channel_id(message.channel_id),
            convert::message_id(message.id),
        );
        retry_on_rate_limit(move || async move {
            http.delete_reaction_me(channel, msg, reaction)
                .await
                .map_err(transport_error)
        })
        .await
    }

    async fn unreact_user(
        &self,
        message: &SentMessage,
        glyph: Glyph,
        user_id: UserId,
    ) -> Result<(), TransportError> {
        self.http
            .delete_reaction(
                convert::channel_id(message.channel_id),
                convert::message_id(message.id),
                convert::user_id(user_id),
                &convert::glyph_reaction(glyph),
            )
            .await
            .map_err(transport_error)
    }

    async fn delete(&self, message: &SentMessage) -> Result<(), TransportError> {
        self.http
            .delete_message(
                convert::channel_id(message.channel_id),
                convert::message_id(message.id),
                None,
            )
            .await
            .map_err(transport_error)
    }

    fn subscribe_to_reactions_on(
        &self,
        message_id: MessageId,
    ) -> Result<ReactionSubscription, DispatchError> {
        self.hub.subscribe(message_id)
    }
}
