use std::sync::{Arc, OnceLock};

use serenity::all::ActivityData;
use serenity::async_trait;
use serenity::model::channel::{Message, Reaction as SerenityReaction};
use serenity::model::event::ResumedEvent;
use serenity::model::gateway::Ready;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use serenity::model::user::OnlineStatus;
use serenity::prelude::{Context, EventHandler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use cfspy_core::CfspyConfig;
use cfspy_widget::{self as widget, GatewayEvent, ReactionHub};

use crate::commands;
use crate::convert;
use crate::messager::SerenityMessager;
use crate::respond::Responder;

/// Serenity event handler: feeds reactions to the widget hub and runs commands.
pub struct CfspyHandler {
    pub config: Arc<CfspyConfig>,
    pub hub: Arc<ReactionHub>,
    pub shutdown: CancellationToken,
    pub web: reqwest::Client,
    pub bot_id: OnceLock<UserId>,
}

impl CfspyHandler {
    fn status_text(&self) -> String {
        format!(
            "for Codeforces links | {}help for info",
            self.config.discord.prefix
        )
    }

    /// The gateway forgets presence on reconnect, so this runs on ready and on resume.
    fn set_status(&self, ctx: &Context) {
        let activity = ActivityData::watching(self.status_text());
        ctx.set_presence(Some(activity), OnlineStatus::Online);
    }

    /// Reactions the bot makes itself are its own glyphs, never input.
    fn is_own(&self, user_id: Option<UserId>) -> bool {
        user_id.is_some_and(|id| self.bot_id.get() == Some(&id))
    }

    fn publish_reaction(&self, reaction: &SerenityReaction, added: bool) {
        if self.is_own(reaction.user_id) {
            return;
        }
        let Some(reaction) = convert::reaction(reaction) else {
            debug!("reaction without user id ignored");
            return;
        };
        let event = if added {
            GatewayEvent::ReactionAdd(reaction)
        } else {
            GatewayEvent::ReactionRemove(reaction)
        };
        self.hub.publish(&event);
    }
}

#[async_trait]
impl EventHandler for CfspyHandler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.bot_id.set(ready.user.id).ok();
        self.set_status(&ctx);
        info!(name = %ready.user.name, "Discord bot connected");
    }

    async fn resume(&self, ctx: Context, _: ResumedEvent) {
        self.set_status(&ctx);
        debug!("Discord session resumed");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(invocation) = commands::parse(&self.config.discord.prefix, &msg.content) else {
            return;
        };

        let messager = SerenityMessager::new(Arc::clone(&ctx.http), Arc::clone(&self.hub));
        let responder = Responder::new(messager, &msg, &self.config, self.shutdown.clone());
        let config = self.config.discord.clone();
        tokio::spawn(commands::dispatch(
            responder,
            config,
            self.web.clone(),
            invocation,
        ));
    }

    async fn reaction_add(&self, _ctx: Context, add_reaction: SerenityReaction) {
        self.publish_reaction(&add_reaction, true);
    }

    async fn reaction_remove(&self, _ctx: Context, removed_reaction: SerenityReaction) {
        self.publish_reaction(&removed_reaction, false);
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        channel_id: ChannelId,
        deleted_message_id: MessageId,
        _guild_id: Option<GuildId>,
    ) {
        self.hub.publish(&GatewayEvent::MessageDelete {
            channel_id: widget::ChannelId(channel_id.get()),
            message_id: widget::MessageId(deleted_message_id.get()),
        });
    }
}
