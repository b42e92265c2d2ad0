//! The widget controller: one interactive message and its whole lifecycle.
//!
//! ```text
//! validate ─► send first page ─► attach glyphs ─► subscribe
//!                                                    │
//!      ┌──────────── reaction task per event ◄───────┤
//!      │  (lock state, edit, fix glyphs)             │
//!      ▼                                             ▼
//!   delete ─► Ok      lifetime ─► strip glyphs ─► Ok      owner cancel ─► Err(Cancelled)
//! ```
//!
//! All widget state sits behind one async mutex. A transition holds it for the
//! whole network edit, so transitions on one widget are serialised, while
//! removing the reacting user's own reaction runs alongside without the lock.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{DeletedCallback, PermissionCheck, WidgetConfig};
use crate::error::{ConfigError, Result, WidgetError};
use crate::glyph::Glyph;
use crate::messager::Messager;
use crate::page::{Page, PageLookup};
use crate::types::{ChannelId, Reaction, SentMessage, UserId};

/// How long a closing widget waits for in-flight transitions. Long enough for
/// one rate-limited retry of a glyph call.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(15);

/// A paginated, reaction-controlled message waiting to be sent.
pub struct Widget {
    config: WidgetConfig,
}

impl Widget {
    pub fn new(config: WidgetConfig) -> Self {
        Self { config }
    }

    /// Send the widget to `channel_id` and drive it until it is deleted,
    /// expires, or `cancel` fires.
    ///
    /// Returns `Ok(())` after a permitted delete or when the lifetime runs out
    /// (the bot's glyphs are stripped first). Returns
    /// [`WidgetError::Cancelled`] if the owner cancels; glyphs are left as they
    /// are. Configuration errors are returned before anything is sent.
    pub async fn run(
        self,
        messager: Arc<dyn Messager>,
        channel_id: ChannelId,
        cancel: CancellationToken,
    ) -> Result<()> {
        let config = self.config;
        config.validate()?;
        let lookup = config
            .page_lookup
            .clone()
            .ok_or(ConfigError::MissingPageLookup)?;
        let deadline = Instant::now() + config.lifetime;

        let first_page = lookup(config.first_page);
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WidgetError::Cancelled),
            sent = messager.send(channel_id, &first_page.default) => sent.map_err(WidgetError::Send)?,
        };
        debug!(message_id = %message.id, %channel_id, page = config.first_page, "widget sent");
        (config.on_message_sent)(&message);

        let controller = Arc::new(Controller {
            messager,
            message,
            lookup,
            page_count: config.page_count,
            permission_check: config.permission_check,
            on_deleted: config.on_deleted,
            state: Mutex::new(WidgetState {
                page_number: config.first_page,
                page: first_page,
                expanded: false,
                glyphs: BTreeSet::new(),
                last_applied: None,
                active: true,
            }),
            generation: AtomicU64::new(0),
            deleted: CancellationToken::new(),
            closed: CancellationToken::new(),
        });
        controller.attach_initial_glyphs().await;

        let mut subscription = match controller
            .messager
            .subscribe_to_reactions_on(controller.message.id)
        {
            Ok(sub) => sub,
            Err(e) => {
                controller.strip_glyphs().await;
                return Err(e.into());
            }
        };

        let mut tasks = JoinSet::new();
        let lifetime = tokio::time::sleep_until(deadline);
        tokio::pin!(lifetime);
        let mut stream_open = true;

        let outcome = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Outcome::Cancelled,
                _ = controller.deleted.cancelled() => break Outcome::Deleted,
                _ = &mut lifetime => break Outcome::Expired,
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        warn!(message_id = %controller.message.id, error = %e, "widget task failed");
                    }
                }
                reaction = subscription.recv(), if stream_open => match reaction {
                    Some(reaction) => controller.dispatch(reaction, &mut tasks),
                    None => {
                        debug!(message_id = %controller.message.id, "reaction stream closed");
                        stream_open = false;
                    }
                },
            }
        };

        subscription.unsubscribe();
        controller.closed.cancel();
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!(message_id = %controller.message.id, "widget tasks still running, aborting");
            tasks.shutdown().await;
        }

        match outcome {
            Outcome::Expired => {
                controller.strip_glyphs().await;
                info!(message_id = %controller.message.id, "widget expired");
                Ok(())
            }
            Outcome::Deleted => {
                info!(message_id = %controller.message.id, "widget deleted");
                Ok(())
            }
            Outcome::Cancelled => {
                debug!(message_id = %controller.message.id, "widget cancelled by owner");
                Err(WidgetError::Cancelled)
            }
        }
    }
}

/// Send a multi-page widget and drive it to completion.
pub async fn send_paginated(
    config: WidgetConfig,
    messager: Arc<dyn Messager>,
    channel_id: ChannelId,
    cancel: CancellationToken,
) -> Result<()> {
    Widget::new(config).run(messager, channel_id, cancel).await
}

/// Send one page with only a delete button and drive it to completion.
///
/// `configure` can set the lifetime, callbacks and permission check.
pub async fn send_with_delete_button(
    page: Page,
    configure: impl FnOnce(WidgetConfig) -> WidgetConfig,
    messager: Arc<dyn Messager>,
    channel_id: ChannelId,
    cancel: CancellationToken,
) -> Result<()> {
    let config = configure(WidgetConfig::single_page(page));
    Widget::new(config).run(messager, channel_id, cancel).await
}

enum Outcome {
    Expired,
    Deleted,
    Cancelled,
}

/// Mutable widget state. Only touched with `Controller::state` locked.
struct WidgetState {
    page_number: usize,
    page: Page,
    expanded: bool,
    /// Glyphs the bot currently has on the message.
    glyphs: BTreeSet<Glyph>,
    /// Glyph of the last transition that changed the view.
    last_applied: Option<Glyph>,
    /// Cleared by a delete so queued transitions become no-ops.
    active: bool,
}

struct Controller {
    messager: Arc<dyn Messager>,
    message: SentMessage,
    lookup: PageLookup,
    page_count: usize,
    permission_check: PermissionCheck,
    on_deleted: DeletedCallback,
    state: Mutex<WidgetState>,
    /// Bumped after every applied transition; see `apply`.
    generation: AtomicU64,
    /// Fired by a permitted delete to end the run loop.
    deleted: CancellationToken,
    /// Fired when the run loop exits. Work not yet holding the state lock is
    /// abandoned; a transition that holds it runs to the end.
    closed: CancellationToken,
}

impl Controller {
    /// Filter one reaction and spawn the tasks it calls for.
    fn dispatch(self: &Arc<Self>, reaction: Reaction, tasks: &mut JoinSet<()>) {
        let Some(glyph) = Glyph::from_emoji(&reaction.emoji) else {
            return;
        };
        let permitted = (self.permission_check)(&reaction);
        let generation = self.generation.load(Ordering::Acquire);
        debug!(
            message_id = %self.message.id,
            user_id = %reaction.user_id,
            %glyph,
            permitted,
            "control reaction"
        );

        // A permitted delete removes the whole message, reactions included.
        if !(permitted && glyph == Glyph::Delete) {
            let this = Arc::clone(self);
            let user_id = reaction.user_id;
            self.spawn_guarded(tasks, async move {
                this.remove_user_reaction(glyph, user_id).await;
            });
        }

        if !permitted {
            return;
        }
        let this = Arc::clone(self);
        tasks.spawn(async move {
            this.apply(glyph, reaction, generation).await;
        });
    }

    /// Spawn `work` so that it is abandoned at its next await point once the
    /// widget closes. Only for work that does not touch the state.
    fn spawn_guarded<F>(&self, tasks: &mut JoinSet<()>, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let closed = self.closed.clone();
        tasks.spawn(async move {
            tokio::select! {
                _ = closed.cancelled() => {}
                _ = work => {}
            }
        });
    }

    /// Apply a permitted control reaction.
    ///
    /// Transitions run in the order they take the lock. `observed` is the
    /// generation when the reaction was dispatched: if the view has changed
    /// since and the change was made by this same glyph, the reaction repeats
    /// a request that is already shown and is dropped. Any other glyph is a
    /// new request and is applied to the current view.
    async fn apply(&self, glyph: Glyph, reaction: Reaction, observed: u64) {
        let mut state = tokio::select! {
            _ = self.closed.cancelled() => return,
            state = self.state.lock() => state,
        };
        if !state.active {
            return;
        }
        if glyph != Glyph::Delete
            && self.generation.load(Ordering::Acquire) != observed
            && state.last_applied == Some(glyph)
        {
            debug!(message_id = %self.message.id, %glyph, "dropping repeated reaction");
            return;
        }
        match glyph {
            Glyph::Delete => self.delete(&mut state, &reaction).await,
            Glyph::Previous => self.show_page(&mut state, -1).await,
            Glyph::Next => self.show_page(&mut state, 1).await,
            Glyph::Expand => self.expand(&mut state).await,
            Glyph::Collapse => self.collapse(&mut state).await,
        }
    }

    async fn delete(&self, state: &mut WidgetState, reaction: &Reaction) {
        state.active = false;
        if let Err(e) = self.messager.delete(&self.message).await {
            warn!(message_id = %self.message.id, error = %e, "widget delete failed");
        }
        (self.on_deleted)(reaction);
        self.deleted.cancel();
    }

    async fn show_page(&self, state: &mut WidgetState, delta: isize) {
        let Some(target) = state
            .page_number
            .checked_add_signed(delta)
            .filter(|n| (1..=self.page_count).contains(n))
        else {
            debug!(message_id = %self.message.id, page = state.page_number, delta, "page out of range");
            return;
        };

        let page = (self.lookup)(target);
        if let Err(e) = self.messager.edit(&self.message, &page.default).await {
            warn!(message_id = %self.message.id, page = target, error = %e, "page edit failed");
            return;
        }
        state.page_number = target;
        state.page = page;
        state.expanded = false;
        let glyph = if delta > 0 { Glyph::Next } else { Glyph::Previous };
        self.bump_generation(state, glyph);
        debug!(message_id = %self.message.id, page = target, "page shown");

        self.fix_expand_glyphs(state).await;
    }

    async fn expand(&self, state: &mut WidgetState) {
        if state.expanded {
            return;
        }
        let Some(expanded) = state.page.expanded.as_ref() else {
            return;
        };
        if let Err(e) = self.messager.edit(&self.message, expanded).await {
            warn!(message_id = %self.message.id, error = %e, "expand edit failed");
            return;
        }
        state.expanded = true;
        self.bump_generation(state, Glyph::Expand);
        self.fix_expand_glyphs(state).await;
    }

    async fn collapse(&self, state: &mut WidgetState) {
        if !state.expanded {
            return;
        }
        if let Err(e) = self.messager.edit(&self.message, &state.page.default).await {
            warn!(message_id = %self.message.id, error = %e, "collapse edit failed");
            return;
        }
        state.expanded = false;
        self.bump_generation(state, Glyph::Collapse);
        self.fix_expand_glyphs(state).await;
    }

    fn bump_generation(&self, state: &mut WidgetState, glyph: Glyph) {
        state.last_applied = Some(glyph);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    async fn attach_initial_glyphs(&self) {
        let mut state = self.state.lock().await;
        self.react(&mut state, Glyph::Delete).await;
        if self.page_count > 1 {
            self.react(&mut state, Glyph::Previous).await;
            self.react(&mut state, Glyph::Next).await;
        }
        self.fix_expand_glyphs(&mut state).await;
    }

    /// Make the Expand/Collapse glyph match the current page.
    /// Unwanted glyphs are removed before the wanted one is added.
    async fn fix_expand_glyphs(&self, state: &mut WidgetState) {
        let wanted = match (state.page.has_expansion(), state.expanded) {
            (false, _) => None,
            (true, false) => Some(Glyph::Expand),
            (true, true) => Some(Glyph::Collapse),
        };
        for glyph in [Glyph::Expand, Glyph::Collapse] {
            if state.glyphs.contains(&glyph) && wanted != Some(glyph) {
                self.unreact(state, glyph).await;
            }
        }
        if let Some(glyph) = wanted {
            if !state.glyphs.contains(&glyph) {
                self.react(state, glyph).await;
            }
        }
    }

    async fn react(&self, state: &mut WidgetState, glyph: Glyph) {
        match self.messager.react(&self.message, glyph).await {
            Ok(()) => {
                state.glyphs.insert(glyph);
            }
            Err(e) => warn!(message_id = %self.message.id, %glyph, error = %e, "react failed"),
        }
    }

    async fn unreact(&self, state: &mut WidgetState, glyph: Glyph) {
        match self.messager.unreact(&self.message, glyph).await {
            Ok(()) => {
                state.glyphs.remove(&glyph);
            }
            Err(e) => warn!(message_id = %self.message.id, %glyph, error = %e, "unreact failed"),
        }
    }

    async fn remove_user_reaction(&self, glyph: Glyph, user_id: UserId) {
        if let Err(e) = self
            .messager
            .unreact_user(&self.message, glyph, user_id)
            .await
        {
            warn!(message_id = %self.message.id, %glyph, %user_id, error = %e, "unreact user failed");
        }
    }

    /// Best-effort removal of every glyph the bot still has on the message.
    /// Fails without the manage-messages permission in some channels; ignored.
    async fn strip_glyphs(&self) {
        let mut state = self.state.lock().await;
        let glyphs = std::mem::take(&mut state.glyphs);
        for glyph in glyphs {
            if let Err(e) = self.messager.unreact(&self.message, glyph).await {
                debug!(message_id = %self.message.id, %glyph, error = %e, "glyph cleanup failed");
            }
        }
    }
}
