//! Reaction dispatch: routes reaction-add events to the widget that owns the message.
//!
//! The platform layer publishes every gateway event it receives into a shared
//! [`ReactionHub`]. Each widget holds one [`ReactionSubscription`] for its
//! message id and reads events off a bounded channel. Unsubscribing flips a
//! shared liveness flag, so nothing published afterwards reaches the widget.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::types::{GatewayEvent, MessageId, Reaction};

/// Per-subscription event buffer. A widget that falls this far behind drops events.
pub const SUBSCRIPTION_BUFFER: usize = 32;

type Routes = DashMap<MessageId, Route>;

struct Route {
    id: u64,
    sender: mpsc::Sender<Reaction>,
    alive: Arc<AtomicBool>,
}

impl Route {
    fn is_live(&self) -> bool {
        self.alive.load(Ordering::Acquire) && !self.sender.is_closed()
    }
}

/// Shared fan-in point between the gateway and all live widgets.
#[derive(Default)]
pub struct ReactionHub {
    routes: Arc<Routes>,
    next_id: AtomicU64,
}

impl ReactionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in reaction-add events on `message_id`.
    ///
    /// Fails if another live subscription already exists for the message.
    pub fn subscribe(&self, message_id: MessageId) -> Result<ReactionSubscription, DispatchError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let alive = Arc::new(AtomicBool::new(true));
        let route = Route {
            id,
            sender: tx,
            alive: Arc::clone(&alive),
        };

        match self.routes.entry(message_id) {
            Entry::Occupied(mut existing) => {
                if existing.get().is_live() {
                    return Err(DispatchError::AlreadySubscribed {
                        message_id: message_id.get(),
                    });
                }
                existing.insert(route);
            }
            Entry::Vacant(slot) => {
                slot.insert(route);
            }
        }
        debug!(%message_id, "reaction subscription opened");

        Ok(ReactionSubscription {
            rx,
            handle: SubscriptionHandle {
                id,
                message_id,
                alive,
                routes: Arc::downgrade(&self.routes),
            },
        })
    }

    /// Route one gateway event.
    ///
    /// Only reaction adds are delivered. A message delete closes the route for
    /// that message so its widget sees the end of the stream.
    pub fn publish(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::ReactionAdd(reaction) => self.deliver(reaction),
            GatewayEvent::ReactionRemove(_) => {}
            GatewayEvent::MessageDelete { message_id, .. } => {
                if self.routes.remove(message_id).is_some() {
                    debug!(%message_id, "message deleted, reaction route closed");
                }
            }
        }
    }

    /// Whether a live subscription exists for `message_id`.
    pub fn is_subscribed(&self, message_id: MessageId) -> bool {
        self.routes
            .get(&message_id)
            .is_some_and(|route| route.is_live())
    }

    fn deliver(&self, reaction: &Reaction) {
        let message_id = reaction.message_id;
        let closed = {
            let Some(route) = self.routes.get(&message_id) else {
                return;
            };
            if !route.alive.load(Ordering::Acquire) {
                return;
            }
            match route.sender.try_send(reaction.clone()) {
                Ok(()) => false,
                Err(TrySendError::Full(_)) => {
                    warn!(%message_id, "reaction buffer full, dropping event");
                    false
                }
                Err(TrySendError::Closed(_)) => true,
            }
        };
        // The map guard is released above; removing while holding it would deadlock.
        if closed {
            self.routes.remove_if(&message_id, |_, route| !route.is_live());
        }
    }
}

/// Cloneable handle that ends a subscription.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u64,
    message_id: MessageId,
    alive: Arc<AtomicBool>,
    routes: Weak<Routes>,
}

impl SubscriptionHandle {
    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Mark the subscription dead and detach it from the hub. Idempotent.
    pub fn unsubscribe(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(routes) = self.routes.upgrade() {
            let id = self.id;
            routes.remove_if(&self.message_id, |_, route| route.id == id);
        }
        debug!(message_id = %self.message_id, "reaction subscription closed");
    }
}

/// Receiving end of a reaction subscription. Dropping it unsubscribes.
pub struct ReactionSubscription {
    rx: mpsc::Receiver<Reaction>,
    handle: SubscriptionHandle,
}

impl ReactionSubscription {
    /// Next reaction-add on the subscribed message, or `None` once the
    /// subscription is dead or the route was closed.
    pub async fn recv(&mut self) -> Option<Reaction> {
        if !self.handle.is_alive() {
            return None;
        }
        let reaction = self.rx.recv().await?;
        // Anything still buffered when the subscription died is discarded.
        self.handle.is_alive().then_some(reaction)
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }

    pub fn unsubscribe(&self) {
        self.handle.unsubscribe();
    }
}

impl Drop for ReactionSubscription {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}
