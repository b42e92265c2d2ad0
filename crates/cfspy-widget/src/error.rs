use std::time::Duration;

use thiserror::Error;

/// Failure of a single call against the chat platform.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The platform rejected the request because a rate-limit bucket was exhausted.
    #[error("Rate limited, retry after {}ms", retry_after.as_millis())]
    RateLimited { retry_after: Duration },

    /// The platform answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Anything else the platform client reported (gateway, decoding, I/O).
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// The platform connection is gone.
    #[error("Connection closed")]
    Closed,
}

impl TransportError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, TransportError::RateLimited { .. })
    }
}

/// Errors from the reaction dispatch hub.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Only one widget may listen on a given message.
    #[error("Message {message_id} already has an active widget")]
    AlreadySubscribed { message_id: u64 },
}

/// An invalid [`WidgetConfig`](crate::config::WidgetConfig).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page lookup must be set")]
    MissingPageLookup,

    #[error("page count must be positive, found {0}")]
    NoPages(usize),

    #[error("first page must be between 1 and {page_count}, found {first_page}")]
    FirstPageOutOfRange { first_page: usize, page_count: usize },

    #[error("lifetime must be positive")]
    NonPositiveLifetime,
}

/// Errors returned by [`Widget::run`](crate::controller::Widget::run).
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The first page could not be sent; nothing was shown.
    #[error("Failed to send widget message: {0}")]
    Send(#[source] TransportError),

    #[error("Failed to subscribe to reactions: {0}")]
    Subscribe(#[from] DispatchError),

    /// The owner cancelled the widget before it expired.
    #[error("Widget cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, WidgetError>;
