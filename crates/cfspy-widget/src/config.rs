use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ConfigError;
use crate::page::{Page, PageLookup};
use crate::types::{Reaction, SentMessage};

/// How long a widget reacts to input when the caller does not say otherwise.
pub const DEFAULT_LIFETIME: Duration = Duration::from_secs(60);

pub type MessageSentCallback = Arc<dyn Fn(&SentMessage) + Send + Sync>;
pub type DeletedCallback = Arc<dyn Fn(&Reaction) + Send + Sync>;
pub type PermissionCheck = Arc<dyn Fn(&Reaction) -> bool + Send + Sync>;

/// Everything a widget needs before it sends its first page.
///
/// Built with [`WidgetConfig::paginated`] or [`WidgetConfig::single_page`] and
/// the chained setters. Checked by [`validate`](Self::validate) once, before
/// any network call.
#[derive(Clone)]
pub struct WidgetConfig {
    pub(crate) page_lookup: Option<PageLookup>,
    pub(crate) page_count: usize,
    pub(crate) first_page: usize,
    pub(crate) lifetime: Duration,
    pub(crate) on_message_sent: MessageSentCallback,
    pub(crate) on_deleted: DeletedCallback,
    pub(crate) permission_check: PermissionCheck,
}

impl WidgetConfig {
    /// A widget over `page_count` pages, initially showing the last one.
    pub fn paginated(page_lookup: PageLookup, page_count: usize) -> Self {
        Self {
            page_lookup: Some(page_lookup),
            page_count,
            first_page: page_count,
            ..Self::default()
        }
    }

    /// A single page whose only control is the delete button.
    pub fn single_page(page: Page) -> Self {
        Self {
            page_lookup: Some(Arc::new(move |_: usize| page.clone())),
            page_count: 1,
            first_page: 1,
            ..Self::default()
        }
    }

    pub fn first_page(mut self, first_page: usize) -> Self {
        self.first_page = first_page;
        self
    }

    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Called once, right after the first page is posted.
    pub fn on_message_sent(mut self, f: impl Fn(&SentMessage) + Send + Sync + 'static) -> Self {
        self.on_message_sent = Arc::new(f);
        self
    }

    /// Called once when a permitted delete reaction ends the widget.
    pub fn on_deleted(mut self, f: impl Fn(&Reaction) + Send + Sync + 'static) -> Self {
        self.on_deleted = Arc::new(f);
        self
    }

    /// Decides whether a reaction may operate the widget.
    pub fn permission_check(mut self, f: impl Fn(&Reaction) -> bool + Send + Sync + 'static) -> Self {
        self.permission_check = Arc::new(f);
        self
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Whether `reaction` passes the permission check.
    pub fn permits(&self, reaction: &Reaction) -> bool {
        (self.permission_check)(reaction)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_lookup.is_none() {
            return Err(ConfigError::MissingPageLookup);
        }
        if self.page_count < 1 {
            return Err(ConfigError::NoPages(self.page_count));
        }
        if self.first_page < 1 || self.first_page > self.page_count {
            return Err(ConfigError::FirstPageOutOfRange {
                first_page: self.first_page,
                page_count: self.page_count,
            });
        }
        if self.lifetime.is_zero() {
            return Err(ConfigError::NonPositiveLifetime);
        }
        Ok(())
    }
}

impl Default for WidgetConfig {
    /// No pages and no-op callbacks; only useful as a base for struct update.
    fn default() -> Self {
        Self {
            page_lookup: None,
            page_count: 0,
            first_page: 1,
            lifetime: DEFAULT_LIFETIME,
            on_message_sent: Arc::new(|_: &SentMessage| {}),
            on_deleted: Arc::new(|_: &Reaction| {}),
            permission_check: Arc::new(|_: &Reaction| true),
        }
    }
}

impl fmt::Debug for WidgetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetConfig")
            .field("has_page_lookup", &self.page_lookup.is_some())
            .field("page_count", &self.page_count)
            .field("first_page", &self.first_page)
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}
