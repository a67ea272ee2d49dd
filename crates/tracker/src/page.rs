//! Page environment - what the tracker reads from the host page
//!
//! Everything is read at capture time. Implementations must not cache
//! geometry: a resize between two page views has to show up in the second.

use descriptor::{Screen, Viewport};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

use crate::navigation::BrowserHistory;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    #[error("{0} is not available")]
    Unavailable(&'static str),

    #[error("Page has been detached")]
    Detached,
}

pub trait PageEnvironment: Send + Sync {
    fn viewport(&self) -> Result<Viewport, PageError>;

    fn screen(&self) -> Result<Screen, PageError>;

    /// Absolute URL of the current document
    fn href(&self) -> Result<String, PageError>;

    fn title(&self) -> Result<String, PageError>;

    /// `None` when the page was opened directly
    fn referrer(&self) -> Result<Option<String>, PageError>;

    fn user_agent(&self) -> Result<String, PageError>;

    /// IANA time zone name of the visitor
    fn time_zone(&self) -> Result<String, PageError>;
}

#[derive(Debug, Clone)]
struct PageState {
    viewport: Viewport,
    screen: Screen,
    title: String,
    referrer: Option<String>,
    user_agent: Option<String>,
    time_zone: String,
    detached: bool,
}

/// Page held in memory, backed by a `BrowserHistory` for its location.
///
/// Used by embedders that render pages themselves and by tests.
pub struct MemoryPage {
    history: Arc<BrowserHistory>,
    state: RwLock<PageState>,
}

impl MemoryPage {
    pub fn new(history: Arc<BrowserHistory>) -> Self {
        Self {
            history,
            state: RwLock::new(PageState {
                viewport: Viewport {
                    inner_width: 1024,
                    inner_height: 768,
                },
                screen: Screen::full(1024, 768),
                title: String::new(),
                referrer: None,
                user_agent: None,
                time_zone: "UTC".to_string(),
                detached: false,
            }),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self::new(Arc::new(BrowserHistory::new(url)))
    }

    pub fn history(&self) -> Arc<BrowserHistory> {
        Arc::clone(&self.history)
    }

    pub fn set_viewport(&self, inner_width: u32, inner_height: u32) {
        self.update(|state| {
            state.viewport = Viewport {
                inner_width,
                inner_height,
            }
        });
    }

    pub fn set_screen(&self, screen: Screen) {
        self.update(|state| state.screen = screen);
    }

    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.update(|state| state.title = title);
    }

    pub fn set_referrer(&self, referrer: Option<String>) {
        self.update(|state| state.referrer = referrer);
    }

    pub fn set_user_agent(&self, user_agent: impl Into<String>) {
        let user_agent = user_agent.into();
        self.update(|state| state.user_agent = Some(user_agent));
    }

    pub fn set_time_zone(&self, time_zone: impl Into<String>) {
        let time_zone = time_zone.into();
        self.update(|state| state.time_zone = time_zone);
    }

    /// Every read fails from now on, like a window that went away
    pub fn detach(&self) {
        self.update(|state| state.detached = true);
    }

    fn update(&self, f: impl FnOnce(&mut PageState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    fn read<T>(&self, f: impl FnOnce(&PageState) -> Result<T, PageError>) -> Result<T, PageError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.detached {
            return Err(PageError::Detached);
        }
        f(&state)
    }
}

impl PageEnvironment for MemoryPage {
    fn viewport(&self) -> Result<Viewport, PageError> {
        self.read(|state| Ok(state.viewport))
    }

    fn screen(&self) -> Result<Screen, PageError> {
        self.read(|state| Ok(state.screen))
    }

    fn href(&self) -> Result<String, PageError> {
        self.read(|_| Ok(self.history.current_url()))
    }

    fn title(&self) -> Result<String, PageError> {
        self.read(|state| Ok(state.title.clone()))
    }

    fn referrer(&self) -> Result<Option<String>, PageError> {
        self.read(|state| Ok(state.referrer.clone().filter(|r| !r.is_empty())))
    }

    fn user_agent(&self) -> Result<String, PageError> {
        self.read(|state| {
            state
                .user_agent
                .clone()
                .ok_or(PageError::Unavailable("navigator.userAgent"))
        })
    }

    fn time_zone(&self) -> Result<String, PageError> {
        self.read(|state| Ok(state.time_zone.clone()))
    }
}
