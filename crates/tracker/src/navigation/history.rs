//! Session history with replaceable entry points
//!
//! Mirrors the shape of a browser's `History` object: a stack of entries, the
//! two mutation entry points (`push_state`, `replace_state`) stored as
//! swappable function slots, and `popstate` listeners fired on traversal.
//!
//! The slots are what `HistoryNavigation` wraps. Reading a slot returns the
//! `Arc` currently installed, so restoring a saved slot restores identity
//! (`Arc::ptr_eq`), not just behavior.

use dashmap::DashMap;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use url::Url;

use super::POPSTATE;

/// Entry point signature: `(history, url)`
pub type StateFn = Arc<dyn Fn(&BrowserHistory, &str) + Send + Sync>;

/// Event listener callback
pub type ListenerFn = Arc<dyn Fn(&PopStateEvent) + Send + Sync>;

pub type ListenerId = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Passive listeners cannot cancel the event
    pub passive: bool,
}

/// Event delivered to `popstate` listeners after a traversal
pub struct PopStateEvent {
    url: String,
    passive: bool,
    default_prevented: Cell<bool>,
}

impl PopStateEvent {
    fn new(url: String, passive: bool) -> Self {
        Self {
            url,
            passive,
            default_prevented: Cell::new(false),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn prevent_default(&self) {
        if self.passive {
            tracing::warn!("[BrowserHistory] preventDefault ignored inside passive listener");
            return;
        }
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

#[derive(Clone)]
struct Listener {
    event: String,
    callback: ListenerFn,
    options: ListenerOptions,
}

#[derive(Debug)]
struct Stack {
    entries: Vec<String>,
    index: usize,
}

pub struct BrowserHistory {
    stack: Mutex<Stack>,
    push_state: RwLock<StateFn>,
    replace_state: RwLock<StateFn>,
    listeners: DashMap<ListenerId, Listener>,
    next_listener: AtomicU64,
}

impl BrowserHistory {
    pub fn new(initial_url: impl Into<String>) -> Self {
        let push_state: StateFn = Arc::new(Self::native_push_state);
        let replace_state: StateFn = Arc::new(Self::native_replace_state);

        Self {
            stack: Mutex::new(Stack {
                entries: vec![initial_url.into()],
                index: 0,
            }),
            push_state: RwLock::new(push_state),
            replace_state: RwLock::new(replace_state),
            listeners: DashMap::new(),
            next_listener: AtomicU64::new(1),
        }
    }

    /// Add an entry through whatever `push_state` entry point is installed
    pub fn push_state(&self, url: &str) {
        let entry_point = self.push_state_fn();
        entry_point(self, url);
    }

    /// Replace the current entry through the installed entry point
    pub fn replace_state(&self, url: &str) {
        let entry_point = self.replace_state_fn();
        entry_point(self, url);
    }

    pub fn push_state_fn(&self) -> StateFn {
        self.push_state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_push_state_fn(&self, entry_point: StateFn) {
        *self
            .push_state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = entry_point;
    }

    pub fn replace_state_fn(&self) -> StateFn {
        self.replace_state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_replace_state_fn(&self, entry_point: StateFn) {
        *self
            .replace_state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = entry_point;
    }

    /// Unpatched `push_state`: drops forward entries and appends
    pub fn native_push_state(&self, url: &str) {
        let mut stack = self.stack();
        let resolved = resolve(&stack.entries[stack.index], url);
        let keep = stack.index + 1;
        stack.entries.truncate(keep);
        stack.entries.push(resolved);
        stack.index = keep;
    }

    /// Unpatched `replace_state`
    pub fn native_replace_state(&self, url: &str) {
        let mut stack = self.stack();
        let index = stack.index;
        let resolved = resolve(&stack.entries[index], url);
        stack.entries[index] = resolved;
    }

    pub fn back(&self) -> bool {
        self.go(-1)
    }

    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Traverse `delta` entries. Fires `popstate` when the position changed.
    pub fn go(&self, delta: isize) -> bool {
        let url = {
            let mut stack = self.stack();
            let target = stack.index as isize + delta;
            if delta == 0 || target < 0 || target >= stack.entries.len() as isize {
                return false;
            }
            stack.index = target as usize;
            stack.entries[stack.index].clone()
        };

        self.dispatch(POPSTATE, &url);
        true
    }

    pub fn current_url(&self) -> String {
        let stack = self.stack();
        stack.entries[stack.index].clone()
    }

    /// Number of entries, like `history.length`
    pub fn length(&self) -> usize {
        self.stack().entries.len()
    }

    pub fn add_event_listener(
        &self,
        event: &str,
        callback: ListenerFn,
        options: ListenerOptions,
    ) -> ListenerId {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        self.listeners.insert(
            id,
            Listener {
                event: event.to_string(),
                callback,
                options,
            },
        );
        id
    }

    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Options of every listener registered for `event`
    pub fn listener_options(&self, event: &str) -> Vec<ListenerOptions> {
        self.listeners
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| entry.options)
            .collect()
    }

    fn dispatch(&self, event: &str, url: &str) {
        // Clone out first: a listener may add or remove listeners
        let mut listeners: Vec<(ListenerId, Listener)> = self
            .listeners
            .iter()
            .filter(|entry| entry.event == event)
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        listeners.sort_by_key(|(id, _)| *id);

        for (_, listener) in listeners {
            let event = PopStateEvent::new(url.to_string(), listener.options.passive);
            (listener.callback)(&event);
        }
    }

    fn stack(&self) -> std::sync::MutexGuard<'_, Stack> {
        self.stack.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve(current: &str, url: &str) -> String {
    Url::parse(current)
        .and_then(|base| base.join(url))
        .map(String::from)
        .unwrap_or_else(|_| url.to_string())
}
