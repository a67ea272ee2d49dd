//! Observer set - the observers one `init` started
//!
//! Observers start in their constructors and hold their registrations until
//! `stop`. The tracker keeps them in an `ObserverSet` so tearing a session
//! down is a single `stop_all`.

/// A running observer
pub trait Observer: Send + Sync {
    /// Human-readable name for logging, unique per kind of observer
    fn name(&self) -> &str;

    /// Deregister everything the observer registered. Must be idempotent.
    fn stop(&mut self);
}

#[derive(Default)]
pub struct ObserverSet {
    observers: Vec<Box<dyn Observer>>,
}

impl ObserverSet {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub fn register(&mut self, observer: Box<dyn Observer>) {
        tracing::debug!("[ObserverSet] Registered observer: {}", observer.name());
        self.observers.push(observer);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.observers.iter().any(|o| o.name() == name)
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Stop and forget every observer, most recent first
    pub fn stop_all(&mut self) {
        while let Some(mut observer) = self.observers.pop() {
            observer.stop();
            tracing::debug!("[ObserverSet] Stopped observer: {}", observer.name());
        }
    }
}

impl Drop for ObserverSet {
    fn drop(&mut self) {
        self.stop_all();
    }
}
