//! Change notification.
//!
//! Every mutation of a form's stores ends in a notification so observers
//! (typically a UI binding) can re-render. Listeners are plain callbacks;
//! [`ChangeReceiver`] adapts them to an async channel.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;

use tokio::sync::mpsc;

/// A change callback. Identity is the `Arc` allocation.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Wrap a closure as a [`Listener`].
pub fn listener(f: impl Fn() + Send + Sync + 'static) -> Listener {
    Arc::new(f)
}

type Listeners = Mutex<Vec<Listener>>;

/// Set of listeners notified synchronously on every change.
///
/// Clone-able; all clones share the same listener set.
#[derive(Clone)]
pub struct ChangeNotifier {
    name: String,
    listeners: Arc<Listeners>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::named("form")
    }
}

impl ChangeNotifier {
    /// Creates a notifier without listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier whose log records are labelled `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listeners: Arc::default(),
        }
    }

    /// Label used in log records.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a listener.
    ///
    /// Returns `false` if the same listener is already subscribed.
    pub fn subscribe(&self, listener: &Listener) -> bool {
        let mut listeners = lock(&self.listeners);
        if listeners.iter().any(|l| Arc::ptr_eq(l, listener)) {
            return false;
        }
        listeners.push(Arc::clone(listener));
        true
    }

    /// Removes a listener.
    ///
    /// Returns `false` if it was not subscribed.
    pub fn unsubscribe(&self, listener: &Listener) -> bool {
        remove(&self.listeners, listener)
    }

    /// Invokes every current listener on the calling thread.
    ///
    /// The listener set is copied first, so listeners may subscribe or
    /// unsubscribe from within the callback.
    pub fn notify(&self) {
        let listeners = lock(&self.listeners).clone();
        log::trace!("[{}] Notifying {} listener(s)", self.name, listeners.len());
        for listener in listeners {
            listener();
        }
    }

    /// Subscribes a channel that receives one signal per notification.
    ///
    /// Signals beyond `capacity` pending ones are dropped. The channel
    /// unsubscribes itself when the receiver is dropped, and closes once the
    /// notifier and all its clones are gone.
    pub fn channel(&self, capacity: usize) -> ChangeReceiver {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let listener = listener(move || {
            // Full buffer or closed receiver: nothing to do.
            let _ = tx.try_send(());
        });
        self.subscribe(&listener);
        // Only the listener set owns the sender.
        ChangeReceiver {
            rx,
            listener: Arc::downgrade(&listener),
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Returns the number of subscribed listeners.
    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Returns `true` if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        lock(&self.listeners).is_empty()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("name", &self.name)
            .field("listeners", &self.len())
            .finish()
    }
}

/// Receiving half of a change channel.
pub struct ChangeReceiver {
    rx: mpsc::Receiver<()>,
    listener: Weak<dyn Fn() + Send + Sync>,
    listeners: Weak<Listeners>,
}

impl ChangeReceiver {
    /// Wait for the next change signal.
    ///
    /// Returns `None` once the form is gone and no signal is pending.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Take a pending change signal without waiting.
    pub fn try_recv(&mut self) -> Option<()> {
        self.rx.try_recv().ok()
    }
}

impl Drop for ChangeReceiver {
    fn drop(&mut self) {
        if let (Some(listeners), Some(listener)) = (self.listeners.upgrade(), self.listener.upgrade()) {
            remove(&listeners, &listener);
        }
    }
}

fn remove(listeners: &Listeners, listener: &Listener) -> bool {
    let mut listeners = lock(listeners);
    let before = listeners.len();
    listeners.retain(|l| !Arc::ptr_eq(l, listener));
    listeners.len() != before
}

fn lock(listeners: &Listeners) -> std::sync::MutexGuard<'_, Vec<Listener>> {
    listeners
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
