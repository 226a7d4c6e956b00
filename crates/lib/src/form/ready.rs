//! One-shot readiness signal.

use std::{
    fmt,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

type ReadyCallback = Box<dyn FnOnce() + Send>;

/// Fires a callback the first time both readiness conditions hold.
///
/// The host reports two conditions through [`update`](Self::update): that
/// initial values have been loaded, and that any external gate has resolved.
/// The callback runs at most once per gate, on the first update where both
/// are true, however many updates follow.
///
/// ```
/// use formwork::form::ReadyGate;
/// use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
///
/// let fired = Arc::new(AtomicUsize::new(0));
/// let counter = fired.clone();
/// let gate = ReadyGate::new(move || {
///     counter.fetch_add(1, Ordering::SeqCst);
/// });
///
/// assert!(!gate.update(true, false));
/// assert!(gate.update(true, true));
/// assert!(!gate.update(true, true));
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct ReadyGate {
    callback: Mutex<Option<ReadyCallback>>,
    ready: AtomicBool,
}

impl fmt::Debug for ReadyGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadyGate")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl ReadyGate {
    pub fn new(callback: impl FnOnce() + Send + 'static) -> Self {
        Self {
            callback: Mutex::new(Some(Box::new(callback))),
            ready: AtomicBool::new(false),
        }
    }

    /// Reports the current conditions. Returns `true` if this call fired the
    /// callback.
    pub fn update(&self, values_loaded: bool, gate_resolved: bool) -> bool {
        if !(values_loaded && gate_resolved) {
            return false;
        }
        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match callback {
            Some(callback) => {
                self.ready.store(true, Ordering::SeqCst);
                tracing::debug!("Form ready");
                callback();
                true
            }
            None => false,
        }
    }

    /// `true` once the callback has fired.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
