//! Serialization of transactions against one store.

use std::{
    sync::{Condvar, Mutex, PoisonError},
    thread::{self, ThreadId},
};

use handle_trait::Handle;

use super::FieldStore;

#[derive(Default)]
struct GateState {
    owner: Option<ThreadId>,
    depth: usize,
}

/// Admits one transaction at a time.
///
/// The thread holding the gate may enter it again, so a transaction started
/// from inside another one on the same thread (for instance by a validator)
/// does not deadlock. Other threads wait until the depth drops back to zero.
#[derive(Default)]
pub(super) struct CommitGate {
    state: Mutex<GateState>,
    released: Condvar,
}

impl CommitGate {
    fn acquire(&self) {
        let me = thread::current().id();
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        while state.owner.is_some_and(|owner| owner != me) {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        state.owner = Some(me);
        state.depth += 1;
    }

    fn release(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            state.owner = None;
            self.released.notify_all();
        }
    }
}

/// Held by a live [`Transaction`](super::Transaction); releases the gate on
/// drop, whether the transaction committed or not.
pub(super) struct CommitPermit {
    store: FieldStore,
}

impl CommitPermit {
    pub(super) fn acquire(store: &FieldStore) -> Self {
        store.inner.gate.acquire();
        Self {
            store: store.handle(),
        }
    }
}

impl Drop for CommitPermit {
    fn drop(&mut self) {
        self.store.inner.gate.release();
    }
}
