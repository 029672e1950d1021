use std::sync::Arc;

use mantis_types::Reducer;
use tokio::sync::watch;

/// Observable state value
///
/// Changes go through [`dispatch`](Self::dispatch) (reducer actions) or
/// [`update`](Self::update); observers hold a `watch::Receiver`.
#[derive(Debug)]
pub struct StateCell<S> {
    tx: Arc<watch::Sender<S>>,
}

impl<S> Clone for StateCell<S> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<S: Default> Default for StateCell<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> StateCell<S> {
    pub fn new(initial: S) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.tx.subscribe()
    }

    pub fn borrow(&self) -> watch::Ref<'_, S> {
        self.tx.borrow()
    }

    pub fn update(&self, f: impl FnOnce(&mut S)) {
        self.tx.send_modify(f);
    }

    /// Applies `f` and notifies observers only when it returns true
    pub fn update_if(&self, f: impl FnOnce(&mut S) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }

    pub fn replace(&self, state: S) -> S {
        self.tx.send_replace(state)
    }
}

impl<S: Clone> StateCell<S> {
    pub fn snapshot(&self) -> S {
        self.tx.borrow().clone()
    }
}

impl<S: Reducer + Default> StateCell<S> {
    pub fn dispatch(&self, action: S::Action) {
        self.tx.send_modify(|state| {
            let current = std::mem::take(state);
            *state = current.reduce(action);
        });
    }

    /// Dispatches only when `guard` holds, atomically with respect to other dispatches
    pub fn dispatch_if(&self, guard: impl FnOnce(&S) -> bool, action: S::Action) -> bool {
        self.tx.send_if_modified(|state| {
            if !guard(state) {
                return false;
            }
            let current = std::mem::take(state);
            *state = current.reduce(action);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mantis_types::{TeamAction, TeamState};

    #[test]
    fn test_dispatch_notifies_observers() {
        let cell = StateCell::<TeamState>::default();
        let mut rx = cell.subscribe();

        cell.dispatch(TeamAction::SetLoading(true));

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_loading);
    }

    #[test]
    fn test_dispatch_if_respects_guard() {
        let cell = StateCell::<TeamState>::default();
        assert!(!cell.dispatch_if(|s| s.is_loading, TeamAction::SetError("x".into())));
        assert!(cell.snapshot().error.is_none());
        assert!(cell.dispatch_if(|s| !s.is_loading, TeamAction::SetError("x".into())));
        assert_eq!(cell.snapshot().error.as_deref(), Some("x"));
    }
}
