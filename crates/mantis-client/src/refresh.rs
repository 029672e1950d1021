use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mantis_persist::{CredentialStore, StorageKey};
use mantis_types::SessionEvent;
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::error::RefreshError;
use crate::identity::IdentityProvider;
use crate::session_bus::SessionBus;

pub const LOGIN_PATH: &str = "/login";

type Outcome = Result<String, RefreshError>;

enum RefreshState {
    Idle,
    /// A refresh is running; later callers queue here in arrival order
    InFlight { waiters: Vec<oneshot::Sender<Outcome>> },
}

/// Single-flight identity token refresh
///
/// At most one call to the identity provider is outstanding; every caller that
/// arrives while it runs receives the same outcome.
pub struct TokenRefreshCoordinator {
    provider: Arc<dyn IdentityProvider>,
    store: Arc<dyn CredentialStore>,
    bus: SessionBus,
    state: Mutex<RefreshState>,
    refreshing: watch::Sender<bool>,
}

impl TokenRefreshCoordinator {
    pub fn new(provider: Arc<dyn IdentityProvider>, store: Arc<dyn CredentialStore>, bus: SessionBus) -> Self {
        let (refreshing, _) = watch::channel(false);
        Self {
            provider,
            store,
            bus,
            state: Mutex::new(RefreshState::Idle),
            refreshing,
        }
    }

    /// Observes the "refresh in progress" indicator
    pub fn refreshing(&self) -> watch::Receiver<bool> {
        self.refreshing.subscribe()
    }

    pub fn is_refreshing(&self) -> bool {
        *self.refreshing.borrow()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn request_token(&self) -> Outcome {
        let waiter = {
            let mut state = self.lock();
            match &mut *state {
                RefreshState::InFlight { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    Some(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::InFlight { waiters: Vec::new() };
                    None
                }
            }
        };

        if let Some(rx) = waiter {
            debug!("Token refresh already in flight, waiting for its outcome");
            return rx.await.unwrap_or(Err(RefreshError::Abandoned));
        }

        let mut leader = LeaderGuard {
            coordinator: self,
            settled: false,
        };
        let outcome = self.refresh().await;
        leader.settle(&outcome);
        outcome
    }

    async fn refresh(&self) -> Outcome {
        let _indicator = IndicatorGuard::raise(&self.refreshing);
        info!("Refreshing identity token");

        match self.provider.refresh_silently().await {
            Ok(token) => {
                if let Err(e) = self.store.set(StorageKey::IdentityToken, token.clone()).await {
                    warn!("Failed to persist refreshed identity token: {}", e);
                }
                info!("Identity token refreshed");
                Ok(token)
            }
            Err(e) => {
                error!("Failed to refresh identity token: {}", e);
                if let Err(e) = self.store.remove(StorageKey::IdentityToken).await {
                    warn!("Failed to clear identity token: {}", e);
                }
                if let Err(redirect_err) = self.provider.login_with_redirect().await {
                    error!("Failed to redirect to login: {}", redirect_err);
                    self.bus.publish(SessionEvent::HardNavigate {
                        path: LOGIN_PATH.to_string(),
                    });
                }
                Err(RefreshError::Failed(e.to_string()))
            }
        }
    }

    /// Returns to idle and resolves every queued waiter in FIFO order
    fn drain(&self, outcome: &Outcome) {
        let waiters = match std::mem::replace(&mut *self.lock(), RefreshState::Idle) {
            RefreshState::InFlight { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };
        debug!("Resolving {} queued token refresh waiters", waiters.len());
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Settles the queue even if the leading caller's future is dropped mid-refresh
struct LeaderGuard<'a> {
    coordinator: &'a TokenRefreshCoordinator,
    settled: bool,
}

impl LeaderGuard<'_> {
    fn settle(&mut self, outcome: &Outcome) {
        self.coordinator.drain(outcome);
        self.settled = true;
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.coordinator.drain(&Err(RefreshError::Abandoned));
        }
    }
}

struct IndicatorGuard<'a>(&'a watch::Sender<bool>);

impl<'a> IndicatorGuard<'a> {
    fn raise(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for IndicatorGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}
