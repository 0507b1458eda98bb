// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Access control for a subtree of surfaces.
//!
//! A [`RouteGuard`] decides whether its subtree may be shown, and, while the
//! subtree requires a session, keeps watching for the session to disappear.
//! Storage changes made elsewhere and a periodic re-check both feed a single
//! trigger channel; one consumer re-validates the session and runs the
//! unauthorized sequence.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use log::{debug, error, info};
use tokio::{
    select,
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    api::AuthApi,
    navigation::{self, Navigation, Navigator, Surface, LOGIN_PATH},
    profile::ProfileCache,
    session::{self, SessionStore, SESSION_KEYS},
    storage::Changes,
};

const TRIGGER_CAPACITY: usize = 1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GuardState {
    #[default]
    Pending,
    Allowed,
    Denied,
}

#[derive(Clone, Copy, Debug)]
enum Trigger {
    StorageChanged,
    Tick,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Decision {
    path: String,
    authenticated: bool,
}

pub struct RouteGuard {
    require_auth: bool,
    store: Arc<SessionStore>,
    profile: ProfileCache,
    api: AuthApi,
    navigator: Arc<dyn Navigator>,
    poll_interval: Duration,
    state: watch::Sender<GuardState>,
    last: Mutex<Option<Decision>>,
}

impl RouteGuard {
    pub fn new(
        require_auth: bool,
        store: Arc<SessionStore>,
        profile: ProfileCache,
        api: AuthApi,
        navigator: Arc<dyn Navigator>,
        poll_interval: Duration,
    ) -> Self {
        let (state, _) = watch::channel(GuardState::Pending);
        Self {
            require_auth,
            store,
            profile,
            api,
            navigator,
            poll_interval,
            state,
            last: Mutex::new(None),
        }
    }

    pub fn requires_auth(&self) -> bool {
        self.require_auth
    }

    pub fn state(&self) -> GuardState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    /// Decides whether the subtree may be shown at the navigator's current
    /// path, redirecting when it may not. Repeating an evaluation with the
    /// same outcome does not repeat the redirect.
    pub async fn evaluate(&self) -> GuardState {
        let path = self.navigator.current_path();
        let authenticated = self.store.is_authenticated().await;

        let (state, redirect) = if self.require_auth && !authenticated {
            (
                GuardState::Denied,
                Some(Surface::login_returning_to(path.as_str())),
            )
        } else if !self.require_auth && authenticated && navigation::is_public_only(&path) {
            (GuardState::Denied, Some(Surface::Home))
        } else {
            (GuardState::Allowed, None)
        };

        let decision = Decision {
            path,
            authenticated,
        };
        let repeated = {
            let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
            let repeated = last.as_ref() == Some(&decision);
            *last = Some(decision);
            repeated
        };

        if let Some(surface) = redirect {
            if !repeated {
                self.navigator.navigate(Navigation::to(surface));
            }
        }
        _ = self.state.send_replace(state);
        state
    }

    /// Starts watching the session. Guards that do not require a session have
    /// nothing to watch and return an inert monitor.
    pub fn monitor(self: &Arc<Self>) -> Monitor {
        let cancel = CancellationToken::new();
        let mut tasks = Vec::new();

        if self.require_auth {
            let (tx, rx) = mpsc::channel(TRIGGER_CAPACITY);
            tasks.push(tokio::spawn(watch_storage(
                self.store.subscribe(),
                tx.clone(),
                cancel.clone(),
            )));
            tasks.push(tokio::spawn(poll(self.poll_interval, tx, cancel.clone())));
            tasks.push(tokio::spawn(Arc::clone(self).revalidate(rx, cancel.clone())));
            debug!(
                "Monitoring session validity every {:?} and on storage changes",
                self.poll_interval
            );
        }

        Monitor { cancel, tasks }
    }

    async fn revalidate(self: Arc<Self>, mut rx: mpsc::Receiver<Trigger>, cancel: CancellationToken) {
        loop {
            let trigger = select! {
                biased;
                () = cancel.cancelled() => return,
                trigger = rx.recv() => trigger,
            };
            let Some(trigger) = trigger else {
                return;
            };

            debug!("Re-validating session ({:?})", trigger);
            if !self.store.is_authenticated().await {
                self.handle_unauthorized().await;
            }
        }
    }

    /// Tears the session down and sends the user to login, remembering where
    /// they were. Once on the login surface, repeated runs only re-clear
    /// local state.
    pub async fn handle_unauthorized(&self) {
        let path = self.navigator.current_path();
        if path == LOGIN_PATH {
            if let Err(e) = self.store.clear().await {
                error!("Failed to clear session storage: {}", e);
            }
            self.profile.clear();
        } else {
            info!("Session is no longer valid; leaving {}", path);
            session::end_session(&self.api, &self.store, &self.profile).await;
            self.navigator
                .navigate(Navigation::to(Surface::login_returning_to(path.as_str())));
        }

        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(Decision {
            path,
            authenticated: false,
        });
        _ = self.state.send_replace(GuardState::Denied);
    }
}

async fn watch_storage(mut changes: Changes, tx: mpsc::Sender<Trigger>, cancel: CancellationToken) {
    loop {
        let event = select! {
            biased;
            () = cancel.cancelled() => return,
            event = changes.next() => event,
        };
        match event {
            Some(event) if event.concerns(&SESSION_KEYS) => {
                if !offer(&tx, Trigger::StorageChanged) {
                    return;
                }
            }
            Some(event) => debug!("Ignoring change to unrelated key {:?}", event.key),
            None => return,
        }
    }
}

async fn poll(period: Duration, tx: mpsc::Sender<Trigger>, cancel: CancellationToken) {
    let mut ticks = time::interval_at(Instant::now() + period, period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        select! {
            biased;
            () = cancel.cancelled() => return,
            _ = ticks.tick() => {
                if !offer(&tx, Trigger::Tick) {
                    return;
                }
            }
        }
    }
}

/// Queues a trigger unless one is already pending. Returns false once the
/// consumer is gone.
fn offer(tx: &mpsc::Sender<Trigger>, trigger: Trigger) -> bool {
    match tx.try_send(trigger) {
        Ok(()) | Err(mpsc::error::TrySendError::Full(_)) => true,
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// The background tasks of a monitored guard. Dropping the monitor stops them.
pub struct Monitor {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Monitor {
    pub fn is_active(&self) -> bool {
        self.tasks.iter().any(|task| !task.is_finished())
    }

    /// Stops the monitor and waits for its tasks to wind down.
    pub async fn dispose(mut self) {
        self.cancel.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!("Session monitor task panicked: {}", e);
                }
            }
        }
    }
}

impl Drop for Monitor {
    fn drop(&mut self) {
        self.cancel.cancel();
        for task in &self.tasks {
            task.abort();
        }
    }
}
