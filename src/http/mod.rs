// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The single chokepoint for backend calls.
//!
//! Every request passes through three stages: credential injection, failure
//! classification, and notification. A 401 additionally tears the session
//! down and forces a reloading redirect to the login surface; this is the only
//! place where response codes decide that a session has died.

pub mod classify;
pub mod credentials;
mod transport;

use std::sync::Arc;

use log::{debug, error, info};

use crate::{
    error::{self, Result},
    navigation::{Navigation, Navigator, Surface},
    notify::{Notice, Notifier},
    profile::ProfileCache,
    session::SessionStore,
};

pub use classify::Failure;
pub use transport::{Method, Reqwest, Request, Response, Transport, TransportError};

pub struct Client {
    transport: Arc<dyn Transport>,
    store: Arc<SessionStore>,
    profile: ProfileCache,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl Client {
    pub fn new(
        transport: Arc<dyn Transport>,
        store: Arc<SessionStore>,
        profile: ProfileCache,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            transport,
            store,
            profile,
            notifier,
            navigator,
        }
    }

    /// Sends `req`. Failures are reported to the notifier before being
    /// returned, so callers only need to handle them if they want to react
    /// locally.
    pub async fn send(&self, mut req: Request) -> Result<Response> {
        credentials::inject(&self.store, &mut req).await?;
        debug!("Dispatching {} {}", req.method, req.path);

        match classify::classify(self.transport.send(req).await) {
            Ok(resp) => Ok(resp),
            Err(failure) => {
                if failure.is_unauthorized() {
                    self.expire_session().await;
                }
                self.notifier.notify(Notice::error(failure.message()));
                Err(error::Http::from(failure).into())
            }
        }
    }

    async fn expire_session(&self) {
        info!("Server rejected the session credentials; signing out");
        if let Err(e) = self.store.clear().await {
            error!("Failed to clear the expired session from storage: {}", e);
        }
        self.profile.clear();
        self.navigator
            .navigate(Navigation::reload(Surface::login()));
    }
}
