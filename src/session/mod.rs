// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod controller;
mod store;
mod token;

use log::{error, info, warn};

use crate::{api::AuthApi, profile::ProfileCache};

pub use controller::{SessionController, SessionState};
pub use store::{SessionStore, AUTH_STATE_KEY, SESSION_KEYS, TOKEN_KEY};
pub use token::Token;

/// Ends the session locally, notifying the server first when there is still a
/// credential to revoke. Safe to run any number of times; every step is a
/// no-op on an already cleared session.
pub(crate) async fn end_session(api: &AuthApi, store: &SessionStore, profile: &ProfileCache) {
    match store.get_token().await {
        Ok(Some(_)) => {
            if let Err(e) = api.logout().await {
                warn!("Remote logout failed; continuing with local logout: {}", e);
            }
        }
        Ok(None) => {}
        Err(e) => warn!("Skipping remote logout because storage could not be read: {}", e),
    }

    if let Err(e) = store.clear().await {
        error!("Failed to clear session storage: {}", e);
    }
    profile.clear();
    info!("Session ended");
}
