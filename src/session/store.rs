// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use log::{debug, warn};

use crate::{
    error::Result,
    storage::{Changes, IsPersistent, Storage},
};

use super::Token;

pub const TOKEN_KEY: &str = "auth_token";
pub const AUTH_STATE_KEY: &str = "isAuthenticated";
/// The keys whose foreign modification may change the session's validity.
pub const SESSION_KEYS: [&str; 2] = [TOKEN_KEY, AUTH_STATE_KEY];

const AUTHENTICATED: &str = "true";

/// The durable source of truth for session credentials.
pub struct SessionStore {
    storage: Arc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn get_token(&self) -> Result<Option<Token>> {
        Ok(self.storage.get(TOKEN_KEY).await?.and_then(Token::new))
    }

    /// Writes the token, then the authenticated flag. The writes are
    /// sequential; a failure between them leaves a token without a flag,
    /// which reads as unauthenticated.
    pub async fn set_token(&self, token: &Token) -> Result<()> {
        self.storage.set(TOKEN_KEY, token.expose()).await?;
        self.storage.set(AUTH_STATE_KEY, AUTHENTICATED).await?;
        debug!("Stored session token");
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove(TOKEN_KEY).await?;
        self.storage.remove(AUTH_STATE_KEY).await?;
        debug!("Cleared session token");
        Ok(())
    }

    /// True only when the flag reads `"true"` and a non-empty token is
    /// present. Unreadable storage counts as unauthenticated.
    pub async fn is_authenticated(&self) -> bool {
        match self.read_state().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                warn!("Treating session as unauthenticated because storage could not be read: {}", e);
                false
            }
        }
    }

    async fn read_state(&self) -> Result<bool> {
        let flag = self.storage.get(AUTH_STATE_KEY).await?;
        if flag.as_deref() != Some(AUTHENTICATED) {
            return Ok(false);
        }
        Ok(self.get_token().await?.is_some())
    }

    pub fn subscribe(&self) -> Changes {
        self.storage.subscribe()
    }
}

impl IsPersistent for SessionStore {
    fn is_persistent(&self) -> bool {
        self.storage.is_persistent()
    }
}
