// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use log::{error, info, warn};
use tokio::sync::watch;
use validator::Validate as _;

use crate::{
    api::{self, AuthApi, LoginPayload, RegisterPayload},
    error::{self, Result},
    http::credentials::AUTHORIZATION,
    profile::{ProfileCache, UserProfile},
};

use super::{end_session, SessionStore, Token};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub token: Option<Token>,
}

/// The reactive view of "am I logged in".
///
/// The store stays authoritative; this state is re-derived from it on
/// [`refresh`](Self::refresh) and updated by login and logout.
pub struct SessionController {
    store: Arc<SessionStore>,
    profile: ProfileCache,
    api: AuthApi,
    state: watch::Sender<SessionState>,
}

impl SessionController {
    pub async fn new(store: Arc<SessionStore>, profile: ProfileCache, api: AuthApi) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        let controller = Self {
            store,
            profile,
            api,
            state,
        };
        controller.refresh().await;
        controller
    }

    pub async fn refresh(&self) {
        let is_logged_in = self.store.is_authenticated().await;
        let token = match self.store.get_token().await {
            Ok(token) => token,
            Err(e) => {
                warn!("Could not read the session token: {}", e);
                None
            }
        };
        _ = self.state.send_replace(SessionState {
            is_logged_in,
            token,
        });
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Persists a token received in a response header and marks the session
    /// as logged in. If the token cannot be persisted the failure is logged
    /// and the session stays logged out; the return value says which
    /// happened.
    pub async fn adopt_token_from_header(&self, header: &str) -> bool {
        match Token::from_header(header) {
            Some(token) => self.adopt(token).await,
            None => {
                warn!("Ignoring an authorization header without a credential");
                false
            }
        }
    }

    async fn adopt(&self, token: Token) -> bool {
        if let Err(e) = self.store.set_token(&token).await {
            error!("Failed to persist the session token: {}", e);
            if let Err(e) = self.store.clear().await {
                error!("Failed to roll back a partially stored session: {}", e);
            }
            _ = self.state.send_replace(SessionState::default());
            return false;
        }

        _ = self.state.send_replace(SessionState {
            is_logged_in: true,
            token: Some(token),
        });
        true
    }

    /// Exchanges credentials for a session, then loads the profile.
    ///
    /// A profile that fails to load is recorded in the profile cache but does
    /// not fail the login.
    pub async fn login(&self, payload: &LoginPayload) -> Result<()> {
        payload.validate()?;
        let resp = self.api.sign_in(payload).await?;

        let token = resp
            .header(AUTHORIZATION)
            .and_then(Token::from_header)
            .ok_or(error::Api::MissingCredential)?;
        if !self.adopt(token).await {
            return Err(error::Api::CredentialNotPersisted.into());
        }
        api::expect_object_or_empty(&resp)?;
        info!("Signed in as {}", payload.email);

        if let Err(e) = self.fetch_profile().await {
            warn!("Signed in, but the profile could not be loaded: {}", e);
        }
        Ok(())
    }

    /// Loads the profile at start-up when a stored session exists.
    pub async fn initialize(&self) {
        self.refresh().await;
        if !self.store.is_authenticated().await {
            return;
        }
        if let Err(e) = self.fetch_profile().await {
            error!("Could not load the profile for the stored session: {}", e);
        }
    }

    pub async fn fetch_profile(&self) -> Result<UserProfile> {
        self.profile.fetch_start();
        let result = match self.api.session_info().await {
            Ok(resp) => UserProfile::from_json(&resp.body),
            Err(e) => Err(e),
        };

        match result {
            Ok(profile) => {
                self.profile.fetch_success(profile.clone());
                Ok(profile)
            }
            Err(e) => {
                self.profile.fetch_failure(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn register(&self, payload: &RegisterPayload) -> Result<()> {
        payload.validate()?;
        self.api.register(payload).await?;
        info!("Registered company {}", payload.company_name);
        Ok(())
    }

    /// Logs out. The server is told on a best-effort basis; local state is
    /// invalidated regardless of how that goes.
    pub async fn logout(&self) {
        end_session(&self.api, &self.store, &self.profile).await;
        _ = self.state.send_replace(SessionState::default());
    }
}
