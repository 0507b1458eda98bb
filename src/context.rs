// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use crate::{
    api::AuthApi,
    config::Config,
    guard::RouteGuard,
    http::{Client, Transport},
    navigation::Navigator,
    notify::Notifier,
    profile::ProfileCache,
    session::{SessionController, SessionStore},
    storage::Storage,
};

/// Everything that belongs to one session lifetime, wired together once and
/// handed to whoever needs it.
pub struct SessionContext {
    config: Config,
    store: Arc<SessionStore>,
    profile: ProfileCache,
    client: Arc<Client>,
    api: AuthApi,
    controller: SessionController,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
}

impl SessionContext {
    pub async fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let store = Arc::new(SessionStore::new(storage));
        let profile = ProfileCache::new();
        let client = Arc::new(Client::new(
            transport,
            Arc::clone(&store),
            profile.clone(),
            Arc::clone(&notifier),
            Arc::clone(&navigator),
        ));
        let api = AuthApi::new(Arc::clone(&client));
        let controller =
            SessionController::new(Arc::clone(&store), profile.clone(), api.clone()).await;

        Self {
            config,
            store,
            profile,
            client,
            api,
            controller,
            navigator,
            notifier,
        }
    }

    /// Loads the profile for a session left over from an earlier run.
    pub async fn init(&self) {
        self.controller.initialize().await;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn profile(&self) -> &ProfileCache {
        &self.profile
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn api(&self) -> &AuthApi {
        &self.api
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn guard(&self, require_auth: bool) -> Arc<RouteGuard> {
        Arc::new(RouteGuard::new(
            require_auth,
            Arc::clone(&self.store),
            self.profile.clone(),
            self.api.clone(),
            Arc::clone(&self.navigator),
            self.config.poll_interval,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        api,
        guard::GuardState,
        http::Response,
        navigation::{History, Navigation, Surface},
        profile::model::fixtures,
        session::Token,
        storage::Memory,
        testing::{Recorder, Scripted},
    };

    #[tokio::test]
    async fn components_share_one_session() {
        let storage = Memory::new();
        let seeded = SessionStore::new(Arc::new(storage.share()));
        seeded.set_token(&Token::new("abc123").unwrap()).await.unwrap();

        let history = Arc::new(History::new("/events"));
        let transport = Arc::new(Scripted::new(|req| match req.path.as_str() {
            api::SESSION_INFO_PATH => Ok(Response::new(200).with_json(&fixtures::profile_json())),
            _ => Ok(Response::new(401).with_json(&json!({ "error": "Token expired" }))),
        }));
        let ctx = SessionContext::new(
            Config::default(),
            Arc::new(storage),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::clone(&history) as Arc<dyn Navigator>,
            Arc::new(Recorder::default()) as Arc<dyn Notifier>,
        )
        .await;

        ctx.init().await;
        assert!(ctx.controller().is_logged_in());
        assert_eq!(ctx.profile().company_id().as_deref(), Some("c42"));
        assert_eq!(ctx.guard(true).evaluate().await, GuardState::Allowed);

        // A 401 anywhere tears down the state every other component sees.
        assert!(ctx
            .client()
            .send(crate::http::Request::get("/admin/event/upcoming"))
            .await
            .unwrap_err()
            .is_unauthorized());
        assert!(!ctx.store().is_authenticated().await);
        assert_eq!(ctx.profile().profile(), None);
        assert_eq!(
            history.navigations(),
            vec![Navigation::reload(Surface::login())]
        );
    }
}
