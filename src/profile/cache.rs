// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use log::debug;
use tokio::sync::watch;

use super::{ProfilePatch, UserProfile};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileState {
    pub profile: Option<UserProfile>,
    pub loading: bool,
    pub error: Option<String>,
}

/// The single owner of the fetched user profile.
///
/// Clones are handles onto the same state. Mutation only happens through the
/// transition methods below; observers can [`subscribe`](Self::subscribe) to
/// be woken on every transition.
#[derive(Clone)]
pub struct ProfileCache {
    state: Arc<watch::Sender<ProfileState>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch_start(&self) {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    pub fn fetch_success(&self, profile: UserProfile) {
        debug!("Caching profile for user {}", profile.id);
        self.state.send_modify(|state| {
            state.profile = Some(profile);
            state.loading = false;
            state.error = None;
        });
    }

    /// Records the failure. A previously cached profile is kept.
    pub fn fetch_failure<S: Into<String>>(&self, message: S) {
        let message = message.into();
        self.state.send_modify(|state| {
            state.loading = false;
            state.error = Some(message);
        });
    }

    pub fn clear(&self) {
        self.state.send_if_modified(|state| state.profile.take().is_some());
    }

    /// Merges `patch` into the held profile; does nothing when no profile is
    /// held.
    pub fn update_partial(&self, patch: ProfilePatch) {
        self.state.send_if_modified(|state| match state.profile.as_mut() {
            Some(profile) => {
                profile.apply(patch);
                true
            }
            None => false,
        });
    }

    pub fn snapshot(&self) -> ProfileState {
        self.state.borrow().clone()
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state.borrow().profile.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn company_id(&self) -> Option<String> {
        self.state
            .borrow()
            .profile
            .as_ref()
            .and_then(UserProfile::company_id)
            .map(str::to_owned)
    }

    pub fn subscribe(&self) -> watch::Receiver<ProfileState> {
        self.state.subscribe()
    }
}

impl Default for ProfileCache {
    fn default() -> Self {
        let (tx, _) = watch::channel(ProfileState::default());
        Self {
            state: Arc::new(tx),
        }
    }
}
