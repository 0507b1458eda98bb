// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Mutex, PoisonError};

use log::info;
use tokio::sync::watch;
use url::form_urlencoded;

use crate::error::{self, Result};

pub const LOGIN_PATH: &str = "/login";
pub const SIGNUP_PATH: &str = "/signup";
pub const HOME_PATH: &str = "/";
/// Surfaces only meant for visitors without a session.
pub const PUBLIC_ONLY_PATHS: [&str; 2] = [LOGIN_PATH, SIGNUP_PATH];

const RETURN_TO_PARAM: &str = "returnTo";

pub fn is_public_only(path: &str) -> bool {
    PUBLIC_ONLY_PATHS.contains(&path)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Surface {
    Login { return_to: Option<String> },
    Signup,
    Home,
}

impl Surface {
    pub fn login() -> Self {
        Self::Login { return_to: None }
    }

    /// The login surface, remembering `path` so the user can be sent back
    /// after signing in. Nothing is remembered when `path` is the login page.
    pub fn login_returning_to<S: Into<String>>(path: S) -> Self {
        let path = path.into();
        Self::Login {
            return_to: (path != LOGIN_PATH).then_some(path),
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login { .. } => LOGIN_PATH,
            Self::Signup => SIGNUP_PATH,
            Self::Home => HOME_PATH,
        }
    }

    /// The path plus any query parameters.
    pub fn location(&self) -> String {
        match self {
            Self::Login {
                return_to: Some(return_to),
            } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(RETURN_TO_PARAM, return_to)
                    .finish();
                format!("{}?{}", LOGIN_PATH, query)
            }
            Self::Login { return_to: None } | Self::Signup | Self::Home => self.path().to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub surface: Surface,
    /// A hard redirect: the host must discard all in-memory state tied to the
    /// current session, not just switch views.
    pub reload: bool,
}

impl Navigation {
    pub fn to(surface: Surface) -> Self {
        Self {
            surface,
            reload: false,
        }
    }

    pub fn reload(surface: Surface) -> Self {
        Self {
            surface,
            reload: true,
        }
    }
}

pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, navigation: Navigation);
}

struct Entries {
    current: String,
    log: Vec<Navigation>,
}

/// An in-memory navigator that tracks the current path and remembers every
/// navigation it was asked to perform.
pub struct History {
    entries: Mutex<Entries>,
    path_tx: watch::Sender<String>,
}

impl History {
    pub fn new<S: Into<String>>(initial_path: S) -> Self {
        let current = initial_path.into();
        let (path_tx, _) = watch::channel(current.clone());
        Self {
            entries: Mutex::new(Entries {
                current,
                log: Vec::new(),
            }),
            path_tx,
        }
    }

    /// Moves to `path` as if the user followed a link; this is not recorded
    /// as a navigation.
    pub fn visit<S: Into<String>>(&self, path: S) {
        let path = path.into();
        self.lock().current = path.clone();
        _ = self.path_tx.send_replace(path);
    }

    pub fn navigations(&self) -> Vec<Navigation> {
        self.lock().log.clone()
    }

    pub fn last(&self) -> Option<Navigation> {
        self.lock().log.last().cloned()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.path_tx.subscribe()
    }

    /// Waits until the current path is `path`.
    pub async fn wait_for(&self, path: &str) -> Result<()> {
        let mut rx = self.subscribe();
        loop {
            if *rx.borrow_and_update() == path {
                return Ok(());
            }
            rx.changed()
                .await
                .map_err(|_| error::Internal::ChannelClosed)?;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Navigator for History {
    fn current_path(&self) -> String {
        self.lock().current.clone()
    }

    fn navigate(&self, navigation: Navigation) {
        info!(
            "Navigating to {}{}",
            navigation.surface.location(),
            if navigation.reload { " (reload)" } else { "" }
        );
        let path = navigation.surface.path().to_owned();
        {
            let mut entries = self.lock();
            entries.current = path.clone();
            entries.log.push(navigation);
        }
        _ = self.path_tx.send_replace(path);
    }
}
