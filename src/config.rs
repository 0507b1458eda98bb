// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api/";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Runtime settings shared by every component of a session context.
#[derive(Clone, Debug)]
pub struct Config {
    /// Backend root. Endpoint paths are resolved relative to it.
    pub base_url: Url,
    /// How often a protected route guard re-validates the stored session.
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    pub fn with_base_url(mut base_url: Url) -> Self {
        // Url::join would otherwise replace the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Self {
            base_url,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap_or_else(|_| unreachable!()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
