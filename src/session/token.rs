// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use secrecy::{ExposeSecret as _, SecretString};

const BEARER_SCHEME: &str = "Bearer";

/// An opaque bearer credential.
#[derive(Clone)]
pub struct Token(SecretString);

impl Token {
    /// Wraps a raw token value. The empty string is not a credential.
    pub fn new<S: Into<String>>(value: S) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(SecretString::new(value)))
        }
    }

    /// Extracts the token from an `Authorization` header value, with or
    /// without its `Bearer` scheme. A bare scheme carries no credential.
    pub fn from_header(value: &str) -> Option<Self> {
        let mut parts = value.split_whitespace();
        let credential = match (parts.next(), parts.next(), parts.next()) {
            (Some(scheme), Some(credential), None) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => {
                credential
            }
            (Some(scheme), None, None) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => return None,
            (Some(credential), None, None) => credential,
            _ => return None,
        };
        Self::new(credential)
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn to_header(&self) -> String {
        format!("{} {}", BEARER_SCHEME, self.expose())
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}
