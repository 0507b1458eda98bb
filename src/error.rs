// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result};

use thiserror::Error;

pub type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("HTTP error: {0}")]
    Http(#[from] Http),
    #[error("validation error: {0}")]
    Validation(#[from] Validation),
    #[error("API error: {0}")]
    Api(#[from] Api),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("internal communication error: {0}")]
    Internal(#[from] Internal),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// The HTTP status carried by this error, if it came from a server
    /// response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(Http::Status { status, .. }) => Some(*status),
            Self::Io(_)
            | Self::Storage(_)
            | Self::Http(Http::Transport { .. } | Http::Client(_))
            | Self::Validation(_)
            | Self::Api(_)
            | Self::Password(_)
            | Self::Internal(_)
            | Self::Command
            | Self::Cancelled => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Validation(Validation::Json(value)),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

#[derive(Error, Debug)]
pub enum Storage {
    #[error("stored data in {path} is not a JSON object of strings: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
    #[error("no per-user data directory is available on this system")]
    NoProjectDirs,
}

#[derive(Error, Debug)]
pub enum Http {
    /// The request never produced a response.
    #[error("{message}")]
    Transport { message: String },
    /// The server answered with a non-success status.
    #[error("{message} (status {status})")]
    Status { status: u16, message: String },
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Error, Debug)]
pub enum Validation {
    #[error("malformed JSON payload: {0}")]
    Json(serde_json::Error),
    #[error("expected a JSON object, but got {0}")]
    NotAnObject(&'static str),
    #[error("invalid fields: {0}")]
    Fields(#[from] validator::ValidationErrors),
}

impl Validation {
    /// Whether `field` failed validation.
    pub fn concerns(&self, field: &str) -> bool {
        match self {
            Self::Fields(errors) => errors.field_errors().contains_key(field),
            Self::Json(_) | Self::NotAnObject(_) => false,
        }
    }

    /// Whether `field` is the only field that failed validation.
    pub fn concerns_only(&self, field: &str) -> bool {
        match self {
            Self::Fields(errors) => {
                let failed = errors.field_errors();
                failed.len() == 1 && failed.contains_key(field)
            }
            Self::Json(_) | Self::NotAnObject(_) => false,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(value: validator::ValidationErrors) -> Self {
        Self::Validation(value.into())
    }
}

#[derive(Error, Debug)]
pub enum Api {
    #[error("server accepted the credentials but did not return an authorization header")]
    MissingCredential,
    #[error("session token could not be persisted; the session remains unauthenticated")]
    CredentialNotPersisted,
}

#[derive(Error, Debug)]
pub enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}

#[derive(Error, Debug)]
pub enum Internal {
    #[error("channel is closed")]
    ChannelClosed,
}
