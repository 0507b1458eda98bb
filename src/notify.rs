// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! User-visible notices.

use std::{fmt, sync::Arc};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "Success",
            Self::Warning => "Warning",
            Self::Error => "Error",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn warning<S: Into<String>>(message: S) -> Self {
        Self {
            level: Level::Warning,
            message: message.into(),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.level, self.message)
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

impl<T: Notifier + ?Sized> Notifier for Box<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    fn notify(&self, notice: Notice) {
        (**self).notify(notice);
    }
}

/// Prints notices for a person at a terminal.
pub struct Console;

impl Notifier for Console {
    fn notify(&self, notice: Notice) {
        eprintln!("{notice}");
    }
}
