// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Test doubles for the pipeline's collaborators.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::{
    http::{Request, Response, Transport, TransportError},
    notify::{Notice, Notifier},
};

type Handler = dyn Fn(&Request) -> Result<Response, TransportError> + Send + Sync;

/// A transport that answers from a closure and remembers every request.
pub(crate) struct Scripted {
    handler: Box<Handler>,
    requests: Mutex<Vec<Request>>,
}

impl Scripted {
    pub(crate) fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> Result<Response, TransportError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|req| req.path).collect()
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn send(&self, req: Request) -> Result<Response, TransportError> {
        let outcome = (self.handler)(&req);
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req);
        outcome
    }
}

#[derive(Default)]
pub(crate) struct Recorder {
    notices: Mutex<Vec<Notice>>,
}

impl Recorder {
    pub(crate) fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for Recorder {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
