// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;

use crate::error;

use super::{Response, TransportError};

pub const UNAUTHORIZED: u16 = 401;
pub const FALLBACK_MESSAGE: &str = "An error occurred";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Failure {
    /// No response was received.
    Transport { message: String },
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
}

impl Failure {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { .. } => None,
            Self::Status { status, .. } => Some(*status),
        }
    }

    /// Whether the server rejected the credentials as invalid or expired.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(UNAUTHORIZED)
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message } | Self::Status { message, .. } => message,
        }
    }
}

impl From<Failure> for error::Http {
    fn from(value: Failure) -> Self {
        match value {
            Failure::Transport { message } => Self::Transport { message },
            Failure::Status { status, message } => Self::Status { status, message },
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<serde_json::Value>,
}

/// The `error` field of a JSON error body, when it is a non-blank string.
fn server_message(resp: &Response) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(&resp.body)
        .ok()
        .and_then(|body| match body.error {
            Some(serde_json::Value::String(message)) if !message.trim().is_empty() => {
                Some(message)
            }
            Some(_) | None => None,
        })
}

fn or_fallback(message: String) -> String {
    if message.trim().is_empty() {
        FALLBACK_MESSAGE.to_owned()
    } else {
        message
    }
}

/// Splits a transport outcome into a usable response or a failure, picking
/// the most specific message available: the server's `error` field, then the
/// transport-level description, then a generic fallback.
pub fn classify(outcome: Result<Response, TransportError>) -> Result<Response, Failure> {
    match outcome {
        Ok(resp) if resp.is_success() => Ok(resp),
        Ok(resp) => {
            let message = server_message(&resp).unwrap_or_else(|| {
                format!("Request failed with status code {}", resp.status)
            });
            Err(Failure::Status {
                status: resp.status,
                message,
            })
        }
        Err(err) => Err(Failure::Transport {
            message: or_fallback(err.message),
        }),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn success_passes_through() {
        let resp = Response::new(204);
        assert_eq!(classify(Ok(resp.clone())), Ok(resp));
    }

    #[test]
    fn server_message_wins() {
        let failure =
            classify(Ok(Response::new(401).with_json(&json!({ "error": "Token expired" }))))
                .unwrap_err();
        assert!(failure.is_unauthorized());
        assert_eq!(failure.message(), "Token expired");
    }

    #[test]
    fn status_description_is_second_choice() {
        for body in [json!({}), json!({ "error": "" }), json!({ "error": { "code": 7 } })] {
            let failure = classify(Ok(Response::new(500).with_json(&body))).unwrap_err();
            assert_eq!(failure.message(), "Request failed with status code 500");
            assert!(!failure.is_unauthorized());
        }

        let mut not_json = Response::new(502);
        not_json.body = b"<html>Bad gateway</html>".to_vec();
        assert_eq!(
            classify(Ok(not_json)).unwrap_err().message(),
            "Request failed with status code 502"
        );
    }

    #[test]
    fn transport_errors_fall_back_to_generic_message() {
        let failure = classify(Err(TransportError::new("connection refused"))).unwrap_err();
        assert_eq!(failure.message(), "connection refused");
        assert_eq!(failure.status(), None);

        let failure = classify(Err(TransportError::new(""))).unwrap_err();
        assert_eq!(failure.message(), FALLBACK_MESSAGE);
    }
}
