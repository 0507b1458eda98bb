// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::task;

use crate::{error::Result, metadata};

#[derive(Debug, Default, Clone)]
pub struct Request {
    account: String,
    error: Option<String>,
}

impl Request {
    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn description(&self) -> String {
        format!("Enter the password for {}", self.account)
    }
}

pub struct RequestBuilder {
    account: String,
    error: Option<String>,
}

impl RequestBuilder {
    pub fn new<S: Into<String>>(account: S) -> Self {
        Self {
            account: account.into(),
            error: None,
        }
    }

    pub fn with_error<S: Into<String>>(mut self, error: S) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn into_request(self) -> Request {
        Request {
            account: self.account,
            error: self.error,
        }
    }
}

#[async_trait]
pub trait Prompt: Send + Sync {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

/// Asks each prompt in turn until one produces a password or fails.
#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

pub struct PinentryPrompt {
    executable: Option<OsString>,
}

impl PinentryPrompt {
    pub const fn new() -> Self {
        Self { executable: None }
    }

    pub fn new_with_executable<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: Some(executable.as_ref().as_os_str().into()),
        }
    }
}

impl Default for PinentryPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Prompt for PinentryPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        fn interact<'input>(
            mut input: pinentry::PassphraseInput<'input>,
            title: &'input str,
            description: &'input str,
            error: Option<&'input String>,
        ) -> Result<SecretString> {
            _ = input.required("A password is required to sign in.");
            _ = input.with_title(title);
            _ = input.with_description(description);
            _ = input.with_prompt("Password");
            if let Some(e) = error {
                _ = input.with_error(e);
            }

            Ok(input.interact()?)
        }

        let title = format!("Sign in - {}", *metadata::CLIENT_DISPLAY_NAME);
        let description = req.description();

        let input = self
            .executable
            .as_ref()
            .and_then(pinentry::PassphraseInput::with_binary)
            .or_else(pinentry::PassphraseInput::with_default_binary)
            .map(|input| {
                task::spawn_blocking(move || {
                    interact(input, &title, &description, req.error.as_ref())
                })
            });

        Ok(match input {
            Some(fut) => Some(fut.await??),
            None => None,
        })
    }
}

pub struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        if let Some(error) = req.error() {
            eprintln!("Error: {error}");
        }
        let prompt = format!("Password for {}: ", req.account());

        Ok(Some(
            task::spawn_blocking(move || rpassword::prompt_password(prompt).map(SecretString::new))
                .await??,
        ))
    }
}

/// The prompts the CLI tries, most capable first.
pub fn default_prompt(pinentry_program: Option<&Path>) -> Vec<Box<dyn Prompt>> {
    vec![
        Box::new(pinentry_program.map_or_else(
            PinentryPrompt::new,
            PinentryPrompt::new_with_executable,
        )),
        Box::new(RpasswordPrompt),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use secrecy::ExposeSecret as _;

    use super::*;
    use crate::error::{self, Error};

    enum Answer {
        Nothing,
        Password(&'static str),
        Fail,
    }

    struct Canned {
        answer: Answer,
        seen: Mutex<Vec<Request>>,
    }

    impl Canned {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Prompt for Canned {
        async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
            self.seen.lock().unwrap().push(req);
            match self.answer {
                Answer::Nothing => Ok(None),
                Answer::Password(p) => Ok(Some(SecretString::new(p.to_owned()))),
                Answer::Fail => Err(error::Password::NoPrompt.into()),
            }
        }
    }

    #[tokio::test]
    async fn falls_through_until_a_prompt_answers() {
        let prompts = vec![
            Canned::new(Answer::Nothing),
            Canned::new(Answer::Password("hunter22")),
            Canned::new(Answer::Fail),
        ];
        let req = RequestBuilder::new("a@example.com")
            .with_error("Invalid credentials")
            .into_request();

        let password = prompts.prompt(req).await.unwrap().unwrap();
        assert_eq!(password.expose_secret(), "hunter22");

        let seen = prompts[0].seen.lock().unwrap();
        assert_eq!(seen[0].account(), "a@example.com");
        assert_eq!(seen[0].error(), Some("Invalid credentials"));
        assert!(prompts[2].seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn errors_stop_the_chain() {
        let prompts = vec![Canned::new(Answer::Fail), Canned::new(Answer::Password("x"))];
        let result = prompts
            .prompt(RequestBuilder::new("a@example.com").into_request())
            .await;
        assert!(matches!(result, Err(Error::Password(error::Password::NoPrompt))));
    }

    #[tokio::test]
    async fn exhausted_chain_yields_nothing() {
        let prompts: Vec<Canned> = vec![Canned::new(Answer::Nothing)];
        let result = prompts
            .prompt(RequestBuilder::new("a@example.com").into_request())
            .await;
        assert!(matches!(result, Ok(None)));
    }
}
