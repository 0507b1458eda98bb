// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;
use secrecy::SecretString;
use validator::Validate as _;

use crate::{
    api::RegisterPayload,
    context::SessionContext,
    error::{self, Result},
    notify::Notice,
    password::{Prompt, RequestBuilder},
};

/// Register a new company together with its first account.
#[derive(Debug, Parser)]
pub struct Command {
    /// The name of the company.
    #[arg(long)]
    company_name: String,

    /// The branch or office of the company.
    #[arg(long)]
    branch: String,

    /// The postal address of the company.
    #[arg(long)]
    address: String,

    /// A contact telephone number.
    #[arg(long)]
    contact_no: String,

    /// The e-mail address of the account to create.
    #[arg(long, short)]
    email: String,

    #[arg(long)]
    first_name: String,

    #[arg(long)]
    last_name: String,

    /// The position of the account holder within the company.
    #[arg(long)]
    position: String,

    /// A previously uploaded company logo.
    #[arg(long)]
    logo_path: Option<String>,

    /// The account holder was invited by an existing company.
    #[arg(long)]
    from_invitation: bool,
}

impl Command {
    fn payload(&self, password: SecretString) -> RegisterPayload {
        RegisterPayload {
            address: self.address.clone(),
            branch: self.branch.clone(),
            company_name: self.company_name.clone(),
            contact_no: self.contact_no.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            from_invitation: self.from_invitation,
            last_name: self.last_name.clone(),
            logo_path: self.logo_path.clone(),
            password,
            position: self.position.clone(),
        }
    }
}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &SessionContext, prompt: &dyn Prompt) -> Result<()> {
        let mut rejection: Option<String> = None;

        for _ in 0..super::MAX_PASSWORD_ATTEMPTS {
            let mut req = RequestBuilder::new(self.email.as_str());
            if let Some(message) = rejection.take() {
                req = req.with_error(message);
            }
            let password = prompt
                .prompt(req.into_request())
                .await?
                .ok_or(error::Password::NoPrompt)?;

            let payload = self.payload(password);
            if let Err(e) = payload.validate().map_err(error::Validation::from) {
                if e.concerns_only("password") {
                    rejection = Some(e.to_string());
                    continue;
                }
                return Err(e.into());
            }

            ctx.controller().register(&payload).await?;
            ctx.notifier().notify(Notice::success(format!(
                "Registered {}; sign in as {} to continue",
                self.company_name, self.email
            )));
            return Ok(());
        }

        error!("Giving up after {} attempts", super::MAX_PASSWORD_ATTEMPTS);
        Err(error::Error::Command)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        api,
        command::Command as _,
        config::Config,
        http::{Response, Transport},
        navigation::{History, Navigator},
        notify::Notifier,
        password::Request,
        storage::Memory,
        testing::{Recorder, Scripted},
    };

    struct Answers {
        passwords: Mutex<Vec<&'static str>>,
        errors: Mutex<Vec<Option<String>>>,
    }

    #[async_trait]
    impl Prompt for Answers {
        async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
            self.errors.lock().unwrap().push(req.error().map(str::to_owned));
            let password = self.passwords.lock().unwrap().remove(0);
            Ok(Some(SecretString::new(password.to_owned())))
        }
    }

    fn command(email: &str) -> Command {
        Command {
            company_name: "Example Events".to_owned(),
            branch: "HQ".to_owned(),
            address: "1 Main Street".to_owned(),
            contact_no: "+1 555 0100".to_owned(),
            email: email.to_owned(),
            first_name: "A".to_owned(),
            last_name: "Organizer".to_owned(),
            position: "Owner".to_owned(),
            logo_path: None,
            from_invitation: false,
        }
    }

    async fn context() -> (SessionContext, Arc<Scripted>) {
        let transport = Arc::new(Scripted::new(|_| Ok(Response::new(200))));
        let ctx = SessionContext::new(
            Config::default(),
            Arc::new(Memory::new()),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(History::new("/signup")) as Arc<dyn Navigator>,
            Arc::new(Recorder::default()) as Arc<dyn Notifier>,
        )
        .await;
        (ctx, transport)
    }

    #[tokio::test]
    async fn short_passwords_are_asked_for_again() {
        let (ctx, transport) = context().await;
        let prompt = Answers {
            passwords: Mutex::new(vec!["12345", "hunter22"]),
            errors: Mutex::new(Vec::new()),
        };

        command("owner@example.com")
            .execute(&ctx, &prompt)
            .await
            .unwrap();

        let errors = prompt.errors.lock().unwrap().clone();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], None);
        assert!(errors[1]
            .as_deref()
            .is_some_and(|e| e.contains("at least 6 characters")));
        assert_eq!(transport.paths(), vec![api::REGISTER_PATH]);
    }

    #[tokio::test]
    async fn other_invalid_fields_fail_without_asking_again() {
        let (ctx, transport) = context().await;
        let prompt = Answers {
            passwords: Mutex::new(vec!["12345", "hunter22"]),
            errors: Mutex::new(Vec::new()),
        };

        let err = command("owner").execute(&ctx, &prompt).await.unwrap_err();
        assert!(matches!(err, error::Error::Validation(e) if e.concerns("email")));
        assert_eq!(prompt.errors.lock().unwrap().len(), 1);
        assert!(transport.paths().is_empty());
    }
}
