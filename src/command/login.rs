// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::{error, warn};

use crate::{
    api::LoginPayload,
    context::SessionContext,
    error::{self, Result},
    notify::Notice,
    password::{Prompt, RequestBuilder},
};

/// Sign in with an e-mail address and password.
#[derive(Debug, Parser)]
pub struct Command {
    /// The e-mail address of the account.
    #[arg(long, short, env = "EVENTDESK_EMAIL")]
    email: String,

    /// Sign in to the administration surface.
    #[arg(long)]
    admin: bool,
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

            let payload = LoginPayload {
                email: self.email.clone(),
                password,
                admin: self.admin.then_some(true),
            };
            match ctx.controller().login(&payload).await {
                Ok(()) => {
                    report(ctx);
                    return Ok(());
                }
                // Rejected credentials are worth another try; anything else
                // is not.
                Err(e) if e.status().is_some_and(|status| (400..500).contains(&status)) => {
                    warn!("Sign-in was rejected: {}", e);
                    rejection = Some(e.to_string());
                }
                Err(e) => return Err(e),
            }
        }

        error!("Giving up after {} attempts", super::MAX_PASSWORD_ATTEMPTS);
        Err(error::Error::Command)
    }
}

fn report(ctx: &SessionContext) {
    match ctx.profile().profile() {
        Some(profile) => ctx.notifier().notify(Notice::success(format!(
            "Signed in as {} <{}>",
            profile.full_name(),
            profile.email
        ))),
        None => ctx.notifier().notify(Notice::warning(format!(
            "Signed in, but the profile could not be loaded: {}",
            ctx.profile()
                .error()
                .unwrap_or_else(|| "unknown error".to_owned())
        ))),
    }
}
