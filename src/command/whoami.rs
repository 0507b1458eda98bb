// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::error;
use tabled::{settings::Style, Table};

use crate::{
    context::SessionContext,
    error::{self, Result},
    password::Prompt,
};

/// Show the profile of the signed-in account.
#[derive(Debug, Parser)]
pub struct Command {}

#[async_trait]
impl super::Command for Command {
    fn loads_profile(&self) -> bool {
        true
    }

    async fn execute(self, ctx: &SessionContext, _prompt: &dyn Prompt) -> Result<()> {
        if !ctx.controller().is_logged_in() {
            error!("Not signed in");
            return Err(error::Error::Command);
        }

        let Some(profile) = ctx.profile().profile() else {
            error!(
                "The profile could not be loaded: {}",
                ctx.profile()
                    .error()
                    .unwrap_or_else(|| "unknown error".to_owned())
            );
            return Err(error::Error::Command);
        };

        println!("{} <{}>", profile.full_name(), profile.email);
        println!("Company e-mail: {}", profile.company_email);
        if let Some(subscription) = &profile.subscription_type {
            println!("Subscription: {}", subscription);
        }
        if !profile.is_verified {
            println!("This account has not been verified");
        }
        println!("{}", Table::new(&profile.roles).with(Style::rounded()));
        Ok(())
    }
}
