// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    context::SessionContext, error::Result, password::Prompt, storage::IsPersistent as _,
};

/// Report whether a session is stored, without contacting the server.
#[derive(Debug, Parser)]
pub struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &SessionContext, _prompt: &dyn Prompt) -> Result<()> {
        if ctx.store().is_authenticated().await {
            println!("Signed in");
        } else {
            println!("Not signed in");
        }
        if !ctx.store().is_persistent() {
            println!("Session storage is not persistent");
        }
        Ok(())
    }
}
