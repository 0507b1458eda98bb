// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{context::SessionContext, error::Result, notify::Notice, password::Prompt};

/// Sign out, revoking the session on the server when possible.
#[derive(Debug, Parser)]
pub struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute(self, ctx: &SessionContext, _prompt: &dyn Prompt) -> Result<()> {
        ctx.controller().logout().await;
        ctx.notifier().notify(Notice::success("Signed out"));
        Ok(())
    }
}
