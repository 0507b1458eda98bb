// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{context::SessionContext, error::Result, password::Prompt};

pub mod login;
pub mod logout;
pub mod register;
pub mod status;
pub mod watch;
pub mod whoami;

/// Attempts at entering a password before a command gives up.
const MAX_PASSWORD_ATTEMPTS: usize = 3;

#[async_trait]
pub trait Command {
    /// Whether the command works with the profile of a stored session.
    fn loads_profile(&self) -> bool {
        false
    }

    async fn execute(self, ctx: &SessionContext, prompt: &dyn Prompt) -> Result<()>;
}

/// Runs `command`, first loading the profile of a stored session if the
/// command needs one.
pub async fn run<C: Command + Send>(
    command: C,
    ctx: &SessionContext,
    prompt: &dyn Prompt,
) -> Result<()> {
    if command.loads_profile() {
        ctx.init().await;
    }
    command.execute(ctx, prompt).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use serde_json::json;

    use super::*;
    use crate::{
        api,
        config::Config,
        http::{Response, Transport},
        navigation::{History, Navigator},
        notify::Notifier,
        password::Request,
        profile::model::fixtures,
        session::{SessionStore, Token},
        storage::Memory,
        testing::{Recorder, Scripted},
    };

    struct NoPrompt;

    #[async_trait]
    impl Prompt for NoPrompt {
        async fn prompt(&self, _req: Request) -> Result<Option<SecretString>> {
            Ok(None)
        }
    }

    async fn signed_in_context() -> (SessionContext, Arc<Scripted>) {
        let storage = Memory::new();
        let seeded = SessionStore::new(Arc::new(storage.share()));
        seeded.set_token(&Token::new("abc123").unwrap()).await.unwrap();

        let transport = Arc::new(Scripted::new(|req| match req.path.as_str() {
            api::SESSION_INFO_PATH => Ok(Response::new(200).with_json(&fixtures::profile_json())),
            _ => Ok(Response::new(404).with_json(&json!({ "message": "Not found" }))),
        }));
        let ctx = SessionContext::new(
            Config::default(),
            Arc::new(storage),
            Arc::clone(&transport) as Arc<dyn Transport>,
            Arc::new(History::new("/")) as Arc<dyn Navigator>,
            Arc::new(Recorder::default()) as Arc<dyn Notifier>,
        )
        .await;
        (ctx, transport)
    }

    #[tokio::test]
    async fn offline_commands_leave_the_server_alone() {
        let (ctx, transport) = signed_in_context().await;

        run(status::Command {}, &ctx, &NoPrompt).await.unwrap();
        assert!(transport.paths().is_empty());
        assert_eq!(ctx.profile().profile(), None);
    }

    #[tokio::test]
    async fn profile_commands_load_the_stored_session() {
        let (ctx, transport) = signed_in_context().await;

        run(whoami::Command {}, &ctx, &NoPrompt).await.unwrap();
        assert_eq!(transport.paths(), vec![api::SESSION_INFO_PATH]);
        assert_eq!(ctx.profile().company_id().as_deref(), Some("c42"));
    }
}
