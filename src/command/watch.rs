// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::{error, info};
use tokio::{select, signal};

use crate::{
    context::SessionContext,
    error::{self, Result},
    guard::GuardState,
    navigation::{Surface, HOME_PATH},
    password::Prompt,
};

/// Hold a protected surface open until the session ends.
///
/// The stored session is re-checked whenever another process on this machine
/// changes it and at every polling interval.
#[derive(Debug, Parser)]
pub struct Command {
    /// The path of the protected surface.
    #[arg(long, default_value = HOME_PATH)]
    path: String,
}

impl Command {
    /// Where the navigator should start before the guard is evaluated.
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[async_trait]
impl super::Command for Command {
    fn loads_profile(&self) -> bool {
        true
    }

    async fn execute(self, ctx: &SessionContext, _prompt: &dyn Prompt) -> Result<()> {
        let guard = ctx.guard(true);
        if guard.evaluate().await == GuardState::Denied {
            error!(
                "Not signed in; continue at {}",
                Surface::login_returning_to(self.path.as_str()).location()
            );
            return Err(error::Error::Command);
        }

        let mut state = guard.subscribe();
        let monitor = guard.monitor();
        println!("Watching {}; press Ctrl-C to stop", self.path);

        let outcome = select! {
            r = signal::ctrl_c() => {
                r?;
                info!("Interrupted");
                Ok(())
            }
            r = state.wait_for(|state| *state == GuardState::Denied) => {
                r.map_err(|_| error::Internal::ChannelClosed)?;
                error!(
                    "The session ended; continue at {}",
                    Surface::login_returning_to(self.path.as_str()).location()
                );
                Err(error::Error::Command)
            }
        };

        monitor.dispose().await;
        outcome
    }
}
