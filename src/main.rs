// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
#![warn(
    rust_2018_idioms,
    future_incompatible,
    unused,
    unused_qualifications,
    unused_results,
    clippy::all,
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::{path::PathBuf, process, sync::Arc, time::Duration};

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use eventdesk::{
    command,
    config::{self, Config},
    context::SessionContext,
    error::Result,
    http::{Reqwest, Transport},
    navigation::{History, Navigator, HOME_PATH},
    notify::{Console, Notifier},
    password::{self, Prompt},
    storage::{self, IsPersistent as _, Storage},
};
use log::{error, warn};
use url::Url;

#[derive(Debug, Subcommand)]
enum Command {
    Login(command::login::Command),
    Logout(command::logout::Command),
    Register(command::register::Command),
    Status(command::status::Command),
    Watch(command::watch::Command),
    Whoami(command::whoami::Command),
}

impl Command {
    fn start_path(&self) -> &str {
        match self {
            Self::Watch(cmd) => cmd.path(),
            Self::Login(_)
            | Self::Logout(_)
            | Self::Register(_)
            | Self::Status(_)
            | Self::Whoami(_) => HOME_PATH,
        }
    }
}

#[async_trait]
impl command::Command for Command {
    fn loads_profile(&self) -> bool {
        match self {
            Self::Login(cmd) => command::Command::loads_profile(cmd),
            Self::Logout(cmd) => command::Command::loads_profile(cmd),
            Self::Register(cmd) => command::Command::loads_profile(cmd),
            Self::Status(cmd) => command::Command::loads_profile(cmd),
            Self::Watch(cmd) => command::Command::loads_profile(cmd),
            Self::Whoami(cmd) => command::Command::loads_profile(cmd),
        }
    }

    async fn execute(self, ctx: &SessionContext, prompt: &dyn Prompt) -> Result<()> {
        match self {
            Self::Login(cmd) => cmd.execute(ctx, prompt).await,
            Self::Logout(cmd) => cmd.execute(ctx, prompt).await,
            Self::Register(cmd) => cmd.execute(ctx, prompt).await,
            Self::Status(cmd) => cmd.execute(ctx, prompt).await,
            Self::Watch(cmd) => cmd.execute(ctx, prompt).await,
            Self::Whoami(cmd) => cmd.execute(ctx, prompt).await,
        }
    }
}

fn parse_seconds(value: &str) -> std::result::Result<Duration, String> {
    match value.parse::<u64>() {
        Ok(0) => Err("must be at least one second".to_owned()),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(e.to_string()),
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// The root URL of the Eventdesk API.
    #[arg(long, env = "EVENTDESK_URL", default_value = config::DEFAULT_BASE_URL, value_parser = Url::parse)]
    url: Url,

    /// How often, in seconds, a watched session is re-validated.
    #[arg(long, env = "EVENTDESK_POLL_INTERVAL", default_value = "5", value_parser = parse_seconds)]
    poll_interval: Duration,

    /// How long, in seconds, to wait for the server before giving up on a
    /// request.
    #[arg(long, env = "EVENTDESK_TIMEOUT", default_value = "30", value_parser = parse_seconds)]
    timeout: Duration,

    /// Keep the session in memory only; it ends when the program exits.
    #[arg(long)]
    no_persist_session: bool,

    /// The path to the Pinentry program to use when asking for a password.
    #[arg(long, value_hint = clap::ValueHint::ExecutablePath)]
    pinentry_program: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

fn get_session_storage(args: &Args) -> Arc<dyn Storage> {
    if !args.no_persist_session {
        match storage::File::new("session.json") {
            Ok(file_storage) => return Arc::new(file_storage),
            Err(e) => warn!("The session will not outlive this process: {}", e),
        }
    }

    Arc::new(storage::Memory::new())
}

async fn run(args: Args) -> Result<()> {
    let prompt = password::default_prompt(args.pinentry_program.as_deref());

    let config = Config {
        poll_interval: args.poll_interval,
        request_timeout: args.timeout,
        ..Config::with_base_url(args.url.clone())
    };
    let storage = get_session_storage(&args);
    if !storage.is_persistent() {
        warn!("Session storage is not persistent");
    }
    let transport: Arc<dyn Transport> =
        Arc::new(Reqwest::new(config.base_url.clone(), config.request_timeout)?);
    let navigator: Arc<dyn Navigator> = Arc::new(History::new(args.command.start_path()));
    let notifier: Arc<dyn Notifier> = Arc::new(Console);

    let ctx = SessionContext::new(config, storage, transport, navigator, notifier).await;
    command::run(args.command, &ctx, &prompt).await
}

#[tokio::main]
async fn main() {
    let logger_env = env_logger::Env::new()
        .filter_or("EVENTDESK_LOG", "warn")
        .write_style("EVENTDESK_LOG_STYLE");
    env_logger::Builder::from_env(logger_env).init();

    if let Err(e) = run(Args::parse()).await {
        error!("We encountered an error: {}", e);
        process::exit(1);
    };
}
