//! The command flows: login, then list, report or watch.

use std::io::{self, Write};

use anyhow::Context;
use deathwatch::prelude::*;

use crate::prompt::{StdinPrompter, confirm};
use crate::render::{self, Level};
use crate::{Cli, Command};

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let portal_config = PortalConfig::with_base_url(cli.base_url.clone());
    let portal = Portal::new(cli.base_url.clone());
    let fetcher = HttpFetcher::new(portal_config).context("failed to set up the HTTP client")?;

    match cli.dump_dir.clone() {
        Some(dir) => {
            tracing::debug!(dir = %dir.display(), "dumping fetched pages");
            run(DumpingFetcher::new(fetcher, dir), portal, cli).await
        }
        None => run(fetcher, portal, cli).await,
    }
}

async fn run<F: Fetcher>(fetcher: F, portal: Portal, cli: Cli) -> anyhow::Result<()> {
    let prompter = StdinPrompter;
    // Progress goes to stderr when stdout carries JSON.
    let mut out: Box<dyn Write> = if matches!(cli.cmd, Some(Command::Status { json: true })) {
        Box::new(io::stderr())
    } else {
        Box::new(io::stdout())
    };
    let interactive = cli.cmd.is_none();
    if interactive {
        render::banner(&mut out)?;
    }

    let credentials = credentials(&cli, &prompter).await?;
    let ctx = SessionContext::new(fetcher, portal).with_credentials(credentials);

    render::message(&mut out, Level::Info, "Logging in...")?;
    let session = Deathwatch::login(ctx, &prompter, config(&cli))
        .await
        .context("login failed")?;
    render::message(&mut out, Level::Success, "Logged in")?;

    if let Some(Command::Roster) = cli.cmd {
        render::roster(&mut out, session.roster())?;
        return Ok(());
    }

    let character = session.select_character(&prompter).await?;
    render::message(&mut out, Level::Success, &format!("Character: {character}"))?;
    let status = session.character_status(&character).await?;

    match cli.cmd {
        Some(Command::Status { json: true }) => {
            println!("{}", serde_json::to_string_pretty(&status)?);
            return Ok(());
        }
        Some(Command::Status { json: false }) => {
            render::status(&mut out, &status)?;
            return Ok(());
        }
        _ => render::status(&mut out, &status)?,
    }

    let confirmed = matches!(cli.cmd, Some(Command::Watch { yes: true }));
    if !confirmed && !keep_watching(&prompter).await? {
        return Ok(());
    }

    let (handle, mut events) = session.watch(&status);
    let cancel = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping watch");
            cancel.cancel();
        }
    });

    while let Some(event) = events.recv().await {
        render::watch_event(&mut out, &event)?;
    }
    let summary = handle.join().await?;
    render::summary(&mut out, &summary)?;
    Ok(())
}

/// Credentials from flags or the environment, prompting for what is
/// missing.
async fn credentials(cli: &Cli, prompter: &StdinPrompter) -> anyhow::Result<Credentials> {
    let email = match cli.email.clone() {
        Some(email) => email,
        None => prompter.prompt_text("Email: ").await?,
    };
    let password = match cli.password.clone() {
        Some(password) => password,
        None => prompter.prompt_secret("Password: ").await?,
    };
    Ok(Credentials::new(email, password)?)
}

async fn keep_watching(prompter: &StdinPrompter) -> anyhow::Result<bool> {
    Ok(confirm(prompter, "Keep watching this character for new deaths? (y/n): ").await?)
}

pub(crate) fn config(cli: &Cli) -> DeathwatchConfig {
    let detection = if cli.same_day {
        DetectionMode::SameDay
    } else {
        DetectionMode::EdgeTriggered
    };
    let mut builder = DeathwatchConfig::builder()
        .interval(std::time::Duration::from_secs(cli.interval))
        .detection(detection);
    if let Some(name) = &cli.character {
        builder = builder.character(name.clone());
    }
    builder.build()
}
