//! Terminal implementation of [`Prompter`].
//!
//! Reads happen on Tokio's blocking pool so the runtime keeps driving
//! timers and signals while the user types.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use deathwatch::prelude::*;

/// Reads answers from stdin. Secrets are read with echo off when stdin is
/// a terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    async fn prompt_text(&self, label: &str) -> Result<String, SessionError> {
        let label = label.to_string();
        blocking(move || read_line(&label)).await
    }

    async fn prompt_secret(&self, label: &str) -> Result<String, SessionError> {
        let label = label.to_string();
        blocking(move || {
            if io::stdin().is_terminal() {
                read_hidden(&label)
            } else {
                read_line(&label)
            }
        })
        .await
    }

    async fn prompt_choice(&self, label: &str, options: &[String]) -> Result<String, SessionError> {
        let label = label.to_string();
        let options = options.to_vec();
        blocking(move || {
            let mut stdout = io::stdout();
            for option in &options {
                writeln!(stdout, "  {option}")?;
            }
            read_line(&label)
        })
        .await
    }
}

/// Asks a yes/no question. Anything but "y"/"yes" is a no.
pub async fn confirm<P: Prompter>(prompter: &P, label: &str) -> Result<bool, SessionError> {
    let answer = prompter.prompt_text(label).await?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

async fn blocking<F>(read: F) -> Result<String, SessionError>
where
    F: FnOnce() -> io::Result<String> + Send + 'static,
{
    tokio::task::spawn_blocking(read)
        .await
        .map_err(|e| SessionError::Prompt(e.to_string()))?
        .map_err(|e| SessionError::Prompt(e.to_string()))
}

fn read_line(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Leaves raw mode when dropped, also on early return.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_hidden(label: &str) -> io::Result<String> {
    let mut stdout = io::stdout();
    write!(stdout, "{label}")?;
    stdout.flush()?;

    let mut secret = String::new();
    {
        let _raw = RawMode::enable()?;
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break,
                KeyCode::Backspace => {
                    secret.pop();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
                }
                KeyCode::Char(c) => secret.push(c),
                _ => {}
            }
        }
    }
    writeln!(stdout)?;
    Ok(secret)
}
