//! Console output: banner, tagged messages, roster, status and watch
//! screens.
//!
//! Every function writes to a caller-supplied [`Write`] through
//! crossterm commands, so the same code drives the terminal and the
//! tests' byte buffers.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use crossterm::queue;
use deathwatch::prelude::*;

const BANNER: &str = r"
  ___           _   _                  _      _
 |   \ ___ __ _| |_| |_ __ __ ____ _| |_ __| |_
 | |) / -_) _` |  _| ' \\ V  V / _` |  _/ _| ' \
 |___/\___\__,_|\__|_||_\_/\_/\__,_|\__\__|_||_|
";

/// Severity tag of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }

    fn color(self) -> Color {
        match self {
            Self::Info => Color::Cyan,
            Self::Success => Color::Green,
            Self::Warning => Color::Yellow,
            Self::Error => Color::Red,
        }
    }
}

pub fn banner(out: &mut impl Write) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(Color::Blue),
        Print(BANNER),
        ResetColor,
        Print("\n  Your email and password are only sent to the account portal.\n\n")
    )?;
    out.flush()
}

/// Prints `[  level  ] message` with a coloured tag.
pub fn message(out: &mut impl Write, level: Level, text: &str) -> io::Result<()> {
    queue!(
        out,
        SetForegroundColor(level.color()),
        Print(format!("[  {}  ]", level.tag())),
        ResetColor,
        Print(format!(" {text}\n"))
    )?;
    out.flush()
}

pub fn roster(out: &mut impl Write, characters: &[CharacterSummary]) -> io::Result<()> {
    message(out, Level::Info, "Characters on this account:")?;
    for (i, character) in characters.iter().enumerate() {
        queue!(out, Print(format!("  {}. {character}\n", i + 1)))?;
    }
    out.flush()
}

pub fn status(out: &mut impl Write, status: &CharacterStatus) -> io::Result<()> {
    message(
        out,
        Level::Info,
        &format!(
            "Character: {} | Deaths: {}",
            status.character, status.total_deaths
        )
    )?;
    last_death(out, status.last_death.as_ref())
}

/// Redraws the screen for one watch event.
pub fn watch_event(out: &mut impl Write, event: &WatchEvent) -> io::Result<()> {
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    match event {
        WatchEvent::Status(report) => {
            if report.new_death {
                queue!(
                    out,
                    SetForegroundColor(Color::Red),
                    SetAttribute(Attribute::Bold),
                    Print(format!("NEW DEATH: {}\n", report.character)),
                    SetAttribute(Attribute::Reset),
                    ResetColor
                )?;
            }
            message(
                out,
                Level::Warning,
                &format!(
                    "Poll {} | Character: {} | Deaths: {}",
                    report.tick, report.character, report.total_deaths
                )
            )?;
            last_death(out, report.last_death.as_ref())
        }
        WatchEvent::PageUnavailable { tick } => message(
            out,
            Level::Error,
            &format!("Poll {tick}: character page unavailable, retrying next poll"),
        ),
    }
}

pub fn summary(out: &mut impl Write, summary: &WatchSummary) -> io::Result<()> {
    message(
        out,
        Level::Success,
        &format!(
            "Watch stopped after {} polls ({} new deaths, {} unavailable)",
            summary.ticks, summary.alerts, summary.unavailable
        ),
    )
}

fn last_death(out: &mut impl Write, death: Option<&DeathRecord>) -> io::Result<()> {
    match death {
        Some(death) => queue!(
            out,
            Print("Last death:\n"),
            Print(format!("  Date:        {}\n", death.date)),
            Print(format!("  Description: {}\n", death.description)),
            Print(format!("  Penalty:     {}\n", death.penalty))
        )?,
        None => queue!(out, Print("No deaths listed.\n"))?,
    }
    out.flush()
}
