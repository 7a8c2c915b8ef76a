//! Page interpretation: turning portal markup into typed results.
//!
//! All three functions are pure and infallible. The portal's markup is not
//! a contract, so a page that lacks the expected structure yields a default
//! (`AwaitingPin`, an empty list, a raw-text character) instead of an error.

use std::sync::LazyLock;

use regex::Regex;

use crate::markup::{Document, normalize_ws};
use crate::{CharacterSummary, DeathRecord, SessionState};

/// Text of the account overview's greeting cell.
pub const WELCOME_MARKER: &str = "Welcome to your account!";

/// Heading text (lower-cased) that precedes a character's death list.
pub const DEATHS_MARKER: &str = "character deaths";

const CHARACTER_ROW_PREFIX: &str = "CharacterRow_";

static IP_MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bip\b").expect("static regex"));

static EDITORIAL_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Edit\]\s*\[Delete\]").expect("static regex"));

static LEADING_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\s*").expect("static regex"));

/// Roster line with a known vocation, so multi-word names and vocations
/// split correctly ("Sir Knight Elite Knight - Level 8 - On Antica").
static ROSTER_LINE_KNOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.*?)\s+((?:(?:Elite|Master|Elder|Royal|Exalted)\s+)?(?:Knight|Sorcerer|Druid|Paladin|Monk)|None)\s*-\s*Level\s*(\d+)\s*-\s*On\s*(.+)$",
    )
    .expect("static regex")
});

/// Fallback for vocations not in the list above.
static ROSTER_LINE_ANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\s+([A-Za-z ]+?)\s*-\s*Level\s*(\d+)\s*-\s*On\s*(.+)$")
        .expect("static regex")
});

// ---------------------------------------------------------------------------
// Session classification
// ---------------------------------------------------------------------------

/// Classifies the page returned by a login attempt.
///
/// Checks run in priority order, first match wins:
///
/// 1. a `<td>` containing [`WELCOME_MARKER`] → `Authenticated`
/// 2. an `AttentionSign` element whose parent's text mentions "IP"
///    → `LockedOut`
/// 3. a password input or a form posting to a login URL → `AwaitingLogin`
/// 4. otherwise → `AwaitingPin`
///
/// The lockout check must precede the login-form check: a lockout page
/// still carries the login form. A blank page is `Unknown`.
pub fn classify_session(html: &str) -> SessionState {
    if html.trim().is_empty() {
        return SessionState::Unknown;
    }
    let doc = Document::parse(html);

    if doc.find_all("td").any(|td| td.text().contains(WELCOME_MARKER)) {
        return SessionState::Authenticated;
    }

    let locked_out = doc
        .elements()
        .filter(|e| e.has_class("AttentionSign"))
        .filter_map(|sign| sign.parent())
        .any(|parent| IP_MENTION.is_match(&parent.text()));
    if locked_out {
        return SessionState::LockedOut;
    }

    let password_input = doc
        .find_all("input")
        .any(|input| input.attr("type").is_some_and(|t| t.eq_ignore_ascii_case("password")));
    let login_form = doc.find_all("form").any(|form| {
        form.attr("action")
            .is_some_and(|a| a.to_ascii_lowercase().contains("login"))
    });
    if password_input || login_form {
        return SessionState::AwaitingLogin;
    }

    SessionState::AwaitingPin
}

// ---------------------------------------------------------------------------
// Character roster
// ---------------------------------------------------------------------------

/// Extracts the roster from the account overview.
///
/// One entry per element whose `id` starts with `CharacterRow_`. Lines that
/// do not match `<name> <vocation> - Level <n> - On <world>` become an
/// entry with the raw text as name.
pub fn extract_characters(html: &str) -> Vec<CharacterSummary> {
    let doc = Document::parse(html);
    doc.elements()
        .filter(|e| e.id().is_some_and(|id| id.starts_with(CHARACTER_ROW_PREFIX)))
        .map(|row| parse_roster_line(&row.text()))
        .collect()
}

/// Parses one roster row's text.
pub fn parse_roster_line(raw: &str) -> CharacterSummary {
    let text = normalize_ws(raw);
    let text = EDITORIAL_TOKENS.replace_all(&text, "");
    let text = normalize_ws(&text);
    let text = LEADING_ORDINAL.replace(&text, "").into_owned();

    let captures = ROSTER_LINE_KNOWN
        .captures(&text)
        .or_else(|| ROSTER_LINE_ANY.captures(&text));

    match captures {
        Some(caps) => {
            let level = caps[3].parse().unwrap_or(0);
            CharacterSummary {
                name: caps[1].trim().to_string(),
                vocation: caps[2].trim().to_string(),
                level,
                world: caps[4].trim().to_string(),
            }
        }
        None => CharacterSummary {
            name: text,
            ..Default::default()
        },
    }
}

// ---------------------------------------------------------------------------
// Death list
// ---------------------------------------------------------------------------

/// Extracts a character's deaths, newest first.
///
/// Returns an empty list when the page has no [`DEATHS_MARKER`] heading.
/// Otherwise every row after the first of each `TableContent` table that
/// has exactly three cells becomes a record; other rows are skipped.
pub fn extract_deaths(html: &str) -> Vec<DeathRecord> {
    let doc = Document::parse(html);
    if !doc.body_text().to_lowercase().contains(DEATHS_MARKER) {
        return Vec::new();
    }

    let mut deaths = Vec::new();
    for table in doc.find_all("table").filter(|t| t.has_class("TableContent")) {
        let rows = table
            .descendants()
            .filter(|e| e.name() == "tr")
            .filter(|tr| tr.closest("table").is_some_and(|t| t.is(&table)));

        for row in rows.skip(1) {
            let cells: Vec<String> = row
                .descendants()
                .filter(|e| e.name() == "td")
                .filter(|td| td.closest("tr").is_some_and(|tr| tr.is(&row)))
                .map(|td| td.text())
                .collect();
            if let [date, description, penalty] = cells.as_slice() {
                deaths.push(DeathRecord {
                    date: normalize_ws(date),
                    description: description.trim().to_string(),
                    penalty: penalty.trim().to_string(),
                });
            }
        }
    }
    deaths
}
