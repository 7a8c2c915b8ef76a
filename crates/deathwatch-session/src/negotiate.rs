//! Login negotiation and character selection.
//!
//! ```text
//! login page ──→ submit credentials ──→ classify
//!                     ↑                    │
//!                     │   AwaitingLogin ───┤ (fresh credentials from prompter)
//!                     └── AwaitingPin  ────┤ (same credentials)
//!                                          │
//!            Authenticated ←───────────────┤
//!            LockedOut / Unknown ←─────────┘ (stop)
//! ```
//!
//! Rejected logins, PIN prompts and blank re-entered credentials share one
//! retry budget; no more than `max_attempts` submissions are ever made.

use deathwatch_protocol::{
    CharacterSummary, Credentials, SessionState, classify_session, extract_characters,
};
use deathwatch_transport::Fetcher;

use crate::{Prompter, SessionConfig, SessionContext, SessionError};

/// The account overview reached by a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedPage {
    /// Raw overview markup.
    pub html: String,
    /// Characters on the account. Never empty.
    pub roster: Vec<CharacterSummary>,
}

/// Drives the login flow until the account overview is reached.
///
/// On success the context is `Authenticated` and holds the credentials
/// that worked.
///
/// # Errors
/// - [`SessionError::MissingCredentials`] if the context has none
/// - [`SessionError::PageUnavailable`] if a page cannot be fetched
/// - [`SessionError::MaxAttempts`] once the retry budget is spent
/// - [`SessionError::LockedOut`] / [`SessionError::UnrecognizedPage`]
///   immediately on those classifications
/// - [`SessionError::EmptyRoster`] if the overview lists no characters
/// - [`SessionError::Prompt`] if fresh credentials cannot be read
pub async fn negotiate<F, P>(
    ctx: &mut SessionContext<F>,
    prompter: &P,
    config: &SessionConfig,
) -> Result<AuthenticatedPage, SessionError>
where
    F: Fetcher,
    P: Prompter,
{
    let max_attempts = config.clone().validated().max_attempts;
    if ctx.credentials().is_none() {
        return Err(SessionError::MissingCredentials);
    }

    tracing::info!("loading login page");
    let login = ctx.portal().login_page();
    ctx.require(&login).await?;

    let mut failures = 0u32;
    loop {
        let credentials = ctx
            .credentials()
            .cloned()
            .ok_or(SessionError::MissingCredentials)?;
        let attempt = failures + 1;
        tracing::info!(attempt, email = %credentials.email(), "submitting credentials");

        let request = ctx.portal().account_overview(&credentials);
        let page = ctx.require(&request).await?;
        let state = ctx.advance(classify_session(&page))?;
        tracing::debug!(attempt, %state, "login page classified");

        match state {
            SessionState::Authenticated => {
                let roster = extract_characters(&page);
                if roster.is_empty() {
                    tracing::error!("authenticated page lists no characters");
                    return Err(SessionError::EmptyRoster);
                }
                tracing::info!(
                    outcome = "success",
                    characters = roster.len(),
                    "account authenticated"
                );
                return Ok(AuthenticatedPage { html: page, roster });
            }
            SessionState::AwaitingLogin => {
                failures += 1;
                tracing::warn!(attempt = failures, max_attempts, "invalid email or password");
                if failures >= max_attempts {
                    return Err(SessionError::MaxAttempts { attempts: failures });
                }
                loop {
                    match prompt_credentials(prompter).await {
                        Ok(fresh) => {
                            ctx.set_credentials(fresh);
                            break;
                        }
                        Err(SessionError::InvalidCredentials(err)) => {
                            failures += 1;
                            tracing::warn!(attempt = failures, max_attempts, %err, "blank credentials entered");
                            if failures >= max_attempts {
                                return Err(SessionError::MaxAttempts { attempts: failures });
                            }
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
            SessionState::AwaitingPin => {
                failures += 1;
                tracing::warn!(attempt = failures, max_attempts, "portal asks for a PIN");
                if failures >= max_attempts {
                    return Err(SessionError::MaxAttempts { attempts: failures });
                }
            }
            SessionState::LockedOut => {
                tracing::error!("login blocked for this IP");
                return Err(SessionError::LockedOut);
            }
            SessionState::Unknown => {
                tracing::error!("login attempt returned an unrecognized page");
                return Err(SessionError::UnrecognizedPage);
            }
        }
    }
}

async fn prompt_credentials<P: Prompter>(prompter: &P) -> Result<Credentials, SessionError> {
    let email = prompter.prompt_text("Email: ").await?;
    let password = prompter.prompt_secret("Password: ").await?;
    Ok(Credentials::new(email.trim(), password.trim())?)
}

// ---------------------------------------------------------------------------
// Character selection
// ---------------------------------------------------------------------------

/// Picks the character to watch.
///
/// A non-blank `preconfigured` name wins without looking at the roster.
/// Otherwise a single-entry roster is chosen automatically, and a longer
/// one is offered through [`Prompter::prompt_choice`]. Answers are a
/// 1-based index or a name (case-insensitive); invalid answers re-prompt
/// up to `max_selection_attempts` times.
///
/// # Errors
/// - [`SessionError::EmptyRoster`] if there is nothing to choose from
/// - [`SessionError::SelectionFailed`] once the re-prompt budget is spent
pub async fn select_character<P: Prompter>(
    roster: &[CharacterSummary],
    preconfigured: Option<&str>,
    prompter: &P,
    config: &SessionConfig,
) -> Result<String, SessionError> {
    if let Some(name) = preconfigured.map(str::trim).filter(|n| !n.is_empty()) {
        tracing::debug!(character = %name, "using configured character");
        return Ok(name.to_string());
    }

    match roster {
        [] => Err(SessionError::EmptyRoster),
        [only] => {
            tracing::info!(outcome = "success", character = %only.name, "only character selected");
            Ok(only.name.clone())
        }
        _ => {
            let max = config.clone().validated().max_selection_attempts;
            let options: Vec<String> = roster
                .iter()
                .enumerate()
                .map(|(i, c)| format!("{}. {c}", i + 1))
                .collect();

            for attempt in 1..=max {
                let answer = prompter
                    .prompt_choice("Choose a character (number or name): ", &options)
                    .await?;
                if let Some(chosen) = resolve_choice(roster, &answer) {
                    tracing::info!(outcome = "success", character = %chosen.name, "character selected");
                    return Ok(chosen.name.clone());
                }
                tracing::warn!(attempt, max, answer = %answer.trim(), "character not available");
            }
            Err(SessionError::SelectionFailed { attempts: max })
        }
    }
}

/// Matches an answer against the roster by 1-based index or by name.
fn resolve_choice<'r>(roster: &'r [CharacterSummary], answer: &str) -> Option<&'r CharacterSummary> {
    let answer = answer.trim();
    if answer.is_empty() {
        return None;
    }
    if let Ok(index) = answer.parse::<usize>() {
        return index.checked_sub(1).and_then(|i| roster.get(i));
    }
    roster.iter().find(|c| c.name.eq_ignore_ascii_case(answer))
}
