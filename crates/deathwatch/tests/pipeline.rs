//! End-to-end tests for the run pipeline over a scripted portal.
//!
//! The portal serves pages by request label, so the same fixture covers
//! login, status and every watch poll.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use deathwatch::prelude::*;
use deathwatch_transport::{PageRequest, TransportError};

// =========================================================================
// Fixtures
// =========================================================================

const LOGIN_PAGE: &str = r#"<html><body><form action="/account/?page=login">
    <input type="password" name="loginpassword"></form></body></html>"#;

const OVERVIEW: &str = r#"<html><body><table>
    <tr><td>Welcome to your account!</td></tr>
    <tr id="CharacterRow_0"><td>1. Sir Knight Elite Knight - Level 120 - On Antica [Edit] [Delete]</td></tr>
    <tr id="CharacterRow_1"><td>2. Mage Lady Sorcerer - Level 8 - On Secura [Edit] [Delete]</td></tr>
    </table></body></html>"#;

const ONE_CHARACTER: &str = r#"<html><body><table>
    <tr><td>Welcome to your account!</td></tr>
    <tr id="CharacterRow_0"><td>1. Lonely Druid Druid - Level 30 - On Secura [Edit] [Delete]</td></tr>
    </table></body></html>"#;

fn deaths_page(rows: &[(&str, &str)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(date, what)| format!("<tr><td>{date}</td><td>{what}</td><td>Normal</td></tr>"))
        .collect();
    format!(
        "<html><body><b>Character Deaths</b><table class=\"TableContent\">\
         <tr><td>Date</td><td>Description</td><td>Penalty</td></tr>{rows}</table></body></html>"
    )
}

/// Serves queued pages per label; the last page of a label repeats.
#[derive(Default)]
struct ScriptedPortal {
    pages: Mutex<HashMap<String, VecDeque<String>>>,
    seen: Mutex<Vec<PageRequest>>,
}

impl ScriptedPortal {
    fn serve(self, label: &str, page: impl Into<String>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(label.to_string())
            .or_default()
            .push_back(page.into());
        self
    }

    fn requests(&self, label: &str) -> Vec<PageRequest> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.label == label)
            .cloned()
            .collect()
    }
}

impl Fetcher for ScriptedPortal {
    async fn fetch(&self, request: &PageRequest) -> Result<String, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let mut pages = self.pages.lock().unwrap();
        let queue = pages.get_mut(&request.label);
        let page = match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };
        page.ok_or_else(|| TransportError::Status {
            label: request.label.clone(),
            status: 404,
        })
    }
}

#[derive(Default)]
struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    choices_offered: Mutex<Vec<Vec<String>>>,
}

impl ScriptedPrompter {
    fn answering(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|s| s.to_string()).collect()),
            ..Default::default()
        }
    }

    fn next(&self) -> Result<String, SessionError> {
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| SessionError::Prompt("no more answers".into()))
    }
}

impl Prompter for ScriptedPrompter {
    async fn prompt_text(&self, _label: &str) -> Result<String, SessionError> {
        self.next()
    }

    async fn prompt_choice(&self, _label: &str, options: &[String]) -> Result<String, SessionError> {
        self.choices_offered.lock().unwrap().push(options.to_vec());
        self.next()
    }
}

fn context(portal: ScriptedPortal) -> SessionContext<std::sync::Arc<ScriptedPortal>> {
    let credentials = Credentials::new("knight@example.com", "hunter2").unwrap();
    SessionContext::new(std::sync::Arc::new(portal), Portal::default()).with_credentials(credentials)
}

// =========================================================================
// Login and selection
// =========================================================================

#[tokio::test]
async fn test_login_exposes_roster() {
    let ctx = context(
        ScriptedPortal::default()
            .serve("account.html", LOGIN_PAGE)
            .serve("account_overview.html", OVERVIEW),
    );
    let prompter = ScriptedPrompter::default();

    let session = Deathwatch::login(ctx, &prompter, DeathwatchConfig::default())
        .await
        .unwrap();

    let names: Vec<&str> = session.roster().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Sir Knight", "Mage Lady"]);
    assert_eq!(session.context().state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_login_failure_is_session_error() {
    let ctx = context(
        ScriptedPortal::default()
            .serve("account.html", LOGIN_PAGE)
            .serve("account_overview.html", LOGIN_PAGE),
    );
    let prompter = ScriptedPrompter::answering(&["a@b.c", "x", "a@b.c", "y"]);

    let err = Deathwatch::login(ctx, &prompter, DeathwatchConfig::default())
        .await
        .err()
        .expect("login should fail");

    assert!(matches!(
        err,
        DeathwatchError::Session(SessionError::MaxAttempts { attempts: 3 })
    ));
}

#[tokio::test]
async fn test_select_character_prompts_with_roster() {
    let ctx = context(
        ScriptedPortal::default()
            .serve("account.html", LOGIN_PAGE)
            .serve("account_overview.html", OVERVIEW),
    );
    let prompter = ScriptedPrompter::answering(&["7", "mage lady"]);
    let session = Deathwatch::login(ctx, &prompter, DeathwatchConfig::default())
        .await
        .unwrap();

    let name = session.select_character(&prompter).await.unwrap();

    assert_eq!(name, "Mage Lady");
    let offered = prompter.choices_offered.lock().unwrap().clone();
    assert_eq!(offered.len(), 2, "invalid answer re-prompts");
    assert!(offered[0][0].starts_with("1. Sir Knight"));
}

#[tokio::test]
async fn test_configured_character_skips_prompt() {
    let ctx = context(
        ScriptedPortal::default()
            .serve("account.html", LOGIN_PAGE)
            .serve("account_overview.html", OVERVIEW),
    );
    let prompter = ScriptedPrompter::default();
    let config = DeathwatchConfig::builder().character("Someone Else").build();
    let session = Deathwatch::login(ctx, &prompter, config).await.unwrap();

    assert_eq!(session.select_character(&prompter).await.unwrap(), "Someone Else");
    assert!(prompter.choices_offered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_single_character_is_chosen_automatically() {
    let ctx = context(
        ScriptedPortal::default()
            .serve("account.html", LOGIN_PAGE)
            .serve("account_overview.html", ONE_CHARACTER),
    );
    let prompter = ScriptedPrompter::default();
    let session = Deathwatch::login(ctx, &prompter, DeathwatchConfig::default())
        .await
        .unwrap();

    assert_eq!(session.select_character(&prompter).await.unwrap(), "Lonely Druid");
}

// =========================================================================
// Status and watch
// =========================================================================

#[tokio::test]
async fn test_character_status_reads_deaths() {
    let portal = ScriptedPortal::default()
        .serve("account.html", LOGIN_PAGE)
        .serve("account_overview.html", OVERVIEW)
        .serve(
            "character_info.html",
            deaths_page(&[
                ("Jan 05 2024, 21:14:03 CET", "Died at Level 120 by a hydra."),
                ("Jan 01 2024, 10:00:00 CET", "Died at Level 119 by a wyrm."),
            ]),
        );
    let session = Deathwatch::login(context(portal), &ScriptedPrompter::default(), DeathwatchConfig::default())
        .await
        .unwrap();

    let status = session.character_status("Sir Knight").await.unwrap();

    assert_eq!(status.character, "Sir Knight");
    assert_eq!(status.total_deaths, 2);
    let last = status.last_death.unwrap();
    assert_eq!(last.date, "Jan 05 2024, 21:14:03 CET");
    assert_eq!(last.description, "Died at Level 120 by a hydra.");

    let requests = session.context().fetcher().requests("character_info.html");
    assert_eq!(requests[0].query_value("name"), Some("Sir Knight"));
}

#[tokio::test]
async fn test_character_status_unavailable() {
    let portal = ScriptedPortal::default()
        .serve("account.html", LOGIN_PAGE)
        .serve("account_overview.html", OVERVIEW);
    let session = Deathwatch::login(context(portal), &ScriptedPrompter::default(), DeathwatchConfig::default())
        .await
        .unwrap();

    let err = session.character_status("Sir Knight").await.unwrap_err();
    assert!(matches!(err, DeathwatchError::Watch(_)));
    assert!(err.to_string().contains("Sir Knight"));
}

#[tokio::test(start_paused = true)]
async fn test_watch_is_seeded_from_status() {
    let seen = ("Jan 01 2024, 10:00:00 CET", "Died at Level 119 by a wyrm.");
    let fresh = ("Jan 05 2024, 21:14:03 CET", "Died at Level 120 by a hydra.");
    let portal = ScriptedPortal::default()
        .serve("account.html", LOGIN_PAGE)
        .serve("account_overview.html", OVERVIEW)
        .serve("character_info.html", deaths_page(&[seen]))
        .serve("character_info.html", deaths_page(&[seen]))
        .serve("character_info.html", deaths_page(&[fresh, seen]));
    let config = DeathwatchConfig::builder()
        .interval(Duration::from_secs(5))
        .build();
    let session = Deathwatch::login(context(portal), &ScriptedPrompter::default(), config)
        .await
        .unwrap();
    let status = session.character_status("Sir Knight").await.unwrap();

    let (handle, mut events) = session.watch(&status);

    let WatchEvent::Status(first) = events.recv().await.unwrap() else {
        panic!("expected a status event");
    };
    assert!(!first.new_death, "deaths from the status check are already known");

    let WatchEvent::Status(second) = events.recv().await.unwrap() else {
        panic!("expected a status event");
    };
    assert!(second.new_death);
    assert_eq!(second.total_deaths, 2);

    handle.cancel();
    let summary = handle.join().await.unwrap();
    assert_eq!(summary.ticks, 2);
    assert_eq!(summary.alerts, 1);
}
