//! The three requests the portal flow makes.
//!
//! The portal serves a different (and less predictable) page to clients
//! that do not look like a browser, so every request carries the fetch
//! metadata a mobile browser would send for a top-level navigation.

use deathwatch_transport::PageRequest;

use crate::Credentials;

/// Path of every account page.
pub const ACCOUNT_PATH: &str = "/account/";

/// Builds [`PageRequest`]s for one portal origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portal {
    origin: String,
}

impl Default for Portal {
    fn default() -> Self {
        Self::new("https://www.tibia.com")
    }
}

impl Portal {
    /// `origin` is scheme plus host, without a trailing slash.
    pub fn new(origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    fn referer(&self) -> String {
        format!("{}{ACCOUNT_PATH}?subtopic=accountmanagement", self.origin)
    }

    /// Entry page; sets the session cookies the login post needs.
    pub fn login_page(&self) -> PageRequest {
        navigation(PageRequest::get("account.html", ACCOUNT_PATH), "none")
    }

    /// Credential submission. The response is the overview on success,
    /// otherwise a login, PIN or lockout page.
    pub fn account_overview(&self, credentials: &Credentials) -> PageRequest {
        let request = PageRequest::post("account_overview.html", ACCOUNT_PATH)
            .form("loginemail", credentials.email())
            .form("loginpassword", credentials.password())
            .form("page", "overview")
            .header("cache-control", "max-age=0")
            .header("origin", self.origin.clone())
            .header("referer", self.referer());
        navigation(request, "same-origin")
    }

    /// Character management page, which lists the character's deaths.
    pub fn character_info(&self, name: &str) -> PageRequest {
        let request = PageRequest::get("character_info.html", ACCOUNT_PATH)
            .query("subtopic", "accountmanagement")
            .query("page", "changecharacterinformation")
            .query("countryid", "")
            .query("name", name)
            .header("referer", self.referer());
        navigation(request, "same-origin")
    }
}

fn navigation(request: PageRequest, site: &str) -> PageRequest {
    request
        .header("sec-fetch-dest", "document")
        .header("sec-fetch-mode", "navigate")
        .header("sec-fetch-site", site)
        .header("sec-fetch-user", "?1")
        .header("upgrade-insecure-requests", "1")
}
