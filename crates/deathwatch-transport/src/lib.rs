//! Page fetching layer for Deathwatch.
//!
//! Provides the [`Fetcher`] trait that abstracts over how raw account pages
//! are retrieved, plus the [`PageRequest`] description every fetch takes.
//!
//! Session continuity matters: the portal's multi-step login only works when
//! cookies set by one response are sent with the next request, so every
//! [`Fetcher`] implementation must keep its cookie store for its lifetime.
//!
//! # Feature Flags
//!
//! - `http` (default): [`HttpFetcher`] via `reqwest` with a cookie store

#![allow(async_fn_in_trait)]

mod dump;
mod error;
#[cfg(feature = "http")]
mod http;

pub use dump::{DumpingFetcher, persist_raw_page};
pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpFetcher, PortalConfig};

use std::fmt;

/// HTTP method of a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// Everything needed to fetch one page.
///
/// `label` names the page for logs and for the dump sink
/// (e.g. `account_overview.html`). `path` is relative to the fetcher's
/// base URL and starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub label: String,
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl PageRequest {
    /// A GET request for `path`.
    pub fn get(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            method: Method::Get,
            path: path.into(),
            ..Default::default()
        }
    }

    /// A POST request for `path`; add the body with [`form`](Self::form).
    pub fn post(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            method: Method::Post,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Appends a query-string pair.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a url-encoded form field.
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Appends an extra request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of the first query pair named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first form field named `key`.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        self.form
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.method, self.path, self.label)
    }
}

/// Retrieves raw page markup.
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → a fetcher is moved into the watch task and
///   borrowed across `.await` points there.
///
/// Implementations return the body of a successful response; non-success
/// statuses are errors. Callers decide whether an error is fatal.
pub trait Fetcher: Send + Sync + 'static {
    /// Performs the request and returns the response body.
    fn fetch(
        &self,
        request: &PageRequest,
    ) -> impl std::future::Future<Output = Result<String, TransportError>> + Send;
}

/// Shared fetchers fetch through the shared value (one cookie jar).
impl<F: Fetcher> Fetcher for std::sync::Arc<F> {
    fn fetch(
        &self,
        request: &PageRequest,
    ) -> impl std::future::Future<Output = Result<String, TransportError>> + Send {
        (**self).fetch(request)
    }
}
