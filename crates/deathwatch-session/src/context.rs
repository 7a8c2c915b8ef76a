//! The session context: everything one login-then-watch run owns.
//!
//! A context bundles the fetcher (and with it the cookie jar), the portal
//! request builder, the current credentials and the last classified
//! [`SessionState`]. It is passed explicitly to the negotiator and then
//! moved into the watch task, so exactly one flow uses the cookie jar at a
//! time.

use deathwatch_protocol::{Credentials, Portal, SessionState};
use deathwatch_transport::{Fetcher, PageRequest};

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Retry budgets for login and character selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Credential submissions allowed before giving up. Rejected logins
    /// and PIN prompts share this budget.
    ///
    /// Default: 3.
    pub max_attempts: u32,

    /// Character prompts allowed before giving up.
    ///
    /// Default: 3.
    pub max_selection_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_selection_attempts: 3,
        }
    }
}

impl SessionConfig {
    /// Raises zero budgets to 1 so every flow makes at least one attempt.
    pub fn validated(mut self) -> Self {
        if self.max_attempts == 0 {
            tracing::warn!("max_attempts is 0, using 1");
            self.max_attempts = 1;
        }
        if self.max_selection_attempts == 0 {
            tracing::warn!("max_selection_attempts is 0, using 1");
            self.max_selection_attempts = 1;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// State owned by one negotiation-then-watch pipeline.
pub struct SessionContext<F: Fetcher> {
    fetcher: F,
    portal: Portal,
    credentials: Option<Credentials>,
    state: SessionState,
}

impl<F: Fetcher> SessionContext<F> {
    /// A fresh context in `AwaitingLogin` with no credentials.
    pub fn new(fetcher: F, portal: Portal) -> Self {
        Self {
            fetcher,
            portal,
            credentials: None,
            state: SessionState::default(),
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn portal(&self) -> &Portal {
        &self.portal
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.credentials = Some(credentials);
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Records the classification of the latest page.
    ///
    /// # Errors
    /// Returns [`SessionError::InvalidTransition`] if the context is
    /// already in a terminal state other than `next`.
    pub fn advance(&mut self, next: SessionState) -> Result<SessionState, SessionError> {
        if !self.state.can_transition_to(next) {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "session state changed");
        }
        self.state = next;
        Ok(next)
    }

    /// Fetches a page, turning transport failures into logged absence.
    pub async fn fetch(&self, request: &PageRequest) -> Option<String> {
        match self.fetcher.fetch(request).await {
            Ok(body) => {
                tracing::debug!(label = %request.label, bytes = body.len(), "page fetched");
                Some(body)
            }
            Err(e) => {
                tracing::error!(label = %request.label, error = %e, "page fetch failed");
                None
            }
        }
    }

    /// Fetches a page that the flow cannot continue without.
    ///
    /// # Errors
    /// Returns [`SessionError::PageUnavailable`] when the fetch fails.
    pub async fn require(&self, request: &PageRequest) -> Result<String, SessionError> {
        self.fetch(request)
            .await
            .ok_or_else(|| SessionError::PageUnavailable {
                label: request.label.clone(),
            })
    }
}

impl<F: Fetcher> std::fmt::Debug for SessionContext<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("portal", &self.portal)
            .field("credentials", &self.credentials)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use deathwatch_transport::TransportError;

    use super::*;

    struct Echo;

    impl Fetcher for Echo {
        async fn fetch(&self, request: &PageRequest) -> Result<String, TransportError> {
            if request.label == "missing.html" {
                return Err(TransportError::Status {
                    label: request.label.clone(),
                    status: 404,
                });
            }
            Ok(format!("<p>{}</p>", request.label))
        }
    }

    fn context() -> SessionContext<Echo> {
        SessionContext::new(Echo, Portal::default())
    }

    #[test]
    fn test_new_context_awaits_login_without_credentials() {
        let ctx = context();
        assert_eq!(ctx.state(), SessionState::AwaitingLogin);
        assert!(ctx.credentials().is_none());
    }

    #[test]
    fn test_advance_between_login_and_pin() {
        let mut ctx = context();
        assert_eq!(ctx.advance(SessionState::AwaitingPin).unwrap(), SessionState::AwaitingPin);
        assert_eq!(ctx.advance(SessionState::AwaitingLogin).unwrap(), SessionState::AwaitingLogin);
        assert_eq!(ctx.advance(SessionState::Authenticated).unwrap(), SessionState::Authenticated);
    }

    #[test]
    fn test_advance_rejects_leaving_terminal_state() {
        let mut ctx = context();
        ctx.advance(SessionState::LockedOut).unwrap();
        let err = ctx.advance(SessionState::Authenticated).unwrap_err();
        assert!(matches!(
            err,
            SessionError::InvalidTransition {
                from: SessionState::LockedOut,
                to: SessionState::Authenticated,
            }
        ));
        assert_eq!(ctx.state(), SessionState::LockedOut);
    }

    #[test]
    fn test_config_validated_raises_zero_budgets() {
        let cfg = SessionConfig {
            max_attempts: 0,
            max_selection_attempts: 0,
        }
        .validated();
        assert_eq!(cfg.max_attempts, 1);
        assert_eq!(cfg.max_selection_attempts, 1);
        assert_eq!(SessionConfig::default().validated(), SessionConfig::default());
    }

    #[test]
    fn test_debug_hides_password() {
        let ctx = context().with_credentials(Credentials::new("a@b.c", "hunter2").unwrap());
        let dbg = format!("{ctx:?}");
        assert!(dbg.contains("a@b.c"));
        assert!(!dbg.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_absence() {
        let ctx = context();
        assert_eq!(
            ctx.fetch(&PageRequest::get("ok.html", "/")).await.as_deref(),
            Some("<p>ok.html</p>")
        );
        assert!(ctx.fetch(&PageRequest::get("missing.html", "/")).await.is_none());
        let err = ctx
            .require(&PageRequest::get("missing.html", "/"))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PageUnavailable { label } if label == "missing.html"));
    }
}
