//! Interactive input hook.
//!
//! The negotiator and selector never read a terminal themselves. When they
//! need an answer from the user (fresh credentials after a rejected login,
//! a character choice) they ask a [`Prompter`]. The CLI implements it over
//! stdin; tests implement it with a scripted list of answers.

use crate::SessionError;

/// Asks the user for input.
///
/// # Trait bounds
///
/// - `Send + Sync` → a prompter is borrowed across `.await` points inside
///   futures that may move between runtime threads.
///
/// # Example
///
/// ```rust
/// use deathwatch_session::{Prompter, SessionError};
///
/// /// Answers every question with the same text.
/// struct Fixed(&'static str);
///
/// impl Prompter for Fixed {
///     async fn prompt_text(&self, _label: &str) -> Result<String, SessionError> {
///         Ok(self.0.to_string())
///     }
///
///     async fn prompt_choice(
///         &self,
///         _label: &str,
///         _options: &[String],
///     ) -> Result<String, SessionError> {
///         Ok(self.0.to_string())
///     }
/// }
/// ```
pub trait Prompter: Send + Sync {
    /// Reads one line of free text.
    fn prompt_text(
        &self,
        label: &str,
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send;

    /// Reads a line that should not be echoed. Defaults to
    /// [`prompt_text`](Self::prompt_text).
    fn prompt_secret(
        &self,
        label: &str,
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send {
        self.prompt_text(label)
    }

    /// Shows `options` and reads the user's raw answer.
    ///
    /// The answer is returned unparsed; the caller decides whether it
    /// names an option.
    fn prompt_choice(
        &self,
        label: &str,
        options: &[String],
    ) -> impl std::future::Future<Output = Result<String, SessionError>> + Send;
}
