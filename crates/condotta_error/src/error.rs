//! Top-level error wrapper types.

use crate::{CommandError, ConfigError, ProvisionError, StoreError};

/// The foundation error enum for the Condotta workspace.
///
/// # Examples
///
/// ```
/// use condotta_error::{CondottaError, CommandError, CommandErrorKind};
///
/// let cmd_err = CommandError::new(CommandErrorKind::NotInFaction);
/// let err: CondottaError = cmd_err.into();
/// assert!(format!("{}", err).contains("Not a member"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CondottaErrorKind {
    /// User-facing command rejection
    #[from(CommandError)]
    Command(CommandError),
    /// Persistent store error
    #[from(StoreError)]
    Store(StoreError),
    /// External resource provisioning error
    #[from(ProvisionError)]
    Provision(ProvisionError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Condotta error with kind discrimination.
///
/// # Examples
///
/// ```
/// use condotta_error::{CondottaResult, ConfigError};
///
/// fn might_fail() -> CondottaResult<()> {
///     Err(ConfigError::new("missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Condotta Error: {}", _0)]
pub struct CondottaError(Box<CondottaErrorKind>);

impl CondottaError {
    /// Create a new error from a kind.
    pub fn new(kind: CondottaErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CondottaErrorKind {
        &self.0
    }

    /// The command rejection inside this error, if that is what it carries.
    ///
    /// The rendering layer uses this to decide between a user-facing reply
    /// and an internal-error reply.
    pub fn as_command(&self) -> Option<&CommandError> {
        match self.kind() {
            CondottaErrorKind::Command(cmd) => Some(cmd),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to CondottaErrorKind
impl<T> From<T> for CondottaError
where
    T: Into<CondottaErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Condotta operations.
pub type CondottaResult<T> = std::result::Result<T, CondottaError>;
