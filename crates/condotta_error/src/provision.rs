//! Resource provisioning error types.
//!
//! Provisioning calls are remote and individually fallible. During faction
//! creation a provisioning failure aborts the operation and triggers
//! compensation; during destruction it is logged and suppressed.

/// Kinds of provisioning errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum ProvisionErrorKind {
    /// Role creation failed
    #[display("Role creation failed: {}", _0)]
    Role(String),
    /// Container (category) creation failed
    #[display("Container creation failed: {}", _0)]
    Container(String),
    /// Channel creation failed
    #[display("Channel creation failed: {}", _0)]
    Channel(String),
    /// Resource deletion failed
    #[display("Resource deletion failed: {}", _0)]
    Delete(String),
    /// Granting or revoking an external rank failed
    #[display("Role grant failed: {}", _0)]
    Grant(String),
    /// Posting a notice failed
    #[display("Notice delivery failed: {}", _0)]
    Notify(String),
}

/// Provisioning error with location tracking.
///
/// # Examples
///
/// ```
/// use condotta_error::{ProvisionError, ProvisionErrorKind};
///
/// let err = ProvisionError::new(ProvisionErrorKind::Channel("rate limited".to_string()));
/// assert!(format!("{}", err).contains("Channel creation failed"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Provision Error: {} at line {} in {}", kind, line, file)]
pub struct ProvisionError {
    /// The kind of error that occurred
    pub kind: ProvisionErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl ProvisionError {
    /// Create a new provisioning error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ProvisionErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
