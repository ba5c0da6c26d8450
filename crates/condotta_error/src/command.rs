//! User-facing command error types.
//!
//! Every variant here is a terminal outcome reported back to the requesting
//! actor. None of them are retried automatically.

/// Kinds of command rejections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum CommandErrorKind {
    /// Faction name failed validation (empty, too long, or unprintable).
    #[display("Invalid faction name: {}", _0)]
    InvalidName(String),
    /// A non-destroyed faction with the same name exists in this guild.
    #[display("A faction named '{}' already exists", _0)]
    DuplicateName(String),
    /// The actor already belongs to a faction in this guild.
    #[display("Already a member of a faction")]
    AlreadyInFaction,
    /// The actor belongs to no faction in this guild.
    #[display("Not a member of any faction")]
    NotInFaction,
    /// The target user already belongs to a faction in this guild.
    #[display("Target user is already in a faction")]
    TargetAlreadyInFaction,
    /// The target user is not a member of the actor's faction.
    #[display("Target user is not in your faction")]
    TargetNotInFaction,
    /// The actor lacks the rank or capability required for the action.
    #[display("Not authorized to perform this action")]
    NotAuthorized,
    /// The action is restricted to the faction leader (or an administrator).
    #[display("Only the faction leader may do this")]
    LeaderOnly,
    /// The faction leader cannot be kicked.
    #[display("The faction leader cannot be kicked")]
    CannotKickLeader,
    /// The leader must disband instead of leaving.
    #[display("The leader cannot leave; disband the faction instead")]
    LeaderCannotLeave,
    /// Self-serve join attempted on a closed faction.
    #[display("That faction is closed; joining requires an invite")]
    FactionClosed,
    /// A named faction, war, or record was not found.
    #[display("Not found: {}", _0)]
    NotFound(String),
    /// Balance would go negative.
    #[display("Insufficient funds: need {}, have {}", needed, balance)]
    InsufficientFunds {
        /// Amount the operation required.
        needed: i64,
        /// Balance at the time of the check.
        balance: i64,
    },
    /// A war is already active in this guild.
    #[display("A war is already active in this guild")]
    WarAlreadyActive,
    /// No war is active in this guild.
    #[display("No war is active in this guild")]
    NoActiveWar,
    /// A faction cannot declare war on itself.
    #[display("A faction cannot declare war on itself")]
    SelfWar,
    /// A stored invariant was observed broken. Fatal to the operation but
    /// must never corrupt stored state.
    #[display("Consistency violation: {}", _0)]
    ConsistencyViolation(String),
}

/// Command error with source location tracking.
///
/// # Examples
///
/// ```
/// use condotta_error::{CommandError, CommandErrorKind};
///
/// let err = CommandError::new(CommandErrorKind::NoActiveWar);
/// assert!(format!("{}", err).contains("No war"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Command Error: {} at line {} in {}", kind, line, file)]
pub struct CommandError {
    /// The kind of rejection that occurred
    pub kind: CommandErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl CommandError {
    /// Create a new command error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: CommandErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
