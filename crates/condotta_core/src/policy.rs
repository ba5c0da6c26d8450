//! Centralized authorization policy.
//!
//! Both the slash-command path and the control-panel component path answer
//! rank questions through [`authorize`], so the two entry points cannot
//! drift apart.

use crate::faction::Rank;

/// An acting user, with their guild-administrator capability resolved by
/// the transport layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Acting user's id.
    pub user_id: i64,
    /// Whether the user holds guild-administrator capability.
    pub admin: bool,
}

impl Actor {
    /// A plain (non-administrator) actor.
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            admin: false,
        }
    }

    /// An administrator actor.
    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            admin: true,
        }
    }
}

/// A rank-gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Invite a user into the actor's faction.
    Invite,
    /// Self-serve join of an open faction.
    Join,
    /// Kick a member.
    Kick,
    /// Promote a member to officer.
    Promote,
    /// Demote an officer to member.
    Demote,
    /// Leave one's faction.
    Leave,
    /// Toggle the faction's open/closed mode.
    ToggleOpen,
    /// Declare a war.
    StartWar,
    /// Resolve the active war.
    EndWar,
    /// Disband one's faction.
    Disband,
}

/// Decide whether an actor with the given rank (and administrator flag) may
/// perform the action.
///
/// Rules beyond rank, such as "the leader cannot leave" or "the target must
/// not be the leader", live with the operation that owns them.
pub fn authorize(rank: Option<Rank>, admin: bool, action: Action) -> bool {
    if admin {
        return true;
    }
    match action {
        Action::Join => true,
        Action::Leave => rank.is_some(),
        Action::Invite
        | Action::Kick
        | Action::Promote
        | Action::Demote
        | Action::ToggleOpen
        | Action::StartWar => rank.is_some_and(Rank::is_officer_or_above),
        Action::Disband => rank == Some(Rank::Leader),
        Action::EndWar => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn officer_gated_actions_require_officer_or_leader() {
        for action in [
            Action::Invite,
            Action::Kick,
            Action::Promote,
            Action::Demote,
            Action::ToggleOpen,
            Action::StartWar,
        ] {
            assert!(authorize(Some(Rank::Leader), false, action));
            assert!(authorize(Some(Rank::Officer), false, action));
            assert!(!authorize(Some(Rank::Member), false, action));
            assert!(!authorize(None, false, action));
        }
    }

    #[test]
    fn end_war_is_administrator_only() {
        assert!(!authorize(Some(Rank::Leader), false, Action::EndWar));
        assert!(authorize(None, true, Action::EndWar));
    }

    #[test]
    fn disband_is_leader_or_administrator() {
        assert!(authorize(Some(Rank::Leader), false, Action::Disband));
        assert!(!authorize(Some(Rank::Officer), false, Action::Disband));
        assert!(authorize(Some(Rank::Member), true, Action::Disband));
    }

    #[test]
    fn administrator_overrides_every_rank_gate() {
        for action in [Action::Invite, Action::Kick, Action::StartWar, Action::Disband] {
            assert!(authorize(None, true, action));
        }
    }

    #[test]
    fn join_needs_no_rank_and_leave_needs_membership() {
        assert!(authorize(None, false, Action::Join));
        assert!(authorize(Some(Rank::Member), false, Action::Leave));
        assert!(!authorize(None, false, Action::Leave));
    }
}
