//! User-facing reply rendering.
//!
//! Command rejections render from their error kind; anything else becomes a
//! generic internal-error reply (the detail goes to the log, not the user).

use condotta_core::{FactionInfo, WarOutcome, WarReport};
use condotta_error::CondottaError;

/// Component id for the control panel info button.
pub const PANEL_INFO: &str = "faction_panel:info";
/// Component id for the control panel join-mode toggle button.
pub const PANEL_TOGGLE_OPEN: &str = "faction_panel:toggle_open";
/// Component id for the control panel disband button.
pub const PANEL_DISBAND: &str = "faction_panel:disband";

/// Mention a user by id.
pub fn mention(user_id: i64) -> String {
    format!("<@{user_id}>")
}

/// Render an error as a reply. Command rejections carry their own
/// user-facing text; everything else is reported generically.
pub fn error_reply(err: &CondottaError) -> String {
    match err.as_command() {
        Some(cmd) => cmd.kind.to_string(),
        None => "Something went wrong on our end. Please try again later.".to_string(),
    }
}

/// Render a faction summary.
pub fn faction_info(info: &FactionInfo) -> String {
    let mode = if info.is_open { "open" } else { "invite-only" };
    let rank = match info.rank {
        Some(rank) => format!("\nYour rank: {rank}"),
        None => String::new(),
    };
    format!(
        "**{}**\nLeader: {}\nMembers: {}\nJoin mode: {}{}",
        info.name,
        mention(info.leader_id),
        info.member_count,
        mode,
        rank
    )
}

/// Render the active war standings.
pub fn war_report(report: &WarReport) -> String {
    format!(
        "War standings:\nAttacker **{}**: {} messages\nDefender **{}**: {} messages",
        report.attacker.name,
        report.attacker_messages,
        report.defender.name,
        report.defender_messages
    )
}

/// Render a war resolution.
pub fn war_outcome(outcome: &WarOutcome) -> String {
    match outcome {
        WarOutcome::Draw {
            attacker,
            defender,
            messages,
        } => format!(
            "The war between **{}** and **{}** ends in a draw at {} messages each. Both factions stand.",
            attacker.name, defender.name, messages
        ),
        WarOutcome::Victory {
            winner,
            loser,
            winner_messages,
            loser_messages,
        } => format!(
            "**{}** wins the war {} to {}. **{}** has been disbanded.",
            winner.name, winner_messages, loser_messages, loser.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use condotta_core::Rank;
    use condotta_error::{CommandError, CommandErrorKind};

    #[test]
    fn command_errors_render_their_own_text() {
        let err: CondottaError = CommandError::new(CommandErrorKind::FactionClosed).into();
        assert!(error_reply(&err).contains("closed"));
    }

    #[test]
    fn internal_errors_render_generically() {
        let err: CondottaError = condotta_error::ConfigError::new("oops").into();
        assert!(!error_reply(&err).contains("oops"));
    }

    #[test]
    fn info_includes_rank_only_for_members() {
        let mut info = FactionInfo {
            name: "Red".to_string(),
            leader_id: 100,
            member_count: 3,
            rank: Some(Rank::Officer),
            is_open: false,
        };
        assert!(faction_info(&info).contains("officer"));
        info.rank = None;
        assert!(!faction_info(&info).contains("rank"));
    }
}
