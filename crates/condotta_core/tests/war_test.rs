//! War tracker integration tests: declaration gates, message scoring, and
//! resolution outcomes.

mod common;

use common::{GUILD, Harness, command_kind};
use condotta_core::{Actor, FactionStore, WarOutcome};
use condotta_error::CommandErrorKind;

/// Two founded factions with the guild's war channel configured.
async fn two_factions(h: &Harness) {
    h.found(100, "Red").await;
    h.found(200, "Blue").await;
    h.store.set_war_status_channel(GUILD, 5000).await.unwrap();
}

#[tokio::test]
async fn declaring_war_records_both_sides_and_announces() {
    let h = Harness::new();
    two_factions(&h).await;

    let (war, attacker, defender) = h
        .wars
        .start(GUILD, Actor::user(100), "Blue")
        .await
        .unwrap();
    assert_eq!(attacker.name, "Red");
    assert_eq!(defender.name, "Blue");
    assert!(war.active);
    assert_eq!(war.attacker_messages, 0);
    assert_eq!(war.defender_messages, 0);

    let posted = h.provisioner.posted_messages();
    let notice = posted.iter().find(|(channel, _)| *channel == 5000).unwrap();
    assert!(notice.1.contains("Red"));
    assert!(notice.1.contains("Blue"));
}

#[tokio::test]
async fn only_officers_and_leaders_declare_war() {
    let h = Harness::new();
    two_factions(&h).await;
    h.membership.invite(GUILD, Actor::user(100), 300).await.unwrap();

    let err = h
        .wars
        .start(GUILD, Actor::user(300), "Blue")
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotAuthorized));

    let err = h
        .wars
        .start(GUILD, Actor::user(999), "Blue")
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotInFaction));
}

#[tokio::test]
async fn war_declaration_edge_cases() {
    let h = Harness::new();
    two_factions(&h).await;

    let err = h
        .wars
        .start(GUILD, Actor::user(100), "Ghost")
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotFound(_)));

    let err = h
        .wars
        .start(GUILD, Actor::user(100), "Red")
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::SelfWar));
}

#[tokio::test]
async fn one_active_war_per_guild() {
    let h = Harness::new();
    two_factions(&h).await;
    h.found(300, "Green").await;

    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    let err = h
        .wars
        .start(GUILD, Actor::user(300), "Red")
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::WarAlreadyActive));
}

#[tokio::test]
async fn scoring_counts_only_participants_of_the_active_war() {
    let h = Harness::new();
    two_factions(&h).await;
    h.found(300, "Green").await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();

    // Three attacker messages, one defender message.
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 200).await.unwrap();
    // Bystanders score nothing: third faction and factionless senders.
    h.wars.score(GUILD, 300).await.unwrap();
    h.wars.score(GUILD, 999).await.unwrap();

    let report = h.wars.status(GUILD).await.unwrap();
    assert_eq!(report.attacker.name, "Red");
    assert_eq!(report.defender.name, "Blue");
    assert_eq!(report.attacker_messages, 3);
    assert_eq!(report.defender_messages, 1);
}

#[tokio::test]
async fn scoring_without_a_war_is_a_silent_noop() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.score(GUILD, 100).await.unwrap();
    let err = h.wars.status(GUILD).await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NoActiveWar));
}

#[tokio::test]
async fn resolution_destroys_the_loser_and_announces() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 200).await.unwrap();

    let outcome = h.wars.end(GUILD, Actor::admin(999)).await.unwrap();
    let WarOutcome::Victory {
        winner,
        loser,
        winner_messages,
        loser_messages,
    } = outcome
    else {
        panic!("expected a victory, got {outcome:?}");
    };
    assert_eq!(winner.name, "Red");
    assert_eq!(loser.name, "Blue");
    assert_eq!(winner_messages, 2);
    assert_eq!(loser_messages, 1);

    // The loser is gone, the winner stands, the war slot is free.
    assert!(h.store.faction_by_name(GUILD, "Blue").await.unwrap().is_none());
    assert!(h.store.faction_by_name(GUILD, "Red").await.unwrap().is_some());
    assert!(h.store.active_war(GUILD).await.unwrap().is_none());

    let posted = h.provisioner.posted_messages();
    let ending = posted
        .iter()
        .filter(|(channel, _)| *channel == 5000)
        .next_back()
        .unwrap();
    assert!(ending.1.contains("Winner: **Red**"));
}

#[tokio::test]
async fn the_defender_can_win() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    h.wars.score(GUILD, 200).await.unwrap();

    let outcome = h.wars.end(GUILD, Actor::admin(999)).await.unwrap();
    assert!(matches!(
        outcome,
        WarOutcome::Victory { ref winner, .. } if winner.name == "Blue"
    ));
    assert!(h.store.faction_by_name(GUILD, "Red").await.unwrap().is_none());
}

#[tokio::test]
async fn a_tie_destroys_nothing() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.score(GUILD, 200).await.unwrap();
    h.wars.score(GUILD, 200).await.unwrap();

    let outcome = h.wars.end(GUILD, Actor::admin(999)).await.unwrap();
    assert!(matches!(outcome, WarOutcome::Draw { messages: 2, .. }));

    assert!(h.store.faction_by_name(GUILD, "Red").await.unwrap().is_some());
    assert!(h.store.faction_by_name(GUILD, "Blue").await.unwrap().is_some());
    assert!(h.store.active_war(GUILD).await.unwrap().is_none());
}

#[tokio::test]
async fn a_zero_zero_war_is_also_a_draw() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();

    let outcome = h.wars.end(GUILD, Actor::admin(999)).await.unwrap();
    assert!(matches!(outcome, WarOutcome::Draw { messages: 0, .. }));
}

#[tokio::test]
async fn only_administrators_resolve_wars() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();

    // Not even the attacking leader may end the war.
    let err = h.wars.end(GUILD, Actor::user(100)).await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotAuthorized));
    assert!(h.store.active_war(GUILD).await.unwrap().is_some());
}

#[tokio::test]
async fn ending_without_a_war_reports_no_active_war() {
    let h = Harness::new();
    let err = h.wars.end(GUILD, Actor::admin(999)).await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NoActiveWar));
}

#[tokio::test]
async fn a_new_war_can_start_after_resolution() {
    let h = Harness::new();
    two_factions(&h).await;
    h.found(300, "Green").await;

    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.end(GUILD, Actor::admin(999)).await.unwrap();

    // Blue is gone; Red turns on Green next.
    let (_, attacker, defender) = h
        .wars
        .start(GUILD, Actor::user(100), "Green")
        .await
        .unwrap();
    assert_eq!(attacker.name, "Red");
    assert_eq!(defender.name, "Green");
}

#[tokio::test]
async fn scoring_after_resolution_is_dropped() {
    let h = Harness::new();
    two_factions(&h).await;
    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    h.wars.score(GUILD, 100).await.unwrap();
    h.wars.end(GUILD, Actor::admin(999)).await.unwrap();

    // Red survives the victory; its messages now land nowhere.
    h.wars.score(GUILD, 100).await.unwrap();
    let err = h.wars.status(GUILD).await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NoActiveWar));
}

#[tokio::test]
async fn wars_proceed_without_a_status_channel() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.found(200, "Blue").await;

    h.wars.start(GUILD, Actor::user(100), "Blue").await.unwrap();
    h.wars.end(GUILD, Actor::admin(999)).await.unwrap();

    // Creation panel greetings aside, nothing was posted.
    assert!(
        h.provisioner
            .posted_messages()
            .iter()
            .all(|(channel, _)| *channel != 5000)
    );
}
