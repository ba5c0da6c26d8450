//! Membership synchronizer integration tests: invite/join/kick flows, rank
//! changes, and the external-before-durable commit order.

mod common;

use common::{GUILD, Harness, command_kind};
use condotta_core::{Actor, FactionStore, Rank};
use condotta_error::CommandErrorKind;

#[tokio::test]
async fn invite_seats_target_as_member_with_base_role() {
    let h = Harness::new();
    let faction = h.found(100, "Red").await;

    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    let membership = h.store.membership(200, GUILD).await.unwrap().unwrap();
    assert_eq!(membership.rank, Rank::Member);
    assert_eq!(membership.faction_id, faction.id);
    assert_eq!(h.store.member_count(faction.id).await.unwrap(), 2);
    assert!(
        h.provisioner
            .grants
            .lock()
            .unwrap()
            .contains(&(200, faction.roles.base))
    );
}

#[tokio::test]
async fn plain_members_cannot_invite() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    let err = h
        .membership
        .invite(GUILD, Actor::user(200), 300)
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotAuthorized));
}

#[tokio::test]
async fn invite_rejects_target_with_existing_membership() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.found(200, "Blue").await;

    let err = h
        .membership
        .invite(GUILD, Actor::user(100), 200)
        .await
        .unwrap_err();
    assert!(matches!(
        command_kind(err),
        CommandErrorKind::TargetAlreadyInFaction
    ));
}

#[tokio::test]
async fn join_respects_the_open_toggle() {
    let h = Harness::new();
    h.found(100, "Red").await;

    // Factions are closed at birth.
    let err = h.membership.join(GUILD, 200, "Red").await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::FactionClosed));

    let (_, open) = h.membership.toggle_open(GUILD, Actor::user(100)).await.unwrap();
    assert!(open);
    let faction = h.membership.join(GUILD, 200, "Red").await.unwrap();
    assert_eq!(
        h.store.membership(200, GUILD).await.unwrap().unwrap().rank,
        Rank::Member
    );
    assert_eq!(faction.name, "Red");

    // A second toggle closes the door again.
    let (_, open) = h.membership.toggle_open(GUILD, Actor::user(100)).await.unwrap();
    assert!(!open);
    let err = h.membership.join(GUILD, 300, "Red").await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::FactionClosed));
}

#[tokio::test]
async fn one_membership_per_guild() {
    let h = Harness::new();
    h.found(100, "Red").await;
    let blue = h.found(200, "Blue").await;
    h.membership.toggle_open(GUILD, Actor::user(200)).await.unwrap();
    assert!(
        h.store
            .faction_by_id(blue.id)
            .await
            .unwrap()
            .unwrap()
            .is_open
    );

    // Red's leader cannot also join the open Blue.
    let err = h.membership.join(GUILD, 100, "Blue").await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::AlreadyInFaction));
}

#[tokio::test]
async fn join_unknown_faction_reports_not_found() {
    let h = Harness::new();
    let err = h.membership.join(GUILD, 200, "Ghost").await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotFound(_)));
}

#[tokio::test]
async fn kick_removes_row_and_revokes_roles() {
    let h = Harness::new();
    let faction = h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    h.membership.kick(GUILD, Actor::user(100), 200).await.unwrap();

    assert!(h.store.membership(200, GUILD).await.unwrap().is_none());
    assert!(
        h.provisioner
            .revokes
            .lock()
            .unwrap()
            .contains(&(200, faction.roles.base))
    );
}

#[tokio::test]
async fn kicked_officer_loses_both_roles() {
    let h = Harness::new();
    let faction = h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();
    h.membership.promote(GUILD, Actor::user(100), 200).await.unwrap();

    h.membership.kick(GUILD, Actor::user(100), 200).await.unwrap();

    let revokes = h.provisioner.revokes.lock().unwrap().clone();
    assert!(revokes.contains(&(200, faction.roles.base)));
    assert!(revokes.contains(&(200, faction.roles.officer)));
}

#[tokio::test]
async fn the_leader_cannot_be_kicked() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();
    h.membership.promote(GUILD, Actor::user(100), 200).await.unwrap();

    let err = h
        .membership
        .kick(GUILD, Actor::user(200), 100)
        .await
        .unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::CannotKickLeader));
}

#[tokio::test]
async fn kick_outside_own_faction_reports_target_not_in_faction() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.found(200, "Blue").await;

    let err = h
        .membership
        .kick(GUILD, Actor::user(100), 200)
        .await
        .unwrap_err();
    assert!(matches!(
        command_kind(err),
        CommandErrorKind::TargetNotInFaction
    ));
}

#[tokio::test]
async fn promote_and_demote_move_rank_and_officer_role() {
    let h = Harness::new();
    let faction = h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    h.membership.promote(GUILD, Actor::user(100), 200).await.unwrap();
    assert_eq!(
        h.store.membership(200, GUILD).await.unwrap().unwrap().rank,
        Rank::Officer
    );
    assert!(
        h.provisioner
            .grants
            .lock()
            .unwrap()
            .contains(&(200, faction.roles.officer))
    );

    h.membership.demote(GUILD, Actor::user(100), 200).await.unwrap();
    assert_eq!(
        h.store.membership(200, GUILD).await.unwrap().unwrap().rank,
        Rank::Member
    );
    assert!(
        h.provisioner
            .revokes
            .lock()
            .unwrap()
            .contains(&(200, faction.roles.officer))
    );
}

#[tokio::test]
async fn the_leader_rank_is_immovable() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();
    h.membership.promote(GUILD, Actor::user(100), 200).await.unwrap();

    let promote = h
        .membership
        .promote(GUILD, Actor::user(200), 100)
        .await
        .unwrap_err();
    assert!(matches!(command_kind(promote), CommandErrorKind::NotAuthorized));

    let demote = h
        .membership
        .demote(GUILD, Actor::user(200), 100)
        .await
        .unwrap_err();
    assert!(matches!(command_kind(demote), CommandErrorKind::NotAuthorized));
}

#[tokio::test]
async fn members_leave_but_the_leader_must_disband() {
    let h = Harness::new();
    let faction = h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    h.membership.leave(GUILD, 200).await.unwrap();
    assert!(h.store.membership(200, GUILD).await.unwrap().is_none());
    assert_eq!(h.store.member_count(faction.id).await.unwrap(), 1);

    let err = h.membership.leave(GUILD, 100).await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::LeaderCannotLeave));
    assert!(h.store.membership(100, GUILD).await.unwrap().is_some());
}

#[tokio::test]
async fn failed_grant_never_commits_the_row() {
    let h = Harness::new();
    h.found(100, "Red").await;
    *h.provisioner.fail_grants.lock().unwrap() = true;

    assert!(
        h.membership
            .invite(GUILD, Actor::user(100), 200)
            .await
            .is_err()
    );
    assert!(h.store.membership(200, GUILD).await.unwrap().is_none());
}

#[tokio::test]
async fn info_reports_name_count_and_rank() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    let info = h.membership.info(GUILD, 200).await.unwrap();
    assert_eq!(info.name, "Red");
    assert_eq!(info.leader_id, 100);
    assert_eq!(info.member_count, 2);
    assert_eq!(info.rank, Some(Rank::Member));
    assert!(!info.is_open);

    let err = h.membership.info(GUILD, 999).await.unwrap_err();
    assert!(matches!(command_kind(err), CommandErrorKind::NotInFaction));
}

#[tokio::test]
async fn administrators_can_manage_factions_they_lead_nothing_in() {
    let h = Harness::new();
    h.found(100, "Red").await;
    h.membership.invite(GUILD, Actor::user(100), 200).await.unwrap();

    // An admin who happens to be a plain member may still promote.
    h.membership
        .invite(GUILD, Actor::user(100), 300)
        .await
        .unwrap();
    h.membership
        .promote(GUILD, Actor::admin(200), 300)
        .await
        .unwrap();
    assert_eq!(
        h.store.membership(300, GUILD).await.unwrap().unwrap().rank,
        Rank::Officer
    );
}
