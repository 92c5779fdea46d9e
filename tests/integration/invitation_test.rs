//! Invitation issue, acceptance, expiry, and purge.

mod helpers;

use std::collections::BTreeSet;

use chrono::Duration;

use helpers::{CLIENT_IP, TestApp};
use tollgate_core::ErrorKind;
use tollgate_core::traits::Clock;
use tollgate_core::types::OrganizationId;
use tollgate_database::InvitationStore;
use tollgate_entity::{Capability, InvitationStatus};

#[tokio::test]
async fn test_levels_expand_cumulatively() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;

    let cases = [
        ("Viewer", BTreeSet::from([Capability::Viewer])),
        ("Editor", BTreeSet::from([Capability::Editor, Capability::Viewer])),
        (
            "Admin",
            BTreeSet::from([Capability::Admin, Capability::Editor, Capability::Viewer]),
        ),
    ];
    for (level, expected) in cases {
        let issued = app.invitations.invite(org, "new@example.com", level).await.unwrap();
        let stored = app
            .store
            .get_invitation_by_token(&issued.invitation.token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.capabilities, expected, "level {level}");
    }
}

#[tokio::test]
async fn test_unknown_level_inserts_nothing() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;

    let err = app
        .invitations
        .invite(org, "new@example.com", "Owner")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AccessLevelForbidden);
    assert_eq!(app.store.invitation_count().await, 0);
}

#[tokio::test]
async fn test_unknown_organization() {
    let app = TestApp::new();
    let err = app
        .invitations
        .invite(OrganizationId::new(), "new@example.com", "Viewer")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::OrganizationNotFound);
    assert_eq!(app.store.invitation_count().await, 0);
}

#[tokio::test]
async fn test_link_and_token_shape() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;

    let issued = app.invitations.invite(org, "new@example.com", "Editor").await.unwrap();
    let token = &issued.invitation.token;

    assert_eq!(issued.organization_name, "Acme");
    assert_eq!(issued.link, format!("https://app.example.com/invite/{token}"));
    assert_eq!(token.len(), 8);
    assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        issued.invitation.token_expiration_time,
        issued.invitation.created_at + Duration::days(2)
    );
    assert_eq!(
        issued.invitation.remove_from_db_date,
        issued.invitation.created_at + Duration::days(5)
    );
}

#[tokio::test]
async fn test_accept_is_single_use() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let token = app
        .invitations
        .invite(org, "new@example.com", "Viewer")
        .await
        .unwrap()
        .invitation
        .token;

    let accepted = app.invitations.accept(&token).await.unwrap();
    assert!(accepted.accepted);
    assert_eq!(accepted.receiver_email, "new@example.com");

    let err = app.invitations.accept(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvitationTokenAlreadyUsed);

    let err = app.invitations.accept("ZZZZ9999").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvitationTokenNotFound);
}

#[tokio::test]
async fn test_accept_after_expiry() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let token = app
        .invitations
        .invite(org, "late@example.com", "Viewer")
        .await
        .unwrap()
        .invitation
        .token;

    app.clock.advance(Duration::days(2) + Duration::seconds(1));
    let err = app.invitations.accept(&token).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvitationTokenExpired);
}

#[tokio::test]
async fn test_accept_on_expiry_instant_still_succeeds() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let token = app
        .invitations
        .invite(org, "edge@example.com", "Viewer")
        .await
        .unwrap()
        .invitation
        .token;

    app.clock.advance(Duration::days(2));
    assert!(app.invitations.accept(&token).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_accept_only_one_wins() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let token = app
        .invitations
        .invite(org, "race@example.com", "Viewer")
        .await
        .unwrap()
        .invitation
        .token;

    let (a, b) = tokio::join!(app.invitations.accept(&token), app.invitations.accept(&token));
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = if a.is_err() { a } else { b };
    assert_eq!(loser.unwrap_err().kind, ErrorKind::InvitationTokenAlreadyUsed);
}

#[tokio::test]
async fn test_purge_keeps_expired_until_removal_date() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let first = app
        .invitations
        .invite(org, "first@example.com", "Viewer")
        .await
        .unwrap()
        .invitation;

    app.clock.advance(Duration::days(3));
    assert_eq!(app.invitations.purge(org).await.unwrap(), 0);
    let stored = app
        .store
        .get_invitation_by_token(&first.token)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.status_at(app.clock.now()),
        InvitationStatus::Expired
    );

    app.clock.advance(Duration::days(2));
    app.invitations
        .invite(org, "second@example.com", "Viewer")
        .await
        .unwrap();

    assert!(
        app.store
            .get_invitation_by_token(&first.token)
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(app.store.invitation_count().await, 1);
}

#[tokio::test]
async fn test_purge_is_scoped_to_organization() {
    let app = TestApp::new();
    let acme = app.create_organization("Acme").await;
    let globex = app.create_organization("Globex").await;
    app.invitations.invite(acme, "a@example.com", "Viewer").await.unwrap();
    app.invitations.invite(globex, "g@example.com", "Viewer").await.unwrap();

    app.clock.advance(Duration::days(6));
    assert_eq!(app.invitations.purge(acme).await.unwrap(), 1);
    assert_eq!(app.store.invitation_count().await, 1);
}

#[tokio::test]
async fn test_send_invitation_delivers_link() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;

    let issued = app
        .invitations
        .send_invitation(org, "mail@example.com", "Editor")
        .await
        .unwrap();

    let sent = app.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to_address, "mail@example.com");
    assert!(sent[0].subject.contains("Acme"));
    assert!(sent[0].body.contains(&issued.link));
}

#[tokio::test]
async fn test_delivery_failure_is_reported_and_invitation_kept() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    app.notifier.set_failing(true).await;

    let err = app
        .invitations
        .send_invitation(org, "mail@example.com", "Viewer")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExternalService);
    assert_eq!(app.store.invitation_count().await, 1);
}

#[tokio::test]
async fn test_register_invited_grants_invitation_capabilities() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    let token = app
        .invitations
        .invite(org, "joiner@example.com", "Editor")
        .await
        .unwrap()
        .invitation
        .token;

    let summary = app.sessions.register_invited(&token, "pw").await.unwrap();
    assert_eq!(summary.email, "joiner@example.com");
    assert_eq!(summary.capabilities, Capability::Editor.expand());

    let login = app
        .sessions
        .login("joiner@example.com", "pw", CLIENT_IP)
        .await
        .unwrap();
    assert_eq!(login.user.id, summary.id);

    let err = app.sessions.register_invited(&token, "pw").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvitationTokenAlreadyUsed);
}

#[tokio::test]
async fn test_register_invited_existing_email_keeps_invitation() {
    let app = TestApp::new();
    let org = app.create_organization("Acme").await;
    app.create_user("taken@example.com", Capability::Viewer).await;
    let token = app
        .invitations
        .invite(org, "taken@example.com", "Admin")
        .await
        .unwrap()
        .invitation
        .token;

    let err = app.sessions.register_invited(&token, "pw").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let stored = app
        .store
        .get_invitation_by_token(&token)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.accepted);
    assert!(app.invitations.accept(&token).await.is_ok());
}
