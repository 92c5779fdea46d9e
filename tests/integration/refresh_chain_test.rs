//! Refresh-token rotation, replay detection, and cleanup.

mod helpers;

use chrono::Duration;

use helpers::{CLIENT_IP, PASSWORD, TestApp};
use tollgate_auth::RefreshTokenChain;
use tollgate_core::ErrorKind;
use tollgate_core::traits::Clock;
use tollgate_entity::Capability;

#[tokio::test]
async fn test_replayed_token_revokes_descendants() {
    let app = TestApp::new();
    let user_id = app.create_user("user@example.com", Capability::Viewer).await;

    let login = app
        .sessions
        .login("user@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap();
    let t0 = login.refresh_token;
    assert_eq!(login.refresh_expires_at, app.clock.now() + Duration::days(7));

    let t1 = app.sessions.refresh(&t0, CLIENT_IP).await.unwrap().refresh_token;
    assert_ne!(t0, t1);
    let user = app.user(user_id).await;
    assert!(user.refresh_token(&t0).unwrap().is_revoked());
    assert!(user.refresh_token(&t1).unwrap().is_active_at(app.clock.now()));

    let err = app.sessions.refresh(&t0, CLIENT_IP).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let user = app.user(user_id).await;
    let t1_record = user.refresh_token(&t1).unwrap();
    assert!(t1_record.is_revoked());
    assert_eq!(
        t1_record.revocation_reason.as_deref(),
        Some(format!("Attempted reuse of revoked ancestor token: {t0}").as_str())
    );

    let err = app.sessions.refresh(&t1, CLIENT_IP).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_cascade_covers_whole_chain() {
    let app = TestApp::new();
    let user_id = app.create_user("chain@example.com", Capability::Editor).await;
    let mut tokens = vec![
        app.sessions
            .login("chain@example.com", PASSWORD, CLIENT_IP)
            .await
            .unwrap()
            .refresh_token,
    ];
    for _ in 0..20 {
        let last = tokens.last().unwrap().clone();
        tokens.push(app.sessions.refresh(&last, CLIENT_IP).await.unwrap().refresh_token);
    }

    let user = app.user(user_id).await;
    assert_eq!(
        RefreshTokenChain::descendants(&user, &tokens[0]),
        tokens[1..].to_vec()
    );

    let err = app.sessions.refresh(&tokens[5], CLIENT_IP).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let user = app.user(user_id).await;
    let now = app.clock.now();
    assert_eq!(user.active_refresh_tokens(now).count(), 0);
}

#[tokio::test]
async fn test_replay_leaves_other_sessions_alone() {
    let app = TestApp::new();
    let user_id = app.create_user("two@example.com", Capability::Viewer).await;

    let laptop = app
        .sessions
        .login("two@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap()
        .refresh_token;
    let phone = app
        .sessions
        .login("two@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap()
        .refresh_token;

    app.sessions.refresh(&laptop, CLIENT_IP).await.unwrap();
    app.sessions.refresh(&laptop, CLIENT_IP).await.unwrap_err();

    let user = app.user(user_id).await;
    assert!(user.refresh_token(&phone).unwrap().is_active_at(app.clock.now()));
}

#[tokio::test]
async fn test_activity_tracks_simulated_time() {
    let app = TestApp::new();
    let user_id = app.create_user("time@example.com", Capability::Viewer).await;
    let issued_at = app.clock.now();
    let token = app
        .sessions
        .login("time@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap()
        .refresh_token;
    let user = app.user(user_id).await;
    let record = user.refresh_token(&token).unwrap();

    for hours in [0, 24, 96, 167, 168, 200] {
        let now = issued_at + Duration::hours(hours);
        assert_eq!(
            record.is_active_at(now),
            record.revoked_at.is_none() && now < record.expires_at,
            "at +{hours}h"
        );
        assert_eq!(record.is_active_at(now), hours < 168, "at +{hours}h");
    }

    app.clock.advance(Duration::days(7));
    let err = app.sessions.refresh(&token, CLIENT_IP).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);
}

#[tokio::test]
async fn test_rotation_cleans_up_old_inactive_tokens() {
    let app = TestApp::new();
    let user_id = app.create_user("gc@example.com", Capability::Viewer).await;
    let t0 = app
        .sessions
        .login("gc@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap()
        .refresh_token;

    app.clock.advance(Duration::days(1));
    let t1 = app.sessions.refresh(&t0, CLIENT_IP).await.unwrap().refresh_token;

    // Revoked but created within the retention window.
    assert!(app.user(user_id).await.refresh_token(&t0).is_some());

    // t0 reaches the end of its retention window (7 days after creation).
    app.clock.advance(Duration::days(6));
    let t2 = app.sessions.refresh(&t1, CLIENT_IP).await.unwrap().refresh_token;

    let user = app.user(user_id).await;
    assert!(user.refresh_token(&t0).is_none());
    assert!(user.refresh_token(&t1).is_some());
    assert!(user.refresh_token(&t2).is_some());
}

#[tokio::test]
async fn test_replay_detected_late_in_token_lifetime() {
    let app = TestApp::new();
    let user_id = app.create_user("late@example.com", Capability::Viewer).await;
    let t0 = app
        .sessions
        .login("late@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap()
        .refresh_token;

    app.clock.advance(Duration::days(3));
    let t1 = app.sessions.refresh(&t0, CLIENT_IP).await.unwrap().refresh_token;
    assert!(app.user(user_id).await.refresh_token(&t0).is_some());

    let err = app.sessions.refresh(&t0, CLIENT_IP).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidToken);

    let user = app.user(user_id).await;
    assert!(user.refresh_token(&t1).unwrap().is_revoked());
    assert_eq!(user.active_refresh_tokens(app.clock.now()).count(), 0);
}

#[tokio::test]
async fn test_concurrent_refresh_leaves_no_live_successor_twice() {
    let app = TestApp::new();
    let user_id = app.create_user("race@example.com", Capability::Viewer).await;
    let t0 = app
        .sessions
        .login("race@example.com", PASSWORD, CLIENT_IP)
        .await
        .unwrap()
        .refresh_token;

    let (a, b) = tokio::join!(
        app.sessions.refresh(&t0, CLIENT_IP),
        app.sessions.refresh(&t0, CLIENT_IP)
    );
    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);

    let user = app.user(user_id).await;
    let now = app.clock.now();
    assert_eq!(user.active_refresh_tokens(now).count(), 0);
    assert_eq!(user.refresh_tokens.len(), 2);
}
