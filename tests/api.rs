// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use reelbook_social::api::auth::ACTOR_HEADER;
use reelbook_social::api::{router, AppState};
use reelbook_social::config::Config;
use reelbook_social::models::profile::{Profile, Visibility};
use reelbook_social::models::timeline::CatalogRef;
use reelbook_social::store::memory::TimelineRecord;
use reelbook_social::store::MemoryStore;

struct Fixture {
    store: Arc<MemoryStore>,
    app: Router,
    alice: Profile,
    carol: Profile,
}

fn profile(username: &str, visibility: Visibility) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        username: username.into(),
        display_name: Some(username.to_uppercase()),
        bio: None,
        profile_pic_url: None,
        visibility,
        created_at: NaiveDateTime::default(),
    }
}

fn movie(id: i64, title: &str) -> CatalogRef {
    CatalogRef {
        tmdb_id: id,
        title: title.into(),
        release_date: None,
        poster_url: None,
    }
}

fn watched(user: Uuid, day: u32, movie_id: i64) -> TimelineRecord {
    let mut record = TimelineRecord::new(
        user,
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        Utc.with_ymd_and_hms(2024, 3, day, 20, 0, 0).unwrap(),
    );
    record.movie_tmdb_id = Some(movie_id);
    record
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let alice = profile("alice", Visibility::Public);
    let carol = profile("carol", Visibility::Private);
    store.insert_profile(alice.clone()).await;
    store.insert_profile(carol.clone()).await;

    store.insert_movie(movie(42, "Heat")).await;
    store.insert_movie(movie(99, "Ronin")).await;
    // inserted out of order on purpose
    store.insert_timeline_entry(watched(carol.id, 3, 99)).await;
    store.insert_timeline_entry(watched(carol.id, 1, 42)).await;
    let mut rewatch = watched(carol.id, 2, 42);
    rewatch.collaborator_ids = vec![alice.id];
    store.insert_timeline_entry(rewatch).await;

    let app = router(AppState::new(store.clone()), &Config::default());
    Fixture { store, app, alice, carol }
}

async fn send(app: &Router, method: Method, uri: &str, actor: Option<Uuid>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(ACTOR_HEADER, actor.to_string());
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[test_log::test(tokio::test)]
async fn private_timeline_is_gated_until_approved() {
    let f = fixture().await;

    let (status, _) = send(&f.app, Method::GET, "/api/profiles/carol/timeline", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&f.app, Method::POST, "/api/follows/carol", Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["follow_state"], "pending");

    let (status, _) = send(&f.app, Method::GET, "/api/profiles/carol/timeline", Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, requests) = send(&f.app, Method::GET, "/api/follow-requests", Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(requests[0]["requester"]["username"], "alice");

    let uri = format!("/api/follow-requests/{}/approve", f.alice.id);
    let (status, _) = send(&f.app, Method::POST, &uri, Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, timeline) = send(&f.app, Method::GET, "/api/profiles/carol/timeline", Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::OK);

    let entries = timeline.as_array().unwrap();
    let days: Vec<&str> = entries.iter().map(|e| e["watched_on"].as_str().unwrap()).collect();
    assert_eq!(days, vec!["2024-03-03", "2024-03-02", "2024-03-01"]);
    assert_eq!(entries[1]["is_rewatch"], true);
    assert_eq!(entries[1]["rewatch_count"], 1);
    assert_eq!(entries[1]["movie"]["title"], "Heat");
    assert_eq!(entries[1]["collaborators"][0]["username"], "alice");
    assert_eq!(entries[0]["rewatch_count"], 0);
    assert_eq!(entries[2]["is_rewatch"], false);
}

#[test_log::test(tokio::test)]
async fn owner_sees_own_private_timeline() {
    let f = fixture().await;
    let (status, timeline) = send(&f.app, Method::GET, "/api/profiles/carol/timeline", Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(timeline.as_array().unwrap().len(), 3);
}

#[test_log::test(tokio::test)]
async fn profile_view_reports_visibility_and_counts() {
    let f = fixture().await;

    let (status, body) = send(&f.app, Method::GET, "/api/profiles/carol", Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_view_content"], false);
    assert_eq!(body["follow_state"], "not_following");
    assert_eq!(body["profile"]["visibility"], "private");

    send(&f.app, Method::POST, "/api/follows/alice", Some(f.carol.id)).await;
    let (_, body) = send(&f.app, Method::GET, "/api/profiles/alice", None).await;
    assert_eq!(body["can_view_content"], true);
    assert_eq!(body["counts"]["followers"], 1);

    let (status, followers) = send(&f.app, Method::GET, "/api/profiles/alice/followers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(followers["profiles"][0]["username"], "carol");
    assert_eq!(followers["pagination"]["total"], 1);
}

#[test_log::test(tokio::test)]
async fn follow_errors_map_to_status_codes() {
    let f = fixture().await;

    let (status, body) = send(&f.app, Method::POST, "/api/follows/alice", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = send(&f.app, Method::POST, "/api/follows/alice", Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&f.app, Method::POST, "/api/follows/nobody", Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&f.app, Method::POST, "/api/follows/carol", Some(f.alice.id)).await;
    let uri = format!("/api/follow-requests/{}/approve", f.carol.id);
    let (status, _) = send(&f.app, Method::POST, &uri, Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn deny_removes_request_and_notification() {
    let f = fixture().await;
    send(&f.app, Method::POST, "/api/follows/carol", Some(f.alice.id)).await;

    let (_, inbox) = send(&f.app, Method::GET, "/api/notifications", Some(f.carol.id)).await;
    assert_eq!(inbox[0]["kind"], "follow_request");

    let uri = format!("/api/follow-requests/{}/deny", f.alice.id);
    let (status, _) = send(&f.app, Method::POST, &uri, Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(f.store.edge_rows_between(f.alice.id, f.carol.id).await, 0);
    let (_, inbox) = send(&f.app, Method::GET, "/api/notifications", Some(f.carol.id)).await;
    assert!(inbox.as_array().unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn recipient_marks_notification_read() {
    let f = fixture().await;
    send(&f.app, Method::POST, "/api/follows/carol", Some(f.alice.id)).await;

    let (_, inbox) = send(&f.app, Method::GET, "/api/notifications", Some(f.carol.id)).await;
    assert_eq!(inbox[0]["is_read"], false);
    let uri = format!("/api/notifications/{}/read", inbox[0]["id"].as_str().unwrap());

    // the sender cannot touch the recipient's inbox
    let (status, _) = send(&f.app, Method::POST, &uri, Some(f.alice.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, inbox) = send(&f.app, Method::GET, "/api/notifications", Some(f.carol.id)).await;
    assert_eq!(inbox[0]["is_read"], false);

    let (status, _) = send(&f.app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&f.app, Method::POST, &uri, Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let (_, inbox) = send(&f.app, Method::GET, "/api/notifications", Some(f.carol.id)).await;
    assert_eq!(inbox[0]["is_read"], true);

    let missing = format!("/api/notifications/{}/read", Uuid::new_v4());
    let (status, _) = send(&f.app, Method::POST, &missing, Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[test_log::test(tokio::test)]
async fn store_failure_is_a_generic_error() {
    let f = fixture().await;
    f.store.set_fail_writes(true).await;

    let (status, body) = send(&f.app, Method::POST, "/api/follows/alice", Some(f.carol.id)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Something went wrong. Please try again.");
    assert_eq!(f.store.edge_rows_between(f.alice.id, f.carol.id).await, 0);
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let f = fixture().await;
    let (status, body) = send(&f.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let response = f
        .app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = hyper::body::to_bytes(response.into_body()).await.unwrap();
    assert!(String::from_utf8_lossy(&text).contains("reelbook_timeline_entries_normalized_total"));
}

#[test]
fn malformed_actor_header_is_rejected() {
    tokio_test::block_on(async {
        let f = fixture().await;
        let response = f
            .app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/notifications")
                    .header(ACTOR_HEADER, "not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    });
}
