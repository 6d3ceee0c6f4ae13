// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use tracing_test::traced_test;
use uuid::Uuid;

use reelbook_social::follows;
use reelbook_social::models::profile::{Profile, Visibility};
use reelbook_social::store::MemoryStore;

fn profile(username: &str, visibility: Visibility) -> Profile {
    Profile {
        id: Uuid::new_v4(),
        username: username.into(),
        display_name: None,
        bio: None,
        profile_pic_url: None,
        visibility,
        created_at: NaiveDateTime::default(),
    }
}

#[tokio::test]
#[traced_test]
async fn follow_transitions_are_logged() {
    let store = MemoryStore::new();
    let alice = profile("alice", Visibility::Public);
    let carol = profile("carol", Visibility::Private);
    store.insert_profile(alice.clone()).await;
    store.insert_profile(carol.clone()).await;

    follows::follow(&store, Some(alice.id), &carol).await.unwrap();
    assert!(logs_contain("follow edge written"));

    follows::approve(&store, Some(carol.id), alice.id).await.unwrap();
    assert!(logs_contain("follow request approved"));

    follows::unfollow(&store, Some(alice.id), carol.id).await.unwrap();
    assert!(logs_contain("follow edge removed"));
}

#[tokio::test]
#[traced_test]
async fn failed_write_is_logged_and_surfaced() {
    let store = MemoryStore::new();
    let alice = profile("alice", Visibility::Public);
    let carol = profile("carol", Visibility::Public);
    store.insert_profile(alice.clone()).await;
    store.insert_profile(carol.clone()).await;
    store.set_fail_writes(true).await;

    assert!(follows::follow(&store, Some(alice.id), &carol).await.is_err());
    assert!(!logs_contain("follow edge written"));
}
