// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::SocialStore;
use crate::error::StoreError;
use crate::models::follow::{EdgeKey, FollowCounts, FollowEdge, FollowRequest, FollowStatus};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::profile::{Profile, ProfileSummary};
use crate::models::timeline::{CatalogRef, Joined, PostRef, RawCollaborator, RawTimelineEntry};

/// Watch-log row as kept by [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct TimelineRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_tmdb_id: Option<i64>,
    pub series_tmdb_id: Option<i64>,
    pub watched_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub rating: Option<f32>,
    pub notes: Option<String>,
    pub viewing_context: Option<String>,
    pub photo_url: Option<String>,
    pub post_slug: Option<String>,
    pub collaborator_ids: Vec<Uuid>,
}

impl TimelineRecord {
    pub fn new(user_id: Uuid, watched_on: NaiveDate, created_at: DateTime<Utc>) -> Self {
        TimelineRecord {
            id: Uuid::new_v4(),
            user_id,
            movie_tmdb_id: None,
            series_tmdb_id: None,
            watched_on,
            created_at,
            rating: None,
            notes: None,
            viewing_context: None,
            photo_url: None,
            post_slug: None,
            collaborator_ids: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    edges: HashMap<EdgeKey, FollowEdge>,
    notifications: Vec<Notification>,
    movies: HashMap<i64, CatalogRef>,
    series: HashMap<i64, CatalogRef>,
    entries: Vec<TimelineRecord>,
    fail_writes: bool,
}

impl Tables {
    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::new("write rejected by store"));
        }
        Ok(())
    }

    fn summary(&self, id: Uuid) -> Option<ProfileSummary> {
        self.profiles.get(&id).map(Profile::summary)
    }

    fn accepted_edges<'a>(&'a self, pick: impl Fn(&FollowEdge) -> bool + 'a) -> Vec<&'a FollowEdge> {
        let mut edges: Vec<&FollowEdge> = self
            .edges
            .values()
            .filter(|e| e.status == FollowStatus::Accepted && pick(e))
            .collect();
        edges.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        edges
    }
}

/// In-process [`SocialStore`] with the same semantics as the Postgres one.
///
/// Join results are handed out array-wrapped, the way the relational
/// backend returns them.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.tables.write().await.profiles.insert(profile.id, profile);
    }

    pub async fn insert_movie(&self, movie: CatalogRef) {
        self.tables.write().await.movies.insert(movie.tmdb_id, movie);
    }

    pub async fn insert_series(&self, series: CatalogRef) {
        self.tables.write().await.series.insert(series.tmdb_id, series);
    }

    pub async fn insert_timeline_entry(&self, record: TimelineRecord) {
        self.tables.write().await.entries.push(record);
    }

    /// Make every subsequent write fail, to exercise store error paths
    pub async fn set_fail_writes(&self, fail: bool) {
        self.tables.write().await.fail_writes = fail;
    }

    /// Number of follow rows between `a` and `b` in either direction
    pub async fn edge_rows_between(&self, a: Uuid, b: Uuid) -> usize {
        let key = EdgeKey::new(a, b);
        self.tables
            .read()
            .await
            .edges
            .keys()
            .filter(|k| **k == key || **k == key.reversed())
            .count()
    }
}

fn paginate<T>(items: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl SocialStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn profile_by_username(&self, username: &str) -> Result<Option<Profile>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.values().find(|p| p.username == username).cloned())
    }

    async fn profile_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&id).cloned())
    }

    async fn find_edge(&self, key: EdgeKey) -> Result<Option<FollowEdge>, StoreError> {
        Ok(self.tables.read().await.edges.get(&key).cloned())
    }

    async fn upsert_edge(
        &self,
        key: EdgeKey,
        status: FollowStatus,
        now: NaiveDateTime,
    ) -> Result<FollowEdge, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        let edge = tables
            .edges
            .entry(key)
            .and_modify(|e| {
                if e.status != FollowStatus::Accepted {
                    e.status = status;
                    e.updated_at = now;
                }
            })
            .or_insert_with(|| FollowEdge {
                follower_id: key.follower_id,
                following_id: key.following_id,
                status,
                created_at: now,
                updated_at: now,
            });
        debug!(follower = %key.follower_id, following = %key.following_id, status = status.as_str(), "upserted edge");
        Ok(edge.clone())
    }

    async fn accept_edge(&self, key: EdgeKey, now: NaiveDateTime) -> Result<Option<FollowEdge>, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;

        match tables.edges.get_mut(&key) {
            Some(edge) if edge.status == FollowStatus::Pending => {
                edge.status = FollowStatus::Accepted;
                edge.updated_at = now;
                Ok(Some(edge.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_edge(&self, key: EdgeKey) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        Ok(tables.edges.remove(&key).is_some())
    }

    async fn pending_requests(&self, profile_id: Uuid) -> Result<Vec<FollowRequest>, StoreError> {
        let tables = self.tables.read().await;
        let mut requests: Vec<FollowRequest> = tables
            .edges
            .values()
            .filter(|e| e.following_id == profile_id && e.status == FollowStatus::Pending)
            .filter_map(|e| {
                tables.summary(e.follower_id).map(|requester| FollowRequest {
                    requester,
                    requested_at: e.created_at,
                })
            })
            .collect();
        requests.sort_by(|a, b| a.requested_at.cmp(&b.requested_at));
        Ok(requests)
    }

    async fn followers(&self, profile_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ProfileSummary>, StoreError> {
        let tables = self.tables.read().await;
        let summaries = tables
            .accepted_edges(|e| e.following_id == profile_id)
            .into_iter()
            .filter_map(|e| tables.summary(e.follower_id))
            .collect();
        Ok(paginate(summaries, limit, offset))
    }

    async fn following(&self, profile_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ProfileSummary>, StoreError> {
        let tables = self.tables.read().await;
        let summaries = tables
            .accepted_edges(|e| e.follower_id == profile_id)
            .into_iter()
            .filter_map(|e| tables.summary(e.following_id))
            .collect();
        Ok(paginate(summaries, limit, offset))
    }

    async fn follow_counts(&self, profile_id: Uuid) -> Result<FollowCounts, StoreError> {
        let tables = self.tables.read().await;
        Ok(FollowCounts {
            followers: tables.accepted_edges(|e| e.following_id == profile_id).len() as i64,
            following: tables.accepted_edges(|e| e.follower_id == profile_id).len() as i64,
        })
    }

    async fn timeline_rows(&self, user_id: Uuid) -> Result<Vec<RawTimelineEntry>, StoreError> {
        let tables = self.tables.read().await;
        let mut records: Vec<&TimelineRecord> = tables.entries.iter().filter(|r| r.user_id == user_id).collect();
        records.sort_by(|a, b| (a.watched_on, a.created_at).cmp(&(b.watched_on, b.created_at)));

        let wrap = |value: Option<CatalogRef>| value.map(|v| Joined::Many(vec![v]));

        Ok(records
            .into_iter()
            .map(|r| RawTimelineEntry {
                id: r.id,
                user_id: r.user_id,
                watched_on: r.watched_on,
                created_at: r.created_at,
                rating: r.rating,
                notes: r.notes.clone(),
                viewing_context: r.viewing_context.clone(),
                photo_url: r.photo_url.clone(),
                movie: wrap(r.movie_tmdb_id.and_then(|id| tables.movies.get(&id).cloned())),
                series: wrap(r.series_tmdb_id.and_then(|id| tables.series.get(&id).cloned())),
                user: tables.summary(r.user_id).map(|s| Joined::Many(vec![s])),
                post: r.post_slug.clone().map(|slug| Joined::One(PostRef { slug })),
                collaborators: r
                    .collaborator_ids
                    .iter()
                    .map(|id| RawCollaborator {
                        profile: tables.summary(*id).map(|s| Joined::Many(vec![s])),
                    })
                    .collect(),
            })
            .collect())
    }

    async fn create_notification(&self, notification: Notification) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        tables.notifications.push(notification);
        Ok(())
    }

    async fn delete_notifications(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        kinds: &[NotificationKind],
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        let before = tables.notifications.len();
        tables
            .notifications
            .retain(|n| !(n.actor_id == actor_id && n.recipient_id == recipient_id && kinds.contains(&n.kind)));
        Ok((before - tables.notifications.len()) as u64)
    }

    async fn convert_request_notification(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        let mut updated = 0;
        for n in tables.notifications.iter_mut().filter(|n| {
            n.actor_id == actor_id && n.recipient_id == recipient_id && n.kind == NotificationKind::FollowRequest
        }) {
            n.kind = NotificationKind::NewFollower;
            n.created_at = now;
            n.is_read = false;
            updated += 1;
        }
        Ok(updated)
    }

    async fn notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let tables = self.tables.read().await;
        let mut list: Vec<Notification> = tables
            .notifications
            .iter()
            .filter(|n| n.recipient_id == recipient_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn mark_notification_read(&self, recipient_id: Uuid, notification_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        tables.check_writable()?;
        match tables
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.recipient_id == recipient_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
