// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::follow::{EdgeKey, FollowCounts, FollowEdge, FollowRequest, FollowStatus};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::profile::{Profile, ProfileSummary};
use crate::models::timeline::RawTimelineEntry;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Relational backend behind the social features.
///
/// Every mutation is a single keyed upsert, update or delete, so a failed
/// call leaves the previous state in place.
#[async_trait]
pub trait SocialStore: Send + Sync {
    /// Cheap round-trip used by the health check
    async fn ping(&self) -> Result<(), StoreError>;

    async fn profile_by_username(&self, username: &str) -> Result<Option<Profile>, StoreError>;

    async fn profile_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn find_edge(&self, key: EdgeKey) -> Result<Option<FollowEdge>, StoreError>;

    /// Insert the edge, or overwrite the status of an existing pending one.
    /// An accepted edge is returned unchanged.
    async fn upsert_edge(
        &self,
        key: EdgeKey,
        status: FollowStatus,
        now: NaiveDateTime,
    ) -> Result<FollowEdge, StoreError>;

    /// Move a pending edge to accepted. `None` when no pending edge exists.
    async fn accept_edge(&self, key: EdgeKey, now: NaiveDateTime) -> Result<Option<FollowEdge>, StoreError>;

    /// Returns whether a row was deleted
    async fn delete_edge(&self, key: EdgeKey) -> Result<bool, StoreError>;

    /// Pending requests addressed to `profile_id`, oldest first
    async fn pending_requests(&self, profile_id: Uuid) -> Result<Vec<FollowRequest>, StoreError>;

    /// Accepted followers of `profile_id`, most recent first
    async fn followers(&self, profile_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ProfileSummary>, StoreError>;

    /// Accepted follows of `profile_id`, most recent first
    async fn following(&self, profile_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ProfileSummary>, StoreError>;

    async fn follow_counts(&self, profile_id: Uuid) -> Result<FollowCounts, StoreError>;

    /// Watch-log rows of one user, ascending by `(watched_on, created_at)`
    async fn timeline_rows(&self, user_id: Uuid) -> Result<Vec<RawTimelineEntry>, StoreError>;

    async fn create_notification(&self, notification: Notification) -> Result<(), StoreError>;

    /// Delete notifications sent by `actor_id` to `recipient_id` of the given kinds
    async fn delete_notifications(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        kinds: &[NotificationKind],
    ) -> Result<u64, StoreError>;

    /// Turn a follow request notification into an unread new-follower one
    async fn convert_request_notification(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<u64, StoreError>;

    /// Notifications for `recipient_id`, newest first
    async fn notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>, StoreError>;

    /// Mark a notification read. Only matches notifications addressed to
    /// `recipient_id`; returns whether one was found.
    async fn mark_notification_read(&self, recipient_id: Uuid, notification_id: Uuid) -> Result<bool, StoreError>;
}
