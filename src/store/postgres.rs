// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sql_types;
use diesel_async::RunQueryDsl;
use tracing::{debug, error};
use uuid::Uuid;

use super::SocialStore;
use crate::db::{DbConnection, DbPool};
use crate::error::StoreError;
use crate::models::follow::{
    EdgeKey, FollowCounts, FollowEdge, FollowEdgeRow, FollowRequest, FollowStatus, NewFollowEdge,
};
use crate::models::notification::{Notification, NotificationKind, NotificationRow};
use crate::models::profile::{Profile, ProfileRow, ProfileSummary};
use crate::models::timeline::RawTimelineEntry;
use crate::schema::{followers, notifications, profiles};

// Each single join is aggregated into a JSON array, the shape the
// normalizer flattens.
const TIMELINE_QUERY: &str = r#"
SELECT jsonb_build_object(
    'id', e.id,
    'user_id', e.user_id,
    'watched_on', e.watched_on,
    'created_at', e.created_at,
    'rating', e.rating,
    'notes', e.notes,
    'viewing_context', e.viewing_context,
    'photo_url', e.photo_url,
    'movie', (SELECT jsonb_agg(to_jsonb(m)) FROM movies m WHERE m.tmdb_id = e.movie_tmdb_id),
    'series', (SELECT jsonb_agg(to_jsonb(s)) FROM series s WHERE s.tmdb_id = e.series_tmdb_id),
    'user', (
        SELECT jsonb_agg(jsonb_build_object(
            'id', p.id,
            'username', p.username,
            'display_name', p.display_name,
            'profile_pic_url', p.profile_pic_url
        ))
        FROM profiles p WHERE p.id = e.user_id
    ),
    'post', CASE WHEN e.post_slug IS NULL THEN NULL ELSE jsonb_build_object('slug', e.post_slug) END,
    'collaborators', COALESCE((
        SELECT jsonb_agg(jsonb_build_object('profile', jsonb_build_array(jsonb_build_object(
            'id', cp.id,
            'username', cp.username,
            'display_name', cp.display_name,
            'profile_pic_url', cp.profile_pic_url
        ))))
        FROM timeline_collaborators c
        JOIN profiles cp ON cp.id = c.user_id
        WHERE c.entry_id = e.id
    ), '[]'::jsonb)
) AS entry
FROM timeline_entries e
WHERE e.user_id = $1
ORDER BY e.watched_on ASC, e.created_at ASC
"#;

#[derive(QueryableByName)]
struct TimelineRow {
    #[diesel(sql_type = sql_types::Jsonb)]
    entry: serde_json::Value,
}

type SummaryTuple = (Uuid, String, Option<String>, Option<String>);

fn summary_from((id, username, display_name, profile_pic_url): SummaryTuple) -> ProfileSummary {
    ProfileSummary {
        id,
        username,
        display_name,
        profile_pic_url,
    }
}

/// Which side of the edge a list or count is taken from
#[derive(Clone, Copy)]
enum Side {
    Followers,
    Following,
}

/// [`SocialStore`] over Postgres via diesel-async
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a database connection from the pool
    async fn get_connection(&self) -> Result<DbConnection, StoreError> {
        self.pool.get().await.map_err(|e| {
            error!("Database connection error: {}", e);
            StoreError::new(format!("Failed to get database connection: {}", e))
        })
    }

    async fn accepted_count(&self, side: Side, profile_id: Uuid) -> Result<i64, StoreError> {
        let mut conn = self.get_connection().await?;
        let accepted = FollowStatus::Accepted.as_str();
        let count = match side {
            Side::Followers => {
                followers::table
                    .filter(followers::following_id.eq(profile_id))
                    .filter(followers::status.eq(accepted))
                    .count()
                    .get_result::<i64>(&mut conn)
                    .await?
            }
            Side::Following => {
                followers::table
                    .filter(followers::follower_id.eq(profile_id))
                    .filter(followers::status.eq(accepted))
                    .count()
                    .get_result::<i64>(&mut conn)
                    .await?
            }
        };
        Ok(count)
    }

    async fn accepted_profiles(
        &self,
        side: Side,
        profile_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProfileSummary>, StoreError> {
        let mut conn = self.get_connection().await?;
        let select = (
            profiles::id,
            profiles::username,
            profiles::display_name,
            profiles::profile_pic_url,
        );

        let rows = match side {
            Side::Followers => {
                followers::table
                    .inner_join(profiles::table.on(profiles::id.eq(followers::follower_id)))
                    .filter(followers::following_id.eq(profile_id))
                    .filter(followers::status.eq(FollowStatus::Accepted.as_str()))
                    .order_by(followers::created_at.desc())
                    .limit(limit)
                    .offset(offset)
                    .select(select)
                    .load::<SummaryTuple>(&mut conn)
                    .await?
            }
            Side::Following => {
                followers::table
                    .inner_join(profiles::table.on(profiles::id.eq(followers::following_id)))
                    .filter(followers::follower_id.eq(profile_id))
                    .filter(followers::status.eq(FollowStatus::Accepted.as_str()))
                    .order_by(followers::created_at.desc())
                    .limit(limit)
                    .offset(offset)
                    .select(select)
                    .load::<SummaryTuple>(&mut conn)
                    .await?
            }
        };

        Ok(rows.into_iter().map(summary_from).collect())
    }
}

#[async_trait]
impl SocialStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        diesel::sql_query("SELECT 1").execute(&mut conn).await?;
        Ok(())
    }

    async fn profile_by_username(&self, username: &str) -> Result<Option<Profile>, StoreError> {
        let mut conn = self.get_connection().await?;
        profiles::table
            .filter(profiles::username.eq(username))
            .select(ProfileRow::as_select())
            .first::<ProfileRow>(&mut conn)
            .await
            .optional()?
            .map(Profile::try_from)
            .transpose()
    }

    async fn profile_by_id(&self, id: Uuid) -> Result<Option<Profile>, StoreError> {
        let mut conn = self.get_connection().await?;
        profiles::table
            .find(id)
            .select(ProfileRow::as_select())
            .first::<ProfileRow>(&mut conn)
            .await
            .optional()?
            .map(Profile::try_from)
            .transpose()
    }

    async fn find_edge(&self, key: EdgeKey) -> Result<Option<FollowEdge>, StoreError> {
        let mut conn = self.get_connection().await?;
        followers::table
            .find((key.follower_id, key.following_id))
            .select(FollowEdgeRow::as_select())
            .first::<FollowEdgeRow>(&mut conn)
            .await
            .optional()?
            .map(FollowEdge::try_from)
            .transpose()
    }

    async fn upsert_edge(
        &self,
        key: EdgeKey,
        status: FollowStatus,
        now: NaiveDateTime,
    ) -> Result<FollowEdge, StoreError> {
        let mut conn = self.get_connection().await?;
        let edge = NewFollowEdge::new(key, status, now);

        let upserted = diesel::query_dsl::methods::FilterDsl::filter(
            diesel::insert_into(followers::table)
                .values(&edge)
                .on_conflict((followers::follower_id, followers::following_id))
                .do_update()
                .set((
                    followers::status.eq(status.as_str()),
                    followers::updated_at.eq(now),
                )),
            followers::status.ne(FollowStatus::Accepted.as_str()),
        )
            .returning(FollowEdgeRow::as_returning())
            .get_result::<FollowEdgeRow>(&mut conn)
            .await
            .optional()?;

        // No row back means the edge was already accepted and stays that way
        let row = match upserted {
            Some(row) => row,
            None => {
                followers::table
                    .find((key.follower_id, key.following_id))
                    .select(FollowEdgeRow::as_select())
                    .first::<FollowEdgeRow>(&mut conn)
                    .await?
            }
        };

        debug!(follower = %key.follower_id, following = %key.following_id, status = status.as_str(), "upserted edge");
        FollowEdge::try_from(row)
    }

    async fn accept_edge(&self, key: EdgeKey, now: NaiveDateTime) -> Result<Option<FollowEdge>, StoreError> {
        let mut conn = self.get_connection().await?;
        diesel::update(
            followers::table
                .filter(followers::follower_id.eq(key.follower_id))
                .filter(followers::following_id.eq(key.following_id))
                .filter(followers::status.eq(FollowStatus::Pending.as_str())),
        )
        .set((
            followers::status.eq(FollowStatus::Accepted.as_str()),
            followers::updated_at.eq(now),
        ))
        .returning(FollowEdgeRow::as_returning())
        .get_result::<FollowEdgeRow>(&mut conn)
        .await
        .optional()?
        .map(FollowEdge::try_from)
        .transpose()
    }

    async fn delete_edge(&self, key: EdgeKey) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;
        let deleted = diesel::delete(
            followers::table
                .filter(followers::follower_id.eq(key.follower_id))
                .filter(followers::following_id.eq(key.following_id)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted > 0)
    }

    async fn pending_requests(&self, profile_id: Uuid) -> Result<Vec<FollowRequest>, StoreError> {
        let mut conn = self.get_connection().await?;
        let rows = followers::table
            .inner_join(profiles::table.on(profiles::id.eq(followers::follower_id)))
            .filter(followers::following_id.eq(profile_id))
            .filter(followers::status.eq(FollowStatus::Pending.as_str()))
            .order_by(followers::created_at.asc())
            .select((
                (
                    profiles::id,
                    profiles::username,
                    profiles::display_name,
                    profiles::profile_pic_url,
                ),
                followers::created_at,
            ))
            .load::<(SummaryTuple, NaiveDateTime)>(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(summary, requested_at)| FollowRequest {
                requester: summary_from(summary),
                requested_at,
            })
            .collect())
    }

    async fn followers(&self, profile_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ProfileSummary>, StoreError> {
        self.accepted_profiles(Side::Followers, profile_id, limit, offset).await
    }

    async fn following(&self, profile_id: Uuid, limit: i64, offset: i64) -> Result<Vec<ProfileSummary>, StoreError> {
        self.accepted_profiles(Side::Following, profile_id, limit, offset).await
    }

    async fn follow_counts(&self, profile_id: Uuid) -> Result<FollowCounts, StoreError> {
        let (followers, following) = futures::try_join!(
            self.accepted_count(Side::Followers, profile_id),
            self.accepted_count(Side::Following, profile_id),
        )?;
        Ok(FollowCounts { followers, following })
    }

    async fn timeline_rows(&self, user_id: Uuid) -> Result<Vec<RawTimelineEntry>, StoreError> {
        let mut conn = self.get_connection().await?;
        let rows = diesel::sql_query(TIMELINE_QUERY)
            .bind::<sql_types::Uuid, _>(user_id)
            .load::<TimelineRow>(&mut conn)
            .await?;

        rows.into_iter()
            .map(|row| serde_json::from_value::<RawTimelineEntry>(row.entry).map_err(StoreError::from))
            .collect()
    }

    async fn create_notification(&self, notification: Notification) -> Result<(), StoreError> {
        let mut conn = self.get_connection().await?;
        diesel::insert_into(notifications::table)
            .values(NotificationRow::from(&notification))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    async fn delete_notifications(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        kinds: &[NotificationKind],
    ) -> Result<u64, StoreError> {
        let mut conn = self.get_connection().await?;
        let kinds: Vec<&str> = kinds.iter().map(NotificationKind::as_str).collect();
        let deleted = diesel::delete(
            notifications::table
                .filter(notifications::actor_id.eq(actor_id))
                .filter(notifications::recipient_id.eq(recipient_id))
                .filter(notifications::kind.eq_any(kinds)),
        )
        .execute(&mut conn)
        .await?;
        Ok(deleted as u64)
    }

    async fn convert_request_notification(
        &self,
        actor_id: Uuid,
        recipient_id: Uuid,
        now: NaiveDateTime,
    ) -> Result<u64, StoreError> {
        let mut conn = self.get_connection().await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::actor_id.eq(actor_id))
                .filter(notifications::recipient_id.eq(recipient_id))
                .filter(notifications::kind.eq(NotificationKind::FollowRequest.as_str())),
        )
        .set((
            notifications::kind.eq(NotificationKind::NewFollower.as_str()),
            notifications::created_at.eq(now),
            notifications::is_read.eq(false),
        ))
        .execute(&mut conn)
        .await?;
        Ok(updated as u64)
    }

    async fn notifications(&self, recipient_id: Uuid) -> Result<Vec<Notification>, StoreError> {
        let mut conn = self.get_connection().await?;
        notifications::table
            .filter(notifications::recipient_id.eq(recipient_id))
            .order_by(notifications::created_at.desc())
            .select(NotificationRow::as_select())
            .load::<NotificationRow>(&mut conn)
            .await?
            .into_iter()
            .map(Notification::try_from)
            .collect()
    }

    async fn mark_notification_read(&self, recipient_id: Uuid, notification_id: Uuid) -> Result<bool, StoreError> {
        let mut conn = self.get_connection().await?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::id.eq(notification_id))
                .filter(notifications::recipient_id.eq(recipient_id)),
        )
        .set(notifications::is_read.eq(true))
        .execute(&mut conn)
        .await?;
        Ok(updated > 0)
    }
}
