// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::profile::ProfileSummary;
use crate::schema::followers;

/// Stored status of a follow edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowStatus {
    Pending,
    Accepted,
}

impl FollowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FollowStatus::Pending => "pending",
            FollowStatus::Accepted => "accepted",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        match raw {
            "pending" => Ok(FollowStatus::Pending),
            "accepted" => Ok(FollowStatus::Accepted),
            other => Err(StoreError::new(format!("unknown follow status '{}'", other))),
        }
    }
}

/// Identifies a follow edge: `follower_id` follows `following_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeKey {
    pub follower_id: Uuid,
    pub following_id: Uuid,
}

impl EdgeKey {
    pub fn new(follower_id: Uuid, following_id: Uuid) -> Self {
        Self { follower_id, following_id }
    }

    /// The same pair in the opposite direction
    pub fn reversed(&self) -> Self {
        Self::new(self.following_id, self.follower_id)
    }

    pub fn involves(&self, profile_id: Uuid) -> bool {
        self.follower_id == profile_id || self.following_id == profile_id
    }
}

/// A directed follow relationship
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEdge {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub status: FollowStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Status of the edge between a viewer and a target, absent edges included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeState {
    None,
    Pending { since: NaiveDateTime },
    Accepted { since: NaiveDateTime },
}

impl EdgeState {
    pub fn is_accepted(&self) -> bool {
        matches!(self, EdgeState::Accepted { .. })
    }
}

impl From<Option<&FollowEdge>> for EdgeState {
    fn from(edge: Option<&FollowEdge>) -> Self {
        match edge {
            None => EdgeState::None,
            Some(e) => match e.status {
                FollowStatus::Pending => EdgeState::Pending { since: e.updated_at },
                FollowStatus::Accepted => EdgeState::Accepted { since: e.updated_at },
            },
        }
    }
}

/// Row as stored in the `followers` table
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = followers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FollowEdgeRow {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<FollowEdgeRow> for FollowEdge {
    type Error = StoreError;

    fn try_from(row: FollowEdgeRow) -> Result<Self, Self::Error> {
        Ok(FollowEdge {
            follower_id: row.follower_id,
            following_id: row.following_id,
            status: FollowStatus::parse(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// DTO for upserting a follow edge
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = followers)]
pub struct NewFollowEdge {
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub status: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl NewFollowEdge {
    pub fn new(key: EdgeKey, status: FollowStatus, now: NaiveDateTime) -> Self {
        Self {
            follower_id: key.follower_id,
            following_id: key.following_id,
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A pending request joined with the requester's profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowRequest {
    pub requester: ProfileSummary,
    pub requested_at: NaiveDateTime,
}

/// Accepted follower/following counts for a profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowCounts {
    pub followers: i64,
    pub following: i64,
}

/// Query parameters for paginating followers/following lists
#[derive(Debug, Deserialize)]
pub struct FollowsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub page: Option<i64>,
}

impl FollowsQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(50).clamp(1, 100)
    }

    /// Offset derived from `page` when given, else the explicit offset
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) if page > 1 => (page - 1).saturating_mul(self.limit()),
            _ => self.offset.unwrap_or(0).max(0),
        }
    }
}
