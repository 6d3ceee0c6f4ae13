// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::schema::notifications;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FollowRequest,
    NewFollower,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FollowRequest => "follow_request",
            NotificationKind::NewFollower => "new_follower",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        match raw {
            "follow_request" => Ok(NotificationKind::FollowRequest),
            "new_follower" => Ok(NotificationKind::NewFollower),
            other => Err(StoreError::new(format!("unknown notification kind '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub actor_username: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Insertable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NotificationRow {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub actor_username: String,
    pub kind: String,
    pub is_read: bool,
    pub created_at: NaiveDateTime,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            actor_id: row.actor_id,
            actor_username: row.actor_username,
            kind: NotificationKind::parse(&row.kind)?,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        NotificationRow {
            id: n.id,
            recipient_id: n.recipient_id,
            actor_id: n.actor_id,
            actor_username: n.actor_username.clone(),
            kind: n.kind.as_str().to_string(),
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

impl Notification {
    pub fn new(
        recipient_id: Uuid,
        actor_id: Uuid,
        actor_username: impl Into<String>,
        kind: NotificationKind,
        now: NaiveDateTime,
    ) -> Self {
        Notification {
            id: Uuid::new_v4(),
            recipient_id,
            actor_id,
            actor_username: actor_username.into(),
            kind,
            is_read: false,
            created_at: now,
        }
    }
}
