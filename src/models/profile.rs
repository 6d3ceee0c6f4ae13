// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;
use crate::schema::profiles;

/// Whether non-followers may see a profile's protected content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        match raw {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(StoreError::new(format!("unknown profile visibility '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
    pub visibility: Visibility,
    pub created_at: NaiveDateTime,
}

impl Profile {
    pub fn is_private(&self) -> bool {
        self.visibility == Visibility::Private
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            profile_pic_url: self.profile_pic_url.clone(),
        }
    }
}

/// Row as stored in the `profiles` table
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProfileRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub profile_pic_url: Option<String>,
    pub visibility: String,
    pub created_at: NaiveDateTime,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            bio: row.bio,
            profile_pic_url: row.profile_pic_url,
            visibility: Visibility::parse(&row.visibility)?,
            created_at: row.created_at,
        })
    }
}

/// Compact profile used in joins (timeline owners, collaborators, follow lists)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
}
