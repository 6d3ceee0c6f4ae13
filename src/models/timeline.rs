// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::profile::ProfileSummary;

/// A single related row as returned by a join: either the row itself or a
/// list holding it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Joined<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> Joined<T> {
    pub fn into_single(self) -> Option<T> {
        match self {
            Joined::One(value) => Some(value),
            Joined::Many(values) => values.into_iter().next(),
        }
    }
}

/// Cached catalog row for a movie or a series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRef {
    pub tmdb_id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// Review post linked to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub slug: String,
}

/// Collaborator join row; `profile` is the co-watching user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCollaborator {
    pub profile: Option<Joined<ProfileSummary>>,
}

/// Watch-log record as it comes out of the store, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTimelineEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub watched_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub viewing_context: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default, alias = "movies", deserialize_with = "lenient_join")]
    pub movie: Option<Joined<CatalogRef>>,
    #[serde(default, deserialize_with = "lenient_join")]
    pub series: Option<Joined<CatalogRef>>,
    #[serde(default, alias = "profiles", deserialize_with = "lenient_join")]
    pub user: Option<Joined<ProfileSummary>>,
    #[serde(default, alias = "posts", deserialize_with = "lenient_join")]
    pub post: Option<Joined<PostRef>>,
    #[serde(default, alias = "timeline_collaborators", deserialize_with = "lenient_collaborators")]
    pub collaborators: Vec<RawCollaborator>,
}

/// Display-ready timeline entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub watched_on: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub rating: Option<f32>,
    pub notes: Option<String>,
    pub viewing_context: Option<String>,
    pub photo_url: Option<String>,
    pub movie: Option<CatalogRef>,
    pub series: Option<CatalogRef>,
    pub user: Option<ProfileSummary>,
    pub post: Option<PostRef>,
    pub collaborators: Vec<ProfileSummary>,
    pub media_key: Option<String>,
    pub is_rewatch: bool,
    pub rewatch_count: u32,
}

// A reference of the wrong shape is read as absent instead of failing the row.
fn lenient_join<'de, D, T>(deserializer: D) -> Result<Option<Joined<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

// Accepts join rows (`{"profile": ...}` / `{"profiles": ...}`), bare profiles
// and a single object in place of a list.
fn lenient_collaborators<'de, D>(deserializer: D) -> Result<Vec<RawCollaborator>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<Value>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => vec![other],
    };

    Ok(items.into_iter().filter_map(collaborator_from_value).collect())
}

fn collaborator_from_value(value: Value) -> Option<RawCollaborator> {
    let Value::Object(mut fields) = value else {
        return None;
    };

    let nested = fields.remove("profile").or_else(|| fields.remove("profiles"));
    let profile = match nested {
        Some(inner) => serde_json::from_value::<Joined<ProfileSummary>>(inner).ok(),
        None => serde_json::from_value::<ProfileSummary>(Value::Object(fields))
            .ok()
            .map(Joined::One),
    };

    Some(RawCollaborator { profile })
}
