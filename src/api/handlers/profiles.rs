// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::api::auth::Actor;
use crate::api::AppState;
use crate::error::SocialError;
use crate::models::follow::{EdgeKey, EdgeState, FollowCounts, FollowsQuery};
use crate::models::profile::{Profile, ProfileSummary};
use crate::models::timeline::NormalizedEntry;
use crate::store::SocialStore;
use crate::timeline::normalize_timeline;
use crate::visibility::{resolve_visibility, VisibilityDecision};

#[derive(Debug, Serialize)]
pub struct ProfileView {
    pub profile: Profile,
    #[serde(flatten)]
    pub decision: VisibilityDecision,
    pub counts: FollowCounts,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Serialize)]
pub struct ProfileList {
    pub profiles: Vec<ProfileSummary>,
    pub pagination: Pagination,
}

/// Look up `username` and decide what `viewer` may see of it
async fn resolve_profile(
    store: &dyn SocialStore,
    viewer: Option<Uuid>,
    username: &str,
) -> Result<(Profile, VisibilityDecision), SocialError> {
    let profile = store
        .profile_by_username(username)
        .await?
        .ok_or(SocialError::NotFound("Profile not found"))?;

    let edge = match viewer {
        Some(viewer) if viewer != profile.id => store.find_edge(EdgeKey::new(viewer, profile.id)).await?,
        _ => None,
    };

    let decision = resolve_visibility(viewer, &profile, &EdgeState::from(edge.as_ref()));
    debug!(
        username,
        can_view_content = decision.can_view_content,
        follow_state = ?decision.follow_state,
        "resolved profile visibility"
    );
    Ok((profile, decision))
}

async fn visible_profile(
    store: &dyn SocialStore,
    viewer: Option<Uuid>,
    username: &str,
) -> Result<Profile, SocialError> {
    let (profile, decision) = resolve_profile(store, viewer, username).await?;
    if !decision.can_view_content {
        return Err(SocialError::Forbidden);
    }
    Ok(profile)
}

/// Get a profile with the viewer's follow state and follow counts
pub async fn get_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> Result<Json<ProfileView>, SocialError> {
    let store = state.store.as_ref();
    let (profile, decision) = resolve_profile(store, actor.id(), &username).await?;
    let counts = store.follow_counts(profile.id).await?;

    Ok(Json(ProfileView {
        profile,
        decision,
        counts,
    }))
}

/// Get a profile's timeline, newest first with rewatch annotations
pub async fn get_profile_timeline(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> Result<Json<Vec<NormalizedEntry>>, SocialError> {
    let store = state.store.as_ref();
    let profile = visible_profile(store, actor.id(), &username).await?;

    let rows = store.timeline_rows(profile.id).await?;
    debug!("Normalizing {} timeline rows for {}", rows.len(), username);
    Ok(Json(normalize_timeline(rows)))
}

/// Get the accepted followers of a profile
pub async fn get_profile_followers(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
    Query(query): Query<FollowsQuery>,
) -> Result<Json<ProfileList>, SocialError> {
    let store = state.store.as_ref();
    let profile = visible_profile(store, actor.id(), &username).await?;
    let (limit, offset) = (query.limit(), query.offset());

    let (profiles, counts) = futures::try_join!(
        store.followers(profile.id, limit, offset),
        store.follow_counts(profile.id),
    )?;

    Ok(Json(ProfileList {
        profiles,
        pagination: Pagination {
            total: counts.followers,
            limit,
            offset,
        },
    }))
}

/// Get the profiles a profile follows (accepted only)
pub async fn get_profile_following(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
    Query(query): Query<FollowsQuery>,
) -> Result<Json<ProfileList>, SocialError> {
    let store = state.store.as_ref();
    let profile = visible_profile(store, actor.id(), &username).await?;
    let (limit, offset) = (query.limit(), query.offset());

    let (profiles, counts) = futures::try_join!(
        store.following(profile.id, limit, offset),
        store.follow_counts(profile.id),
    )?;

    Ok(Json(ProfileList {
        profiles,
        pagination: Pagination {
            total: counts.following,
            limit,
            offset,
        },
    }))
}
