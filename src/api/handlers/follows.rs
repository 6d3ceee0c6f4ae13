// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::api::auth::Actor;
use crate::api::AppState;
use crate::error::SocialError;
use crate::follows;
use crate::models::follow::{EdgeState, FollowRequest};
use crate::models::notification::Notification;
use crate::visibility::FollowState;

#[derive(Debug, Serialize)]
pub struct FollowResponse {
    pub success: bool,
    pub follow_state: FollowState,
}

impl FollowResponse {
    fn new(follow_state: FollowState) -> Self {
        Self {
            success: true,
            follow_state,
        }
    }
}

/// Follow a profile (or request to, if it is private)
pub async fn follow_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, SocialError> {
    let actor = actor.require()?;
    let store = state.store.as_ref();
    let target = store
        .profile_by_username(&username)
        .await?
        .ok_or(SocialError::NotFound("Profile not found"))?;

    let edge = follows::follow(store, Some(actor), &target).await?;
    let follow_state = FollowState::from(&EdgeState::from(Some(&edge)));
    Ok(Json(FollowResponse::new(follow_state)))
}

/// Unfollow a profile or withdraw a pending request
pub async fn unfollow_profile(
    State(state): State<AppState>,
    actor: Actor,
    Path(username): Path<String>,
) -> Result<Json<FollowResponse>, SocialError> {
    let actor = actor.require()?;
    let store = state.store.as_ref();
    let target = store
        .profile_by_username(&username)
        .await?
        .ok_or(SocialError::NotFound("Profile not found"))?;

    follows::unfollow(store, Some(actor), target.id).await?;
    Ok(Json(FollowResponse::new(FollowState::after_unfollow())))
}

/// Pending follow requests addressed to the actor
pub async fn list_follow_requests(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<FollowRequest>>, SocialError> {
    let actor = actor.require()?;
    Ok(Json(state.store.pending_requests(actor).await?))
}

pub async fn approve_request(
    State(state): State<AppState>,
    actor: Actor,
    Path(requester): Path<Uuid>,
) -> Result<Json<FollowResponse>, SocialError> {
    follows::approve(state.store.as_ref(), actor.id(), requester).await?;
    Ok(Json(FollowResponse::new(FollowState::Accepted)))
}

pub async fn deny_request(
    State(state): State<AppState>,
    actor: Actor,
    Path(requester): Path<Uuid>,
) -> Result<Json<FollowResponse>, SocialError> {
    follows::deny(state.store.as_ref(), actor.id(), requester).await?;
    Ok(Json(FollowResponse::new(FollowState::NotFollowing)))
}

/// The actor's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<Json<Vec<Notification>>, SocialError> {
    let actor = actor.require()?;
    Ok(Json(state.store.notifications(actor).await?))
}

/// Mark one of the actor's notifications as read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    actor: Actor,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, SocialError> {
    let actor = actor.require()?;
    if !state.store.mark_notification_read(actor, notification_id).await? {
        return Err(SocialError::NotFound("Notification not found"));
    }
    debug!(recipient = %actor, notification = %notification_id, "notification marked read");
    Ok(Json(json!({ "success": true })))
}
