// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

//! Follow-graph transitions: follow, approve, and the shared delete behind
//! unfollow and deny.
//!
//! Authorization and validation are checked before anything is written.

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{SocialError, StoreError};
use crate::metrics::record_transition;
use crate::models::follow::{EdgeKey, FollowEdge, FollowStatus};
use crate::models::notification::{Notification, NotificationKind};
use crate::models::profile::Profile;
use crate::store::SocialStore;
use crate::visibility::initial_status;

const FOLLOW_NOTIFICATIONS: [NotificationKind; 2] = [NotificationKind::NewFollower, NotificationKind::FollowRequest];

fn require_actor(transition: &'static str, actor: Option<Uuid>) -> Result<Uuid, SocialError> {
    actor.ok_or_else(|| {
        record_transition(transition, "rejected");
        SocialError::not_logged_in()
    })
}

fn store_failure(transition: &'static str, e: StoreError) -> SocialError {
    record_transition(transition, "failed");
    SocialError::Store(e)
}

/// Follow `target`. Private targets get a pending request, public ones an
/// accepted edge. Repeating the call never duplicates the edge and never
/// downgrades an accepted one.
pub async fn follow(
    store: &dyn SocialStore,
    actor: Option<Uuid>,
    target: &Profile,
) -> Result<FollowEdge, SocialError> {
    let actor = require_actor("follow", actor)?;
    if actor == target.id {
        record_transition("follow", "rejected");
        return Err(SocialError::Validation("You cannot follow yourself."));
    }

    let key = EdgeKey::new(actor, target.id);
    let existing = store.find_edge(key).await.map_err(|e| store_failure("follow", e))?;

    let status = initial_status(target.visibility);
    if let Some(edge) = existing {
        if edge.status == FollowStatus::Accepted || edge.status == status {
            debug!(follower = %actor, following = %target.id, "follow edge already in place");
            record_transition("follow", "ok");
            return Ok(edge);
        }
    }

    let now = Utc::now().naive_utc();
    let edge = store
        .upsert_edge(key, status, now)
        .await
        .map_err(|e| store_failure("follow", e))?;

    info!(follower = %actor, following = %target.id, status = status.as_str(), "follow edge written");
    record_transition("follow", "ok");

    let kind = match edge.status {
        FollowStatus::Pending => NotificationKind::FollowRequest,
        FollowStatus::Accepted => NotificationKind::NewFollower,
    };
    notify(store, actor, target.id, kind).await;

    Ok(edge)
}

/// Approve the pending request `requester → actor`. Only the requested
/// profile may approve; the requester calling this fails.
pub async fn approve(
    store: &dyn SocialStore,
    actor: Option<Uuid>,
    requester: Uuid,
) -> Result<FollowEdge, SocialError> {
    let actor = require_actor("approve", actor)?;
    if actor == requester {
        record_transition("approve", "rejected");
        return Err(SocialError::Validation("You cannot approve your own request."));
    }

    let key = EdgeKey::new(requester, actor);
    let now = Utc::now().naive_utc();

    if let Some(edge) = store.accept_edge(key, now).await.map_err(|e| store_failure("approve", e))? {
        info!(follower = %requester, following = %actor, "follow request approved");
        record_transition("approve", "ok");

        if let Err(e) = store.convert_request_notification(requester, actor, now).await {
            warn!("Failed to convert follow request notification: {}", e);
        }
        return Ok(edge);
    }

    // Nothing pending in the approvable direction: find out why
    if let Some(edge) = store.find_edge(key).await.map_err(|e| store_failure("approve", e))? {
        debug!(follower = %requester, following = %actor, "request already accepted");
        record_transition("approve", "ok");
        return Ok(edge);
    }

    record_transition("approve", "rejected");
    match store.find_edge(key.reversed()).await.map_err(|e| store_failure("approve", e))? {
        Some(_) => Err(SocialError::Authorization(
            "Only the requested profile can approve a follow request.",
        )),
        None => Err(SocialError::NotFound("Follow request not found.")),
    }
}

/// Delete the edge `key` from whatever state it is in. The actor must be one
/// of its endpoints. Deleting an edge that does not exist succeeds.
pub async fn deny_or_unfollow(
    store: &dyn SocialStore,
    actor: Option<Uuid>,
    key: EdgeKey,
) -> Result<(), SocialError> {
    let actor = require_actor("remove", actor)?;
    if !key.involves(actor) {
        record_transition("remove", "rejected");
        return Err(SocialError::Authorization("You can only remove your own follow relationships."));
    }

    let removed = store.delete_edge(key).await.map_err(|e| store_failure("remove", e))?;
    info!(follower = %key.follower_id, following = %key.following_id, removed, "follow edge removed");
    record_transition("remove", "ok");

    if let Err(e) = store
        .delete_notifications(key.follower_id, key.following_id, &FOLLOW_NOTIFICATIONS)
        .await
    {
        warn!("Failed to clean up follow notifications: {}", e);
    }
    Ok(())
}

/// Stop following `target` (or withdraw a pending request)
pub async fn unfollow(store: &dyn SocialStore, actor: Option<Uuid>, target: Uuid) -> Result<(), SocialError> {
    let actor = require_actor("remove", actor)?;
    deny_or_unfollow(store, Some(actor), EdgeKey::new(actor, target)).await
}

/// Refuse a pending request from `requester` (also removes an accepted follower)
pub async fn deny(store: &dyn SocialStore, actor: Option<Uuid>, requester: Uuid) -> Result<(), SocialError> {
    let actor = require_actor("remove", actor)?;
    deny_or_unfollow(store, Some(actor), EdgeKey::new(requester, actor)).await
}

// Notifications are best effort and never fail the transition that sent them.
async fn notify(store: &dyn SocialStore, actor: Uuid, recipient: Uuid, kind: NotificationKind) {
    let actor_username = match store.profile_by_id(actor).await {
        Ok(Some(profile)) => profile.username,
        Ok(None) => {
            warn!(actor = %actor, "actor profile missing, skipping notification");
            return;
        }
        Err(e) => {
            warn!("Failed to load actor profile for notification: {}", e);
            return;
        }
    };

    let notification = Notification::new(recipient, actor, actor_username, kind, Utc::now().naive_utc());
    if let Err(e) = store.create_notification(notification).await {
        warn!("Failed to create {} notification: {}", kind.as_str(), e);
    }
}
