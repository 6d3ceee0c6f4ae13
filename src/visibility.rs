// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

//! Decides what a viewer may see of a profile and which follow button
//! state to present.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::follow::{EdgeState, FollowStatus};
use crate::models::profile::{Profile, Visibility};

/// Follow button state presented to a viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowState {
    NotFollowing,
    Pending,
    Accepted,
}

impl FollowState {
    /// State to show right after a follow request is sent
    pub fn after_follow(target: Visibility) -> Self {
        match initial_status(target) {
            FollowStatus::Pending => FollowState::Pending,
            FollowStatus::Accepted => FollowState::Accepted,
        }
    }

    pub fn after_unfollow() -> Self {
        FollowState::NotFollowing
    }
}

impl From<&EdgeState> for FollowState {
    fn from(edge: &EdgeState) -> Self {
        match edge {
            EdgeState::None => FollowState::NotFollowing,
            EdgeState::Pending { .. } => FollowState::Pending,
            EdgeState::Accepted { .. } => FollowState::Accepted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityDecision {
    pub can_view_content: bool,
    pub follow_state: FollowState,
    pub is_own_profile: bool,
}

/// Status a new edge starts in: private accounts gate, public ones don't
pub fn initial_status(target: Visibility) -> FollowStatus {
    match target {
        Visibility::Private => FollowStatus::Pending,
        Visibility::Public => FollowStatus::Accepted,
    }
}

/// Resolve what `viewer` (anonymous when `None`) may see of `target`.
///
/// `edge` is the edge from viewer to target, `EdgeState::None` when absent.
pub fn resolve_visibility(viewer: Option<Uuid>, target: &Profile, edge: &EdgeState) -> VisibilityDecision {
    let is_own_profile = viewer == Some(target.id);
    let can_view_content = !target.is_private() || edge.is_accepted() || is_own_profile;

    VisibilityDecision {
        can_view_content,
        follow_state: FollowState::from(edge),
        is_own_profile,
    }
}
