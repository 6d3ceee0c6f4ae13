// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Every route served by the API, without middleware
pub fn routes() -> Router<AppState> {
    Router::new()
        // General routes
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::get_metrics))

        // Profile routes
        .route("/api/profiles/:username", get(handlers::profiles::get_profile))
        .route("/api/profiles/:username/timeline", get(handlers::profiles::get_profile_timeline))
        .route("/api/profiles/:username/followers", get(handlers::profiles::get_profile_followers))
        .route("/api/profiles/:username/following", get(handlers::profiles::get_profile_following))

        // Follow graph routes
        .route(
            "/api/follows/:username",
            post(handlers::follows::follow_profile).delete(handlers::follows::unfollow_profile),
        )
        .route("/api/follow-requests", get(handlers::follows::list_follow_requests))
        .route("/api/follow-requests/:requester_id/approve", post(handlers::follows::approve_request))
        .route("/api/follow-requests/:requester_id/deny", post(handlers::follows::deny_request))

        // Notification routes
        .route("/api/notifications", get(handlers::follows::list_notifications))
        .route("/api/notifications/:notification_id/read", post(handlers::follows::mark_notification_read))
}
